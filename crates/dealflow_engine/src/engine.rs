use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use dealflow_core::{Msg, UiEvent};
use engine_logging::flow_info;
use tokio::sync::mpsc as async_mpsc;

use crate::{EngineConfig, FetchError, RelayFetcher, ReqwestFetcher, Sequencer};

/// Receives render data and signals for the presentation layer.
pub trait UiSink: Send + Sync {
    fn emit(&self, event: UiEvent);
}

pub struct ChannelUiSink {
    tx: mpsc::Sender<UiEvent>,
}

impl ChannelUiSink {
    pub fn new(tx: mpsc::Sender<UiEvent>) -> Self {
        Self { tx }
    }
}

impl UiSink for ChannelUiSink {
    fn emit(&self, event: UiEvent) {
        let _ = self.tx.send(event);
    }
}

/// Runs the sequencer on a dedicated single-threaded runtime.
///
/// Messages go in through [`EngineHandle::send`]; UI events come back out
/// through [`EngineHandle::try_recv`] / [`EngineHandle::recv_timeout`].
pub struct EngineHandle {
    cmd_tx: async_mpsc::UnboundedSender<Msg>,
    event_rx: mpsc::Receiver<UiEvent>,
}

impl EngineHandle {
    pub fn new(config: EngineConfig) -> Result<Self, FetchError> {
        let fetcher = Arc::new(ReqwestFetcher::new(config.connect_timeout)?);
        Ok(Self::with_fetcher(config, fetcher))
    }

    pub fn with_fetcher(config: EngineConfig, fetcher: Arc<dyn RelayFetcher>) -> Self {
        let (cmd_tx, mut cmd_rx) = async_mpsc::unbounded_channel::<Msg>();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("tokio runtime");
            let sink = Arc::new(ChannelUiSink::new(event_tx));
            let sequencer = Sequencer::new(config, fetcher, sink);

            runtime.block_on(async move {
                while let Some(msg) = cmd_rx.recv().await {
                    sequencer.dispatch(msg);
                }
                flow_info!("Engine command channel closed");
            });
        });

        Self { cmd_tx, event_rx }
    }

    pub fn send(&self, msg: Msg) {
        let _ = self.cmd_tx.send(msg);
    }

    pub fn try_recv(&self) -> Option<UiEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<UiEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}
