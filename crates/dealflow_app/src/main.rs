mod config;
mod input;
mod render;

use std::io::{self, BufRead, Write};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use anyhow::Context;
use dealflow_engine::EngineHandle;
use engine_logging::{flow_info, flow_warn};

use crate::input::{parse_command, Command, HELP};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

fn main() -> anyhow::Result<()> {
    let path = config::config_path();
    let file_config = config::load(&path)?;
    engine_logging::initialize(file_config.log_destination(), file_config.log_level()?);
    flow_info!("Starting dealflow (config {:?})", path);

    let engine = EngineHandle::new(file_config.engine_config())
        .context("failed to start the fetch engine")?;

    let lines = spawn_stdin_reader();
    let mut out = io::stdout().lock();
    writeln!(out, "{HELP}")?;

    loop {
        while let Some(event) = engine.try_recv() {
            for line in render::render_event(&event) {
                writeln!(out, "{line}")?;
            }
        }
        out.flush()?;

        let line = match lines.recv_timeout(POLL_INTERVAL) {
            Ok(line) => line,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };

        match parse_command(&line) {
            Ok(None) => {}
            Ok(Some(Command::Send(msg))) => engine.send(msg),
            Ok(Some(Command::Help)) => writeln!(out, "{HELP}")?,
            Ok(Some(Command::Quit)) => break,
            Err(err) => writeln!(out, "{err}")?,
        }
    }

    flow_info!("Shutting down");
    Ok(())
}

fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(err) => {
                    flow_warn!("stdin read failed: {}", err);
                    break;
                }
            }
        }
    });
    rx
}
