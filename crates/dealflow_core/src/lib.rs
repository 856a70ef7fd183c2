//! Dealflow core: session state machine, job queue accounting and view-model helpers.
//!
//! Nothing in this crate performs I/O or sleeps; the engine drives it.
mod effect;
mod model;
mod msg;
mod state;
mod update;
mod view_model;

pub use effect::{Effect, Severity, UiEvent};
pub use model::{Credential, Deal, DealId, Job, JobKind, Task};
pub use msg::Msg;
pub use state::{FailureDecision, SessionState, DEFAULT_MAX_RETRIES};
pub use update::update;
pub use view_model::{
    build_deal_rows, build_task_views, format_deal_date, format_task_date, task_status,
    DealRow, StatusColor, TaskView,
};
