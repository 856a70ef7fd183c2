use dealflow_core::{DealId, Msg};
use thiserror::Error;

pub const HELP: &str = "\
commands:
  load <domain> <token>   start a new session
  expand <deal id>        open a deal and fetch its tasks
  collapse                close the open deal
  retry <deal id>         fetch a deal's tasks again
  help                    show this text
  quit                    exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Send(Msg),
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("unknown command {0:?}; type `help`")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("invalid deal id {0:?}")]
    DealId(String),
}

/// Parses one stdin line. Blank lines yield `None`.
pub fn parse_command(line: &str) -> Result<Option<Command>, InputError> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let command = match (verb.to_ascii_lowercase().as_str(), args.as_slice()) {
        ("load", [domain, token]) => Command::Send(Msg::LoadRequested {
            domain: (*domain).to_string(),
            token: (*token).to_string(),
        }),
        ("load", _) => return Err(InputError::Usage("load <domain> <token>")),
        ("expand", [id]) => Command::Send(Msg::DealExpanded {
            deal_id: parse_deal_id(id)?,
        }),
        ("expand", _) => return Err(InputError::Usage("expand <deal id>")),
        ("collapse", []) => Command::Send(Msg::DealCollapsed),
        ("collapse", _) => return Err(InputError::Usage("collapse")),
        ("retry", [id]) => Command::Send(Msg::TaskRetryRequested {
            deal_id: parse_deal_id(id)?,
        }),
        ("retry", _) => return Err(InputError::Usage("retry <deal id>")),
        ("help", _) => Command::Help,
        ("quit" | "exit", _) => Command::Quit,
        (other, _) => return Err(InputError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

fn parse_deal_id(raw: &str) -> Result<DealId, InputError> {
    raw.parse()
        .map_err(|_| InputError::DealId(raw.to_string()))
}
