//! JSON output envelope shared by all commands.

use serde::Serialize;

pub const SCHEMA_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Success,
    /// Succeeded but found nothing
    NotFound,
    Error,
}

impl Status {
    pub fn exit_code(self) -> u8 {
        match self {
            Status::Success => 0,
            Status::NotFound => 3,
            Status::Error => 1,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub status: Status,
    pub exit_code: u8,
    pub command: &'static str,
    pub message: String,
    pub data: Option<T>,
    pub schema_version: &'static str,
}

impl<T: Serialize> Envelope<T> {
    pub fn new(command: &'static str, status: Status, message: impl Into<String>, data: T) -> Self {
        Self {
            status,
            exit_code: status.exit_code(),
            command,
            message: message.into(),
            data: Some(data),
            schema_version: SCHEMA_VERSION,
        }
    }

    /// Print to stdout and hand back the status the process exits with.
    pub fn print(&self) -> anyhow::Result<Status> {
        println!("{}", serde_json::to_string_pretty(self)?);
        Ok(self.status)
    }
}

/// Error envelope for `--json` callers.
pub fn print_error(command: &'static str, error: &anyhow::Error) {
    let envelope: Envelope<()> = Envelope {
        status: Status::Error,
        exit_code: Status::Error.exit_code(),
        command,
        message: format!("{error:#}"),
        data: None,
        schema_version: SCHEMA_VERSION,
    };
    match serde_json::to_string_pretty(&envelope) {
        Ok(json) => println!("{json}"),
        Err(_) => eprintln!("Error: {error:#}"),
    }
}
