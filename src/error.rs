use thiserror::Error;
use x11rb::errors::{ConnectError, ConnectionError, ReplyError, ReplyOrIdError};

/// Errors that end the program
#[derive(Debug, Error)]
pub enum DizzyError {
    #[error("Cannot open display {display}: {source}")]
    Connect {
        display: String,
        #[source]
        source: ConnectError,
    },
    #[error("double buffer extension unavailable: {0}")]
    ExtensionUnavailable(String),
    #[error("Failed to find matching double buffer capable visual.")]
    NoMatchingConfig,
    #[error("no visual descriptor for visual {0:#x}")]
    ConfigResolution(u32),
    #[error("Couldn't create {what}: {source}")]
    ResourceCreation {
        what: String,
        #[source]
        source: ReplyOrIdError,
    },
    #[error("X protocol error: {0}")]
    Protocol(#[from] ReplyError),
    #[error("X connection failed: {0}")]
    Connection(#[from] ConnectionError),
    #[error("X resource id allocation failed: {0}")]
    Id(#[from] ReplyOrIdError),
    #[error("waiting for input failed: {0}")]
    Poll(#[from] nix::errno::Errno),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DizzyError {
    /// Wraps a failed setup request with the name of the resource it was creating
    pub fn resource(what: impl Into<String>, source: impl Into<ReplyOrIdError>) -> Self {
        DizzyError::ResourceCreation {
            what: what.into(),
            source: source.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DizzyError>;
