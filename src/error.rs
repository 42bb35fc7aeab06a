//! Error types for the broadcaster and its collaborators

use thiserror::Error;

/// A caller broke the [`Broadcaster`] lifecycle contract.
///
/// These are programming errors, never transient conditions. The panicking
/// methods on [`Broadcaster`] raise them immediately; the `try_*` methods
/// hand them back so an embedding application can decide what to do.
/// Retrying the same call will always fail the same way.
///
/// [`Broadcaster`]: struct.Broadcaster.html
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContractViolation {
    #[error("add_chan: attempt to add a new output to a closed broadcaster")]
    AddAfterClose,

    #[error("send: attempt to send to a broadcaster that has already been closed")]
    SendAfterClose,

    #[error("send: attempt to send to a broadcaster with no outputs")]
    SendWithoutOutputs,

    #[error("close: attempt to close a broadcaster that has already been closed")]
    DoubleClose,

    #[error("len: attempt to count outputs of a broadcaster that has already been closed")]
    LenAfterClose,
}

impl ContractViolation {
    /// The broadcaster operation that was misused.
    pub fn operation(&self) -> &'static str {
        match self {
            ContractViolation::AddAfterClose => "add_chan",
            ContractViolation::SendAfterClose | ContractViolation::SendWithoutOutputs => "send",
            ContractViolation::DoubleClose => "close",
            ContractViolation::LenAfterClose => "len",
        }
    }
}

/// Failures of the file recorders.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("i/o error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error on {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("csv separator {0:?} is not a single ascii character")]
    InvalidSeparator(char),
}

/// Settings could not be loaded.
#[derive(Debug, Error)]
#[error("configuration error: {0}")]
pub struct ConfigError(#[from] figment::Error);
