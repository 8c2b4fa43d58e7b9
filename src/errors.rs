use std::io;

use thiserror::Error;

use crate::types::StoreId;

/// Error type for every stage of a menu run.
///
/// Each variant names the stage that failed so the top-level handler can
/// report it without inspecting the cause.
#[derive(Debug, Error)]
pub enum MenuError {
    /// Missing or invalid options.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// No usable stored password.
    #[error("credentials unavailable: {0}")]
    Credentials(String),
    /// Store unreachable or unreadable.
    #[error("recipe store '{store}' is unavailable: {reason}")]
    StoreUnavailable {
        /// Store identifier.
        store: StoreId,
        /// Underlying failure.
        reason: String,
    },
    /// A record could not be decoded into a recipe.
    #[error("failed to decode record at position {position}: {reason}")]
    Decode {
        /// Zero-based offset of the record in the stream.
        position: usize,
        /// Parser message.
        reason: String,
    },
    /// The mail sink rejected the report.
    #[error("report delivery failed: {0}")]
    Delivery(String),
    /// Local I/O outside the store and sinks.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl MenuError {
    /// Short stage label used in diagnostics.
    pub fn stage(&self) -> &'static str {
        match self {
            MenuError::Configuration(_) => "configuration",
            MenuError::Credentials(_) => "credentials",
            MenuError::StoreUnavailable { .. } => "store",
            MenuError::Decode { .. } => "decode",
            MenuError::Delivery(_) => "delivery",
            MenuError::Io(_) => "io",
        }
    }
}
