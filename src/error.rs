//! Error types for folio operations.

use thiserror::Error;

use crate::collect::ContextType;

/// Errors that can occur while collecting or importing a document.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A context the caller opened explicitly was never closed.
    #[error("explicitly opened {context:?} still open at end of document")]
    UnclosedContext { context: ContextType },

    /// Suspended contexts were never resumed.
    #[error("{count} suspended context(s) never restored")]
    SuspendedContexts { count: usize },

    #[error("Invalid PalmDoc: {0}")]
    InvalidPalmDoc(String),

    #[error("Unsupported PalmDoc compression: {0}")]
    UnsupportedCompression(u16),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

pub type Result<T> = std::result::Result<T, Error>;
