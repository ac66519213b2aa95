use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
/// Batch error
pub enum BatchError {
    /// The source file could not be opened.
    #[error("unable to open {}: {source}", .path.display())]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The document is not a well-formed top-level array.
    #[error("invalid array framing: {0}")]
    Framing(String),

    /// The element at `position` (zero-based) could not be decoded.
    #[error("unable to decode element {position}: {source}")]
    Decode {
        position: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("read failure: {0}")]
    Io(#[from] io::Error),

    #[error("ItemHandler from: {0}")]
    ItemHandler(String),

    #[error("ItemWriter from: {0}")]
    ItemWriter(String),

    #[error("step was cancelled")]
    Cancelled,

    #[error("worker failure: {0}")]
    Worker(String),
}

impl BatchError {
    /// Position of the failing element for decode errors.
    pub fn position(&self) -> Option<usize> {
        match self {
            BatchError::Decode { position, .. } => Some(*position),
            _ => None,
        }
    }
}
