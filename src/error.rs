//! Error kinds raised by the export pipeline.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while fetching, reshaping, or writing a catalog export.
///
/// Every variant is fatal to the run. Nothing in the pipeline retries.
#[derive(Debug, Error)]
pub enum ExportError {
    /// A page could not be fetched (network, auth, rate limit, bad payload).
    #[error("Failed to retrieve products: {0}")]
    Transport(String),

    /// The requested JSON root property is not in the allow-list.
    #[error("Invalid JSON root property: {name}. Use one of: {allowed}")]
    InvalidRootProperty { name: String, allowed: String },

    /// The output file or stream rejected a write.
    #[error("Failed to write {}: {source}", path.display())]
    SinkWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The sink accepted fewer bytes than were produced.
    #[error("Was only able to write {written}/{expected} bytes to {}", path.display())]
    ShortWrite { path: PathBuf, written: usize, expected: usize },

    /// A value used as a document key could not be rendered as a string.
    #[error("Cannot convert JSON root property '{property}' to string for product '{product}'")]
    TypeCoercion { property: String, product: String },

    /// The document tree could not be serialized.
    #[error("Failed to encode JSON output: {0}")]
    Encode(#[from] serde_json::Error),

    /// Neither an access token nor an API key and password were supplied.
    #[error("Missing Shopify credentials: set a token, or an API key and password")]
    MissingCredentials,
}

impl ExportError {
    /// Wraps an I/O failure on the sink at `path`.
    pub fn sink(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ExportError::SinkWrite { path: path.into(), source }
    }

    /// Builds a transport error from anything displayable.
    pub fn transport(message: impl std::fmt::Display) -> Self {
        ExportError::Transport(message.to_string())
    }
}

/// Result alias used across the library.
pub type Result<T, E = ExportError> = std::result::Result<T, E>;
