use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to open region table for pid {pid}: {source}")]
    MapsUnavailable { pid: u32, source: std::io::Error },

    #[error("Failed to read process memory at address {address:#x}: {message}")]
    MemoryReadFailed { address: u64, message: String },

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this error means the target process is gone or was never there
    pub fn is_process_gone(&self) -> bool {
        match self {
            Error::MapsUnavailable { source, .. } => {
                source.kind() == std::io::ErrorKind::NotFound
            }
            Error::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}
