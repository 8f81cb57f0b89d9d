//! Error kinds shared by every native query.

use std::io;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TermError {
    /// No known `TIOCGWINSZ` value for this OS/architecture pair
    #[error("Unsupported platform: os={os}, arch={arch}")]
    UnsupportedPlatform { os: String, arch: String },

    /// A native library or one of its symbols could not be resolved
    #[error("Unresolved native symbol: {0}")]
    NativeCallUnavailable(String),

    /// The OS call reported failure
    #[error("{call} failed: {message}")]
    NativeCallFailed {
        call: &'static str,
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, TermError>;

impl TermError {
    pub(crate) fn call_failed(call: &'static str, message: impl Into<String>) -> Self {
        TermError::NativeCallFailed {
            call,
            message: message.into(),
        }
    }
}

impl From<TermError> for io::Error {
    fn from(err: TermError) -> Self {
        let kind = match err {
            TermError::UnsupportedPlatform { .. } => io::ErrorKind::Unsupported,
            TermError::NativeCallUnavailable(_) => io::ErrorKind::NotFound,
            TermError::NativeCallFailed { .. } => io::ErrorKind::Other,
        };
        io::Error::new(kind, err)
    }
}
