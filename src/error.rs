//! Error types for the tile re-layout and filter pipeline core

use std::fmt;
use std::io;

/// Result type for arraykit-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in arraykit-core operations
#[derive(Debug)]
pub enum Error {
    /// A read could not fit the next cell slab in the user buffer.
    /// Recoverable: the caller may retry with a larger buffer.
    BufferOverflow(String),

    /// A mutating operation was attempted on a read-only buffer.
    ReadOnly(String),

    /// A second prepend/append was attempted on a fixed-allocation buffer.
    FixedAllocViolation(String),

    /// A codec rejected its input or produced a malformed stream.
    Compression(String),

    /// The underlying storage backend failed.
    Storage(String),

    /// An option value, argument combination, or type was invalid.
    InvalidArgument(String),

    /// The requested capability (codec, filter) is not available.
    NotSupported(String),

    /// I/O error from the standard library.
    Io(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BufferOverflow(msg) => write!(f, "buffer overflow: {}", msg),
            Error::ReadOnly(msg) => write!(f, "read-only buffer: {}", msg),
            Error::FixedAllocViolation(msg) => {
                write!(f, "fixed allocation violation: {}", msg)
            }
            Error::Compression(msg) => write!(f, "compression error: {}", msg),
            Error::Storage(msg) => write!(f, "storage error: {}", msg),
            Error::InvalidArgument(msg) => write!(f, "invalid argument: {}", msg),
            Error::NotSupported(msg) => write!(f, "not supported: {}", msg),
            Error::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        Error::Io(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidArgument("bad level".to_string());
        assert_eq!(err.to_string(), "invalid argument: bad level");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_buffer_overflow_display() {
        let err = Error::BufferOverflow("attribute a0".to_string());
        assert!(err.to_string().contains("a0"));
    }

    #[test]
    fn test_not_supported_display() {
        let err = Error::NotSupported("webp codec".to_string());
        assert!(err.to_string().contains("webp"));
    }
}
