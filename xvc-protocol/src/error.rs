use std::{
    error::Error,
    fmt::Display,
    io::{self},
    num::ParseIntError,
    str::Utf8Error,
};

/// Errors that may occur when reading a message from a stream.
#[derive(Debug)]
pub enum ReadError {
    IoError(io::Error),
    /// The prefix matched a known command, but the rest of the name did not.
    InvalidCommand(String),
    /// The first bytes match no known command.
    InvalidCommandPrefix(String),
    UnsupportedVersion(String),
    InvalidFormat(String),
    /// A shift vector is longer than the server accepts.
    TooManyBytes { max: usize, got: usize },
}

impl ReadError {
    /// Whether the error leaves the stream at a command boundary, so reading can continue.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ReadError::InvalidCommand(_) | ReadError::InvalidCommandPrefix(_)
        )
    }
}

impl From<io::Error> for ReadError {
    fn from(value: io::Error) -> Self {
        ReadError::IoError(value)
    }
}

impl From<Utf8Error> for ReadError {
    fn from(value: Utf8Error) -> Self {
        ReadError::InvalidFormat(format!("Invalid UTF8: {}", value))
    }
}

impl From<ParseIntError> for ReadError {
    fn from(value: ParseIntError) -> Self {
        ReadError::InvalidFormat(format!("Invalid integer: {}", value))
    }
}

impl Display for ReadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadError::IoError(error) => write!(f, "{}", error),
            ReadError::InvalidCommand(cmd) => write!(f, "Received invalid command {}", cmd),
            ReadError::UnsupportedVersion(version) => write!(f, "Unsupported version {}", version),
            ReadError::InvalidFormat(format) => write!(f, "{}", format),
            ReadError::InvalidCommandPrefix(prefix) => {
                write!(f, "Received invalid command with prefix {}", prefix)
            }
            ReadError::TooManyBytes { max, got } => {
                write!(
                    f,
                    "Shift vector too large! Maximum is {} bytes, but got {}",
                    max, got
                )
            }
        }
    }
}

impl Error for ReadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ReadError::IoError(error) => Some(error),
            _ => None,
        }
    }
}
