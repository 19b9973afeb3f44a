use std::{error, fmt, io, result};

#[derive(Debug)]
enum ErrorKind {
    Io(io::Error),
    Range {
        start: usize,
        end: usize,
        len: usize,
    },
    Decode {
        index: u64,
    },
    Parse {
        index: u64,
        message: String,
    },
    Construction {
        message: String,
    },
}

/// The error type returned by every fallible operation in this crate.
///
/// The concrete cause is intentionally not exposed as a public enum; match on
/// [`Error::is_range`] and friends, or use [`fmt::Display`] for a human-readable message.
#[derive(Debug)]
pub struct Error(ErrorKind);

impl Error {
    pub(crate) fn range(start: usize, end: usize, len: usize) -> Self {
        Self(ErrorKind::Range { start, end, len })
    }

    pub(crate) fn decode(index: u64) -> Self {
        Self(ErrorKind::Decode { index })
    }

    pub(crate) fn parse(index: u64, message: impl Into<String>) -> Self {
        Self(ErrorKind::Parse {
            index,
            message: message.into(),
        })
    }

    pub(crate) fn construction(message: impl Into<String>) -> Self {
        Self(ErrorKind::Construction {
            message: message.into(),
        })
    }

    /// True if this error was raised by an out-of-bounds buffer access.
    pub fn is_range(&self) -> bool {
        matches!(self.0, ErrorKind::Range { .. })
    }

    /// The zero-based record index a decode or parse failure occurred at, if applicable.
    pub fn index(&self) -> Option<u64> {
        match self.0 {
            ErrorKind::Decode { index } | ErrorKind::Parse { index, .. } => Some(index),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self(ErrorKind::Io(err))
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        Self::new(io::ErrorKind::Other, err)
    }
}

impl error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.0 {
            ErrorKind::Io(err) => err.fmt(f),
            ErrorKind::Range { start, end, len } => write!(
                f,
                "range [{}, {}) is out of bounds for a buffer of {} bytes",
                start, end, len
            ),
            ErrorKind::Decode { index } => {
                write!(f, "record {} is not valid UTF-8", index)
            }
            ErrorKind::Parse { index, message } => {
                write!(f, "record {} failed to parse: {}", index, message)
            }
            ErrorKind::Construction { message } => write!(f, "{}", message),
        }
    }
}

pub type Result<T> = result::Result<T, Error>;
