use std::io;

/// Errors reported by the buffer engine
///
/// None of these are fatal. `OutOfMemory` leaves the buffer exactly as it was
/// before the failing call; the range errors are reported after the request
/// has been clamped to the nearest valid position.
#[derive(Debug)]
pub enum BufferError {
    /// The chunk pool has no free chunks left
    OutOfMemory,
    /// An absolute offset outside `[0, size]` was requested
    OutOfRange { offset: usize, size: usize },
    /// A line number past the last line was requested
    LineNotFound { line: usize, line_count: usize },
    /// The pool or buffer was asked for impossible sizes
    InvalidConfig(String),
    /// Reading or writing the persisted form failed
    Io(io::Error),
}

impl std::fmt::Display for BufferError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutOfMemory => write!(f, "Out of memory: chunk pool exhausted"),
            Self::OutOfRange { offset, size } => {
                write!(f, "Offset {} is out of range (buffer size {})", offset, size)
            }
            Self::LineNotFound { line, line_count } => write!(
                f,
                "Line {} not found (buffer has {} lines)",
                line + 1,
                line_count
            ),
            Self::InvalidConfig(msg) => write!(f, "Invalid buffer configuration: {}", msg),
            Self::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for BufferError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for BufferError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl BufferError {
    /// Is this a recoverable resource exhaustion (as opposed to a bad request)?
    pub fn is_out_of_memory(&self) -> bool {
        matches!(self, Self::OutOfMemory)
    }
}
