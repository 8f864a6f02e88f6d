use std::{error, fmt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The supplied range was empty or inverted (`end <= start`).
    InvalidRange,
    /// The node pool could not provide a node for the operation.
    OutOfMemory,
    /// No stored interval overlaps the queried range.
    NotFound,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::InvalidRange => write!(f, "the range end must lie after its start"),
            Self::OutOfMemory => write!(f, "the node pool is exhausted"),
            Self::NotFound => write!(f, "no stored interval overlaps the range"),
        }
    }
}

impl error::Error for Error {}
