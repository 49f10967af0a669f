use thiserror::Error;

/// Errors raised by mask construction and the set operations built on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BitSetError {
    /// The member's bit position does not fit the backing word.
    #[error("{name} maps to bit {index}, which does not fit a {width}-bit mask")]
    OutOfRange {
        name: &'static str,
        index: u32,
        width: u32,
    },

    /// A flags-style member whose value is zero or has several bits set.
    #[error("{name} ({repr:#x}) is not a single-bit flag")]
    NotSingleBit { name: &'static str, repr: i64 },

    /// A required operand was absent.
    #[error("argument required: {0}")]
    ArgumentRequired(&'static str),

    #[error("destination too small: {needed} members from offset {offset}, {available} slots left")]
    DestinationTooSmall {
        needed: usize,
        offset: usize,
        available: usize,
    },

    #[error("invalid offset {offset} for a destination of length {len}")]
    InvalidOffset { offset: isize, len: usize },
}

pub type Result<T> = std::result::Result<T, BitSetError>;
