// SPDX-License-Identifier: MIT

use core::fmt;

/// Result type for block store operations.
pub type Me2IOResult<T = ()> = core::result::Result<T, Me2IOError>;

/// Error type for block store operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Me2IOError {
    /// Underlying device failure.
    Other(&'static str),
    /// Access past the end of the device or buffer.
    OutOfBounds,
    /// Operation not supported by the backend.
    Unsupported,
    /// Caller passed an argument the backend cannot honor.
    Invalid(&'static str),
}

impl Me2IOError {
    pub fn msg(&self) -> &'static str {
        match self {
            Me2IOError::Other(msg) => msg,
            Me2IOError::OutOfBounds => "Out of bounds",
            Me2IOError::Unsupported => "Unsupported operation",
            Me2IOError::Invalid(msg) => msg,
        }
    }
}

impl From<&'static str> for Me2IOError {
    #[inline]
    fn from(msg: &'static str) -> Self {
        Me2IOError::Other(msg)
    }
}

impl fmt::Display for Me2IOError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.msg())
    }
}

#[cfg(feature = "std")]
impl ::std::error::Error for Me2IOError {}
