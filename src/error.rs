//! Faults that abort a parse.
//!
//! A matcher that simply does not apply returns `Ok(None)`; it never produces
//! one of these. An `Error` always propagates through every enclosing matcher
//! up to the driver.

use std::io;

/// A fatal error raised while matching.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The underlying byte source failed.
    #[error("failed to read from input source: {0}")]
    Io(#[from] io::Error),

    /// Malformed or truncated UTF-8 was found under
    /// [`DecodePolicy::Strict`](crate::DecodePolicy::Strict).
    #[error("invalid UTF-8 sequence at byte {offset}")]
    InvalidUtf8 {
        /// Absolute offset of the offending sequence from the start of the
        /// stream.
        offset: usize,
    },

    /// A cursor tried to read input which had already been discarded from the
    /// buffer window.
    #[error("input at byte {offset} was already reclaimed (window starts at byte {window_start})")]
    Reclaimed {
        /// Absolute offset the cursor tried to read from.
        offset: usize,

        /// Absolute offset of the first byte still held by the buffer.
        window_start: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_conversion() {
        let err: Error = io::Error::new(io::ErrorKind::BrokenPipe, "gone").into();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.to_string(), "failed to read from input source: gone");
    }

    #[test]
    fn test_reclaimed_display() {
        let err = Error::Reclaimed {
            offset: 3,
            window_start: 10,
        };
        assert_eq!(
            err.to_string(),
            "input at byte 3 was already reclaimed (window starts at byte 10)"
        );
    }
}
