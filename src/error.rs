use std::fmt;

// The three recoverable failure categories of the engine core. Anything
// app-level (terminal, audio device, file io) stays anyhow in the binary.
#[derive(Debug, Clone, PartialEq)]
pub enum CoreError {
    // malformed or unsupported audio bytes
    Decode(String),
    // capture device unavailable, denied, or misused
    Capture(String),
    // malformed persisted kit document
    Document(String),
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::Decode(msg) => write!(f, "audio decode failed: {msg}"),
            CoreError::Capture(msg) => write!(f, "capture failed: {msg}"),
            CoreError::Document(msg) => write!(f, "kit document invalid: {msg}"),
        }
    }
}

impl std::error::Error for CoreError {}
