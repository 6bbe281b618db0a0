use std::io;
use std::time::Duration;
use thiserror::Error;

/// The primary error type for the `sekhub-lib` library.
#[derive(Error, Debug)]
pub enum HubError {
    #[error("Malformed frame: expected 20 bytes, got {actual}")]
    MalformedFrame { actual: usize },

    #[error("Payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    #[error("Password rejected by hub (status {status:#04x})")]
    AuthenticationRejected { status: u8 },

    #[error("No password response within {waited:?}")]
    AuthenticationTimedOut { waited: Duration },

    #[error("Handshake already ran; start a new session")]
    HandshakeAlreadyRun,

    #[error("Invalid frame magic: expected 0x45, got {found:#04x}")]
    InvalidMagic { found: u8 },

    #[error("Checksum mismatch: expected {expected:#04x}, got {actual:#04x}")]
    ChecksumMismatch { expected: u8, actual: u8 },

    #[error("Color index {0} out of range (0-48)")]
    InvalidColorIndex(u8),

    #[error("Brightness {0} out of range (0-100)")]
    InvalidBrightness(u8),

    #[error("Password too long ({len} bytes, max {max})")]
    PasswordTooLong { len: usize, max: usize },

    #[error("Unknown color preset: {0}")]
    UnknownPreset(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Hex decode error: {0}")]
    Hex(#[from] hex::FromHexError),
}

pub type Result<T> = std::result::Result<T, HubError>;
