//! Protocol layer for the "Smart Exterior Kit" battery LED hub.
//!
//! Frames are 20 bytes, enciphered with a TEA-style block cipher, and carry a
//! sequence number and an additive checksum. A session starts with a password
//! handshake, after which colors are chosen from 48 presets.

pub mod auth;
pub mod cipher;
pub mod color;
pub mod config;
pub mod constants;
pub mod error;
pub mod frame;
pub mod hub;
pub mod sequence;
pub mod session;
pub mod sim;
pub mod transport;

pub use auth::{AuthOutcome, AuthState, Authenticator};
pub use cipher::{CipherKey, TeaCipher};
pub use color::{ColorPreset, color_command_payload, color_index_for};
pub use config::{HubConfig, Password};
pub use error::{HubError, Result};
pub use frame::{CommandId, Frame, FrameCodec};
pub use hub::Hub;
pub use sequence::SequenceCounter;
pub use transport::Transport;
