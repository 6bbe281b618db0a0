use crate::cipher::{CipherKey, TeaCipher};
use crate::constants::{
    CHECKSUM_OFFSET, COMMAND_OFFSET, FRAME_MAGIC, FRAME_SIZE, PAYLOAD_OFFSET, PAYLOAD_SIZE, SEQUENCE_OFFSET,
};
use crate::error::{HubError, Result};
use crate::sequence::SequenceCounter;
use num_enum::{FromPrimitive, IntoPrimitive};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Command ids carried at offset 2 of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, FromPrimitive)]
#[repr(u8)]
pub enum CommandId {
    SetStaticColor = 0x00,
    /// Password submission (host → hub); the hub also acknowledges with this id
    Password = 0x01,
    /// Alternate password acknowledgement id used by some firmware
    PasswordAck = 0x12,

    #[num_enum(catch_all)]
    Unknown(u8),
}

impl CommandId {
    /// Whether a frame with this id answers a password submission
    pub fn is_password_response(&self) -> bool {
        matches!(self, CommandId::Password | CommandId::PasswordAck)
    }
}

/// A decoded (plaintext) 20-byte frame.
///
/// ```text
/// | 0     | 1        | 2       | 3..19   | 19       |
/// | magic | sequence | command | payload | checksum |
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub magic: u8,
    pub sequence: u8,
    pub command: CommandId,
    pub payload: [u8; PAYLOAD_SIZE],
    pub checksum: u8,
}

impl Frame {
    /// Assemble a frame with a fresh checksum. `payload` is left-aligned and
    /// zero-padded; more than 16 bytes is rejected.
    pub fn new(sequence: u8, command: CommandId, payload: &[u8]) -> Result<Self> {
        Ok(Self::with_payload(sequence, command, pad_payload(payload)?))
    }

    /// Assemble a frame around an already padded payload
    pub fn with_payload(sequence: u8, command: CommandId, payload: [u8; PAYLOAD_SIZE]) -> Self {
        let mut frame = Self {
            magic: FRAME_MAGIC,
            sequence,
            command,
            payload,
            checksum: 0,
        };
        frame.checksum = frame.computed_checksum();
        frame
    }

    /// Split plaintext bytes into fields. No validation is performed.
    pub fn from_plaintext(bytes: &[u8; FRAME_SIZE]) -> Self {
        let mut payload = [0u8; PAYLOAD_SIZE];
        payload.copy_from_slice(&bytes[PAYLOAD_OFFSET..CHECKSUM_OFFSET]);
        Self {
            magic: bytes[0],
            sequence: bytes[SEQUENCE_OFFSET],
            command: CommandId::from_primitive(bytes[COMMAND_OFFSET]),
            payload,
            checksum: bytes[CHECKSUM_OFFSET],
        }
    }

    pub fn to_plaintext(&self) -> [u8; FRAME_SIZE] {
        let mut bytes = [0u8; FRAME_SIZE];
        bytes[0] = self.magic;
        bytes[SEQUENCE_OFFSET] = self.sequence;
        bytes[COMMAND_OFFSET] = self.command.into();
        bytes[PAYLOAD_OFFSET..CHECKSUM_OFFSET].copy_from_slice(&self.payload);
        bytes[CHECKSUM_OFFSET] = self.checksum;
        bytes
    }

    /// Sum of bytes 1..=18 modulo 256
    pub fn computed_checksum(&self) -> u8 {
        checksum(&self.to_plaintext())
    }

    pub fn has_valid_magic(&self) -> bool {
        self.magic == FRAME_MAGIC
    }

    pub fn checksum_matches(&self) -> bool {
        self.checksum == self.computed_checksum()
    }

    /// Strict check of magic and checksum. Decoding never calls this; it is
    /// for callers that want to reject damaged frames.
    pub fn validate(&self) -> Result<()> {
        if !self.has_valid_magic() {
            return Err(HubError::InvalidMagic { found: self.magic });
        }
        let expected = self.computed_checksum();
        if self.checksum != expected {
            return Err(HubError::ChecksumMismatch {
                expected,
                actual: self.checksum,
            });
        }
        Ok(())
    }

    /// Status byte of an acknowledgement (payload offset 0)
    pub fn status(&self) -> u8 {
        self.payload[0]
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "seq={:3} cmd={:?} payload={} checksum={:#04x}",
            self.sequence,
            self.command,
            hex::encode(self.payload),
            self.checksum
        )
    }
}

fn pad_payload(payload: &[u8]) -> Result<[u8; PAYLOAD_SIZE]> {
    if payload.len() > PAYLOAD_SIZE {
        return Err(HubError::PayloadTooLarge {
            size: payload.len(),
            max: PAYLOAD_SIZE,
        });
    }
    let mut padded = [0u8; PAYLOAD_SIZE];
    padded[..payload.len()].copy_from_slice(payload);
    Ok(padded)
}

fn checksum(plaintext: &[u8; FRAME_SIZE]) -> u8 {
    plaintext[SEQUENCE_OFFSET..CHECKSUM_OFFSET]
        .iter()
        .fold(0u8, |acc, &b| acc.wrapping_add(b))
}

/// Builds and parses enciphered frames.
///
/// The sequence counter is held behind an `Arc` so several hub sessions can
/// draw from one process-wide counter.
#[derive(Debug, Clone)]
pub struct FrameCodec {
    cipher: TeaCipher,
    sequence: Arc<SequenceCounter>,
}

impl FrameCodec {
    pub fn new(key: &CipherKey) -> Self {
        Self::with_counter(key, Arc::new(SequenceCounter::new()))
    }

    pub fn with_counter(key: &CipherKey, sequence: Arc<SequenceCounter>) -> Self {
        Self {
            cipher: TeaCipher::new(key),
            sequence,
        }
    }

    pub fn counter(&self) -> &Arc<SequenceCounter> {
        &self.sequence
    }

    /// Build the wire bytes for `command` carrying `payload`.
    ///
    /// Advances the sequence counter only when the frame is actually built.
    pub fn build_frame(&self, command: CommandId, payload: &[u8]) -> Result<[u8; FRAME_SIZE]> {
        let payload = pad_payload(payload)?;
        let frame = Frame::with_payload(self.sequence.next(), command, payload);
        Ok(self.seal(&frame))
    }

    /// Encipher an already assembled frame as-is
    pub fn seal(&self, frame: &Frame) -> [u8; FRAME_SIZE] {
        let plaintext = frame.to_plaintext();
        let mut wire = plaintext;
        self.cipher.encrypt_blocks(&mut wire);
        debug!(
            "TX {:02X} plain: {}",
            u8::from(frame.command),
            hex::encode(plaintext)
        );
        debug!("TX {:02X} enc  : {}", u8::from(frame.command), hex::encode(wire));
        wire
    }

    /// Decipher and split a received buffer.
    ///
    /// Only the length is checked; magic and checksum are returned as found.
    pub fn parse_frame(&self, received: &[u8]) -> Result<Frame> {
        let mut plaintext: [u8; FRAME_SIZE] = received
            .try_into()
            .map_err(|_| HubError::MalformedFrame {
                actual: received.len(),
            })?;
        self.cipher.decrypt_blocks(&mut plaintext);
        debug!("RX enc: {}", hex::encode(received));
        debug!("RX dec: {}", hex::encode(plaintext));
        Ok(Frame::from_plaintext(&plaintext))
    }
}
