//! Block cipher used to obfuscate every hub frame.
//!
//! The hub runs a 32-round Feistel network over pairs of big-endian `u32`
//! words (classic TEA). Each 8-byte block is transformed on its own, with no
//! chaining, and a trailing partial block is passed through untouched. For a
//! 20-byte frame that means bytes `0..16` are enciphered and `16..20` travel
//! in the clear.

use crate::constants::{CIPHER_BLOCK_SIZE, CIPHER_DELTA, CIPHER_KEY_SIZE, CIPHER_ROUNDS};
use crate::error::{HubError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// 128-bit cipher key
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct CipherKey([u8; CIPHER_KEY_SIZE]);

impl CipherKey {
    pub const fn new(bytes: [u8; CIPHER_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Parse a key from 32 hex characters
    pub fn from_hex(text: &str) -> Result<Self> {
        let raw = hex::decode(text.trim())?;
        let bytes: [u8; CIPHER_KEY_SIZE] = raw.as_slice().try_into().map_err(|_| {
            HubError::Config(format!(
                "cipher key must be {} bytes, got {}",
                CIPHER_KEY_SIZE,
                raw.len()
            ))
        })?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; CIPHER_KEY_SIZE] {
        &self.0
    }

    /// Key as the four big-endian words `k0..k3`
    pub fn words(&self) -> [u32; 4] {
        let mut words = [0u32; 4];
        for (word, chunk) in words.iter_mut().zip(self.0.chunks_exact(4)) {
            *word = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        words
    }
}

impl Default for CipherKey {
    fn default() -> Self {
        Self(*crate::constants::DEFAULT_CIPHER_KEY)
    }
}

// Keys are secrets; keep them out of debug logs.
impl fmt::Debug for CipherKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CipherKey(..)")
    }
}

impl Serialize for CipherKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for CipherKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        CipherKey::from_hex(&text).map_err(serde::de::Error::custom)
    }
}

/// Encrypt/decrypt engine bound to one key
#[derive(Debug, Clone)]
pub struct TeaCipher {
    k: [u32; 4],
}

impl TeaCipher {
    pub fn new(key: &CipherKey) -> Self {
        Self { k: key.words() }
    }

    /// Encrypt every full 8-byte block of `buf` in place
    pub fn encrypt_blocks(&self, buf: &mut [u8]) {
        for block in buf.chunks_exact_mut(CIPHER_BLOCK_SIZE) {
            let (v0, v1) = read_block(block);
            let (v0, v1) = self.encrypt_pair(v0, v1);
            write_block(block, v0, v1);
        }
    }

    /// Decrypt every full 8-byte block of `buf` in place
    pub fn decrypt_blocks(&self, buf: &mut [u8]) {
        for block in buf.chunks_exact_mut(CIPHER_BLOCK_SIZE) {
            let (v0, v1) = read_block(block);
            let (v0, v1) = self.decrypt_pair(v0, v1);
            write_block(block, v0, v1);
        }
    }

    fn encrypt_pair(&self, mut v0: u32, mut v1: u32) -> (u32, u32) {
        let [k0, k1, k2, k3] = self.k;
        let mut sum = 0u32;
        for _ in 0..CIPHER_ROUNDS {
            sum = sum.wrapping_add(CIPHER_DELTA);
            v0 = v0.wrapping_add(mix(v1, sum, k0, k1));
            v1 = v1.wrapping_add(mix(v0, sum, k2, k3));
        }
        (v0, v1)
    }

    fn decrypt_pair(&self, mut v0: u32, mut v1: u32) -> (u32, u32) {
        let [k0, k1, k2, k3] = self.k;
        let mut sum = CIPHER_DELTA.wrapping_mul(CIPHER_ROUNDS);
        for _ in 0..CIPHER_ROUNDS {
            v1 = v1.wrapping_sub(mix(v0, sum, k2, k3));
            v0 = v0.wrapping_sub(mix(v1, sum, k0, k1));
            sum = sum.wrapping_sub(CIPHER_DELTA);
        }
        (v0, v1)
    }
}

#[inline]
fn mix(v: u32, sum: u32, ka: u32, kb: u32) -> u32 {
    (v << 4).wrapping_add(ka) ^ v.wrapping_add(sum) ^ (v >> 5).wrapping_add(kb)
}

#[inline]
fn read_block(block: &[u8]) -> (u32, u32) {
    (
        u32::from_be_bytes([block[0], block[1], block[2], block[3]]),
        u32::from_be_bytes([block[4], block[5], block[6], block[7]]),
    )
}

#[inline]
fn write_block(block: &mut [u8], v0: u32, v1: u32) {
    block[..4].copy_from_slice(&v0.to_be_bytes());
    block[4..].copy_from_slice(&v1.to_be_bytes());
}
