use crate::cipher::CipherKey;
use crate::constants::{DEFAULT_PASSWORD, DEFAULT_RESPONSE_TIMEOUT, MAX_PASSWORD_LEN};
use crate::error::{HubError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Hub password, at most 6 bytes, compared case-sensitively by the hub
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    pub fn new(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        if text.len() > MAX_PASSWORD_LEN {
            return Err(HubError::PasswordTooLong {
                len: text.len(),
                max: MAX_PASSWORD_LEN,
            });
        }
        Ok(Self(text))
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl Default for Password {
    fn default() -> Self {
        Self(DEFAULT_PASSWORD.to_string())
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(..)")
    }
}

impl Serialize for Password {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Password {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Password::new(text).map_err(serde::de::Error::custom)
    }
}

/// Secrets and timing used to talk to a hub.
///
/// Every field falls back to the factory values, so `{}` is a valid config
/// file. The key is a 32-character hex string and the timeout is in
/// milliseconds:
///
/// ```json
/// { "key": "61646637386572336861663838616430", "password": "MONKEY", "response_timeout_ms": 6000 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    pub key: CipherKey,
    pub password: Password,
    #[serde(rename = "response_timeout_ms", with = "millis")]
    pub response_timeout: Duration,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            key: CipherKey::default(),
            password: Password::default(),
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
        }
    }
}

impl HubConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: HubConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.response_timeout.is_zero() {
            return Err(HubError::Config("response_timeout_ms must be greater than zero".to_string()));
        }
        Ok(())
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}
