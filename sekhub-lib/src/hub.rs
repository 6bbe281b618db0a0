use crate::auth::{AuthOutcome, Authenticator};
use crate::color::{ColorPreset, color_command_payload, color_index_for};
use crate::config::HubConfig;
use crate::constants::MAX_BRIGHTNESS;
use crate::error::Result;
use crate::frame::{CommandId, FrameCodec};
use crate::transport::Transport;
use bytes::Bytes;
use tracing::{debug, info, warn};

/// One connected hub.
///
/// Wraps a transport with the frame codec and the session secrets. Color
/// commands may be sent before the handshake; the hub ignores them until a
/// password has been accepted.
pub struct Hub<T: Transport> {
    transport: T,
    codec: FrameCodec,
    config: HubConfig,
    authenticated: bool,
}

impl<T: Transport> Hub<T> {
    /// Hub with its own sequence counter
    pub fn new(transport: T, config: HubConfig) -> Self {
        let codec = FrameCodec::new(&config.key);
        Self::with_codec(transport, config, codec)
    }

    /// Hub drawing sequence numbers from an existing codec
    pub fn with_codec(transport: T, config: HubConfig, codec: FrameCodec) -> Self {
        Self {
            transport,
            codec,
            config,
            authenticated: false,
        }
    }

    /// Run the password handshake; `true` only when the hub accepted it
    pub async fn authenticate(&mut self) -> Result<bool> {
        Ok(self.authenticate_detailed().await?.is_accepted())
    }

    /// Run the password handshake and report how it ended
    pub async fn authenticate_detailed(&mut self) -> Result<AuthOutcome> {
        let mut auth = Authenticator::new(self.config.password.clone(), self.config.response_timeout);
        let outcome = auth.run(&self.codec, &mut self.transport).await?;
        self.authenticated = outcome.is_accepted();
        Ok(outcome)
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Show preset `index` (0-48) at `brightness` percent
    pub async fn set_color_index(&mut self, index: u8, brightness: u8) -> Result<()> {
        let payload = color_command_payload(index, brightness)?;
        if !self.authenticated {
            warn!("Sending color command before the password was accepted");
        }
        debug!("Setting color index {} at {}%", index, brightness);
        self.send(CommandId::SetStaticColor, &payload).await
    }

    /// Show the preset closest to an RGB color; returns the chosen index
    pub async fn set_rgb(&mut self, r: u8, g: u8, b: u8, brightness: u8) -> Result<u8> {
        let index = color_index_for(r, g, b);
        info!("RGB({},{},{}) -> color index {}", r, g, b, index);
        self.set_color_index(index, brightness).await?;
        Ok(index)
    }

    pub async fn set_preset(&mut self, preset: ColorPreset, brightness: u8) -> Result<()> {
        self.set_color_index(preset.index(), preset.effective_brightness(brightness))
            .await
    }

    pub async fn set_preset_full(&mut self, preset: ColorPreset) -> Result<()> {
        self.set_preset(preset, MAX_BRIGHTNESS).await
    }

    pub async fn turn_off(&mut self) -> Result<()> {
        self.set_preset(ColorPreset::Off, 0).await
    }

    async fn send(&mut self, command: CommandId, payload: &[u8]) -> Result<()> {
        let frame = self.codec.build_frame(command, payload)?;
        self.transport.write(Bytes::copy_from_slice(&frame)).await
    }
}
