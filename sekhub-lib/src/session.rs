//! Scripted sessions: authenticate, walk a list of colors, switch off.
//!
//! Hubs are driven strictly one after another and share one frame codec, so
//! sequence numbers keep counting across hubs.

use crate::auth::AuthOutcome;
use crate::config::HubConfig;
use crate::constants::MAX_BRIGHTNESS;
use crate::error::Result;
use crate::frame::FrameCodec;
use crate::hub::Hub;
use crate::transport::Transport;
use std::time::Duration;
use tracing::{error, info, warn};

/// RGB colors cycled through by the demo session
pub const DEMO_COLORS: [(u8, u8, u8); 7] = [
    (255, 0, 0),     // red
    (0, 255, 0),     // green
    (0, 0, 255),     // blue
    (255, 165, 0),   // orange
    (255, 255, 0),   // yellow
    (128, 0, 128),   // purple
    (255, 192, 203), // pink
];

/// Result of driving one hub
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Handshake accepted; lists the color indices that were sent
    Completed { indices: Vec<u8> },
    /// Handshake rejected or timed out; nothing else was sent
    AuthFailed(AuthOutcome),
    /// Transport or protocol error
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    pub name: String,
    pub outcome: SessionOutcome,
}

/// Authenticate, show each color for `hold`, then switch the hub off
pub async fn run_session<T: Transport>(
    hub: &mut Hub<T>,
    colors: &[(u8, u8, u8)],
    hold: Duration,
) -> Result<SessionOutcome> {
    let outcome = hub.authenticate_detailed().await?;
    if !outcome.is_accepted() {
        return Ok(SessionOutcome::AuthFailed(outcome));
    }

    let mut indices = Vec::with_capacity(colors.len());
    for &(r, g, b) in colors {
        info!("Setting RGB({},{},{})", r, g, b);
        indices.push(hub.set_rgb(r, g, b, MAX_BRIGHTNESS).await?);
        tokio::time::sleep(hold).await;
    }
    hub.turn_off().await?;
    Ok(SessionOutcome::Completed { indices })
}

/// Drive each hub in turn. A failing hub is reported and the next one is
/// still attempted.
pub async fn drive_hubs<T, I>(
    hubs: I,
    config: &HubConfig,
    colors: &[(u8, u8, u8)],
    hold: Duration,
) -> Vec<SessionReport>
where
    T: Transport,
    I: IntoIterator<Item = (String, T)>,
{
    let codec = FrameCodec::new(&config.key);
    let mut reports = Vec::new();

    for (name, transport) in hubs {
        info!("Connecting -> {}", name);
        let mut hub = Hub::with_codec(transport, config.clone(), codec.clone());
        let outcome = match run_session(&mut hub, colors, hold).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("{} failed: {}", name, e);
                SessionOutcome::Failed(e.to_string())
            }
        };
        match &outcome {
            SessionOutcome::Completed { indices } => info!("{} done, {} colors sent", name, indices.len()),
            SessionOutcome::AuthFailed(auth) => warn!("{} password not accepted: {:?}", name, auth),
            SessionOutcome::Failed(_) => {}
        }
        reports.push(SessionReport { name, outcome });
    }
    reports
}
