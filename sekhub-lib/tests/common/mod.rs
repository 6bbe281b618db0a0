//! Common test utilities and shared imports

// Shared across test files; not every item is used in every file
#[allow(unused_imports)]
pub use bytes::Bytes;
#[allow(unused_imports)]
pub use sekhub_lib::auth::{AuthOutcome, AuthState, Authenticator};
#[allow(unused_imports)]
pub use sekhub_lib::config::{HubConfig, Password};
#[allow(unused_imports)]
pub use sekhub_lib::error::{HubError, Result};
#[allow(unused_imports)]
pub use sekhub_lib::frame::{CommandId, Frame, FrameCodec};
#[allow(unused_imports)]
pub use sekhub_lib::sim::{Reply, SimulatedHub};
#[allow(unused_imports)]
pub use sekhub_lib::transport::Transport;
#[allow(unused_imports)]
pub use std::time::Duration;

use tokio::sync::mpsc;

/// Transport that answers the first write with canned buffers, each after a delay
#[allow(dead_code)]
pub struct ScriptedTransport {
    script: Vec<(Duration, Bytes)>,
    sender: Option<mpsc::Sender<Bytes>>,
    fail_subscribe: bool,
    pub written: Vec<Bytes>,
    pub subscribe_calls: usize,
    pub unsubscribe_calls: usize,
}

#[allow(dead_code)]
impl ScriptedTransport {
    pub fn new(script: Vec<(Duration, Bytes)>) -> Self {
        Self {
            script,
            sender: None,
            fail_subscribe: false,
            written: Vec::new(),
            subscribe_calls: 0,
            unsubscribe_calls: 0,
        }
    }

    /// Transport whose notification subscription is refused
    pub fn refusing_subscribe() -> Self {
        Self {
            fail_subscribe: true,
            ..Self::new(Vec::new())
        }
    }
}

impl Transport for ScriptedTransport {
    async fn write(&mut self, frame: Bytes) -> Result<()> {
        self.written.push(frame);
        if let Some(sender) = self.sender.clone() {
            let script = std::mem::take(&mut self.script);
            tokio::spawn(async move {
                for (delay, buffer) in script {
                    tokio::time::sleep(delay).await;
                    if sender.send(buffer).await.is_err() {
                        break;
                    }
                }
            });
        }
        Ok(())
    }

    async fn subscribe(&mut self) -> Result<mpsc::Receiver<Bytes>> {
        self.subscribe_calls += 1;
        if self.fail_subscribe {
            return Err(HubError::Transport("notify characteristic unavailable".to_string()));
        }
        let (sender, receiver) = mpsc::channel(8);
        self.sender = Some(sender);
        Ok(receiver)
    }

    async fn unsubscribe(&mut self) -> Result<()> {
        self.unsubscribe_calls += 1;
        self.sender = None;
        Ok(())
    }
}

/// Enciphered acknowledgement frame as the hub would push it
#[allow(dead_code)]
pub fn ack_frame(config: &HubConfig, command: CommandId, status: u8) -> Bytes {
    let codec = FrameCodec::new(&config.key);
    Bytes::copy_from_slice(&codec.build_frame(command, &[status]).expect("ack frame"))
}
