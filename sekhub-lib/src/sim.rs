//! In-process stand-in for a hub.
//!
//! Decodes whatever is written to it with the configured key and answers
//! password frames on the notification channel, the way the real hub does.
//! Used by the test-suite and by the CLI `simulate` command.

use crate::config::{HubConfig, Password};
use crate::error::{HubError, Result};
use crate::frame::{CommandId, Frame, FrameCodec};
use crate::transport::{NOTIFICATION_QUEUE_DEPTH, Transport};
use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::debug;

/// How the simulated hub answers a password frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// Status 0 when the password matches, 1 otherwise
    Verify,
    /// Always status 0
    Accept,
    /// Always the given non-zero status
    Reject(u8),
    /// Never answer
    Silent,
}

#[derive(Debug)]
pub struct SimulatedHub {
    codec: FrameCodec,
    expected_password: Password,
    reply: Reply,
    ack_command: CommandId,
    noise_frames: usize,
    fail_writes: bool,
    notify: Option<mpsc::Sender<Bytes>>,
    received: Vec<Frame>,
    subscribe_calls: usize,
    unsubscribe_calls: usize,
}

impl SimulatedHub {
    /// Hub sharing the key and password of `config`
    pub fn new(config: &HubConfig) -> Self {
        Self {
            codec: FrameCodec::new(&config.key),
            expected_password: config.password.clone(),
            reply: Reply::Verify,
            ack_command: CommandId::Password,
            noise_frames: 0,
            fail_writes: false,
            notify: None,
            received: Vec::new(),
            subscribe_calls: 0,
            unsubscribe_calls: 0,
        }
    }

    pub fn with_reply(mut self, reply: Reply) -> Self {
        self.reply = reply;
        self
    }

    /// Command id used for the acknowledgement (`0x01` or `0x12` on real hubs)
    pub fn with_ack_command(mut self, command: CommandId) -> Self {
        self.ack_command = command;
        self
    }

    /// Push `count` unrelated frames and one truncated buffer before answering.
    /// Capped so the answer still fits in the notification queue.
    pub fn with_noise(mut self, count: usize) -> Self {
        self.noise_frames = count.min(NOTIFICATION_QUEUE_DEPTH - 2);
        self
    }

    /// Make every write fail, as a dropped link would
    pub fn with_failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    /// Decoded frames written by the host, in order
    pub fn received(&self) -> &[Frame] {
        &self.received
    }

    pub fn subscribe_calls(&self) -> usize {
        self.subscribe_calls
    }

    pub fn unsubscribe_calls(&self) -> usize {
        self.unsubscribe_calls
    }

    pub fn is_subscribed(&self) -> bool {
        self.notify.is_some()
    }

    fn status_for(&self, frame: &Frame) -> Option<u8> {
        match self.reply {
            Reply::Verify => {
                let expected = Frame::new(0, CommandId::Password, self.expected_password.as_bytes())
                    .map(|f| f.payload)
                    .ok()?;
                Some(if frame.payload == expected { 0x00 } else { 0x01 })
            }
            Reply::Accept => Some(0x00),
            Reply::Reject(status) => Some(status),
            Reply::Silent => None,
        }
    }

    async fn push_notification(&self, buffer: Bytes) -> Result<()> {
        let Some(sender) = &self.notify else {
            debug!("Host not subscribed, dropping notification");
            return Ok(());
        };
        sender
            .send(buffer)
            .await
            .map_err(|_| HubError::Transport("notification receiver dropped".to_string()))
    }
}

impl Transport for SimulatedHub {
    async fn write(&mut self, frame: Bytes) -> Result<()> {
        if self.fail_writes {
            return Err(HubError::Transport("write failed: link lost".to_string()));
        }
        let decoded = self.codec.parse_frame(&frame)?;
        debug!("Simulated hub received {}", decoded);
        self.received.push(decoded);

        if decoded.command != CommandId::Password {
            return Ok(());
        }
        let Some(status) = self.status_for(&decoded) else {
            return Ok(());
        };

        for _ in 0..self.noise_frames {
            let noise = self.codec.build_frame(CommandId::Unknown(0x20), &[0xAA; 4])?;
            self.push_notification(Bytes::copy_from_slice(&noise)).await?;
        }
        if self.noise_frames > 0 {
            self.push_notification(Bytes::from_static(&[0x45, 0x00, 0x01])).await?;
        }

        let ack = self.codec.build_frame(self.ack_command, &[status])?;
        self.push_notification(Bytes::copy_from_slice(&ack)).await
    }

    async fn subscribe(&mut self) -> Result<mpsc::Receiver<Bytes>> {
        self.subscribe_calls += 1;
        let (sender, receiver) = mpsc::channel(NOTIFICATION_QUEUE_DEPTH);
        self.notify = Some(sender);
        Ok(receiver)
    }

    async fn unsubscribe(&mut self) -> Result<()> {
        self.unsubscribe_calls += 1;
        self.notify = None;
        Ok(())
    }
}
