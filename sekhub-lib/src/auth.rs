//! Password handshake with the hub.
//!
//! # Flow
//!
//! 1. Build a password frame (command `0x01`, payload = password, zero padded)
//! 2. Subscribe to notifications and write the frame
//! 3. Wait for a frame with command `0x01` or `0x12`; payload byte 0 is the
//!    status, `0x00` meaning accepted
//! 4. Unsubscribe, whatever happened
//!
//! Frames with other command ids and buffers that fail to decode are skipped.
//! If nothing qualifying arrives before the deadline the handshake times out.

use crate::config::Password;
use crate::error::{HubError, Result};
use crate::frame::{CommandId, FrameCodec};
use crate::transport::Transport;
use bytes::Bytes;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, info, warn};

/// Handshake progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Idle,
    AwaitingResponse,
    Accepted,
    Rejected { status: u8 },
    TimedOut,
    /// The transport failed mid-handshake; the error went to the caller
    Failed,
}

impl AuthState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AuthState::Accepted | AuthState::Rejected { .. } | AuthState::TimedOut | AuthState::Failed
        )
    }
}

/// How a completed handshake ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    Accepted,
    Rejected { status: u8 },
    TimedOut { waited: Duration },
}

impl AuthOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, AuthOutcome::Accepted)
    }

    /// Turn a failed handshake into the matching error
    pub fn into_result(self) -> Result<()> {
        match self {
            AuthOutcome::Accepted => Ok(()),
            AuthOutcome::Rejected { status } => Err(HubError::AuthenticationRejected { status }),
            AuthOutcome::TimedOut { waited } => Err(HubError::AuthenticationTimedOut { waited }),
        }
    }
}

/// One password exchange. Create a fresh one per connection attempt.
#[derive(Debug)]
pub struct Authenticator {
    password: Password,
    response_timeout: Duration,
    state: AuthState,
}

impl Authenticator {
    pub fn new(password: Password, response_timeout: Duration) -> Self {
        Self {
            password,
            response_timeout,
            state: AuthState::Idle,
        }
    }

    pub fn state(&self) -> AuthState {
        self.state
    }

    /// Run the handshake over `transport`, suspending until the hub answers or
    /// the deadline passes. Transport failures are returned as errors after
    /// notifications have been released, and leave the state at `Failed`.
    pub async fn run<T: Transport>(&mut self, codec: &FrameCodec, transport: &mut T) -> Result<AuthOutcome> {
        if self.state != AuthState::Idle {
            return Err(HubError::HandshakeAlreadyRun);
        }

        let outcome = match self.exchange(codec, transport).await {
            Ok(outcome) => outcome,
            Err(e) => {
                self.state = AuthState::Failed;
                return Err(e);
            }
        };

        match outcome {
            AuthOutcome::Accepted => info!("Password accepted"),
            AuthOutcome::Rejected { status } => warn!("Password rejected (status {:#04x})", status),
            AuthOutcome::TimedOut { waited } => warn!("Password response timeout after {:?}", waited),
        }
        Ok(outcome)
    }

    async fn exchange<T: Transport>(&mut self, codec: &FrameCodec, transport: &mut T) -> Result<AuthOutcome> {
        let frame = codec.build_frame(CommandId::Password, self.password.as_bytes())?;
        let mut notifications = transport.subscribe().await?;
        self.state = AuthState::AwaitingResponse;
        debug!("Password frame built, awaiting response");

        let written = match transport.write(Bytes::copy_from_slice(&frame)).await {
            Ok(()) => Ok(self.await_response(codec, &mut notifications).await),
            Err(e) => Err(e),
        };

        drop(notifications);
        let released = transport.unsubscribe().await;
        let outcome = written?;
        released?;
        Ok(outcome)
    }

    async fn await_response(&mut self, codec: &FrameCodec, notifications: &mut mpsc::Receiver<Bytes>) -> AuthOutcome {
        let started = Instant::now();
        let deadline = started + self.response_timeout;

        let outcome = loop {
            let buffer = match timeout_at(deadline, notifications.recv()).await {
                Ok(Some(buffer)) => buffer,
                Ok(None) => {
                    warn!("Notification stream closed before a password response");
                    break AuthOutcome::TimedOut {
                        waited: started.elapsed(),
                    };
                }
                Err(_) => {
                    break AuthOutcome::TimedOut {
                        waited: self.response_timeout,
                    };
                }
            };

            let frame = match codec.parse_frame(&buffer) {
                Ok(frame) => frame,
                Err(e) => {
                    warn!("Ignoring notification: {}", e);
                    continue;
                }
            };

            if !frame.command.is_password_response() {
                debug!("Ignoring frame while awaiting password response: {}", frame);
                continue;
            }

            break match frame.status() {
                0x00 => AuthOutcome::Accepted,
                status => AuthOutcome::Rejected { status },
            };
        };

        self.state = match outcome {
            AuthOutcome::Accepted => AuthState::Accepted,
            AuthOutcome::Rejected { status } => AuthState::Rejected { status },
            AuthOutcome::TimedOut { .. } => AuthState::TimedOut,
        };
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_mapping() {
        assert!(AuthOutcome::Accepted.into_result().is_ok());
        assert!(matches!(
            AuthOutcome::Rejected { status: 1 }.into_result(),
            Err(HubError::AuthenticationRejected { status: 1 })
        ));
        let waited = Duration::from_secs(6);
        assert!(matches!(
            AuthOutcome::TimedOut { waited }.into_result(),
            Err(HubError::AuthenticationTimedOut { .. })
        ));
        assert!(!AuthOutcome::TimedOut { waited }.is_accepted());
    }

    #[test]
    fn test_terminal_states() {
        assert!(!AuthState::Idle.is_terminal());
        assert!(!AuthState::AwaitingResponse.is_terminal());
        assert!(AuthState::Accepted.is_terminal());
        assert!(AuthState::Rejected { status: 2 }.is_terminal());
        assert!(AuthState::TimedOut.is_terminal());
        assert!(AuthState::Failed.is_terminal());
    }

    #[test]
    fn test_new_authenticator_is_idle() {
        let auth = Authenticator::new(Password::default(), Duration::from_secs(6));
        assert_eq!(auth.state(), AuthState::Idle);
    }
}
