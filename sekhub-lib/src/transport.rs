//! Boundary between the protocol core and a wireless transport.
//!
//! A transport only moves opaque buffers. Frames are written to the hub's
//! write characteristic; notifications from the hub arrive on a channel handed
//! out by [`Transport::subscribe`], so the handshake can wait on them with a
//! plain timed receive.

use crate::error::Result;
use bytes::Bytes;
use std::future::Future;
use tokio::sync::mpsc;

/// Capacity of notification channels created by transports in this crate
pub const NOTIFICATION_QUEUE_DEPTH: usize = 32;

pub trait Transport: Send {
    /// Write one enciphered frame to the hub
    fn write(&mut self, frame: Bytes) -> impl Future<Output = Result<()>> + Send;

    /// Start notifications; every buffer the hub pushes is delivered on the receiver
    fn subscribe(&mut self) -> impl Future<Output = Result<mpsc::Receiver<Bytes>>> + Send;

    /// Stop notifications and close the receiver handed out by `subscribe`
    fn unsubscribe(&mut self) -> impl Future<Output = Result<()>> + Send;
}

impl<T: Transport> Transport for &mut T {
    fn write(&mut self, frame: Bytes) -> impl Future<Output = Result<()>> + Send {
        (**self).write(frame)
    }

    fn subscribe(&mut self) -> impl Future<Output = Result<mpsc::Receiver<Bytes>>> + Send {
        (**self).subscribe()
    }

    fn unsubscribe(&mut self) -> impl Future<Output = Result<()>> + Send {
        (**self).unsubscribe()
    }
}
