//! Push channel seam.
//!
//! A [`Transport`] opens channels; each [`Channel`] reports what happens on
//! the wire through a [`ChannelSink`] that tags every event with the id of
//! the channel that produced it.

use std::fmt;

use thiserror::Error;
use url::Url;

use super::event::{PageEvent, PageEventSender};

/// Identity of one opened channel within a page lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChannelId(pub u64);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a channel observed.
#[derive(Debug)]
pub enum ChannelEvent {
    /// Stream accepted by the server.
    Open,
    /// One pushed message payload.
    Message(String),
    /// Channel-level failure; the channel is dead after this.
    Error(ChannelError),
}

/// Channel-level failures. The listener treats them all alike.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("failed to build HTTP client")]
    Client(#[source] reqwest::Error),

    #[error("failed to connect")]
    Connect(#[source] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("unexpected content type `{0}`")]
    ContentType(String),

    #[error("stream error: {0}")]
    Stream(String),

    #[error("stream ended by server")]
    Ended,
}

/// Opens push channels.
pub trait Transport {
    type Channel: Channel;

    /// Start connecting to `endpoint`. Never blocks; the outcome arrives
    /// through `sink`.
    fn open(&mut self, endpoint: &Url, sink: ChannelSink) -> Self::Channel;
}

/// Handle to one open push channel.
pub trait Channel {
    fn id(&self) -> ChannelId;

    /// Stop the channel. No event is delivered after this returns.
    /// Calling it more than once is a no-op.
    fn close(&mut self);
}

/// Delivers one channel's events to the page event queue.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    id: ChannelId,
    tx: PageEventSender,
}

impl ChannelSink {
    pub(super) fn new(id: ChannelId, tx: PageEventSender) -> Self {
        Self { id, tx }
    }

    pub fn id(&self) -> ChannelId {
        self.id
    }

    /// Queue an event. Returns `false` once the page is gone.
    pub fn send(&self, event: ChannelEvent) -> bool {
        self.tx
            .send(PageEvent::Channel { id: self.id, event })
            .is_ok()
    }
}
