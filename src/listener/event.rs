//! Page event queue.
//!
//! Every callback the listener reacts to arrives here, so a single
//! dispatcher handles them one at a time in arrival order.

use tokio::sync::mpsc;

use super::channel::{ChannelEvent, ChannelId};

/// Events delivered to a page's dispatcher.
#[derive(Debug)]
pub enum PageEvent {
    /// The page finished loading its resources.
    Load,
    /// Something happened on a push channel.
    Channel { id: ChannelId, event: ChannelEvent },
}

pub(crate) type PageEventSender = mpsc::UnboundedSender<PageEvent>;

/// Receiving half of a page's event queue.
pub type PageEventReceiver = mpsc::UnboundedReceiver<PageEvent>;

/// Sending handle given to whatever hosts the page.
#[derive(Debug, Clone)]
pub struct PageEvents {
    tx: PageEventSender,
}

impl PageEvents {
    pub(super) fn new(tx: PageEventSender) -> Self {
        Self { tx }
    }

    /// Signal that the page finished loading.
    pub fn load(&self) {
        let _ = self.tx.send(PageEvent::Load);
    }
}
