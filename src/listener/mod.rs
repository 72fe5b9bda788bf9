//! Push Listener
//!
//! Keeps a page subscribed to a server push channel and reloads the page
//! when the server says so.
//!
//! # Architecture
//!
//! ```text
//! Transport --[ChannelEvent]--+
//!                             +--> page event queue --> PushListener --> Page
//! host page --[Load]----------+                                  (console, reload)
//! ```
//!
//! One dispatcher drains the queue, so handlers never overlap. The listener
//! owns the only channel handle; a reconnect closes the old handle and
//! replaces it.
//!
//! # States
//!
//! ```text
//! Idle --load--> Connecting --open--> Listening --"refresh"--> Unloaded
//!                    ^                    |
//!                    +-------error--------+
//! ```
//!
//! Reconnects are immediate and unbounded.
//!
//! # Modules
//!
//! - `channel` - Transport / Channel traits and channel events
//! - `event` - Page event queue
//! - `page` - Page trait and the HTTP page host
//! - `sse` - Server-sent-event transport

pub mod channel;
pub mod event;
pub mod page;
pub mod sse;


pub use channel::{Channel, ChannelError, ChannelEvent, ChannelId, ChannelSink, Transport};
pub use event::{PageEvent, PageEventReceiver, PageEvents};
pub use page::{HttpPage, LoadedDocument, Page, PageError};
pub use sse::SseTransport;

use tokio::sync::mpsc;
use url::Url;

/// Payload substring that makes the page reload.
pub const REFRESH_MARKER: &str = "refresh";

/// Where the listener is in its page lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    /// Waiting for the page to finish loading.
    Idle,
    /// A channel was opened and has not been accepted yet.
    Connecting,
    /// The current channel is streaming.
    Listening,
    /// The page is reloading. Terminal.
    Unloaded,
}

/// Result of handling one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Unloaded,
}

/// Listens on a push channel on behalf of one page lifetime.
pub struct PushListener<T: Transport, P: Page> {
    endpoint: Url,
    transport: T,
    page: P,
    tx: mpsc::UnboundedSender<PageEvent>,
    /// The single live channel, if any
    channel: Option<T::Channel>,
    next_id: u64,
    /// Pending load hooks, one per `initialize()` call
    load_hooks: usize,
    state: ListenerState,
}

impl<T: Transport, P: Page> PushListener<T, P> {
    /// Create a listener for `endpoint` and the event queue that feeds it.
    pub fn new(endpoint: Url, transport: T, page: P) -> (Self, PageEventReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        let listener = Self {
            endpoint,
            transport,
            page,
            tx,
            channel: None,
            next_id: 0,
            load_hooks: 0,
            state: ListenerState::Idle,
        };
        (listener, rx)
    }

    /// Handle for the host to signal page events (load).
    pub fn events(&self) -> PageEvents {
        PageEvents::new(self.tx.clone())
    }

    /// Register to connect once the page has loaded.
    ///
    /// Every call adds another hook, so calling this twice connects twice
    /// at load.
    pub fn initialize(&mut self) {
        self.load_hooks += 1;
    }

    /// Open a fresh channel to the endpoint, replacing the current one.
    pub fn connect(&mut self) {
        self.page.console("connecting");

        if let Some(mut old) = self.channel.take() {
            old.close();
        }

        let id = ChannelId(self.next_id);
        self.next_id += 1;
        let sink = ChannelSink::new(id, self.tx.clone());
        self.channel = Some(self.transport.open(&self.endpoint, sink));
        self.state = ListenerState::Connecting;
    }

    /// Handle one queued event.
    pub fn handle(&mut self, event: PageEvent) -> Flow {
        if self.state == ListenerState::Unloaded {
            return Flow::Unloaded;
        }

        match event {
            PageEvent::Load => {
                for _ in 0..std::mem::take(&mut self.load_hooks) {
                    self.connect();
                }
            }
            PageEvent::Channel { id, event } => {
                if self.current_id() != Some(id) {
                    crate::debug!("listen"; "dropping event from stale channel {}", id);
                    return Flow::Continue;
                }
                match event {
                    ChannelEvent::Open => self.on_open(id),
                    ChannelEvent::Message(data) => self.on_message(&data),
                    ChannelEvent::Error(err) => self.on_error(&err),
                }
            }
        }

        if self.state == ListenerState::Unloaded {
            Flow::Unloaded
        } else {
            Flow::Continue
        }
    }

    /// Dispatch queued events until the page unloads.
    ///
    /// The listener holds a sender itself, so the queue never closes while
    /// this runs; only an unload ends it.
    pub async fn run(&mut self, mut rx: PageEventReceiver) {
        while let Some(event) = rx.recv().await {
            if self.handle(event) == Flow::Unloaded {
                return;
            }
        }
    }

    pub fn state(&self) -> ListenerState {
        self.state
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    /// Take back the transport and page once the lifetime is over.
    pub fn into_parts(mut self) -> (T, P) {
        if let Some(mut channel) = self.channel.take() {
            channel.close();
        }
        (self.transport, self.page)
    }

    fn current_id(&self) -> Option<ChannelId> {
        self.channel.as_ref().map(Channel::id)
    }

    fn on_open(&mut self, id: ChannelId) {
        crate::debug!("listen"; "channel {} open", id);
        self.state = ListenerState::Listening;
    }

    fn on_message(&mut self, data: &str) {
        if data.contains(REFRESH_MARKER) {
            if let Some(mut channel) = self.channel.take() {
                channel.close();
            }
            self.state = ListenerState::Unloaded;
            self.page.reload(true);
        } else {
            self.page.console(data);
        }
    }

    fn on_error(&mut self, err: &ChannelError) {
        crate::debug!("listen"; "channel error: {}", err);
        self.page.console("error");
        self.connect();
    }
}
