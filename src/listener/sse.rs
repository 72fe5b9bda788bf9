//! Server-sent-event transport.
//!
//! Each channel is a tokio task that holds one `GET` request open and turns
//! the response body into [`ChannelEvent`]s:
//!
//! ```text
//! connect fails / non-2xx / wrong content type  -> Error
//! 2xx text/event-stream                         -> Open
//! every `message` event                         -> Message(data)
//! read error / malformed stream / end of body   -> Error
//! ```
//!
//! Named events (`event: foo`) are skipped, like a browser event source
//! skips them for `onmessage`.

use eventsource_stream::Eventsource;
use futures::StreamExt;
use reqwest::header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE};
use tokio::task::JoinHandle;
use url::Url;

use super::channel::{Channel, ChannelError, ChannelEvent, ChannelId, ChannelSink, Transport};

const EVENT_STREAM: &str = "text/event-stream";

/// Opens push channels over HTTP.
#[derive(Debug, Clone)]
pub struct SseTransport {
    client: reqwest::Client,
}

impl SseTransport {
    pub fn new() -> Result<Self, ChannelError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(ChannelError::Client)?;
        Ok(Self { client })
    }
}

impl Transport for SseTransport {
    type Channel = SseChannel;

    fn open(&mut self, endpoint: &Url, sink: ChannelSink) -> SseChannel {
        let id = sink.id();
        crate::debug!("sse"; "channel {} -> {}", id, endpoint);
        let task = tokio::spawn(stream_events(self.client.clone(), endpoint.clone(), sink));
        SseChannel {
            id,
            task: Some(task),
        }
    }
}

/// One open event stream. Dropping it closes it.
#[derive(Debug)]
pub struct SseChannel {
    id: ChannelId,
    task: Option<JoinHandle<()>>,
}

impl Channel for SseChannel {
    fn id(&self) -> ChannelId {
        self.id
    }

    fn close(&mut self) {
        if let Some(task) = self.task.take() {
            crate::debug!("sse"; "channel {} closed", self.id);
            task.abort();
        }
    }
}

impl Drop for SseChannel {
    fn drop(&mut self) {
        self.close();
    }
}

async fn stream_events(client: reqwest::Client, endpoint: Url, sink: ChannelSink) {
    let error = match read_stream(&client, endpoint, &sink).await {
        Ok(()) => ChannelError::Ended,
        Err(e) => e,
    };
    crate::debug!("sse"; "channel {} failed: {}", sink.id(), error);
    sink.send(ChannelEvent::Error(error));
}

/// Pump one response into the sink. `Ok` means the server ended the body.
async fn read_stream(
    client: &reqwest::Client,
    endpoint: Url,
    sink: &ChannelSink,
) -> Result<(), ChannelError> {
    let response = client
        .get(endpoint)
        .header(ACCEPT, EVENT_STREAM)
        .header(CACHE_CONTROL, "no-cache")
        .send()
        .await
        .map_err(ChannelError::Connect)?;

    let status = response.status();
    if !status.is_success() {
        return Err(ChannelError::Status(status.as_u16()));
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    if !is_event_stream(&content_type) {
        return Err(ChannelError::ContentType(content_type));
    }

    if !sink.send(ChannelEvent::Open) {
        return Ok(());
    }

    let mut events = response.bytes_stream().eventsource();
    while let Some(item) = events.next().await {
        let event = item.map_err(|e| ChannelError::Stream(e.to_string()))?;
        if !is_message_event(&event.event) {
            crate::debug!("sse"; "skipping `{}` event", event.event);
            continue;
        }
        if !sink.send(ChannelEvent::Message(event.data)) {
            return Ok(());
        }
    }

    Ok(())
}

/// `text/event-stream`, ignoring parameters such as `; charset=utf-8`.
fn is_event_stream(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case(EVENT_STREAM))
}

/// Events without a type are `message` events.
fn is_message_event(kind: &str) -> bool {
    kind.is_empty() || kind == "message"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_event_stream() {
        assert!(is_event_stream("text/event-stream"));
        assert!(is_event_stream("text/event-stream; charset=utf-8"));
        assert!(is_event_stream("Text/Event-Stream"));
        assert!(!is_event_stream("text/html"));
        assert!(!is_event_stream(""));
    }

    #[tokio::test]
    async fn test_refused_connection_is_connect_error() {
        let addr = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap();
        let endpoint = Url::parse(&format!("http://{addr}/sse")).unwrap();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let sink = ChannelSink::new(ChannelId(0), tx);
        let transport = SseTransport::new().unwrap();

        let err = read_stream(&transport.client, endpoint, &sink)
            .await
            .unwrap_err();

        assert!(matches!(err, ChannelError::Connect(_)), "{err:?}");
        assert_eq!(err.to_string(), "failed to connect");
        // nothing was opened
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_is_message_event() {
        assert!(is_message_event(""));
        assert!(is_message_event("message"));
        assert!(!is_message_event("ping"));
    }
}
