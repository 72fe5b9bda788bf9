//! Server-sent-event writer for one subscriber.
//!
//! ```text
//! quiet for `keepalive`  -> data: stay alive
//! refresh                -> data: refresh   (stream ends)
//! hub gone / shutdown    -> stream ends
//! write fails            -> client gone, stream ends
//! ```

use std::io::{self, Write};
use std::time::Duration;

use crossbeam::channel::RecvTimeoutError;

use super::hub::{Push, Subscription};
use crate::listener::REFRESH_MARKER;

/// Payload of the periodic keepalive message.
pub const KEEPALIVE_MESSAGE: &str = "stay alive";

/// Response head written before the event stream.
pub const STREAM_HEAD: &str = "HTTP/1.1 200 OK\r\n\
Content-Type: text/event-stream\r\n\
Cache-Control: no-cache\r\n\
Connection: keep-alive\r\n\
X-Accel-Buffering: no\r\n\
X-XSS-Protection: 1; mode=block\r\n\
X-Frame-Options: sameorigin\r\n\r\n";

/// Why a stream stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    Refreshed,
    HubClosed,
    Shutdown,
}

/// Write events for `sub` until it is refreshed or the hub goes away.
pub fn pump<W: Write>(sub: &Subscription, out: &mut W, keepalive: Duration) -> io::Result<StreamEnd> {
    loop {
        match sub.recv_timeout(keepalive) {
            Ok(Push::Refresh) => {
                write_event(out, REFRESH_MARKER)?;
                return Ok(StreamEnd::Refreshed);
            }
            Err(RecvTimeoutError::Timeout) => {
                if crate::core::is_shutdown() {
                    return Ok(StreamEnd::Shutdown);
                }
                write_event(out, KEEPALIVE_MESSAGE)?;
            }
            Err(RecvTimeoutError::Disconnected) => return Ok(StreamEnd::HubClosed),
        }
    }
}

/// Write one `message` event. Multi-line data becomes one `data:` line each.
pub fn write_event<W: Write>(out: &mut W, data: &str) -> io::Result<()> {
    for line in data.split('\n') {
        writeln!(out, "data: {line}")?;
    }
    out.write_all(b"\n")?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::push::hub::Hub;

    const TICK: Duration = Duration::from_millis(10);

    #[test]
    fn test_write_event() {
        let mut out = Vec::new();
        write_event(&mut out, "ok: 42").unwrap();
        assert_eq!(out, b"data: ok: 42\n\n");
    }

    #[test]
    fn test_write_multiline_event() {
        let mut out = Vec::new();
        write_event(&mut out, "a\nb").unwrap();
        assert_eq!(out, b"data: a\ndata: b\n\n");
    }

    #[test]
    fn test_queued_refresh_ends_stream() {
        let hub = Hub::new();
        let sub = hub.subscribe();
        hub.refresh_all();

        let mut out = Vec::new();
        let end = pump(&sub, &mut out, TICK).unwrap();

        assert_eq!(end, StreamEnd::Refreshed);
        assert_eq!(out, b"data: refresh\n\n");
    }

    #[test]
    fn test_keepalive_until_refresh() {
        let hub = Hub::new();
        let sub = hub.subscribe();

        let trigger = {
            let hub = std::sync::Arc::clone(&hub);
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(80));
                hub.refresh_all()
            })
        };

        let mut out = Vec::new();
        let end = pump(&sub, &mut out, TICK).unwrap();
        assert_eq!(trigger.join().unwrap(), 1);

        let text = String::from_utf8(out).unwrap();
        assert_eq!(end, StreamEnd::Refreshed);
        assert!(text.starts_with("data: stay alive\n\n"));
        assert!(text.ends_with("data: refresh\n\n"));
    }

    #[test]
    fn test_hub_closed_ends_stream() {
        let hub = Hub::new();
        let sub = hub.subscribe();
        hub.close_all();

        let mut out = Vec::new();
        assert_eq!(pump(&sub, &mut out, TICK).unwrap(), StreamEnd::HubClosed);
        assert!(out.is_empty());
    }

    struct Gone;

    impl Write for Gone {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "client gone"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_failure_ends_stream() {
        let hub = Hub::new();
        let sub = hub.subscribe();

        let err = pump(&sub, &mut Gone, TICK).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);

        // the stream's owner drops the subscription once the pump fails
        drop(sub);
        assert_eq!(hub.refresh_all(), 0);
    }
}
