//! HTTP server for the push endpoint.
//!
//! | Route                     | Response                                   |
//! |---------------------------|--------------------------------------------|
//! | `GET <endpoint>`          | event stream for a new subscriber          |
//! | `POST /refresh`           | refresh every subscriber, body = count     |
//! | `GET /static/js/sse.js`   | browser listener bound to `<endpoint>`     |
//! | `GET`/`HEAD` other paths  | file under the serve root, see [`files`]   |
//! | anything else             | 404                                        |
//!
//! Every request is logged, and every response carries [`SECURE_HEADERS`].
//!
//! [`files`]: super::files

use std::io::Write;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};

use super::files::{self, mime};
use super::hub::Hub;
use super::stream::{STREAM_HEAD, pump};
use crate::config::ServeConfig;
use crate::embed::serve::{SSE_JS, SSE_JS_PATH, SseVars};
use crate::{debug, log};

/// Maximum number of port binding attempts.
const MAX_PORT_RETRIES: u16 = 10;

/// Route that triggers a refresh.
pub const REFRESH_PATH: &str = "/refresh";

/// Headers added to every response.
pub const SECURE_HEADERS: [(&str, &str); 2] = [
    ("X-XSS-Protection", "1; mode=block"),
    ("X-Frame-Options", "sameorigin"),
];

/// Shared per-request context.
struct Routes {
    hub: Arc<Hub>,
    endpoint: String,
    keepalive: Duration,
    root: PathBuf,
}

/// Bound server ready to accept requests
pub struct PushServer {
    server: Arc<Server>,
    addr: SocketAddr,
    routes: Arc<Routes>,
}

/// Bind the push server without starting the request loop.
pub fn bind(config: &ServeConfig, hub: Arc<Hub>) -> Result<PushServer> {
    let (server, addr) = bind_with_retry(config.interface, config.port)?;
    Ok(PushServer {
        server: Arc::new(server),
        addr,
        routes: Arc::new(Routes {
            hub,
            endpoint: config.endpoint.clone(),
            keepalive: Duration::from_secs(config.keepalive),
            root: config.root.clone(),
        }),
    })
}

impl PushServer {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn hub(&self) -> Arc<Hub> {
        Arc::clone(&self.routes.hub)
    }

    /// Handle for graceful shutdown (`unblock`).
    pub fn handle(&self) -> Arc<Server> {
        Arc::clone(&self.server)
    }

    /// Run the request loop until the server is unblocked.
    pub fn run(self) {
        for request in self.server.incoming_requests() {
            // Streams live as long as their client, so each gets a thread
            let routes = Arc::clone(&self.routes);
            std::thread::spawn(move || {
                if let Err(e) = handle_request(request, &routes) {
                    log!("serve"; "request error: {e}");
                }
            });
        }
        self.routes.hub.close_all();
    }
}

/// Bind to the specified interface and port, with automatic port retry.
fn bind_with_retry(interface: IpAddr, base_port: u16) -> Result<(Server, SocketAddr)> {
    let mut last_error = None;

    for offset in 0..MAX_PORT_RETRIES {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                // Port 0 asks the OS; report what it picked
                let actual = server.server_addr().to_ip().unwrap_or(addr);
                return Ok((server, actual));
            }
            Err(e) => last_error = Some(e),
        }

        // An OS-assigned port never collides, so retrying is pointless
        if base_port == 0 {
            break;
        }
    }

    Err(anyhow::anyhow!(
        "Failed to bind after {} attempts (ports from {}): {}",
        MAX_PORT_RETRIES,
        base_port,
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

fn handle_request(request: Request, routes: &Routes) -> Result<()> {
    log_request(&request);
    let method = request.method().clone();
    let url = request.url().to_string();

    match (&method, request_path(&url)) {
        (Method::Get, p) if p == routes.endpoint => respond_stream(request, routes),
        (Method::Post, REFRESH_PATH) => {
            let streams = routes.hub.refresh_all();
            log!("serve"; "refresh sent to {} stream(s)", streams);
            send_bytes(request, 200, mime::PLAIN, format!("{streams}\n").into_bytes())
        }
        (Method::Get, SSE_JS_PATH) => {
            let js = SSE_JS.render(&SseVars {
                endpoint: routes.endpoint.clone(),
            });
            send_bytes(request, 200, mime::JAVASCRIPT, js.into_bytes())
        }
        (Method::Get | Method::Head, _) => {
            match files::respond(request, &url, &routes.root, &routes.endpoint)? {
                Some(request) => respond_not_found(request),
                None => Ok(()),
            }
        }
        _ => respond_not_found(request),
    }
}

/// One line per request: peer, protocol, method and URL.
fn log_request(request: &Request) {
    let peer = request
        .remote_addr()
        .map(ToString::to_string)
        .unwrap_or_else(|| "-".to_string());
    log!("serve"; "{} - HTTP/{} {} {}", peer, request.http_version(), request.method(), request.url());
}

/// Hold the connection open and stream events to it.
fn respond_stream(request: Request, routes: &Routes) -> Result<()> {
    let sub = routes.hub.subscribe();
    let mut writer = request.into_writer();
    writer
        .write_all(STREAM_HEAD.as_bytes())
        .and_then(|()| writer.flush())
        .context("Failed to start event stream")?;

    match pump(&sub, &mut writer, routes.keepalive) {
        Ok(end) => debug!("serve"; "stream #{} ended: {:?}", sub.id(), end),
        Err(e) => debug!("serve"; "stream #{} client gone: {}", sub.id(), e),
    }
    Ok(())
}

fn respond_not_found(request: Request) -> Result<()> {
    send_bytes(request, 404, mime::PLAIN, b"Not Found\n".to_vec())
}

/// Send a complete response with the secure headers attached.
pub(super) fn send_bytes(
    request: Request,
    status: u16,
    content_type: &str,
    body: Vec<u8>,
) -> Result<()> {
    let mut response = Response::from_data(body)
        .with_status_code(StatusCode(status))
        .with_header(make_header("Content-Type", content_type)?);
    for (key, value) in SECURE_HEADERS {
        response.add_header(make_header(key, value)?);
    }
    request.respond(response).context("Failed to send response")
}

fn make_header(key: &str, value: &str) -> Result<Header> {
    Header::from_bytes(key, value).map_err(|()| anyhow::anyhow!("invalid header `{key}: {value}`"))
}

/// Strip the query string from a request URL.
fn request_path(url: &str) -> &str {
    url.split(['?', '#']).next().unwrap_or(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_path() {
        assert_eq!(request_path("/sse"), "/sse");
        assert_eq!(request_path("/sse?last=3"), "/sse");
        assert_eq!(request_path("/static/js/sse.js#x"), "/static/js/sse.js");
        assert_eq!(request_path(""), "");
    }
}
