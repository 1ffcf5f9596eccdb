//! Loopback callback server.
//!
//! A single-use HTTP listener bound to `127.0.0.1` that accepts exactly one
//! GET request, extracts the `code`/`state` (or `error`/`error_description`)
//! query parameters, replies with a small HTML page, and then stops.
//!
//! The server and the PKCE flow engine are modeled as two tasks joined by a
//! rendezvous channel of one item: the server task sends its single
//! [`CallbackResult`] and exits; cancelling the flow's token tears down the
//! listening socket from this side.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::error::{AuthError, Result};

/// The outcome delivered by a successful (or OAuth-error) callback request.
#[derive(Debug, Clone)]
pub enum CallbackResult {
    Success { code: String, state: String },
    Error { error: String, error_description: Option<String> },
}

/// A bound-but-not-yet-serving loopback listener. Binding happens eagerly so
/// the caller can learn the actually-assigned port before constructing the
/// authorization URL.
pub struct CallbackServer {
    listener: TcpListener,
    path: String,
}

impl CallbackServer {
    /// Binds to `127.0.0.1:<port>` (OS-assigned when `port == 0`), matching
    /// GET requests against `path` (the path component of `redirect_uri`).
    pub async fn bind(port: u16, path: impl Into<String>) -> Result<Self> {
        let addr = SocketAddr::from(([127, 0, 0, 1], port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| AuthError::Io(format!("failed to bind callback listener: {e}")))?;
        Ok(Self {
            listener,
            path: path.into(),
        })
    }

    /// The port actually bound, for substitution into `redirect_uri` when
    /// the caller requested port `0`.
    pub fn local_port(&self) -> Result<u16> {
        self.listener
            .local_addr()
            .map(|addr| addr.port())
            .map_err(|e| AuthError::Io(format!("failed to read local address: {e}")))
    }

    /// Serves exactly one matching request (or rejects non-matching
    /// requests/methods with 404/405 and keeps listening), then resolves
    /// with the parsed callback result. Bounded by `deadline`; returns
    /// `TIMEOUT` on expiry or on `cancellation`.
    pub async fn wait_for_callback(
        self,
        deadline: Duration,
        cancellation: CancellationToken,
    ) -> Result<CallbackResult> {
        let (tx, rx) = oneshot::channel();
        let path = self.path.clone();
        let listener = self.listener;

        let accept_loop = async move {
            loop {
                let (stream, _) = match listener.accept().await {
                    Ok(accepted) => accepted,
                    Err(_) => continue,
                };
                match handle_connection(stream, &path).await {
                    Ok(Some(result)) => {
                        let _ = tx.send(result);
                        return;
                    }
                    // Non-matching path/method: 404/405 already written, keep
                    // listening for the real callback.
                    Ok(None) => continue,
                    Err(_) => continue,
                }
            }
        };

        tokio::select! {
            _ = accept_loop => {}
            _ = cancellation.cancelled() => {
                return Err(AuthError::Timeout("callback wait cancelled".to_string()));
            }
            _ = tokio::time::sleep(deadline) => {
                return Err(AuthError::Timeout(format!(
                    "no callback received within {deadline:?}"
                )));
            }
        }

        rx.await
            .map_err(|_| AuthError::CallbackServer("callback task ended without a result".to_string()))
    }
}

/// Reads one HTTP request off `stream`. Returns `Ok(Some(result))` for a
/// matching GET on `path`; `Ok(None)` after writing a 404/405 for anything
/// else; `Err` only for I/O failures reading or writing the socket.
async fn handle_connection(
    mut stream: tokio::net::TcpStream,
    path: &str,
) -> Result<Option<CallbackResult>> {
    let mut buf = vec![0u8; 8192];
    let n = stream
        .read(&mut buf)
        .await
        .map_err(|e| AuthError::Io(e.to_string()))?;
    let request = String::from_utf8_lossy(&buf[..n]);

    let mut lines = request.lines();
    let request_line = lines.next().unwrap_or_default();
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default();
    let target = parts.next().unwrap_or_default();

    if method != "GET" {
        write_response(&mut stream, 405, "Method Not Allowed", "Only GET is accepted.").await?;
        return Ok(None);
    }

    let full_url = format!("http://localhost{target}");
    let parsed = match url::Url::parse(&full_url) {
        Ok(u) => u,
        Err(_) => {
            write_response(&mut stream, 400, "Bad Request", "Malformed request target.").await?;
            return Ok(None);
        }
    };

    if parsed.path() != path {
        write_response(&mut stream, 404, "Not Found", "No such callback path.").await?;
        return Ok(None);
    }

    let params: std::collections::HashMap<String, String> =
        parsed.query_pairs().map(|(k, v)| (k.to_string(), v.to_string())).collect();

    if let Some(error) = params.get("error") {
        let error_description = params.get("error_description").cloned();
        let body = render_error_page(error, error_description.as_deref());
        write_html(&mut stream, 200, &body).await?;
        return Ok(Some(CallbackResult::Error {
            error: error.clone(),
            error_description,
        }));
    }

    match (params.get("code"), params.get("state")) {
        (Some(code), Some(state)) => {
            write_html(&mut stream, 200, SUCCESS_PAGE).await?;
            Ok(Some(CallbackResult::Success {
                code: code.clone(),
                state: state.clone(),
            }))
        }
        _ => {
            write_response(&mut stream, 400, "Bad Request", "Missing code or state.").await?;
            Ok(None)
        }
    }
}

const SUCCESS_PAGE: &str = "<html><body><h1>Authentication successful</h1>\
    <p>You can close this window and return to the application.</p></body></html>";

/// Builds the failure page, HTML-escaping server-supplied values so
/// untrusted input is never echoed unescaped.
fn render_error_page(error: &str, error_description: Option<&str>) -> String {
    let desc = error_description
        .map(|d| format!("<p>{}</p>", html_escape(d)))
        .unwrap_or_default();
    format!(
        "<html><body><h1>Authentication failed</h1><p>{}</p>{}</body></html>",
        html_escape(error),
        desc
    )
}

fn html_escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

async fn write_html(stream: &mut tokio::net::TcpStream, status: u16, body: &str) -> Result<()> {
    write_response(stream, status, status_text(status), body).await
}

fn status_text(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        _ => "Error",
    }
}

async fn write_response(
    stream: &mut tokio::net::TcpStream,
    status: u16,
    reason: &str,
    body: &str,
) -> Result<()> {
    let response = format!(
        "HTTP/1.1 {status} {reason}\r\n\
         Content-Type: text/html; charset=utf-8\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         \r\n\
         {}",
        body.len(),
        body
    );
    stream
        .write_all(response.as_bytes())
        .await
        .map_err(|e| AuthError::Io(e.to_string()))?;
    stream.flush().await.map_err(|e| AuthError::Io(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration as StdDuration;
    use tokio::io::{AsyncReadExt as _, AsyncWriteExt as _};

    #[core_async::test]
    async fn delivers_code_and_state_on_matching_get() {
        let server = CallbackServer::bind(0, "/callback").await.unwrap();
        let port = server.local_port().unwrap();

        let client = tokio::spawn(async move {
            let mut stream = tokio::net::TcpStream::connect(("127.0.0.1", port))
                .await
                .unwrap();
            stream
                .write_all(b"GET /callback?code=XYZ&state=abc123 HTTP/1.1\r\nHost: localhost\r\n\r\n")
                .await
                .unwrap();
            let mut resp = String::new();
            stream.read_to_string(&mut resp).await.unwrap();
            resp
        });

        let result = server
            .wait_for_callback(StdDuration::from_secs(5), CancellationToken::new())
            .await
            .unwrap();

        match result {
            CallbackResult::Success { code, state } => {
                assert_eq!(code, "XYZ");
                assert_eq!(state, "abc123");
            }
            other => panic!("expected Success, got {other:?}"),
        }

        let response = client.await.unwrap();
        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.contains("Authentication successful"));
    }

    #[core_async::test]
    async fn parses_oauth_error_and_escapes_description() {
        let server = CallbackServer::bind(0, "/callback").await.unwrap();
        let port = server.local_port().unwrap();

        tokio::spawn(async move {
            let mut stream = tokio::net::TcpStream::connect(("127.0.0.1", port))
                .await
                .unwrap();
            stream
                .write_all(
                    b"GET /callback?error=access_denied&error_description=user%20said%20%3Cno%3E HTTP/1.1\r\nHost: localhost\r\n\r\n",
                )
                .await
                .unwrap();
            let mut resp = String::new();
            stream.read_to_string(&mut resp).await.unwrap();
            resp
        });

        let result = server
            .wait_for_callback(StdDuration::from_secs(5), CancellationToken::new())
            .await
            .unwrap();

        match result {
            CallbackResult::Error { error, error_description } => {
                assert_eq!(error, "access_denied");
                assert_eq!(error_description.as_deref(), Some("user said <no>"));
            }
            other => panic!("expected Error, got {other:?}"),
        }
    }

    #[core_async::test]
    async fn times_out_when_no_callback_arrives() {
        let server = CallbackServer::bind(0, "/callback").await.unwrap();
        let result = server
            .wait_for_callback(StdDuration::from_millis(50), CancellationToken::new())
            .await;
        assert!(matches!(result, Err(AuthError::Timeout(_))));
    }

    #[core_async::test]
    async fn cancellation_aborts_the_wait() {
        let server = CallbackServer::bind(0, "/callback").await.unwrap();
        let cancellation = CancellationToken::new();
        let token_clone = cancellation.clone();
        tokio::spawn(async move {
            tokio::time::sleep(StdDuration::from_millis(10)).await;
            token_clone.cancel();
        });

        let result = server
            .wait_for_callback(StdDuration::from_secs(30), cancellation)
            .await;
        assert!(matches!(result, Err(AuthError::Timeout(_))));
    }

    #[core_async::test]
    async fn unmatched_path_returns_404_and_keeps_listening() {
        let server = CallbackServer::bind(0, "/callback").await.unwrap();
        let port = server.local_port().unwrap();

        let server_task = tokio::spawn(async move {
            server
                .wait_for_callback(StdDuration::from_secs(5), CancellationToken::new())
                .await
        });

        let probe_response = tokio::spawn(async move {
            let mut stream = tokio::net::TcpStream::connect(("127.0.0.1", port))
                .await
                .unwrap();
            stream
                .write_all(b"GET /wrong HTTP/1.1\r\nHost: localhost\r\n\r\n")
                .await
                .unwrap();
            let mut resp = String::new();
            stream.read_to_string(&mut resp).await.unwrap();
            resp
        })
        .await
        .unwrap();
        assert!(probe_response.starts_with("HTTP/1.1 404"));

        let real_client_response = tokio::spawn(async move {
            let mut stream = tokio::net::TcpStream::connect(("127.0.0.1", port))
                .await
                .unwrap();
            stream
                .write_all(b"GET /callback?code=ok&state=s HTTP/1.1\r\nHost: localhost\r\n\r\n")
                .await
                .unwrap();
            let mut resp = String::new();
            stream.read_to_string(&mut resp).await.unwrap();
            resp
        })
        .await
        .unwrap();
        assert!(real_client_response.starts_with("HTTP/1.1 200"));

        let result = server_task.await.unwrap().unwrap();
        assert!(matches!(result, CallbackResult::Success { .. }));
    }
}
