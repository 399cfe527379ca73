//! Blocking transport backed by `ureq`.
//!
//! Basic-auth credentials travel in the request URL's userinfo; this
//! transport moves them into an `Authorization` header before sending.

use std::time::Duration;

use base64ct::{Base64, Encoding};

use crate::config::{Config, DEFAULT_MAX_RESPONSE_BYTES, DEFAULT_TIMEOUT};
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, Transport};

#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
    body_limit: u64,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        // Status interpretation belongs to the client, not the agent.
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build()
            .new_agent();
        Self {
            agent,
            body_limit: DEFAULT_MAX_RESPONSE_BYTES,
        }
    }

    /// Timeout and body limit taken from `config`.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.timeout).with_body_limit(config.max_response_bytes)
    }

    /// Replace ureq's 10 MiB default cap on response bodies.
    pub fn with_body_limit(mut self, bytes: u64) -> Self {
        self.body_limit = bytes;
        self
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        let url = request.url_without_userinfo();
        let mut call = self.agent.get(url.as_str());
        if let Some((username, password)) = request.basic_auth() {
            let encoded = Base64::encode_string(format!("{username}:{password}").as_bytes());
            call = call.header("Authorization", format!("Basic {encoded}"));
        }

        let mut response = call
            .call()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .with_config()
            .limit(self.body_limit)
            .read_to_string()
            .map_err(|e| ApiError::Transport(format!("failed to read response body: {e}")))?;

        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;

    use url::Url;

    use super::*;

    const MIB: usize = 1024 * 1024;

    /// Answer one request with a 200 carrying `len` bytes of body.
    fn serve_once(len: usize) -> HttpRequest {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream);
            let mut line = String::new();
            loop {
                line.clear();
                if reader.read_line(&mut line).unwrap_or(0) == 0 || line == "\r\n" {
                    break;
                }
            }
            let mut stream = reader.into_inner();
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: text/xml\r\nContent-Length: {len}\r\nConnection: close\r\n\r\n"
            );
            // The client may hang up early when the body is over its limit.
            let _ = stream.write_all(head.as_bytes());
            let _ = stream.write_all(&vec![b'a'; len]);
        });
        HttpRequest {
            url: Url::parse(&format!("http://{addr}/v1/posts/all")).unwrap(),
        }
    }

    #[test]
    fn reads_bodies_past_ureq_default_cap() {
        let request = serve_once(11 * MIB);
        let response = UreqTransport::default().execute(&request).unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body.len(), 11 * MIB);
    }

    #[test]
    fn body_over_configured_limit_is_transport_error() {
        let request = serve_once(4096);
        let transport = UreqTransport::default().with_body_limit(1024);
        let err = transport.execute(&request).unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)), "got {err:?}");
    }

    #[test]
    fn from_config_takes_limit() {
        let config = Config::new(crate::auth::Credentials::with_token("u", "t"))
            .with_max_response_bytes(2048);
        assert_eq!(UreqTransport::from_config(&config).body_limit, 2048);
    }
}
