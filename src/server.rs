// src/server.rs
// HTTP/1.1 front door for `POST /analyze`: one request per connection, JSON
// in and out. Answers with the reduced quick scan.

use crate::engine::FootprintEngine;
use crate::types::FootprintError;
use log::{debug, info, warn};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;

const MAX_HEADER_BYTES: usize = 16 * 1024;
const MAX_BODY_BYTES: usize = 1024 * 1024;
const READ_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: String,
    pub path: String,
    pub body: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn json(status: u16, value: &serde_json::Value) -> Self {
        Self {
            status,
            body: value.to_string(),
        }
    }

    pub fn error(status: u16, message: &str) -> Self {
        Self::json(status, &json!({ "error": message }))
    }

    fn reason(&self) -> &'static str {
        match self.status {
            200 => "OK",
            400 => "Bad Request",
            404 => "Not Found",
            405 => "Method Not Allowed",
            411 => "Length Required",
            413 => "Payload Too Large",
            _ => "Internal Server Error",
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        format!(
            "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            self.status,
            self.reason(),
            self.body.len(),
            self.body
        )
        .into_bytes()
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum RequestError {
    /// Header section not complete yet
    Incomplete,
    Malformed(String),
    TooLarge,
    /// Request bodies must be sized by Content-Length
    Chunked,
}

/// Parse a buffered request. `Incomplete` means more bytes are needed.
pub fn parse_request(buf: &[u8]) -> Result<HttpRequest, RequestError> {
    let header_end = match find_header_end(buf) {
        Some(end) => end,
        None if buf.len() > MAX_HEADER_BYTES => return Err(RequestError::TooLarge),
        None => return Err(RequestError::Incomplete),
    };

    let head = std::str::from_utf8(&buf[..header_end])
        .map_err(|_| RequestError::Malformed("request head is not UTF-8".to_string()))?;
    let mut lines = head.split("\r\n");

    let request_line = lines.next().unwrap_or_default();
    let mut parts = request_line.split_whitespace();
    let (method, target) = match (parts.next(), parts.next(), parts.next()) {
        (Some(method), Some(target), Some(version)) if version.starts_with("HTTP/") => {
            (method, target)
        }
        _ => {
            return Err(RequestError::Malformed(format!(
                "bad request line: {:?}",
                request_line
            )))
        }
    };

    let mut content_length = 0usize;
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-length") {
                content_length = value
                    .trim()
                    .parse()
                    .map_err(|_| RequestError::Malformed("invalid Content-Length".to_string()))?;
            } else if name.trim().eq_ignore_ascii_case("transfer-encoding")
                && !value.trim().eq_ignore_ascii_case("identity")
            {
                return Err(RequestError::Chunked);
            }
        }
    }

    if content_length > MAX_BODY_BYTES {
        return Err(RequestError::TooLarge);
    }

    let body_start = header_end + 4;
    let available = buf.len().saturating_sub(body_start);
    if available < content_length {
        return Err(RequestError::Incomplete);
    }

    let path = target.split('?').next().unwrap_or(target).to_string();
    Ok(HttpRequest {
        method: method.to_uppercase(),
        path,
        body: buf[body_start..body_start + content_length].to_vec(),
    })
}

fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

#[derive(Debug, Deserialize)]
struct AnalyzeRequest {
    username: Option<String>,
}

/// Route one parsed request.
pub async fn handle_request(engine: &FootprintEngine, request: &HttpRequest) -> HttpResponse {
    if request.path != "/analyze" {
        return HttpResponse::error(404, "Not found");
    }
    if request.method != "POST" {
        return HttpResponse::error(405, "Use POST /analyze");
    }

    let payload: AnalyzeRequest = match serde_json::from_slice(&request.body) {
        Ok(payload) => payload,
        Err(e) => {
            debug!("Rejecting body: {}", e);
            return HttpResponse::error(400, "Invalid JSON body");
        }
    };

    let username = match payload.username.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => return HttpResponse::error(400, "Username is required"),
    };

    let report = engine.quick_scan(&username).await;
    match serde_json::to_value(&report) {
        Ok(value) => HttpResponse::json(200, &value),
        Err(e) => HttpResponse::error(500, &format!("Failed to serialize report: {}", e)),
    }
}

async fn read_request(stream: &mut TcpStream) -> Result<HttpRequest, RequestError> {
    let mut buf = Vec::with_capacity(4096);
    let mut chunk = [0u8; 4096];

    loop {
        match parse_request(&buf) {
            Err(RequestError::Incomplete) => {}
            other => return other,
        }

        let read = timeout(READ_TIMEOUT, stream.read(&mut chunk))
            .await
            .map_err(|_| RequestError::Malformed("timed out reading request".to_string()))?
            .map_err(|e| RequestError::Malformed(e.to_string()))?;
        if read == 0 {
            return Err(RequestError::Malformed("connection closed mid-request".to_string()));
        }
        buf.extend_from_slice(&chunk[..read]);
    }
}

async fn handle_connection(engine: Arc<FootprintEngine>, mut stream: TcpStream) {
    let peer = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    let response = match read_request(&mut stream).await {
        Ok(request) => {
            let response = handle_request(&engine, &request).await;
            info!("{} {} {} -> {}", peer, request.method, request.path, response.status);
            response
        }
        Err(RequestError::TooLarge) => HttpResponse::error(413, "Request too large"),
        Err(RequestError::Malformed(reason)) => {
            debug!("{}: malformed request: {}", peer, reason);
            HttpResponse::error(400, "Malformed request")
        }
        Err(RequestError::Chunked) => {
            HttpResponse::error(411, "Transfer-Encoding is not supported; send Content-Length")
        }
        Err(RequestError::Incomplete) => HttpResponse::error(400, "Incomplete request"),
    };

    if let Err(e) = stream.write_all(&response.to_bytes()).await {
        debug!("{}: failed to write response: {}", peer, e);
    }
    let _ = stream.shutdown().await;
}

/// Accept connections until the listener fails.
pub async fn serve_listener(engine: Arc<FootprintEngine>, listener: TcpListener) -> Result<(), FootprintError> {
    loop {
        let (stream, _) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!("Failed to accept connection: {}", e);
                continue;
            }
        };
        tokio::spawn(handle_connection(Arc::clone(&engine), stream));
    }
}

pub async fn serve(engine: Arc<FootprintEngine>, addr: &str) -> Result<(), FootprintError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| FootprintError::Server(format!("Failed to bind {}: {}", addr, e)))?;
    info!("Listening on http://{}", listener.local_addr()?);
    serve_listener(engine, listener).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::engine;

    fn request(method: &str, path: &str, body: &str) -> HttpRequest {
        HttpRequest {
            method: method.to_string(),
            path: path.to_string(),
            body: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn test_parse_complete_request() {
        let body = r#"{"username":"jdoe"}"#;
        let raw = format!(
            "POST /analyze?x=1 HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\ncontent-length: {}\r\n\r\n{}",
            body.len(),
            body
        );
        let parsed = parse_request(raw.as_bytes()).unwrap();

        assert_eq!(parsed.method, "POST");
        assert_eq!(parsed.path, "/analyze");
        assert_eq!(parsed.body, body.as_bytes().to_vec());
    }

    #[test]
    fn test_body_shorter_than_declared_length_is_incomplete() {
        let body = r#"{"username":"jdoe"}"#;
        let raw = format!(
            "POST /analyze HTTP/1.1\r\nContent-Length: {}\r\n\r\n{}",
            body.len() + 1,
            body
        );
        assert_eq!(parse_request(raw.as_bytes()), Err(RequestError::Incomplete));
    }

    #[test]
    fn test_chunked_body_is_rejected() {
        let raw = b"POST /analyze HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n13\r\n{\"username\":\"jdoe\"}\r\n0\r\n\r\n";
        assert_eq!(parse_request(raw), Err(RequestError::Chunked));
    }

    #[test]
    fn test_parse_incomplete_and_bad_requests() {
        assert_eq!(parse_request(b"POST /analyze HTTP/1.1\r\nHost: x"), Err(RequestError::Incomplete));
        assert_eq!(
            parse_request(b"POST /analyze HTTP/1.1\r\nContent-Length: 10\r\n\r\n{}"),
            Err(RequestError::Incomplete)
        );
        assert!(matches!(parse_request(b"garbage\r\n\r\n"), Err(RequestError::Malformed(_))));
        assert_eq!(
            parse_request(b"POST / HTTP/1.1\r\nContent-Length: 99999999\r\n\r\n"),
            Err(RequestError::TooLarge)
        );
    }

    #[tokio::test]
    async fn test_analyze_returns_quick_scan() {
        let engine = engine(false);
        let response = handle_request(&engine, &request("POST", "/analyze", r#"{"username":"jdoe"}"#)).await;

        assert_eq!(response.status, 200);
        let body: serde_json::Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(body["username"], "jdoe");
        assert!(body["domains"]["jdoe.com"].is_object());
        assert_eq!(body["social_profiles"]["GitHub"]["exists"], true);
        assert!(body["social_profiles"].get("Vimeo").is_none());
        assert!(body.get("contacts").is_none());
    }

    #[tokio::test]
    async fn test_missing_username_is_bad_request() {
        let engine = engine(false);
        for body in [r#"{}"#, r#"{"username":""}"#, r#"{"username":"   "}"#] {
            let response = handle_request(&engine, &request("POST", "/analyze", body)).await;
            assert_eq!(response.status, 400);
            assert!(response.body.contains("Username is required"));
        }

        let response = handle_request(&engine, &request("POST", "/analyze", "not json")).await;
        assert_eq!(response.status, 400);
    }

    #[tokio::test]
    async fn test_routing() {
        let engine = engine(false);
        assert_eq!(handle_request(&engine, &request("GET", "/analyze", "")).await.status, 405);
        assert_eq!(handle_request(&engine, &request("POST", "/other", "")).await.status, 404);
    }

    #[tokio::test]
    async fn test_serve_over_tcp() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(serve_listener(Arc::new(engine(false)), listener));

        let client = reqwest::Client::new();
        let response = client
            .post(format!("http://{}/analyze", addr))
            .json(&json!({ "username": "jdoe" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["username"], "jdoe");

        let response = client
            .post(format!("http://{}/analyze", addr))
            .json(&json!({}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 400);
    }

    #[tokio::test]
    async fn test_chunked_post_gets_length_required() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(serve_listener(Arc::new(engine(false)), listener));

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"POST /analyze HTTP/1.1\r\nHost: localhost\r\nTransfer-Encoding: chunked\r\n\r\n13\r\n{\"username\":\"jdoe\"}\r\n0\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();

        assert!(response.starts_with("HTTP/1.1 411 Length Required\r\n"));
    }

    #[test]
    fn test_response_bytes() {
        let bytes = HttpResponse::error(404, "Not found").to_bytes();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(text.ends_with("\r\n\r\n{\"error\":\"Not found\"}"));
    }
}
