//! HTTP message model.
//!
//! Plain data describing requests and responses. Parsing lives in
//! `parser.rs`, serialization in `response.rs`.

use std::fmt;
use std::net::SocketAddr;
use std::time::SystemTime;

use serde::Serialize;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::net::connection::ConnectionId;

/// Maximum headers kept per message. Extra request headers are dropped.
pub const MAX_HEADERS: usize = 32;
/// Maximum query parameters kept per request.
pub const MAX_QUERY_PARAMS: usize = 32;

/// Request methods understood by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Head,
    Options,
    Patch,
    Unknown,
}

impl Method {
    /// Map a request-line token to a method. Matching is case-sensitive.
    pub fn from_token(token: &str) -> Self {
        match token {
            "GET" => Method::Get,
            "POST" => Method::Post,
            "PUT" => Method::Put,
            "DELETE" => Method::Delete,
            "HEAD" => Method::Head,
            "OPTIONS" => Method::Options,
            "PATCH" => Method::Patch,
            _ => Method::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
            Method::Patch => "PATCH",
            Method::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Response status codes emitted by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum StatusCode {
    SwitchingProtocols = 101,
    Ok = 200,
    Created = 201,
    Accepted = 202,
    NoContent = 204,
    MovedPermanently = 301,
    Found = 302,
    NotModified = 304,
    BadRequest = 400,
    Unauthorized = 401,
    Forbidden = 403,
    NotFound = 404,
    MethodNotAllowed = 405,
    RequestTimeout = 408,
    Conflict = 409,
    PayloadTooLarge = 413,
    TooManyRequests = 429,
    InternalServerError = 500,
    NotImplemented = 501,
    ServiceUnavailable = 503,
}

impl StatusCode {
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }

    /// Reason phrase written on the status line.
    pub fn reason(&self) -> &'static str {
        match self {
            StatusCode::SwitchingProtocols => "Switching Protocols",
            StatusCode::Ok => "OK",
            StatusCode::Created => "Created",
            StatusCode::Accepted => "Accepted",
            StatusCode::NoContent => "No Content",
            StatusCode::MovedPermanently => "Moved Permanently",
            StatusCode::Found => "Found",
            StatusCode::NotModified => "Not Modified",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::Unauthorized => "Unauthorized",
            StatusCode::Forbidden => "Forbidden",
            StatusCode::NotFound => "Not Found",
            StatusCode::MethodNotAllowed => "Method Not Allowed",
            StatusCode::RequestTimeout => "Request Timeout",
            StatusCode::Conflict => "Conflict",
            StatusCode::PayloadTooLarge => "Payload Too Large",
            StatusCode::TooManyRequests => "Too Many Requests",
            StatusCode::InternalServerError => "Internal Server Error",
            StatusCode::NotImplemented => "Not Implemented",
            StatusCode::ServiceUnavailable => "Service Unavailable",
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.as_u16())
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason())
    }
}

/// MIME types a response can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentType {
    #[default]
    TextHtml,
    TextPlain,
    ApplicationJson,
    ApplicationXml,
    TextCss,
    TextJavascript,
    ImagePng,
    ImageJpeg,
    OctetStream,
}

impl ContentType {
    /// Value of the `Content-Type` header.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::TextHtml => "text/html; charset=utf-8",
            ContentType::TextPlain => "text/plain; charset=utf-8",
            ContentType::ApplicationJson => "application/json; charset=utf-8",
            ContentType::ApplicationXml => "application/xml; charset=utf-8",
            ContentType::TextCss => "text/css; charset=utf-8",
            ContentType::TextJavascript => "text/javascript; charset=utf-8",
            ContentType::ImagePng => "image/png",
            ContentType::ImageJpeg => "image/jpeg",
            ContentType::OctetStream => "application/octet-stream",
        }
    }
}

/// A single header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub name: String,
    pub value: String,
}

impl Header {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Where and when a request arrived.
#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    /// Connection the request was read from.
    pub id: ConnectionId,
    /// Peer address, when the transport has one.
    pub peer: Option<SocketAddr>,
    /// Correlation id echoed in `X-Request-ID`.
    pub request_id: Uuid,
    /// Time the request bytes were received.
    pub received_at: SystemTime,
}

impl ConnectionInfo {
    pub fn new(id: ConnectionId, peer: Option<SocketAddr>) -> Self {
        Self {
            id,
            peer,
            request_id: Uuid::new_v4(),
            received_at: SystemTime::now(),
        }
    }
}

impl Default for ConnectionInfo {
    fn default() -> Self {
        Self::new(ConnectionId::new(), None)
    }
}

/// A parsed HTTP request.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    /// Path without the query string.
    pub path: String,
    /// Raw text after `?`, empty when absent.
    pub query_string: String,
    /// Protocol token from the request line, e.g. `HTTP/1.1`.
    pub version: String,
    pub headers: Vec<Header>,
    /// Body bytes actually received; `None` without a positive `Content-Length`.
    pub body: Option<Vec<u8>>,
    pub query_params: Vec<(String, String)>,
    /// Value of the `session_id` cookie.
    pub session_id: Option<String>,
    pub connection: ConnectionInfo,
}

impl Request {
    /// Build a request from a method and a request target (`/path?query`).
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query_string) = match target.split_once('?') {
            Some((path, query)) => (path.to_string(), query.to_string()),
            None => (target.to_string(), String::new()),
        };
        let query_params = parse_query_string(&query_string);
        Self {
            method,
            path,
            query_string,
            version: "HTTP/1.1".to_string(),
            headers: Vec::new(),
            body: None,
            query_params,
            session_id: None,
            connection: ConnectionInfo::default(),
        }
    }

    /// Append a header, dropping it silently once `MAX_HEADERS` is reached.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        if self.headers.len() < MAX_HEADERS {
            self.headers.push(Header::new(name, value));
        }
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// First header with the given name, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    /// First query parameter with the given name (case-sensitive).
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query_params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn body(&self) -> &[u8] {
        self.body.as_deref().unwrap_or_default()
    }

    pub fn body_len(&self) -> usize {
        self.body.as_ref().map_or(0, Vec::len)
    }
}

/// Split a query string into `(name, value)` pairs.
///
/// Pieces without `=` and empty pieces are dropped; at most
/// `MAX_QUERY_PARAMS` pairs are kept. Values are not percent-decoded.
pub fn parse_query_string(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| pair.split_once('='))
        .take(MAX_QUERY_PARAMS)
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}

/// A response ready to be serialized.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub content_type: ContentType,
    /// Extra headers, written after `Content-Type` and `Content-Length`.
    pub headers: Vec<Header>,
    pub body: Vec<u8>,
    /// Declared only; the serializer does not act on it.
    pub keep_alive: bool,
    /// Declared only; chunked encoding is not implemented.
    pub chunked: bool,
}

impl Response {
    pub fn new(status: StatusCode, content_type: ContentType, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            content_type,
            headers: Vec::new(),
            body: body.into(),
            keep_alive: false,
            chunked: false,
        }
    }

    /// Add an extra header. Fails once `MAX_HEADERS` headers are present.
    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) -> Result<()> {
        if self.headers.len() >= MAX_HEADERS {
            return Err(Error::CapacityExceeded {
                resource: "response headers",
                capacity: MAX_HEADERS,
            });
        }
        self.headers.push(Header::new(name, value));
        Ok(())
    }

    /// Set a server-owned header, replacing any earlier value with the same
    /// name. Not subject to `MAX_HEADERS`.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.headers.retain(|h| !h.name.eq_ignore_ascii_case(&name));
        self.headers.push(Header::new(name, value));
    }

    /// Builder form of `add_header`; a header past the limit is dropped.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.add_header(name, value);
        self
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_tokens() {
        assert_eq!(Method::from_token("GET"), Method::Get);
        assert_eq!(Method::from_token("PATCH"), Method::Patch);
        assert_eq!(Method::from_token("get"), Method::Unknown);
        assert_eq!(Method::Delete.to_string(), "DELETE");
    }

    #[test]
    fn test_query_string_parsing() {
        let params = parse_query_string("a=1&flag&&b=two=2&c=");
        assert_eq!(
            params,
            vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "two=2".to_string()),
                ("c".to_string(), String::new()),
            ]
        );
    }

    #[test]
    fn test_query_params_capped() {
        let query: Vec<String> = (0..40).map(|i| format!("k{i}=v{i}")).collect();
        let params = parse_query_string(&query.join("&"));
        assert_eq!(params.len(), MAX_QUERY_PARAMS);
        assert_eq!(params[31].0, "k31");
    }

    #[test]
    fn test_request_header_lookup_is_case_insensitive() {
        let req = Request::new(Method::Get, "/search?q=rust")
            .with_header("Content-Type", "text/plain");
        assert_eq!(req.header("content-type"), Some("text/plain"));
        assert_eq!(req.path, "/search");
        assert_eq!(req.query_param("q"), Some("rust"));
        assert_eq!(req.body_len(), 0);
    }

    #[test]
    fn test_response_header_limit() {
        let mut resp = Response::new(StatusCode::Ok, ContentType::TextPlain, "ok");
        for i in 0..MAX_HEADERS {
            resp.add_header(format!("X-{i}"), "v").unwrap();
        }
        assert!(matches!(
            resp.add_header("X-Over", "v"),
            Err(Error::CapacityExceeded { .. })
        ));
        assert_eq!(resp.headers.len(), MAX_HEADERS);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(StatusCode::NotFound.to_string(), "404 Not Found");
        assert!(StatusCode::Created.is_success());
        assert!(!StatusCode::BadRequest.is_success());
    }
}
