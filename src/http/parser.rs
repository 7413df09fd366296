//! HTTP/1.1 request parsing.
//!
//! # Responsibilities
//! - Read a request from a stream in a single bounded read
//! - Split the request line, query string, headers and cookie session id
//! - Collect a `Content-Length` body with at most one extra read
//!
//! # Design Decisions
//! - No pipelining: anything after the body is ignored
//! - Excess headers and query parameters are dropped, not rejected
//! - Query values stay percent-encoded; see `content::escape::url_decode`

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::{Error, Result};
use crate::http::message::{
    parse_query_string, ConnectionInfo, Header, Method, Request, MAX_HEADERS,
};

/// Session ids this long or longer are ignored.
pub const MAX_SESSION_ID_LEN: usize = 64;

const SESSION_COOKIE: &str = "session_id=";

/// Size limits applied while reading a request.
#[derive(Debug, Clone, Copy)]
pub struct ParseLimits {
    /// Size of the single read that must hold the request head.
    pub read_buffer: usize,
    /// Declared bodies of this size or larger are rejected.
    pub max_body: usize,
}

impl Default for ParseLimits {
    fn default() -> Self {
        Self {
            read_buffer: 16 * 1024,
            max_body: 10 * 1024 * 1024,
        }
    }
}

/// Read and parse one request from `reader`.
pub async fn parse_request<R>(
    reader: &mut R,
    connection: ConnectionInfo,
    limits: &ParseLimits,
) -> Result<Request>
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; limits.read_buffer];
    let n = reader.read(&mut buf).await?;
    if n == 0 {
        return Err(Error::ConnectionClosed);
    }
    buf.truncate(n);

    let (mut request, body_offset) = parse_head(&buf)?;
    request.connection = connection;

    if let Some(length) = content_length(&request) {
        if length >= limits.max_body {
            return Err(Error::BodyTooLarge {
                length,
                limit: limits.max_body,
            });
        }
        let available = &buf[body_offset.min(buf.len())..];
        let mut body = available[..available.len().min(length)].to_vec();
        if body.len() < length {
            let filled = body.len();
            body.resize(length, 0);
            let extra = reader.read(&mut body[filled..]).await?;
            body.truncate(filled + extra);
        }
        tracing::trace!(declared = length, received = body.len(), "Request body read");
        request.body = Some(body);
    }

    Ok(request)
}

/// Parse the request line and headers from `data`.
///
/// Returns the request and the offset at which the body starts. Without a
/// blank line terminating the headers the body offset is the end of `data`.
pub fn parse_head(data: &[u8]) -> Result<(Request, usize)> {
    let line_end = find(data, b"\r\n").ok_or(Error::MalformedMessage("missing line terminator"))?;
    let request_line = String::from_utf8_lossy(&data[..line_end]);

    let tokens: Vec<&str> = request_line.split_whitespace().collect();
    let [method, target, version] = tokens.as_slice() else {
        return Err(Error::MalformedMessage("request line needs three tokens"));
    };

    let method_token = *method;
    let method = Method::from_token(method_token);
    if method == Method::Unknown {
        return Err(Error::UnsupportedMethod(method_token.to_string()));
    }

    let (path, query_string) = match target.split_once('?') {
        Some((path, query)) => (path.to_string(), query.to_string()),
        None => (target.to_string(), String::new()),
    };

    let head_start = line_end + 2;
    // The request line itself may be followed directly by the blank line.
    let (head_end, body_offset) = if data[head_start..].starts_with(b"\r\n") {
        (head_start, head_start + 2)
    } else {
        match find(&data[head_start..], b"\r\n\r\n") {
            Some(pos) => (head_start + pos, head_start + pos + 4),
            None => (data.len(), data.len()),
        }
    };

    let header_text = String::from_utf8_lossy(&data[head_start..head_end]);
    let headers: Vec<Header> = header_text
        .split("\r\n")
        .filter_map(|line| line.split_once(':'))
        .take(MAX_HEADERS)
        .map(|(name, value)| Header::new(name, value.trim_start_matches([' ', '\t'])))
        .collect();

    let mut request = Request {
        method,
        query_params: parse_query_string(&query_string),
        path,
        query_string,
        version: version.to_string(),
        headers,
        body: None,
        session_id: None,
        connection: ConnectionInfo::default(),
    };
    request.session_id = request.header("Cookie").and_then(session_from_cookie);

    Ok((request, body_offset))
}

/// Positive `Content-Length`, if declared. Unparseable values mean no body.
fn content_length(request: &Request) -> Option<usize> {
    request
        .header("Content-Length")
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|&n| n > 0)
}

/// Extract the `session_id` cookie value.
pub fn session_from_cookie(cookie: &str) -> Option<String> {
    let start = cookie.find(SESSION_COOKIE)? + SESSION_COOKIE.len();
    let rest = &cookie[start..];
    let value = rest.split(';').next().unwrap_or_default();
    (value.len() < MAX_SESSION_ID_LEN).then(|| value.to_string())
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
