//! Response construction and serialization.
//!
//! # Responsibilities
//! - Convenience constructors for common bodies and error pages
//! - Serialize a `Response` as an HTTP/1.1 message
//!
//! # Design Decisions
//! - `Content-Type` and `Content-Length` are always written first
//! - Writes use `write_all` and flush; I/O errors go back to the caller

use serde::Serialize;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::content::escape::html_escape;
use crate::http::message::{ContentType, Response, StatusCode};

/// Name printed in generated pages.
pub const SERVER_NAME: &str = "flarepath";

impl Response {
    pub fn html(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self::new(status, ContentType::TextHtml, body)
    }

    pub fn text(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self::new(status, ContentType::TextPlain, body)
    }

    /// Serialize `value` as the JSON body.
    pub fn json<T: Serialize + ?Sized>(status: StatusCode, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => Self::new(status, ContentType::ApplicationJson, body),
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize JSON response");
                Self::error_page(StatusCode::InternalServerError, "Serialization error")
            }
        }
    }

    pub fn bytes(status: StatusCode, content_type: ContentType, body: impl Into<Vec<u8>>) -> Self {
        Self::new(status, content_type, body)
    }

    /// HTML page naming the status code and a message.
    pub fn error_page(status: StatusCode, message: &str) -> Self {
        let code = status.as_u16();
        let body = format!(
            "<!DOCTYPE html>\n<html><head><title>Error {code}</title></head>\n<body>\n\
             <h1>Error {code}</h1>\n<p>{}</p>\n<hr>\n<small>{SERVER_NAME}</small>\n</body></html>\n",
            html_escape(message)
        );
        Self::html(status, body)
    }
}

/// Status line and headers, including the blank line.
pub fn encode_head(response: &Response) -> Vec<u8> {
    let mut head = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\n",
        response.status.as_u16(),
        response.status.reason(),
        response.content_type.as_str(),
        response.body.len()
    );
    for header in &response.headers {
        head.push_str(&header.name);
        head.push_str(": ");
        head.push_str(&header.value);
        head.push_str("\r\n");
    }
    head.push_str("\r\n");
    head.into_bytes()
}

/// Write `response` to `writer`, returning the number of bytes sent.
pub async fn write_response<W>(writer: &mut W, response: &Response) -> std::io::Result<usize>
where
    W: AsyncWrite + Unpin,
{
    let head = encode_head(response);
    writer.write_all(&head).await?;
    if !response.body.is_empty() {
        writer.write_all(&response.body).await?;
    }
    writer.flush().await?;
    Ok(head.len() + response.body.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn serializes_status_headers_and_body() {
        let response = Response::text(StatusCode::Ok, "hi").with_header("X-Test", "1");
        let mut out = Vec::new();
        let sent = write_response(&mut out, &response).await.unwrap();

        let expected = "HTTP/1.1 200 OK\r\nContent-Type: text/plain; charset=utf-8\r\n\
                        Content-Length: 2\r\nX-Test: 1\r\n\r\nhi";
        assert_eq!(String::from_utf8(out).unwrap(), expected);
        assert_eq!(sent, expected.len());
    }

    #[tokio::test]
    async fn empty_body_writes_only_head() {
        let response = Response::new(StatusCode::NoContent, ContentType::TextPlain, Vec::new());
        let mut out = Vec::new();
        write_response(&mut out, &response).await.unwrap();
        assert!(out.ends_with(b"Content-Length: 0\r\n\r\n"));
        assert!(out.starts_with(b"HTTP/1.1 204 No Content\r\n"));
    }

    #[test]
    fn error_page_names_status_and_escapes_message() {
        let page = Response::error_page(StatusCode::NotFound, "No <route>");
        let body = String::from_utf8(page.body).unwrap();
        assert_eq!(page.status, StatusCode::NotFound);
        assert_eq!(page.content_type, ContentType::TextHtml);
        assert!(body.contains("<title>Error 404</title>"));
        assert!(body.contains("<p>No &lt;route&gt;</p>"));
    }

    #[test]
    fn json_constructor_serializes_value() {
        let resp = Response::json(StatusCode::Created, &serde_json::json!({"id": 7}));
        assert_eq!(resp.content_type.as_str(), "application/json; charset=utf-8");
        assert_eq!(resp.body, br#"{"id":7}"#);
    }
}
