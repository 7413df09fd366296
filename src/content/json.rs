//! JSON response envelopes and request body parsing.

use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::http::message::{Request, Response, StatusCode};

#[derive(Serialize)]
struct Success<'a> {
    success: bool,
    message: &'a str,
    data: Value,
}

#[derive(Serialize)]
struct Failure<'a> {
    success: bool,
    error: &'a str,
    status: u16,
}

/// `200` with `{"success":true,"message":…,"data":…}`.
pub fn json_success(data: Value, message: &str) -> Response {
    Response::json(
        StatusCode::Ok,
        &Success {
            success: true,
            message,
            data,
        },
    )
}

/// `status` with `{"success":false,"error":…,"status":…}`.
pub fn json_error(status: StatusCode, message: &str) -> Response {
    Response::json(
        status,
        &Failure {
            success: false,
            error: message,
            status: status.as_u16(),
        },
    )
}

/// Parse the body of an `application/json` request.
pub fn parse_json_body(request: &Request) -> Result<Value> {
    let is_json = request
        .header("Content-Type")
        .is_some_and(|ct| ct.to_ascii_lowercase().contains("application/json"));
    if !is_json {
        return Err(Error::InvalidBody("expected application/json".to_string()));
    }
    if request.body_len() == 0 {
        return Err(Error::InvalidBody("empty body".to_string()));
    }
    serde_json::from_slice(request.body()).map_err(|e| Error::InvalidBody(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::message::Method;
    use serde_json::json;

    #[test]
    fn success_envelope_keeps_field_order() {
        let resp = json_success(json!({"id": 1}), "created");
        assert_eq!(resp.status, StatusCode::Ok);
        assert_eq!(
            String::from_utf8(resp.body).unwrap(),
            r#"{"success":true,"message":"created","data":{"id":1}}"#
        );
    }

    #[test]
    fn error_envelope() {
        let resp = json_error(StatusCode::NotFound, "missing");
        assert_eq!(resp.status, StatusCode::NotFound);
        assert_eq!(
            String::from_utf8(resp.body).unwrap(),
            r#"{"success":false,"error":"missing","status":404}"#
        );
    }

    #[test]
    fn body_parsing_checks_content_type_and_emptiness() {
        let req = Request::new(Method::Post, "/api")
            .with_header("Content-Type", "application/json; charset=utf-8")
            .with_body(r#"{"a": [1, 2]}"#);
        assert_eq!(parse_json_body(&req).unwrap(), json!({"a": [1, 2]}));

        let plain = Request::new(Method::Post, "/api").with_body("{}");
        assert!(matches!(parse_json_body(&plain), Err(Error::InvalidBody(_))));

        let empty = Request::new(Method::Post, "/api").with_header("Content-Type", "application/json");
        assert!(matches!(parse_json_body(&empty), Err(Error::InvalidBody(_))));

        let broken = Request::new(Method::Post, "/api")
            .with_header("Content-Type", "application/json")
            .with_body("{nope");
        assert!(matches!(parse_json_body(&broken), Err(Error::InvalidBody(_))));
    }
}
