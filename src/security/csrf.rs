//! CSRF token generation and checking.

use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::http::message::Request;

pub const CSRF_HEADER: &str = "X-CSRF-Token";
pub const CSRF_QUERY_PARAM: &str = "csrf_token";
pub const CSRF_TOKEN_LEN: usize = 32;

/// Random token drawn from `[A-Za-z0-9]`.
pub fn generate_token(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Check the token carried by `request` against `expected`.
///
/// The `X-CSRF-Token` header wins over the `csrf_token` query parameter.
pub fn validate_token(request: &Request, expected: &str) -> bool {
    if expected.is_empty() {
        return false;
    }
    request
        .header(CSRF_HEADER)
        .or_else(|| request.query_param(CSRF_QUERY_PARAM))
        .is_some_and(|token| constant_time_eq(token.as_bytes(), expected.as_bytes()))
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::message::Method;

    #[test]
    fn tokens_are_alphanumeric_and_distinct() {
        let a = generate_token(CSRF_TOKEN_LEN);
        let b = generate_token(CSRF_TOKEN_LEN);
        assert_eq!(a.len(), CSRF_TOKEN_LEN);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }

    #[test]
    fn header_then_query_param() {
        let req = Request::new(Method::Post, "/form?csrf_token=abc");
        assert!(validate_token(&req, "abc"));
        assert!(!validate_token(&req, "abd"));

        let req = Request::new(Method::Post, "/form?csrf_token=abc").with_header("X-CSRF-Token", "xyz");
        assert!(validate_token(&req, "xyz"));
        assert!(!validate_token(&req, "abc"));

        let req = Request::new(Method::Post, "/form");
        assert!(!validate_token(&req, "abc"));
        assert!(!validate_token(&req, ""));
    }
}
