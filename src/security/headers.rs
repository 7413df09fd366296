//! Security response headers.

use crate::http::message::Response;

const SECURITY_HEADERS: [(&str, &str); 4] = [
    ("X-Content-Type-Options", "nosniff"),
    ("X-Frame-Options", "DENY"),
    ("X-XSS-Protection", "1; mode=block"),
    ("Referrer-Policy", "strict-origin-when-cross-origin"),
];

/// Add the standard hardening headers. Headers past the response limit are dropped.
pub fn add_security_headers(response: &mut Response) {
    for (name, value) in SECURITY_HEADERS {
        response.set_header(name, value);
    }
}

/// Add `Access-Control-Allow-Origin`.
pub fn add_cors_headers(response: &mut Response, allowed_origin: &str) {
    response.set_header("Access-Control-Allow-Origin", allowed_origin);
}
