//! Content helpers used by handlers: templates, JSON envelopes, files and escaping.

pub mod escape;
pub mod files;
pub mod json;
pub mod template;

pub use files::{detect_content_type, file_response, StaticFiles};
pub use json::{json_error, json_success, parse_json_body};
pub use template::{render_template, substitute_variables};
