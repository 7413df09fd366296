//! `{{name}}` template substitution.
//!
//! Values come from a flat JSON object given as text. The lookup is loose:
//! it finds `"name":` anywhere in the text and takes either the quoted
//! string that follows or a bare token up to `,`, `}` or a newline.
//! Nested objects and escaped quotes are not understood.

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// Replace each `{{name}}` in `template` with its value from `variables`.
///
/// Unknown names render as the empty string. A `{{` without a closing `}}`
/// is copied literally.
pub fn substitute_variables(template: &str, variables: &str) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        let after_open = &rest[open + 2..];
        let Some(close) = after_open.find("}}") else {
            break;
        };
        out.push_str(&rest[..open]);
        let name = after_open[..close].trim();
        out.push_str(lookup(variables, name).unwrap_or_default());
        rest = &after_open[close + 2..];
    }
    out.push_str(rest);
    out
}

/// Read a template file and substitute `variables` into it.
pub fn render_template(path: &Path, variables: &str) -> Result<String> {
    let template = fs::read_to_string(path)?;
    if template.is_empty() {
        return Err(Error::InvalidBody(format!("template {} is empty", path.display())));
    }
    Ok(substitute_variables(&template, variables))
}

fn lookup<'v>(variables: &'v str, name: &str) -> Option<&'v str> {
    let key = format!("\"{name}\":");
    let start = variables.find(&key)? + key.len();
    let value = variables[start..].trim_start_matches([' ', '\t']);

    if let Some(quoted) = value.strip_prefix('"') {
        let end = quoted.find('"')?;
        return Some(quoted[..end].trim_end_matches([' ', '\t']));
    }
    let end = value.find([',', '}', '\n']).unwrap_or(value.len());
    Some(value[..end].trim_end_matches([' ', '\t', '\r']))
}
