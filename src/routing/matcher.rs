//! Path pattern matching.
//!
//! # Responsibilities
//! - Glob matching (`*` any run of characters, `?` exactly one)
//! - Expand `{name}` placeholders to wildcards
//! - Extract a named parameter from a matched path
//!
//! # Design Decisions
//! - `*` also matches `/`, so `/static/*` covers nested paths
//! - A pattern with `*` is treated as a glob even if it also has `{}`
//! - No regex; matching is linear with single-star backtracking

use crate::error::{Error, Result};

/// True when the pattern needs wildcard matching.
pub fn is_dynamic_pattern(pattern: &str) -> bool {
    pattern.contains('*') || (pattern.contains('{') && pattern.contains('}'))
}

/// Match `path` against a route pattern.
pub fn path_matches_pattern(path: &str, pattern: &str) -> bool {
    if pattern.contains('*') {
        glob_match(pattern, path)
    } else if is_dynamic_pattern(pattern) {
        glob_match(&expand_placeholders(pattern), path)
    } else {
        path == pattern
    }
}

/// Replace every `{name}` with `*`. An unclosed `{` is kept literally.
pub fn expand_placeholders(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut rest = pattern;
    while let Some(open) = rest.find('{') {
        let Some(close) = rest[open..].find('}') else {
            break;
        };
        out.push_str(&rest[..open]);
        out.push('*');
        rest = &rest[open + close + 1..];
    }
    out.push_str(rest);
    out
}

/// Shell-style glob match over characters.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let (mut p, mut t) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some('*') => {
                backtrack = Some((p, t));
                p += 1;
            }
            Some('?') => {
                p += 1;
                t += 1;
            }
            Some(&c) if c == text[t] => {
                p += 1;
                t += 1;
            }
            _ => match backtrack {
                Some((star_p, star_t)) => {
                    p = star_p + 1;
                    t = star_t + 1;
                    backtrack = Some((star_p, star_t + 1));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|&c| c == '*')
}

/// Value of `{name}` in `path`, read from the placeholder's byte offset in
/// `pattern` up to the next `/`.
///
/// Offsets are taken from the pattern text, so a parameter that follows
/// another parameter is only found when the earlier value has the same
/// length as its placeholder.
pub fn extract_path_param<'p>(
    path: &'p str,
    pattern: &str,
    name: &str,
    capacity: usize,
) -> Result<&'p str> {
    let placeholder = format!("{{{name}}}");
    let offset = pattern
        .find(&placeholder)
        .ok_or_else(|| Error::NotFound(format!("parameter {name} in pattern {pattern}")))?;
    let tail = path
        .get(offset..)
        .ok_or_else(|| Error::NotFound(format!("parameter {name} in path {path}")))?;

    let value = tail.split('/').next().unwrap_or_default();
    if value.len() >= capacity {
        return Err(Error::CapacityExceeded {
            resource: "path parameter",
            capacity,
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_patterns() {
        assert!(path_matches_pattern("/api/status", "/api/status"));
        assert!(!path_matches_pattern("/api/status/", "/api/status"));
        assert!(!is_dynamic_pattern("/api/status"));
    }

    #[test]
    fn test_glob() {
        assert!(glob_match("/static/*", "/static/css/site.css"));
        assert!(glob_match("/static/*", "/static/"));
        assert!(!glob_match("/static/*", "/static"));
        assert!(glob_match("/file?.txt", "/file1.txt"));
        assert!(!glob_match("/file?.txt", "/file10.txt"));
        assert!(glob_match("*.js", "/app/main.js"));
        assert!(glob_match("/a*b*c", "/aXbYbZc"));
        assert!(!glob_match("/a*b*c", "/aXbYd"));
    }

    #[test]
    fn test_placeholders_become_wildcards() {
        assert_eq!(expand_placeholders("/users/{id}/posts/{post}"), "/users/*/posts/*");
        assert_eq!(expand_placeholders("/odd/{open"), "/odd/{open");
        assert!(path_matches_pattern("/users/42", "/users/{id}"));
        assert!(path_matches_pattern("/users/42/extra", "/users/{id}"));
        assert!(!path_matches_pattern("/people/42", "/users/{id}"));
    }

    #[test]
    fn test_extract_param() {
        assert_eq!(extract_path_param("/users/42", "/users/{id}", "id", 256).unwrap(), "42");
        assert_eq!(
            extract_path_param("/users/42/extra", "/users/{id}", "id", 256).unwrap(),
            "42"
        );
        assert_eq!(extract_path_param("/users/", "/users/{id}", "id", 256).unwrap(), "");
    }

    #[test]
    fn test_extract_param_failures() {
        assert!(matches!(
            extract_path_param("/users/42", "/users/{id}", "name", 256),
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            extract_path_param("/u", "/users/{id}", "id", 256),
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            extract_path_param("/users/abcdef", "/users/{id}", "id", 6),
            Err(Error::CapacityExceeded { capacity: 6, .. })
        ));
    }
}
