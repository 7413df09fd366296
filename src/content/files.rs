//! File responses and static directory serving.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::http::message::{ContentType, Response, StatusCode};
use crate::routing::handler::{Handler, RequestContext};

/// MIME type by file extension (case-insensitive).
pub fn detect_content_type(path: &Path) -> ContentType {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "html" | "htm" => ContentType::TextHtml,
        "css" => ContentType::TextCss,
        "js" => ContentType::TextJavascript,
        "json" => ContentType::ApplicationJson,
        "xml" => ContentType::ApplicationXml,
        "png" => ContentType::ImagePng,
        "jpg" | "jpeg" => ContentType::ImageJpeg,
        "txt" => ContentType::TextPlain,
        _ => ContentType::OctetStream,
    }
}

/// Serve a file: 404 page when missing, 500 page when unreadable or empty.
pub fn file_response(path: &Path) -> Response {
    if !path.is_file() {
        return Response::error_page(StatusCode::NotFound, "File not found");
    }
    match fs::read(path) {
        Ok(body) if !body.is_empty() => {
            Response::bytes(StatusCode::Ok, detect_content_type(path), body)
        }
        Ok(_) => Response::error_page(StatusCode::InternalServerError, "Error reading file"),
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "Failed to read file");
            Response::error_page(StatusCode::InternalServerError, "Error reading file")
        }
    }
}

/// Serves files below `root` for a `<prefix>/*` route.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: PathBuf,
    prefix: String,
}

impl StaticFiles {
    /// `prefix` is the route pattern without the trailing `*`, e.g. `/static/`.
    pub fn new(root: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            prefix: prefix.into(),
        }
    }

    /// Filesystem path for a request path, or `None` when it escapes the root.
    pub fn resolve(&self, request_path: &str) -> Option<PathBuf> {
        let relative = request_path.strip_prefix(&self.prefix)?;
        if relative.split('/').any(|segment| segment == "..") {
            return None;
        }
        let relative = relative.trim_start_matches('/');
        let relative = if relative.is_empty() { "index.html" } else { relative };
        Some(self.root.join(relative))
    }
}

impl Handler for StaticFiles {
    fn handle(&self, ctx: &RequestContext<'_>) -> Result<Response> {
        match self.resolve(&ctx.request.path) {
            Some(path) => Ok(file_response(&path)),
            None => {
                tracing::warn!(path = %ctx.request.path, "Rejected static file path");
                Ok(Response::error_page(StatusCode::Forbidden, "Forbidden"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_types_by_extension() {
        assert_eq!(detect_content_type(Path::new("a/index.HTML")), ContentType::TextHtml);
        assert_eq!(detect_content_type(Path::new("x.htm")), ContentType::TextHtml);
        assert_eq!(detect_content_type(Path::new("app.js")), ContentType::TextJavascript);
        assert_eq!(detect_content_type(Path::new("photo.jpeg")), ContentType::ImageJpeg);
        assert_eq!(detect_content_type(Path::new("notes.txt")), ContentType::TextPlain);
        assert_eq!(detect_content_type(Path::new("archive.tar.gz")), ContentType::OctetStream);
        assert_eq!(detect_content_type(Path::new("README")), ContentType::OctetStream);
    }

    #[test]
    fn file_response_statuses() {
        let dir = std::env::temp_dir().join(format!("flarepath-files-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let full = dir.join("site.css");
        let empty = dir.join("empty.txt");
        fs::write(&full, "body{}").unwrap();
        fs::write(&empty, "").unwrap();

        let ok = file_response(&full);
        assert_eq!(ok.status, StatusCode::Ok);
        assert_eq!(ok.content_type, ContentType::TextCss);
        assert_eq!(ok.body, b"body{}");

        assert_eq!(file_response(&empty).status, StatusCode::InternalServerError);
        assert_eq!(file_response(&dir.join("missing")).status, StatusCode::NotFound);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn resolve_rejects_parent_segments() {
        let files = StaticFiles::new("/srv/static", "/static/");
        assert_eq!(
            files.resolve("/static/css/a.css"),
            Some(PathBuf::from("/srv/static/css/a.css"))
        );
        assert_eq!(
            files.resolve("/static/"),
            Some(PathBuf::from("/srv/static/index.html"))
        );
        assert_eq!(files.resolve("/static/../etc/passwd"), None);
        assert_eq!(files.resolve("/other/a.css"), None);
    }
}
