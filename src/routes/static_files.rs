//! Front-end file serving
//!
//! Serves files from the built front end. Any path that does not name an
//! existing file gets `index.html` so the client-side router can take over.

use bytes::Bytes;
use http_body_util::Full;
use hyper::{header, Response, StatusCode};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::types::{ArticlesError, Result};

const INDEX_FILE: &str = "index.html";

/// Serve `request_path` from `dist_dir`, falling back to `index.html`
pub async fn serve_static(dist_dir: &Path, request_path: &str) -> Result<Response<Full<Bytes>>> {
    let relative = safe_relative_path(request_path)
        .ok_or_else(|| ArticlesError::NotFound(request_path.to_string()))?;

    if !relative.as_os_str().is_empty() {
        let candidate = dist_dir.join(&relative);
        if is_file(&candidate).await {
            debug!(path = %candidate.display(), "Serving static file");
            return file_response(&candidate).await;
        }
    }

    let index = dist_dir.join(INDEX_FILE);
    if !is_file(&index).await {
        return Err(ArticlesError::NotFound(INDEX_FILE.to_string()));
    }
    file_response(&index).await
}

/// Map a URL path onto a path relative to the dist directory
///
/// Returns `None` for paths that try to leave the directory.
fn safe_relative_path(request_path: &str) -> Option<PathBuf> {
    let decoded = urlencoding::decode(request_path).ok()?;
    let mut relative = PathBuf::new();

    for segment in decoded.split('/') {
        match segment {
            "" | "." => continue,
            ".." => return None,
            s if s.contains('\\') || s.contains('\0') => return None,
            s => relative.push(s),
        }
    }

    Some(relative)
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}

async fn file_response(path: &Path) -> Result<Response<Full<Bytes>>> {
    let data = tokio::fs::read(path).await?;
    let is_index = path.file_name().is_some_and(|n| n == INDEX_FILE);

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type_for(path))
        .header(
            header::CACHE_CONTROL,
            if is_index { "no-cache" } else { "public, max-age=3600" },
        )
        .body(Full::new(Bytes::from(data)))
        .unwrap())
}

fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("js") | Some("mjs") => "text/javascript; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("json") | Some("map") => "application/json",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",
        Some("woff2") => "font/woff2",
        Some("woff") => "font/woff",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    fn dist_fixture(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "articles-api-dist-{}-{}",
            tag,
            std::process::id()
        ));
        std::fs::create_dir_all(dir.join("assets")).unwrap();
        std::fs::write(dir.join("index.html"), "<html>app</html>").unwrap();
        std::fs::write(dir.join("assets/app.js"), "console.log(1)").unwrap();
        dir
    }

    async fn body_string(resp: Response<Full<Bytes>>) -> String {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_safe_relative_path() {
        assert_eq!(safe_relative_path("/"), Some(PathBuf::new()));
        assert_eq!(
            safe_relative_path("/assets/app.js"),
            Some(PathBuf::from("assets").join("app.js"))
        );
        assert_eq!(safe_relative_path("/../etc/passwd"), None);
        assert_eq!(safe_relative_path("/assets/%2e%2e/%2e%2e/secret"), None);
    }

    #[test]
    fn test_content_types() {
        assert_eq!(content_type_for(Path::new("a/index.html")), "text/html; charset=utf-8");
        assert_eq!(content_type_for(Path::new("app.JS")), "text/javascript; charset=utf-8");
        assert_eq!(content_type_for(Path::new("blob.bin")), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_existing_file_is_served() {
        let dist = dist_fixture("file");
        let resp = serve_static(&dist, "/assets/app.js").await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers()[header::CONTENT_TYPE],
            "text/javascript; charset=utf-8"
        );
        assert_eq!(body_string(resp).await, "console.log(1)");
    }

    #[tokio::test]
    async fn test_unknown_path_falls_back_to_index() {
        let dist = dist_fixture("spa");
        for path in ["/", "/articles/learn-react", "/assets"] {
            let resp = serve_static(&dist, path).await.unwrap();
            assert_eq!(resp.headers()[header::CACHE_CONTROL], "no-cache");
            assert_eq!(body_string(resp).await, "<html>app</html>");
        }
    }

    #[tokio::test]
    async fn test_traversal_is_not_found() {
        let dist = dist_fixture("traversal");
        let err = serve_static(&dist, "/../Cargo.toml").await.unwrap_err();
        assert!(matches!(err, ArticlesError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_missing_build_is_not_found() {
        let dist = std::env::temp_dir().join("articles-api-dist-does-not-exist");
        let err = serve_static(&dist, "/").await.unwrap_err();
        assert!(matches!(err, ArticlesError::NotFound(_)));
    }
}
