//! Development-only static asset responder. Mounted as the router fallback.

use std::{
    borrow::Cow,
    path::{Component, Path, PathBuf},
};

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Response, Uri},
};
use percent_encoding::percent_decode_str;
use tracing::debug;

use crate::{
    config::SiteConfig,
    web::{Error, WebResult},
    AppState,
};

const DEFAULT_MIME: &str = "application/octet-stream";

/// Serves whatever static file the path names, or 404 when the responder is off
/// or the path isn't a static asset.
pub async fn serve_static(State(app_state): State<AppState>, uri: Uri) -> WebResult<Response<Body>> {
    let not_found = || Error::NotFound(uri.path().to_string());
    let site_config = &app_state.site_config;
    if !site_config.debug {
        return Err(not_found());
    }

    let decoded = decode_path(uri.path()).ok_or_else(not_found)?;
    let rel_path = decoded.trim_start_matches('/');
    if !is_static_path(rel_path, site_config) {
        return Err(not_found());
    }

    serve_file(&site_config.static_root, rel_path).await
}

/// Percent-decodes the request path. Paths that don't decode to UTF-8 yield `None`.
fn decode_path(path: &str) -> Option<Cow<'_, str>> {
    percent_decode_str(path).decode_utf8().ok()
}

/// Reads a file under `root` whole and attaches the no-cache headers.
pub async fn serve_file(root: &Path, rel_path: &str) -> WebResult<Response<Body>> {
    let not_found = || Error::NotFound(rel_path.to_string());

    let file_path = resolve_path(root, rel_path).ok_or_else(not_found)?;
    let is_file = tokio::fs::metadata(&file_path)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false);
    if !is_file {
        return Err(not_found());
    }

    let content = tokio::fs::read(&file_path).await?;
    debug!(path = %file_path.display(), bytes = content.len(), "serving static file");

    let mime = file_path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(mime_for)
        .unwrap_or(DEFAULT_MIME);

    let mut resp = Response::new(Body::from(content));
    let headers = resp.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(mime));
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-cache, no-store, must-revalidate"),
    );
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(header::EXPIRES, HeaderValue::from_static("0"));

    Ok(resp)
}

/// Asset paths either end in a known extension or live in one of the asset directories.
fn is_static_path(rel_path: &str, site_config: &SiteConfig) -> bool {
    let by_extension = Path::new(rel_path)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            site_config
                .static_extensions
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(ext))
        });

    let by_dir = site_config.static_dirs.iter().any(|dir| {
        rel_path
            .strip_prefix(dir.as_str())
            .is_some_and(|rest| rest.starts_with('/'))
    });

    by_extension || by_dir
}

/// Joins `rel_path` onto `root` if every component is a plain name.
fn resolve_path(root: &Path, rel_path: &str) -> Option<PathBuf> {
    if rel_path.is_empty() || rel_path.contains('\\') {
        return None;
    }

    let rel = Path::new(rel_path);
    rel.components()
        .all(|comp| matches!(comp, Component::Normal(_)))
        .then(|| root.join(rel))
}

fn mime_for(ext: &str) -> &'static str {
    match ext.to_ascii_lowercase().as_str() {
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "js" | "mjs" => "text/javascript",
        "json" => "application/json",
        "txt" => "text/plain",
        "xml" => "application/xml",
        "pdf" => "application/pdf",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "ico" => "image/vnd.microsoft.icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "otf" => "font/otf",
        "eot" => "application/vnd.ms-fontobject",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mp3" => "audio/mpeg",
        _ => DEFAULT_MIME,
    }
}
