//! HTTP request handlers for the restricted file server.
//!
//! # Endpoints
//!
//! - `GET /__pdf_viewer__?file=<path>` - PDF viewer page
//! - `GET /<path>.pdf` - redirect to the viewer
//! - `GET /<path>.pdf?raw=1` - PDF bytes
//! - `GET /<path>` - directory listing or file, subject to the access rules

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use http::Method;
use serde::Serialize;
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tracing::{debug, error, warn};
use url::form_urlencoded;

use crate::error::ServeError;

use super::access::{has_pdf_extension, RequestPath, VIEWER_ROUTE};
use super::listing;
use super::viewer::generate_viewer_html;

/// Index files served in place of a generated listing inside unrestricted directories.
const INDEX_FILES: [&str; 2] = ["index.html", "index.htm"];

// =============================================================================
// Application State
// =============================================================================

/// Shared application state.
///
/// Holds the served root, fixed at startup. Handlers never mutate it and keep
/// no other state between requests.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Directory the server reads from
    pub root: Arc<PathBuf>,
}

impl AppState {
    /// Create application state serving `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Arc::new(root.into()),
        }
    }

    /// The served root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response returned for all error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type identifier (e.g., "not_found", "bad_request")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status code (included for convenience)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorResponse {
    /// Create a new error response with status code.
    pub fn with_status(
        error: impl Into<String>,
        message: impl Into<String>,
        status: StatusCode,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: Some(status.as_u16()),
        }
    }
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Convert ServeError to HTTP response.
///
/// Unauthorized and missing paths produce byte-identical 404 bodies; only the
/// server log tells them apart.
impl IntoResponse for ServeError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            ServeError::Unauthorized { path } => {
                debug!(path = %path, "Denied by access rules");
                (StatusCode::NOT_FOUND, "not_found", "Not found".to_string())
            }
            ServeError::NotFound { path } => {
                debug!(path = %path, "No such file or directory");
                (StatusCode::NOT_FOUND, "not_found", "Not found".to_string())
            }
            ServeError::BadRequest { reason } => {
                (StatusCode::BAD_REQUEST, "bad_request", reason.clone())
            }
            ServeError::MethodNotAllowed { method } => (
                StatusCode::METHOD_NOT_ALLOWED,
                "method_not_allowed",
                format!("Method not allowed: {}", method),
            ),
            ServeError::Io(io_err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "io_error",
                format!("I/O error: {}", io_err),
            ),
        };

        if status.is_server_error() {
            error!(
                error_type = error_type,
                status = status.as_u16(),
                "Server error: {}",
                message
            );
        } else if status != StatusCode::NOT_FOUND {
            warn!(
                error_type = error_type,
                status = status.as_u16(),
                "Client error: {}",
                message
            );
        }

        let error_response = ErrorResponse::with_status(error_type, message, status);
        let mut response = (status, Json(error_response)).into_response();
        if status == StatusCode::METHOD_NOT_ALLOWED {
            response
                .headers_mut()
                .insert(header::ALLOW, header::HeaderValue::from_static("GET, HEAD"));
        }
        response
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle viewer requests - serves the pdf.js viewer page for one document.
///
/// # Endpoint
///
/// `GET /__pdf_viewer__?file=<path>`
///
/// # Response
///
/// - `200 OK`: HTML viewer page referencing `<path>?raw=1`
/// - `400 Bad Request`: `file` missing, empty, or not a `.pdf`
/// - `404 Not Found`: `file` is not exposed, missing, or not a regular file
pub async fn viewer_handler(
    State(state): State<AppState>,
    request: Request,
) -> Result<Response, ServeError> {
    let query = request.uri().query().unwrap_or("");
    let file = query_param(query, "file")
        .filter(|f| !f.is_empty())
        .ok_or_else(|| ServeError::bad_request("Missing 'file' query parameter"))?;

    if !has_pdf_extension(&file) {
        return Err(ServeError::bad_request(format!(
            "Viewer only supports .pdf files: {}",
            file
        )));
    }

    let file = if file.starts_with('/') {
        file
    } else {
        format!("/{}", file)
    };

    let path = RequestPath::parse(&file).ok_or_else(|| ServeError::unauthorized(&file))?;
    if !path.is_allowed() || !path.is_pdf() {
        return Err(ServeError::unauthorized(&file));
    }

    let target = path.resolve(state.root());
    let is_file = tokio::fs::metadata(&target)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false);
    if !is_file {
        return Err(ServeError::not_found(path.display()));
    }

    debug!(file = %path.display(), "Serving PDF viewer");
    let html = generate_viewer_html(&encode_path(&path), &path.display());
    Ok(Html(html).into_response())
}

/// Handle every other request: access check, PDF redirect, listing, or file.
///
/// # Response
///
/// - `200 OK`: file contents or directory listing
/// - `301 Moved Permanently`: directory requested without a trailing slash
/// - `302 Found`: `.pdf` requested without `raw=1`, redirected to the viewer
/// - `404 Not Found`: path not exposed or missing
/// - `405 Method Not Allowed`: anything but GET/HEAD
pub async fn serve_handler(
    State(state): State<AppState>,
    request: Request,
) -> Result<Response, ServeError> {
    if request.method() != Method::GET && request.method() != Method::HEAD {
        return Err(ServeError::MethodNotAllowed {
            method: request.method().to_string(),
        });
    }

    let raw_path = request.uri().path().to_string();
    let query = request.uri().query().map(str::to_string);

    let path = RequestPath::parse(&raw_path).ok_or_else(|| ServeError::unauthorized(&raw_path))?;
    if !path.is_allowed() {
        return Err(ServeError::unauthorized(&raw_path));
    }

    if path.is_pdf() && !is_raw_mode(query.as_deref().unwrap_or("")) {
        debug!(path = %path.display(), "Redirecting PDF to viewer");
        return Ok(redirect(StatusCode::FOUND, &viewer_location(&raw_path)));
    }

    let target = path.resolve(state.root());
    let metadata = tokio::fs::metadata(&target)
        .await
        .map_err(|_| ServeError::not_found(path.display()))?;

    if metadata.is_dir() {
        if !raw_path.ends_with('/') {
            return Ok(redirect(
                StatusCode::MOVED_PERMANENTLY,
                &directory_location(&path, query.as_deref()),
            ));
        }

        if !path.is_root() && !path.is_analysis_root() {
            if let Some(index) = find_index_file(&target).await {
                return serve_file(&index, request).await;
            }
        }

        let html = listing::render_directory(state.root(), &path, &target).await?;
        debug!(path = %path.display(), "Serving directory listing");
        return Ok(Html(html).into_response());
    }

    serve_file(&target, request).await
}

// =============================================================================
// Helpers
// =============================================================================

/// Stream a regular file with content type, length, Last-Modified and range support.
async fn serve_file(path: &Path, request: Request) -> Result<Response, ServeError> {
    let response = match ServeFile::new(path).oneshot(request).await {
        Ok(response) => response,
        Err(never) => match never {},
    };
    Ok(response.map(Body::new))
}

async fn find_index_file(dir: &Path) -> Option<PathBuf> {
    for name in INDEX_FILES {
        let candidate = dir.join(name);
        if tokio::fs::metadata(&candidate)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
        {
            return Some(candidate);
        }
    }
    None
}

fn redirect(status: StatusCode, location: &str) -> Response {
    (status, [(header::LOCATION, location.to_string())]).into_response()
}

/// Viewer URL for a raw (still percent-encoded) request path.
pub fn viewer_location(raw_path: &str) -> String {
    format!("/{}?file={}", VIEWER_ROUTE, urlencoding::encode(raw_path))
}

/// Slash-terminated location for a directory, rebuilt from the parsed
/// segments so it always starts with a single `/`.
fn directory_location(path: &RequestPath, query: Option<&str>) -> String {
    let mut location = encode_path(path);
    if !location.ends_with('/') {
        location.push('/');
    }
    if let Some(q) = query {
        location.push('?');
        location.push_str(q);
    }
    location
}

/// Return `true` when the query string carries `raw=1`.
pub fn is_raw_mode(query: &str) -> bool {
    form_urlencoded::parse(query.as_bytes()).any(|(key, value)| key == "raw" && value == "1")
}

/// First value of a query parameter, decoded.
fn query_param(query: &str, name: &str) -> Option<String> {
    form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

/// Canonical percent-encoded URL for a parsed path.
fn encode_path(path: &RequestPath) -> String {
    let encoded: Vec<_> = path
        .segments()
        .iter()
        .map(|s| urlencoding::encode(s))
        .collect();
    format!("/{}", encoded.join("/"))
}

// =============================================================================
// Tests
// =============================================================================
