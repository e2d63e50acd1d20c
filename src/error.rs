use thiserror::Error;

/// Errors that can occur while answering a request.
///
/// `Unauthorized` and `NotFound` both map to HTTP 404 so that clients cannot
/// tell a forbidden path apart from a missing one.
#[derive(Debug, Error)]
pub enum ServeError {
    /// Path was rejected by the access rules (including traversal attempts)
    #[error("Path is not exposed: {path}")]
    Unauthorized { path: String },

    /// Path is exposed but nothing exists there
    #[error("Not found: {path}")]
    NotFound { path: String },

    /// Request is malformed (e.g. the viewer was given a non-PDF target)
    #[error("Bad request: {reason}")]
    BadRequest { reason: String },

    /// Request method other than GET/HEAD
    #[error("Method not allowed: {method}")]
    MethodNotAllowed { method: String },

    /// Filesystem error while reading an exposed path
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServeError {
    /// Shorthand for an unauthorized path.
    pub fn unauthorized(path: impl Into<String>) -> Self {
        ServeError::Unauthorized { path: path.into() }
    }

    /// Shorthand for a missing path.
    pub fn not_found(path: impl Into<String>) -> Self {
        ServeError::NotFound { path: path.into() }
    }

    /// Shorthand for a malformed request.
    pub fn bad_request(reason: impl Into<String>) -> Self {
        ServeError::BadRequest {
            reason: reason.into(),
        }
    }
}
