//! Router configuration for labserve.
//!
//! # Route Structure
//!
//! ```text
//! /__pdf_viewer__?file=<path>   - PDF viewer page
//! /*                            - everything else (access rules, listings,
//!                                 PDF redirects, file streaming)
//! ```
//!
//! Every response passes through [`harden_response`], including errors and
//! the default 405 answers produced by the router itself.
//!
//! # Example
//!
//! ```ignore
//! use labserve::server::routes::{create_router, RouterConfig};
//!
//! let router = create_router(RouterConfig::new("/srv/project"));
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:8000").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::path::PathBuf;

use axum::{middleware, routing::get, Router};
use tower_http::trace::TraceLayer;

use super::access::VIEWER_ROUTE;
use super::handlers::{serve_handler, viewer_handler, AppState};
use super::hardening::harden_response;

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Directory to serve
    pub root: PathBuf,

    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl RouterConfig {
    /// Create a router configuration serving `root`, with tracing enabled.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            enable_tracing: true,
        }
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
pub fn create_router(config: RouterConfig) -> Router {
    let app_state = AppState::new(config.root);

    let router = Router::new()
        .route(&format!("/{}", VIEWER_ROUTE), get(viewer_handler))
        .fallback(serve_handler)
        .with_state(app_state)
        .layer(middleware::from_fn(harden_response));

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

// =============================================================================
// Tests
// =============================================================================
