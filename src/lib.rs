//! # labserve
//!
//! A read-only HTTP server that exposes the published parts of a project tree
//! while its analysis pipelines keep regenerating them.
//!
//! ## Features
//!
//! - **Allowlisted paths**: only `project_journal/`, `figure_aggregator/` and the
//!   `output/` subtree of numbered analysis directories (`NN_name/`) are reachable
//! - **Filtered listings**: the root and analysis-directory indexes never reveal
//!   anything the allowlist hides
//! - **No caching**: conditional requests are ignored and every response carries
//!   no-cache headers, so regenerated files always show up
//! - **Live PDF viewer**: `.pdf` links open a pdf.js viewer that reloads the
//!   document when it changes on disk and remembers page and zoom
//!
//! ## Architecture
//!
//! - [`server`] - Axum router, access rules, listings, viewer page
//! - [`config`] - CLI and configuration types
//! - [`error`] - Request error type
//!
//! ## Example
//!
//! ```rust,no_run
//! use labserve::{create_router, RouterConfig};
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let router = create_router(RouterConfig::new("/srv/project"));
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8000").await?;
//!     axum::serve(listener, router).await
//! }
//! ```

pub mod config;
pub mod error;
pub mod server;

// Re-export commonly used types
pub use config::Config;
pub use error::ServeError;
pub use server::{
    create_router, harden_response, is_allowed, is_analysis_dir, serve_handler, viewer_handler,
    AppState, ErrorResponse, RequestPath, RouterConfig, ViewerState, ALLOWED_ROOT_DIRS,
    VIEWER_ROUTE,
};
