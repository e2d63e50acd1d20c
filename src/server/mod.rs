//! HTTP server layer for labserve.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                hardening (no-cache, no conditionals)            │
//! │                                                                 │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────────┐  │
//! │  │   access    │  │  handlers   │  │        viewer           │  │
//! │  │ (allowlist) │─▶│ (dispatch)  │─▶│  (pdf.js page)          │  │
//! │  └─────────────┘  └──────┬──────┘  └─────────────────────────┘  │
//! │                          │                                      │
//! │                   ┌──────▼──────┐                               │
//! │                   │   listing   │                               │
//! │                   │ (indexes)   │                               │
//! │                   └─────────────┘                               │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod access;
pub mod handlers;
pub mod hardening;
pub mod listing;
pub mod routes;
pub mod viewer;

pub use access::{is_allowed, is_analysis_dir, RequestPath, ALLOWED_ROOT_DIRS, VIEWER_ROUTE};
pub use handlers::{serve_handler, viewer_handler, AppState, ErrorResponse};
pub use hardening::harden_response;
pub use routes::{create_router, RouterConfig};
pub use viewer::ViewerState;
