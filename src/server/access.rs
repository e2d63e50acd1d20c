//! Access rules for the served tree.
//!
//! Only a curated subset of the served root is visible over HTTP:
//!
//! - the fixed allow-set of top-level directories ([`ALLOWED_ROOT_DIRS`]), in full
//! - numbered analysis directories (`NN_name`), but only as a bare listing and
//!   their `output/` subtree
//! - the internal PDF viewer route ([`VIEWER_ROUTE`])
//!
//! The rules are evaluated over decoded path segments and never touch the
//! filesystem, so every decision here can be tested without a socket.

use std::path::{Path, PathBuf};

/// Top-level directories exposed in full, in the order the root listing shows them.
pub const ALLOWED_ROOT_DIRS: [&str; 2] = ["project_journal", "figure_aggregator"];

/// Reserved top-level segment under which the PDF viewer page is served.
pub const VIEWER_ROUTE: &str = "__pdf_viewer__";

/// The only child of an analysis directory that is reachable.
pub const ANALYSIS_OUTPUT_DIR: &str = "output";

/// A request path split into decoded segments.
///
/// Empty segments and `.` are dropped. `..` segments are kept on purpose so that
/// [`is_allowed`] can reject them instead of silently resolving them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestPath {
    segments: Vec<String>,
}

impl RequestPath {
    /// Parse a raw (percent-encoded) URL path.
    ///
    /// Returns `None` when the path does not decode to valid UTF-8 or contains
    /// a NUL byte. Callers answer such requests with 404.
    pub fn parse(url_path: &str) -> Option<Self> {
        let decoded = urlencoding::decode(url_path).ok()?;
        if decoded.contains('\0') {
            return None;
        }
        Some(Self::from_decoded(&decoded))
    }

    /// Split an already-decoded path into segments.
    pub fn from_decoded(decoded: &str) -> Self {
        let segments = decoded
            .split('/')
            .filter(|s| !s.is_empty() && *s != ".")
            .map(str::to_string)
            .collect();
        Self { segments }
    }

    /// The decoded segments.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// True for the server root (`/`).
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// True when the path names a bare analysis directory (`/NN_name`).
    pub fn is_analysis_root(&self) -> bool {
        self.segments.len() == 1 && is_analysis_dir(&self.segments[0])
    }

    /// True when the last segment carries a `.pdf` extension (any case).
    pub fn is_pdf(&self) -> bool {
        self.segments.last().is_some_and(|s| has_pdf_extension(s))
    }

    /// Whether the access rules expose this path.
    pub fn is_allowed(&self) -> bool {
        is_allowed(&self.segments)
    }

    /// Resolve against the served root.
    ///
    /// Only meaningful for paths that passed [`RequestPath::is_allowed`], which
    /// guarantees there is no `..` segment.
    pub fn resolve(&self, root: &Path) -> PathBuf {
        let mut path = root.to_path_buf();
        path.extend(&self.segments);
        path
    }

    /// Slash-separated display form, always starting with `/`.
    pub fn display(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }
}

/// Check whether a directory name matches the analysis-directory pattern:
/// two or more ASCII digits, an underscore, then at least one more character.
pub fn is_analysis_dir(name: &str) -> bool {
    let digits = name.bytes().take_while(u8::is_ascii_digit).count();
    digits >= 2
        && name.as_bytes().get(digits) == Some(&b'_')
        && name.len() > digits + 1
}

/// Case-insensitive `.pdf` extension check on a single name or path string.
pub fn has_pdf_extension(name: &str) -> bool {
    name.len() > 4
        && name
            .get(name.len() - 4..)
            .is_some_and(|ext| ext.eq_ignore_ascii_case(".pdf"))
}

/// Decide whether a segment list is exposed.
///
/// The traversal check runs before any other rule: a `..` anywhere denies the
/// path regardless of what else it matches.
pub fn is_allowed<S: AsRef<str>>(segments: &[S]) -> bool {
    if segments.iter().any(|s| s.as_ref() == "..") {
        return false;
    }

    let Some(top) = segments.first().map(AsRef::as_ref) else {
        return true;
    };

    if top == VIEWER_ROUTE {
        return segments.len() == 1;
    }

    if ALLOWED_ROOT_DIRS.contains(&top) {
        return true;
    }

    if is_analysis_dir(top) {
        return match segments.get(1) {
            None => true,
            Some(second) => second.as_ref() == ANALYSIS_OUTPUT_DIR,
        };
    }

    false
}
