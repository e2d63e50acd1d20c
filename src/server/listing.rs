//! Directory index pages.
//!
//! Two directories get a synthetic index that only reveals what the access
//! rules expose:
//!
//! - the server root lists the allow-set directories that exist (fixed order),
//!   followed by the analysis directories that exist (lexicographic order)
//! - a bare analysis directory lists only its `output/` child, or an explicit
//!   empty marker when there is none
//!
//! Every other directory that passed the access check is listed in full.

use std::io;
use std::path::Path;

use super::access::{is_analysis_dir, RequestPath, ALLOWED_ROOT_DIRS, ANALYSIS_OUTPUT_DIR};
use super::viewer::html_escape;

/// Marker shown in place of entries when a listing is empty.
pub const EMPTY_MARKER: &str = "(empty)";

/// One line of a directory index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    /// Text shown to the user
    pub name: String,

    /// Link target (already percent-encoded, not yet HTML-escaped)
    pub href: String,
}

impl ListingEntry {
    fn new(name: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            href: href.into(),
        }
    }
}

/// Build the index page for a directory request that passed the access check.
///
/// `dir` is the resolved filesystem path for `path` under `root`.
pub async fn render_directory(root: &Path, path: &RequestPath, dir: &Path) -> io::Result<String> {
    let entries = if path.is_root() {
        root_entries(root).await?
    } else if path.is_analysis_root() {
        analysis_entries(root, &path.segments()[0]).await
    } else {
        directory_entries(dir).await?
    };

    let mut display = path.display();
    if !display.ends_with('/') {
        display.push('/');
    }
    Ok(render_listing(&display, &entries))
}

/// Entries for the server root.
pub async fn root_entries(root: &Path) -> io::Result<Vec<ListingEntry>> {
    let mut entries = Vec::new();
    for name in ALLOWED_ROOT_DIRS {
        if is_dir(&root.join(name)).await {
            entries.push(ListingEntry::new(format!("{name}/"), format!("{name}/")));
        }
    }

    let mut analysis = Vec::new();
    let mut read_dir = tokio::fs::read_dir(root).await?;
    while let Some(entry) = read_dir.next_entry().await? {
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if is_analysis_dir(&name) && is_dir(&entry.path()).await {
            analysis.push(name);
        }
    }
    analysis.sort();

    entries.extend(analysis.into_iter().map(|name| {
        let href = format!("{}/", urlencoding::encode(&name));
        ListingEntry::new(format!("{name}/"), href)
    }));
    Ok(entries)
}

/// Entries for a bare analysis directory: `output/` or nothing.
pub async fn analysis_entries(root: &Path, name: &str) -> Vec<ListingEntry> {
    let output = root.join(name).join(ANALYSIS_OUTPUT_DIR);
    if is_dir(&output).await {
        let href = format!("/{}/{ANALYSIS_OUTPUT_DIR}/", urlencoding::encode(name));
        vec![ListingEntry::new(format!("{ANALYSIS_OUTPUT_DIR}/"), href)]
    } else {
        Vec::new()
    }
}

/// Entries for an unrestricted directory, sorted case-insensitively.
///
/// Directories get a trailing `/`; symlinks are marked with `@` in the
/// displayed name only.
pub async fn directory_entries(dir: &Path) -> io::Result<Vec<ListingEntry>> {
    let mut entries = Vec::new();
    let mut read_dir = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = read_dir.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        let mut display = name.clone();
        let mut href = urlencoding::encode(&name).into_owned();

        if is_dir(&entry.path()).await {
            display.push('/');
            href.push('/');
        }
        if entry.file_type().await.is_ok_and(|t| t.is_symlink()) {
            display.push('@');
        }
        entries.push(ListingEntry::new(display, href));
    }

    entries.sort_by_key(|e| e.name.to_lowercase());
    Ok(entries)
}

/// Render an index page. Names and hrefs are HTML-escaped here.
pub fn render_listing(display_path: &str, entries: &[ListingEntry]) -> String {
    let title = html_escape(&format!("Index of {display_path}"));

    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html><head>\n<meta charset='utf-8'>\n");
    html.push_str(&format!("<title>{title}</title>\n</head><body>\n"));
    html.push_str(&format!("<h1>{title}</h1>\n<ul>\n"));
    if display_path != "/" {
        html.push_str("<li><a href='/'>/</a></li>\n");
    }
    if entries.is_empty() {
        html.push_str(&format!("<li>{EMPTY_MARKER}</li>\n"));
    }
    for entry in entries {
        html.push_str(&format!(
            "<li><a href='{}'>{}</a></li>\n",
            html_escape(&entry.href),
            html_escape(&entry.name)
        ));
    }
    html.push_str("</ul>\n</body></html>\n");
    html
}

async fn is_dir(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false)
}
