//! Viewer module - generates the HTML page that displays a served PDF with pdf.js.
//!
//! The page never embeds the document itself. It fetches the bytes from
//! `<file>?raw=1&v=<version>` and polls that URL with `HEAD` requests to pick
//! up regenerated files. Page and zoom are kept per file in `localStorage`
//! under `pdf_state:<file>`.

use serde::{Deserialize, Serialize};
use serde_json::json;

/// Interval between version checks in the browser.
pub const POLL_INTERVAL_MS: u64 = 2000;

/// Zoom bounds enforced by the viewer.
pub const MIN_ZOOM: f64 = 0.5;
pub const MAX_ZOOM: f64 = 4.0;

/// Initial view state for a file without a stored entry.
pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_ZOOM: f64 = 1.25;

/// Prefix of the `localStorage` key holding `{page, zoom}` for a file.
pub const STATE_KEY_PREFIX: &str = "pdf_state:";

const PDFJS_VERSION: &str = "3.11.174";

/// Per-file view state persisted by the browser as `{"page": .., "zoom": ..}`.
///
/// The server never stores this. It fixes the stored schema and the defaults
/// handed to the page; the page script clamps entries it reads back into
/// `[1, page count]` and `[MIN_ZOOM, MAX_ZOOM]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewerState {
    pub page: u32,
    pub zoom: f64,
}

impl Default for ViewerState {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            zoom: DEFAULT_ZOOM,
        }
    }
}

/// Escape HTML special characters to prevent XSS attacks.
pub(crate) fn html_escape(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}

/// Serialize a value for a `<script>` block. `<` only occurs inside JSON
/// strings, where `\u003c` is equivalent and cannot close the tag.
fn script_json(value: &serde_json::Value) -> String {
    value.to_string().replace('<', "\\u003c")
}

/// Generate the viewer page for a PDF.
///
/// # Arguments
///
/// * `file_url` - URL path of the PDF as requested (percent-encoded, starting with `/`)
/// * `display_name` - Decoded path shown in the title and header
pub fn generate_viewer_html(file_url: &str, display_name: &str) -> String {
    let config = json!({
        "file": file_url,
        "stateKey": format!("{STATE_KEY_PREFIX}{file_url}"),
        "pollIntervalMs": POLL_INTERVAL_MS,
        "minZoom": MIN_ZOOM,
        "maxZoom": MAX_ZOOM,
        "defaultState": ViewerState::default(),
        "workerSrc": format!(
            "https://cdnjs.cloudflare.com/ajax/libs/pdf.js/{PDFJS_VERSION}/pdf.worker.min.js"
        ),
    });

    let escaped_name = html_escape(display_name);

    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{escaped_name}</title>
    <link rel="stylesheet" href="https://cdnjs.cloudflare.com/ajax/libs/pdf.js/{pdfjs}/pdf_viewer.min.css">
    <script src="https://cdnjs.cloudflare.com/ajax/libs/pdf.js/{pdfjs}/pdf.min.js"></script>
    <style>{style}</style>
</head>
<body>
    <header class="toolbar">
        <span class="file-name" title="{escaped_name}">{escaped_name}</span>
        <span class="group">
            <button id="prev" type="button" title="Previous page">&#9664;</button>
            <input id="page-input" type="number" min="1" value="1">
            <span>/ <span id="page-count">?</span></span>
            <button id="next" type="button" title="Next page">&#9654;</button>
        </span>
        <span class="group">
            <button id="zoom-out" type="button" title="Zoom out">&minus;</button>
            <input id="zoom-input" type="number" min="{min_zoom}" max="{max_zoom}" step="0.25" value="{default_zoom}">
            <button id="zoom-in" type="button" title="Zoom in">+</button>
        </span>
        <a class="raw-link" href="" id="raw-link">raw</a>
        <span id="status" class="status">Loading&hellip;</span>
    </header>
    <div id="error" class="error-banner"></div>
    <main id="stage">
        <div id="page-wrap" class="page-wrap">
            <canvas id="canvas"></canvas>
            <div id="text-layer" class="textLayer"></div>
        </div>
    </main>
    <script>const VIEWER_CONFIG = {config};</script>
    <script>{script}</script>
</body>
</html>
"##,
        escaped_name = escaped_name,
        pdfjs = PDFJS_VERSION,
        style = VIEWER_CSS,
        min_zoom = MIN_ZOOM,
        max_zoom = MAX_ZOOM,
        default_zoom = DEFAULT_ZOOM,
        config = script_json(&config),
        script = VIEWER_JS,
    )
}

const VIEWER_CSS: &str = r#"
* { box-sizing: border-box; }
body {
    margin: 0;
    background: #3a3a3a;
    font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
    font-size: 13px;
}
.toolbar {
    position: sticky;
    top: 0;
    z-index: 10;
    display: flex;
    align-items: center;
    gap: 16px;
    padding: 8px 12px;
    background: #1f1f1f;
    color: #eee;
}
.toolbar .file-name {
    font-weight: 600;
    overflow: hidden;
    text-overflow: ellipsis;
    white-space: nowrap;
    max-width: 40vw;
}
.toolbar .group { display: inline-flex; align-items: center; gap: 4px; }
.toolbar input { width: 64px; }
.toolbar button { min-width: 28px; cursor: pointer; }
.toolbar .raw-link { color: #9ecbff; }
.toolbar .status { margin-left: auto; color: #aaa; }
.error-banner {
    display: none;
    padding: 10px 16px;
    background: rgba(220, 38, 38, 0.95);
    color: #fff;
}
.error-banner.visible { display: block; }
#stage { display: flex; justify-content: center; padding: 16px; }
.page-wrap {
    position: relative;
    background: #fff;
    box-shadow: 0 2px 12px rgba(0, 0, 0, 0.5);
}
.page-wrap canvas { display: block; }
.page-wrap .textLayer { position: absolute; inset: 0; }
"#;

const VIEWER_JS: &str = r##"
(function () {
    const cfg = VIEWER_CONFIG;
    const rawUrl = cfg.file + "?raw=1";

    const canvas = document.getElementById("canvas");
    const textLayer = document.getElementById("text-layer");
    const pageWrap = document.getElementById("page-wrap");
    const pageInput = document.getElementById("page-input");
    const pageCount = document.getElementById("page-count");
    const zoomInput = document.getElementById("zoom-input");
    const statusEl = document.getElementById("status");
    const errorEl = document.getElementById("error");
    document.getElementById("raw-link").href = rawUrl;

    function clampZoom(value) {
        let zoom = Number(value);
        if (!Number.isFinite(zoom)) zoom = cfg.defaultState.zoom;
        return Math.min(cfg.maxZoom, Math.max(cfg.minZoom, zoom));
    }

    function clampPage(value, total) {
        let page = Math.floor(Number(value));
        if (!Number.isFinite(page) || page < 1) page = 1;
        if (total) page = Math.min(page, total);
        return page;
    }

    function loadState() {
        try {
            const stored = JSON.parse(localStorage.getItem(cfg.stateKey) || "null");
            if (stored && typeof stored === "object") {
                return { page: clampPage(stored.page), zoom: clampZoom(stored.zoom) };
            }
        } catch (err) {
            console.warn("ignoring unreadable viewer state", err);
        }
        return { page: cfg.defaultState.page, zoom: cfg.defaultState.zoom };
    }

    function saveState() {
        try {
            localStorage.setItem(cfg.stateKey, JSON.stringify({ page: state.page, zoom: state.zoom }));
        } catch (err) {
            console.warn("could not persist viewer state", err);
        }
    }

    function setStatus(text) { statusEl.textContent = text; }

    function showError(text) {
        errorEl.textContent = text;
        errorEl.classList.add("visible");
    }

    function clearError() {
        errorEl.textContent = "";
        errorEl.classList.remove("visible");
    }

    const state = loadState();
    let pdfDoc = null;
    let loadedVersion = null;
    let checking = false;
    let loadFailed = false;

    // Renders and document swaps run one at a time, in order. A failed task
    // does not stall the ones queued behind it.
    let queue = Promise.resolve();
    function enqueue(task) {
        const run = queue.then(task);
        queue = run.catch(() => {});
        return run;
    }

    function versionOf(headers) {
        return (headers.get("ETag") || "") + "|" + (headers.get("Last-Modified") || "");
    }

    async function fetchVersion() {
        const response = await fetch(rawUrl, { method: "HEAD", cache: "no-store" });
        if (!response.ok) throw new Error("HTTP " + response.status);
        return versionOf(response.headers);
    }

    function openDocument(version) {
        const token = encodeURIComponent(version + "#" + Date.now());
        return pdfjsLib.getDocument({ url: rawUrl + "&v=" + token }).promise;
    }

    function swapDocument(doc, version) {
        const previous = pdfDoc;
        pdfDoc = doc;
        loadedVersion = version;
        state.page = clampPage(state.page, doc.numPages);
        pageInput.max = String(doc.numPages);
        pageCount.textContent = String(doc.numPages);
        if (previous) previous.destroy();
    }

    async function renderPage() {
        if (!pdfDoc) return;
        state.page = clampPage(state.page, pdfDoc.numPages);
        state.zoom = clampZoom(state.zoom);

        const page = await pdfDoc.getPage(state.page);
        const viewport = page.getViewport({ scale: state.zoom });
        const ratio = window.devicePixelRatio || 1;

        canvas.width = Math.floor(viewport.width * ratio);
        canvas.height = Math.floor(viewport.height * ratio);
        canvas.style.width = Math.floor(viewport.width) + "px";
        canvas.style.height = Math.floor(viewport.height) + "px";
        pageWrap.style.width = canvas.style.width;
        pageWrap.style.height = canvas.style.height;

        await page.render({
            canvasContext: canvas.getContext("2d"),
            viewport: viewport,
            transform: ratio !== 1 ? [ratio, 0, 0, ratio, 0, 0] : null,
        }).promise;

        textLayer.replaceChildren();
        textLayer.style.setProperty("--scale-factor", String(viewport.scale));
        const textContent = await page.getTextContent();
        await pdfjsLib.renderTextLayer({
            textContentSource: textContent,
            container: textLayer,
            viewport: viewport,
            textDivs: [],
        }).promise;

        pageInput.value = String(state.page);
        zoomInput.value = String(state.zoom);
        saveState();
    }

    async function drawCurrentPage() {
        try {
            await renderPage();
        } catch (err) {
            showError("Failed to render page: " + err.message);
        }
    }

    // Requests made while one is already waiting in the queue collapse into
    // it; the render reads `state` when it starts, so it draws the latest page.
    let renderPending = false;
    function requestRender() {
        if (renderPending) return;
        renderPending = true;
        enqueue(() => {
            renderPending = false;
            return drawCurrentPage();
        });
    }

    async function checkForUpdate() {
        if (checking) return;
        if (typeof pdfjsLib === "undefined") {
            showError("PDF engine unavailable: pdf.js could not be loaded.");
            return;
        }
        checking = true;
        try {
            const version = await fetchVersion();
            if (version !== loadedVersion) {
                const reload = loadedVersion !== null;
                const doc = await openDocument(version);
                // The old document is destroyed only after any render of it
                // has finished, and the new one is drawn in the same step.
                await enqueue(async () => {
                    swapDocument(doc, version);
                    clearError();
                    await drawCurrentPage();
                });
                setStatus((reload ? "Reloaded " : "Loaded ") + new Date().toLocaleTimeString());
            } else if (loadFailed) {
                clearError();
            }
            loadFailed = false;
        } catch (err) {
            loadFailed = true;
            showError("Failed to load document: " + err.message);
        } finally {
            checking = false;
        }
    }

    function goToPage(page) {
        state.page = clampPage(page, pdfDoc ? pdfDoc.numPages : 0);
        saveState();
        requestRender();
    }

    function setZoom(zoom) {
        state.zoom = clampZoom(zoom);
        saveState();
        requestRender();
    }

    document.getElementById("prev").addEventListener("click", () => goToPage(state.page - 1));
    document.getElementById("next").addEventListener("click", () => goToPage(state.page + 1));
    document.getElementById("zoom-out").addEventListener("click", () => setZoom(state.zoom - 0.25));
    document.getElementById("zoom-in").addEventListener("click", () => setZoom(state.zoom + 0.25));
    pageInput.addEventListener("change", () => goToPage(pageInput.value));
    zoomInput.addEventListener("change", () => setZoom(zoomInput.value));

    document.addEventListener("keydown", (event) => {
        if (event.target instanceof HTMLInputElement) return;
        if (event.key === "ArrowLeft" || event.key === "PageUp") goToPage(state.page - 1);
        else if (event.key === "ArrowRight" || event.key === "PageDown") goToPage(state.page + 1);
        else if (event.key === "+" || event.key === "=") setZoom(state.zoom + 0.25);
        else if (event.key === "-") setZoom(state.zoom - 0.25);
    });

    window.addEventListener("beforeunload", saveState);

    if (typeof pdfjsLib !== "undefined") {
        pdfjsLib.GlobalWorkerOptions.workerSrc = cfg.workerSrc;
    }
    pageInput.value = String(state.page);
    zoomInput.value = String(state.zoom);
    checkForUpdate();
    setInterval(checkForUpdate, cfg.pollIntervalMs);
})();
"##;
