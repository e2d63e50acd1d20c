//! PDF redirect, viewer page and raw fetch integration tests.

use axum::http::{Method, StatusCode};

use super::test_utils::{assert_no_cache, get, request, Fixture, FAKE_PDF};

// =============================================================================
// Redirect
// =============================================================================

#[tokio::test]
async fn test_pdf_redirects_to_viewer() {
    let fixture = Fixture::project();
    let router = fixture.router();

    let response = get(&router, "/07_experiment/output/report.pdf").await;
    assert_eq!(response.status, StatusCode::FOUND);
    assert_eq!(
        response.header("location"),
        Some("/__pdf_viewer__?file=%2F07_experiment%2Foutput%2Freport.pdf")
    );
    assert_no_cache(&response);
}

#[tokio::test]
async fn test_pdf_redirect_keeps_encoded_path() {
    let fixture = Fixture::project();
    fixture.write("figure_aggregator/final report.pdf", FAKE_PDF);
    let router = fixture.router();

    let response = get(&router, "/figure_aggregator/final%20report.pdf").await;
    assert_eq!(response.status, StatusCode::FOUND);
    assert_eq!(
        response.header("location"),
        Some("/__pdf_viewer__?file=%2Ffigure_aggregator%2Ffinal%2520report.pdf")
    );
}

#[tokio::test]
async fn test_uppercase_extension_redirects() {
    let fixture = Fixture::project();
    fixture.write("figure_aggregator/SCAN.PDF", FAKE_PDF);
    let router = fixture.router();

    let response = get(&router, "/figure_aggregator/SCAN.PDF").await;
    assert_eq!(response.status, StatusCode::FOUND);
}

#[tokio::test]
async fn test_denied_pdf_is_not_redirected() {
    let fixture = Fixture::project();
    fixture.write("07_experiment/scripts/draft.pdf", FAKE_PDF);
    fixture.write("hidden.pdf", FAKE_PDF);
    let router = fixture.router();

    for uri in ["/07_experiment/scripts/draft.pdf", "/hidden.pdf", "/hidden.pdf?raw=1"] {
        let response = get(&router, uri).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND, "{uri}");
        assert!(response.header("location").is_none(), "{uri}");
    }
}

#[tokio::test]
async fn test_raw_flag_other_values_still_redirect() {
    let fixture = Fixture::project();
    let router = fixture.router();

    let response = get(&router, "/figure_aggregator/summary.pdf?raw=0").await;
    assert_eq!(response.status, StatusCode::FOUND);
}

// =============================================================================
// Raw Fetch
// =============================================================================

#[tokio::test]
async fn test_raw_fetch_streams_bytes() {
    let fixture = Fixture::project();
    let router = fixture.router();

    let response = get(&router, "/07_experiment/output/report.pdf?raw=1").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(&response.body[..], FAKE_PDF);
    assert_eq!(response.header("content-type"), Some("application/pdf"));
    assert_eq!(
        response.header("content-length"),
        Some(FAKE_PDF.len().to_string().as_str())
    );
    assert!(response.header("last-modified").is_some());
    assert_no_cache(&response);
}

#[tokio::test]
async fn test_raw_fetch_with_version_token() {
    let fixture = Fixture::project();
    let router = fixture.router();

    let response = get(
        &router,
        "/07_experiment/output/report.pdf?raw=1&v=%22abc%22%7CWed%2C%2021%20Oct",
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(&response.body[..], FAKE_PDF);
}

#[tokio::test]
async fn test_raw_head_exposes_version_headers() {
    let fixture = Fixture::project();
    let router = fixture.router();

    let response = request(
        &router,
        Method::HEAD,
        "/07_experiment/output/report.pdf?raw=1",
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.is_empty());
    assert!(response.header("last-modified").is_some());
    assert_no_cache(&response);
}

#[tokio::test]
async fn test_raw_fetch_is_idempotent() {
    let fixture = Fixture::project();
    let router = fixture.router();

    let first = get(&router, "/07_experiment/output/report.pdf?raw=1").await;
    let second = get(&router, "/07_experiment/output/report.pdf?raw=1").await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(first.body, second.body);
    assert_no_cache(&second);
}

#[tokio::test]
async fn test_raw_fetch_sees_regenerated_file() {
    let fixture = Fixture::project();
    let router = fixture.router();

    let before = get(&router, "/07_experiment/output/report.pdf?raw=1").await;
    assert_eq!(&before.body[..], FAKE_PDF);

    let regenerated = b"%PDF-1.4\n% regenerated\n%%EOF\n";
    fixture.write("07_experiment/output/report.pdf", regenerated);

    let after = get(&router, "/07_experiment/output/report.pdf?raw=1").await;
    assert_eq!(after.status, StatusCode::OK);
    assert_eq!(&after.body[..], regenerated);
}

#[tokio::test]
async fn test_raw_fetch_missing_file() {
    let fixture = Fixture::project();
    let router = fixture.router();

    let response = get(&router, "/07_experiment/output/missing.pdf?raw=1").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Viewer Page
// =============================================================================

#[tokio::test]
async fn test_viewer_page_served() {
    let fixture = Fixture::project();
    let router = fixture.router();

    let response = get(
        &router,
        "/__pdf_viewer__?file=%2F07_experiment%2Foutput%2Freport.pdf",
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response
        .header("content-type")
        .unwrap()
        .starts_with("text/html"));
    assert_no_cache(&response);

    let html = response.text();
    assert!(html.contains(r#""file":"/07_experiment/output/report.pdf""#));
    assert!(html.contains(r#""stateKey":"pdf_state:/07_experiment/output/report.pdf""#));
    assert!(html.contains("pdfjsLib"));
    assert!(!html.contains("%PDF-1.4"));
}

#[tokio::test]
async fn test_viewer_follows_redirect_target() {
    let fixture = Fixture::project();
    fixture.write("figure_aggregator/final report.pdf", FAKE_PDF);
    let router = fixture.router();

    let redirect = get(&router, "/figure_aggregator/final%20report.pdf").await;
    let location = redirect.header("location").unwrap().to_string();

    let response = get(&router, &location).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response
        .text()
        .contains(r#""file":"/figure_aggregator/final%20report.pdf""#));
}

#[tokio::test]
async fn test_viewer_normalizes_leading_slash() {
    let fixture = Fixture::project();
    let router = fixture.router();

    let response = get(&router, "/__pdf_viewer__?file=figure_aggregator/summary.pdf").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response
        .text()
        .contains(r#""file":"/figure_aggregator/summary.pdf""#));
}

#[tokio::test]
async fn test_viewer_bad_requests() {
    let fixture = Fixture::project();
    let router = fixture.router();

    for uri in [
        "/__pdf_viewer__",
        "/__pdf_viewer__?file=",
        "/__pdf_viewer__?other=1",
        "/__pdf_viewer__?file=%2F01_download%2Foutput%2Fdata.tsv",
        "/__pdf_viewer__?file=%2Fsecrets.txt",
    ] {
        let response = get(&router, uri).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(response.json()["error"], "bad_request", "{uri}");
        assert_no_cache(&response);
    }
}

#[tokio::test]
async fn test_viewer_denied_or_missing_targets() {
    let fixture = Fixture::project();
    fixture.write("07_experiment/scripts/draft.pdf", FAKE_PDF);
    fixture.write("hidden.pdf", FAKE_PDF);
    fixture.mkdir("figure_aggregator/folder.pdf");
    let router = fixture.router();

    for uri in [
        "/__pdf_viewer__?file=%2F07_experiment%2Fscripts%2Fdraft.pdf",
        "/__pdf_viewer__?file=%2Fhidden.pdf",
        "/__pdf_viewer__?file=%2Fproject_journal%2F..%2Fhidden.pdf",
        "/__pdf_viewer__?file=%2F07_experiment%2Foutput%2Fmissing.pdf",
        "/__pdf_viewer__?file=%2Ffigure_aggregator%2Ffolder.pdf",
    ] {
        let response = get(&router, uri).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND, "{uri}");
    }
}

#[tokio::test]
async fn test_viewer_route_with_extra_segments_denied() {
    let fixture = Fixture::project();
    let router = fixture.router();

    let response = get(&router, "/__pdf_viewer__/extra?file=%2Ffigure_aggregator%2Fsummary.pdf").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_viewer_escapes_hostile_file_name() {
    let fixture = Fixture::project();
    fixture.write("figure_aggregator/<script>alert(1)<.pdf", FAKE_PDF);
    let router = fixture.router();

    let response = get(
        &router,
        "/__pdf_viewer__?file=%2Ffigure_aggregator%2F%3Cscript%3Ealert(1)%3C.pdf",
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    let html = response.text();
    assert!(!html.contains("<script>alert(1)"));
    assert!(html.contains("&lt;script&gt;alert(1)&lt;.pdf"));
}
