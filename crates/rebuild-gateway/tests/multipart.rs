#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use axum::http::{header, HeaderMap, HeaderValue};
use bytes::Bytes;

use rebuild_gateway::transfer::parse_multipart_form;

mod mocks;
use mocks::multipart_body;

fn form_headers(boundary: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&format!("multipart/form-data; boundary={boundary}")).unwrap(),
    );
    headers
}

#[tokio::test]
async fn parts_are_split_with_lowercased_names() {
    let body = multipart_body(
        "frontier",
        &[
            ("File", Some("a.docx"), b"PK\x03\x04".as_slice()),
            ("ContentManagementFlags", None, b"{}".as_slice()),
        ],
    );

    let parts = parse_multipart_form(Bytes::from(body), &form_headers("frontier"))
        .await
        .expect("parse");

    assert_eq!(parts.len(), 2);
    assert_eq!(parts[0].field_name, "file");
    assert_eq!(parts[0].file_name.as_deref(), Some("a.docx"));
    assert_eq!(parts[0].content_type.as_deref(), Some("application/pdf"));
    assert_eq!(parts[0].data, Bytes::from_static(b"PK\x03\x04"));
    assert_eq!(parts[1].field_name, "contentmanagementflags");
    assert_eq!(parts[1].file_name, None);
    assert_eq!(parts[1].data, Bytes::from_static(b"{}"));
}

#[tokio::test]
async fn missing_or_bad_content_type_is_rejected() {
    let body = Bytes::from(multipart_body("frontier", &[("file", Some("a"), b"x".as_slice())]));

    let err = parse_multipart_form(body.clone(), &HeaderMap::new())
        .await
        .expect_err("no content type");
    assert_eq!(err.class().as_str(), "BAD_ARGUMENT");

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    let err = parse_multipart_form(body, &headers)
        .await
        .expect_err("not multipart");
    assert_eq!(err.class().as_str(), "BAD_ARGUMENT");
}

#[tokio::test]
async fn truncated_body_is_rejected() {
    let body = Bytes::from_static(b"--frontier\r\nContent-Disposition: form-data; name=\"file\"\r\n\r\nabc");

    let err = parse_multipart_form(body, &form_headers("frontier"))
        .await
        .expect_err("truncated");
    assert_eq!(err.class().as_str(), "BAD_ARGUMENT");
}
