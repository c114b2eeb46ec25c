// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn not_found_has_404_shape() {
    let body = ErrorBody::not_found("job job-1", 1_000);
    assert_eq!(body.error, "not_found");
    assert_eq!(body.status, Some(404));
    assert!(body.message.contains("job-1"));
}

#[test]
fn optional_fields_are_omitted() {
    let body = ErrorBody::new("oops", "something broke", 1_000);
    let value = serde_json::to_value(&body).unwrap();
    assert!(value.get("status").is_none());
    assert!(value.get("details").is_none());
}

#[test]
fn round_trip_with_details() {
    let body = ErrorBody::invalid("bad path", 2_000)
        .with_details(serde_json::json!({ "field": "repository_path" }));
    let json = serde_json::to_string(&body).unwrap();
    let back: ErrorBody = serde_json::from_str(&json).unwrap();
    assert_eq!(back, body);
    assert_eq!(back.status, Some(400));
}
