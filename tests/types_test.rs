use hmc_exporter::console::types::{ApiErrorBody, LogonResponse, RawResource};
use serde_json::json;

fn object(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
    value.as_object().cloned().unwrap()
}

#[test]
fn test_listing_entry_with_object_uri() {
    let raw = RawResource::from_listing(object(json!({
        "object-uri": "/api/partitions/p1",
        "name": "P1",
        "status": "active"
    })))
    .expect("entry has a URI");

    assert_eq!(raw.uri, "/api/partitions/p1");
    assert_eq!(raw.properties["status"], "active");
}

#[test]
fn test_listing_entry_with_element_uri() {
    let raw = RawResource::from_listing(object(json!({
        "element-uri": "/api/storage-groups/g1/storage-volumes/v1",
        "name": "VOL1"
    })))
    .expect("entry has a URI");

    assert_eq!(raw.uri, "/api/storage-groups/g1/storage-volumes/v1");
}

#[test]
fn test_listing_entry_without_uri_is_skipped() {
    assert!(RawResource::from_listing(object(json!({"name": "orphan"}))).is_none());
    assert!(RawResource::from_listing(object(json!({"object-uri": 42}))).is_none());
}

#[test]
fn test_deserialize_logon_response() {
    let logon: LogonResponse = serde_json::from_value(json!({
        "api-session": "abc123",
        "notification-topic": "topic.1",
        "api-major-version": 4
    }))
    .expect("Failed to parse logon response");

    assert_eq!(logon.api_session, "abc123");
}

#[test]
fn test_deserialize_api_error_body() {
    let body: ApiErrorBody = serde_json::from_value(json!({
        "http-status": 403,
        "reason": 5,
        "message": "The API session token is not valid",
        "request-method": "GET"
    }))
    .expect("Failed to parse error body");

    assert_eq!(body.http_status, Some(403));
    assert_eq!(body.reason, 5);
    assert!(body.message.contains("session"));
}

#[test]
fn test_api_error_body_fields_default() {
    let body: ApiErrorBody = serde_json::from_value(json!({})).unwrap();

    assert_eq!(body.http_status, None);
    assert_eq!(body.reason, 0);
    assert!(body.message.is_empty());
}
