use quill_telemetry::{metrics, new_request_ids, record_logout, record_sessions_purged};

#[test]
fn request_ids_non_empty() {
    let ids = new_request_ids();
    assert!(!ids.request_id.is_empty());
    assert!(!ids.trace_id.is_empty());
    assert_ne!(ids.request_id, ids.trace_id);
}

#[test]
fn counters_accumulate() {
    let before = metrics().snapshot();
    record_logout();
    record_sessions_purged(3);
    let after = metrics().snapshot();
    assert!(after.logouts >= before.logouts + 1);
    assert!(after.sessions_purged >= before.sessions_purged + 3);
}
