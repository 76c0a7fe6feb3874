use gridwatch_telemetry::{metrics, new_request_ids, record_heartbeat_received};

#[test]
fn request_ids_non_empty() {
    let ids = new_request_ids();
    assert!(!ids.request_id.is_empty());
    assert!(!ids.trace_id.is_empty());
}

#[test]
fn metrics_counters_accumulate() {
    let before = metrics().snapshot().heartbeats_received;
    record_heartbeat_received();
    record_heartbeat_received();
    let after = metrics().snapshot().heartbeats_received;
    assert!(after >= before + 2);
}
