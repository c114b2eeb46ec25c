// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use sweep_core::test_support::{completed_event, created_event, failed_event};
use sweep_core::{FakeClock, Fingerprint, JobError, JobId};
use yare::parameterized;

#[parameterized(
    created_is_activity = { created_event("job-1", "noop"), Channel::Activity },
    completed_is_activity = { completed_event("job-1", "noop"), Channel::Activity },
    failed_is_alert = { failed_event("job-1", "noop", JobError::transient("x")), Channel::Alerts },
)]
fn lifecycle_channel_mapping(event: Event, expected: Channel) {
    assert_eq!(channel_for(&event), expected);
}

#[test]
fn scan_cache_and_circuit_mapping() {
    let scan = Event::ScanStarted {
        job_id: JobId::new("job-1"),
        repository: "/repos/a".into(),
    };
    assert_eq!(channel_for(&scan), Channel::Scans);

    let cache = Event::CacheMiss {
        fingerprint: Fingerprint::new("fp"),
        job_id: JobId::new("job-1"),
    };
    assert_eq!(channel_for(&cache), Channel::Cache);

    let circuit = Event::CircuitOpened {
        fingerprint: Fingerprint::new("fp"),
    };
    assert_eq!(channel_for(&circuit), Channel::Alerts);
}

#[tokio::test]
async fn attached_adapter_converts_and_forwards() {
    let bus = EventBus::new(16);
    let (adapter, mut out_rx) = BroadcastAdapter::new(16);
    let handle = adapter.attach(&bus, FakeClock::at(7_000));

    bus.publish(created_event("job-1", "noop"));

    let message = tokio::time::timeout(std::time::Duration::from_secs(1), out_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(message.kind, "job:created");
    assert_eq!(message.channel, Channel::Activity);
    assert_eq!(message.timestamp, 7_000);
    assert_eq!(message.payload["id"], "job-1");

    handle.abort();
}

#[test]
fn saturated_transport_drops_and_counts() {
    let (adapter, _out_rx) = BroadcastAdapter::new(1);
    let stats = StatsBody::default();
    adapter.send_stats(&stats, 1_000);
    adapter.send_stats(&stats, 2_000);
    adapter.send_stats(&stats, 3_000);
    assert_eq!(adapter.dropped_total(), 2);
}
