// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn artifact(tag: &str) -> ScanArtifact {
    ScanArtifact::new(serde_json::json!({ "tag": tag }))
}

fn fp(s: &str) -> Fingerprint {
    Fingerprint::new(s)
}

#[test]
fn put_lookup_round_trip() {
    let cache = ScanCache::new();
    cache.put(
        fp("a"),
        "/repos/a".into(),
        artifact("one"),
        Duration::from_secs(60),
        1_000,
    );
    assert_eq!(cache.lookup(&fp("a"), 1_500), Some(artifact("one")));
    assert_eq!(cache.lookup(&fp("b"), 1_500), None);
}

#[test]
fn expired_entries_are_lazily_evicted() {
    let cache = ScanCache::new();
    cache.put(
        fp("a"),
        "/repos/a".into(),
        artifact("one"),
        Duration::from_millis(100),
        1_000,
    );
    assert!(cache.lookup(&fp("a"), 1_099).is_some());
    assert!(cache.lookup(&fp("a"), 1_100).is_none());
    assert!(cache.is_empty());
}

#[test]
fn acquire_hit_short_circuits() {
    let cache = ScanCache::new();
    cache.put(
        fp("a"),
        "/repos/a".into(),
        artifact("one"),
        Duration::from_secs(60),
        1_000,
    );
    match cache.acquire(&fp("a"), 1_500) {
        Acquired::Hit(a) => assert_eq!(a, artifact("one")),
        _ => panic!("expected hit"),
    }
}

#[tokio::test]
async fn single_flight_leader_then_waiters() {
    let cache = ScanCache::new();

    let leader = match cache.acquire(&fp("a"), 1_000) {
        Acquired::Leader(guard) => guard,
        _ => panic!("first caller should lead"),
    };
    let waiter = match cache.acquire(&fp("a"), 1_000) {
        Acquired::Waiter(rx) => rx,
        _ => panic!("second caller should wait"),
    };
    let other = match cache.acquire(&fp("a"), 1_000) {
        Acquired::Waiter(rx) => rx,
        _ => panic!("third caller should wait"),
    };

    leader.complete("/repos/a".into(), artifact("built"), Duration::from_secs(60), 1_000);

    assert_eq!(waiter.await.unwrap().unwrap(), artifact("built"));
    assert_eq!(other.await.unwrap().unwrap(), artifact("built"));
    // The artifact is now cached for later callers
    assert_eq!(cache.lookup(&fp("a"), 1_500), Some(artifact("built")));
}

#[tokio::test]
async fn leader_failure_propagates_to_waiters() {
    let cache = ScanCache::new();
    let leader = match cache.acquire(&fp("a"), 1_000) {
        Acquired::Leader(guard) => guard,
        _ => panic!("expected leader"),
    };
    let waiter = match cache.acquire(&fp("a"), 1_000) {
        Acquired::Waiter(rx) => rx,
        _ => panic!("expected waiter"),
    };

    leader.fail(JobError::transient("analyzer crashed"));

    let err = waiter.await.unwrap().unwrap_err();
    assert_eq!(err.message, "analyzer crashed");
    // Nothing cached; the next caller leads a fresh build
    assert!(matches!(cache.acquire(&fp("a"), 1_000), Acquired::Leader(_)));
}

#[tokio::test]
async fn dropped_leader_fails_waiters_instead_of_hanging() {
    let cache = ScanCache::new();
    let leader = match cache.acquire(&fp("a"), 1_000) {
        Acquired::Leader(guard) => guard,
        _ => panic!("expected leader"),
    };
    let waiter = match cache.acquire(&fp("a"), 1_000) {
        Acquired::Waiter(rx) => rx,
        _ => panic!("expected waiter"),
    };

    drop(leader);

    let err = waiter.await.unwrap().unwrap_err();
    assert!(err.message.contains("abandoned"));
}

#[test]
fn invalidate_by_fingerprint_and_repo() {
    let cache = ScanCache::new();
    cache.put(fp("a"), "/repos/a".into(), artifact("1"), Duration::from_secs(60), 0);
    cache.put(fp("b"), "/repos/a".into(), artifact("2"), Duration::from_secs(60), 0);
    cache.put(fp("c"), "/repos/b".into(), artifact("3"), Duration::from_secs(60), 0);

    assert_eq!(cache.invalidate(&fp("a")), 1);
    assert_eq!(cache.invalidate(&fp("a")), 0);
    assert_eq!(cache.invalidate_repo(Path::new("/repos/a")), 1);
    assert_eq!(cache.invalidate_repo(Path::new("/repos/missing")), 0);
    assert_eq!(cache.len(), 1);
}

#[test]
fn status_reports_entries_and_in_flight() {
    let cache = ScanCache::new();
    cache.put(fp("a"), "/repos/a".into(), artifact("1"), Duration::from_secs(60), 0);
    let _leader = match cache.acquire(&fp("b"), 0) {
        Acquired::Leader(guard) => guard,
        _ => panic!("expected leader"),
    };

    let status = cache.status();
    assert_eq!(status.entries, 1);
    assert_eq!(status.in_flight, 1);
    assert_eq!(status.repositories, vec![PathBuf::from("/repos/a")]);
}

#[test]
fn fingerprints_are_stable_and_distinct() {
    let a = scan_fingerprint(Path::new("/repos/a"), "sha1", "v1", "opts");
    let same = scan_fingerprint(Path::new("/repos/a"), "sha1", "v1", "opts");
    assert_eq!(a, same);

    for other in [
        scan_fingerprint(Path::new("/repos/b"), "sha1", "v1", "opts"),
        scan_fingerprint(Path::new("/repos/a"), "sha2", "v1", "opts"),
        scan_fingerprint(Path::new("/repos/a"), "sha1", "v2", "opts"),
        scan_fingerprint(Path::new("/repos/a"), "sha1", "v1", "other"),
    ] {
        assert_ne!(a, other);
    }
}

#[test]
fn option_hash_ignores_key_order() {
    let a = option_hash(&serde_json::json!({ "x": 1, "y": 2 }));
    let b = option_hash(&serde_json::json!({ "y": 2, "x": 1 }));
    assert_eq!(a, b);
}
