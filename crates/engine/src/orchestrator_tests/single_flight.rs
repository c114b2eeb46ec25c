// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end single-flight: two concurrent scan jobs with the same
//! fingerprint share one underlying build.

use super::*;
use crate::cache::{scan_fingerprint, Acquired, ScanCache};
use sweep_adapters::{FakeAnalyzer, ScanAnalyzer, ScanRequest};
use sweep_core::JobError;

/// Minimal scan pipeline over the cache, mirroring the daemon's worker.
struct CachingScanWorker {
    cache: ScanCache,
    analyzer: Arc<FakeAnalyzer>,
}

#[async_trait]
impl JobHandler for CachingScanWorker {
    fn job_type(&self) -> &str {
        "scan"
    }

    async fn run(&self, ctx: JobContext) -> Result<serde_json::Value, JobError> {
        let repo = std::path::PathBuf::from(
            ctx.job.data.get("repo").and_then(|v| v.as_str()).unwrap_or(""),
        );
        let fingerprint = scan_fingerprint(&repo, "headsha", self.analyzer.version(), "opts");
        let now = ctx.job.created_at_ms;
        match self.cache.acquire(&fingerprint, now) {
            Acquired::Hit(artifact) => {
                ctx.publish(Event::CacheHit {
                    fingerprint,
                    job_id: ctx.job.id.clone(),
                });
                serde_json::to_value(&artifact).map_err(|e| JobError::internal(e.to_string()))
            }
            Acquired::Leader(guard) => {
                ctx.publish(Event::CacheMiss {
                    fingerprint: fingerprint.clone(),
                    job_id: ctx.job.id.clone(),
                });
                let request = ScanRequest {
                    repository_path: repo.clone(),
                    commit_sha: "headsha".to_string(),
                    include_tests: false,
                    max_depth: None,
                };
                match self
                    .analyzer
                    .analyze(&request, &|_report| {}, ctx.cancel_token())
                    .await
                {
                    Ok(artifact) => {
                        guard.complete(repo, artifact.clone(), Duration::from_secs(60), now);
                        serde_json::to_value(&artifact)
                            .map_err(|e| JobError::internal(e.to_string()))
                    }
                    Err(error) => {
                        guard.fail(error.clone());
                        Err(error)
                    }
                }
            }
            Acquired::Waiter(waiter) => match waiter.await {
                Ok(Ok(artifact)) => {
                    serde_json::to_value(&artifact).map_err(|e| JobError::internal(e.to_string()))
                }
                Ok(Err(error)) => Err(error),
                Err(_) => Err(JobError::internal("scan leader went away")),
            },
        }
    }
}

#[tokio::test]
async fn concurrent_identical_scans_build_once() {
    let orch = engine(fast_config());
    let analyzer = Arc::new(FakeAnalyzer::new().with_delay(Duration::from_millis(150)));
    let cache = ScanCache::new();
    orch.register(Arc::new(CachingScanWorker {
        cache: cache.clone(),
        analyzer: Arc::clone(&analyzer),
    }));
    orch.start();
    let mut stream = orch.subscribe();

    let data = serde_json::json!({ "repo": "/repos/a" });
    let first = orch.create_job("scan", data.clone()).unwrap();
    let second = orch.create_job("scan", data).unwrap();

    let a = wait_for_status(&orch, &first, JobStatus::Completed, Duration::from_secs(5)).await;
    let b = wait_for_status(&orch, &second, JobStatus::Completed, Duration::from_secs(5)).await;

    // The builder ran exactly once; both jobs carry equal artifacts.
    assert_eq!(analyzer.calls(), 1);
    assert_eq!(a.result, b.result);
    assert!(a.result.is_some());

    let events = drain(&mut stream);
    let misses = events
        .iter()
        .filter(|e| matches!(e, Event::CacheMiss { .. }))
        .count();
    assert_eq!(misses, 1, "exactly one cache miss for the shared build");

    orch.shutdown();
}

#[tokio::test]
async fn later_scan_hits_the_cache() {
    let orch = engine(fast_config());
    let analyzer = Arc::new(FakeAnalyzer::new());
    let cache = ScanCache::new();
    orch.register(Arc::new(CachingScanWorker {
        cache: cache.clone(),
        analyzer: Arc::clone(&analyzer),
    }));
    orch.start();
    let mut stream = orch.subscribe();

    let data = serde_json::json!({ "repo": "/repos/a" });
    let first = orch.create_job("scan", data.clone()).unwrap();
    wait_for_status(&orch, &first, JobStatus::Completed, Duration::from_secs(5)).await;

    let second = orch.create_job("scan", data).unwrap();
    wait_for_status(&orch, &second, JobStatus::Completed, Duration::from_secs(5)).await;

    assert_eq!(analyzer.calls(), 1, "second scan served from cache");
    let events = drain(&mut stream);
    assert!(events.iter().any(|e| matches!(e, Event::CacheHit { .. })));

    orch.shutdown();
}

#[tokio::test]
async fn leader_failure_propagates_to_waiting_job() {
    let mut config = fast_config();
    // No retries: the shared failure should surface once, on both jobs.
    config.retry.absolute_max = 0;
    let orch = engine(config);
    let analyzer = Arc::new(
        FakeAnalyzer::new()
            .with_delay(Duration::from_millis(150))
            .fail_first(u32::MAX),
    );
    let cache = ScanCache::new();
    orch.register(Arc::new(CachingScanWorker {
        cache: cache.clone(),
        analyzer: Arc::clone(&analyzer),
    }));
    orch.start();

    let data = serde_json::json!({ "repo": "/repos/a" });
    let first = orch.create_job("scan", data.clone()).unwrap();
    let second = orch.create_job("scan", data).unwrap();

    let a = wait_for_status(&orch, &first, JobStatus::Failed, Duration::from_secs(5)).await;
    let b = wait_for_status(&orch, &second, JobStatus::Failed, Duration::from_secs(5)).await;

    assert_eq!(analyzer.calls(), 1, "one build failure shared by both");
    assert_eq!(
        a.error.unwrap().message,
        b.error.unwrap().message
    );

    orch.shutdown();
}
