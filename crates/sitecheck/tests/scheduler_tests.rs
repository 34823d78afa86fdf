//! Scheduler behaviour against in-process fake checkers

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sitecheck::{
    CheckError, CheckResult, Checker, CheckerRegistry, RefreshMode, RefreshOutcome, RefreshPhase,
    Scheduler, Target, TargetState,
};
use tokio::sync::Notify;

struct Fixed(bool);

#[async_trait]
impl Checker for Fixed {
    async fn check(&self, _target: &Target) -> CheckResult {
        Ok(self.0)
    }
}

struct Failing;

#[async_trait]
impl Checker for Failing {
    async fn check(&self, _target: &Target) -> CheckResult {
        Err(CheckError::DeadlineExceeded)
    }
}

struct Counting {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Checker for Counting {
    async fn check(&self, _target: &Target) -> CheckResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }
}

struct Slow(Duration);

#[async_trait]
impl Checker for Slow {
    async fn check(&self, _target: &Target) -> CheckResult {
        tokio::time::sleep(self.0).await;
        Ok(true)
    }
}

/// The "slow" URL blocks until released and then reports unhealthy; every
/// other URL is healthy right away
struct Gated {
    release: Arc<Notify>,
    finished: Arc<Notify>,
}

#[async_trait]
impl Checker for Gated {
    async fn check(&self, target: &Target) -> CheckResult {
        if target.url != "slow" {
            return Ok(true);
        }
        self.release.notified().await;
        self.finished.notify_one();
        Ok(false)
    }
}

struct Panicking;

#[async_trait]
impl Checker for Panicking {
    async fn check(&self, _target: &Target) -> CheckResult {
        panic!("probe blew up");
    }
}

fn target(name: &str, kind: &str, url: &str) -> Target {
    Target::new(name, kind, url, Duration::from_secs(5))
}

fn states(rows: &[sitecheck::TargetStatus]) -> Vec<TargetState> {
    rows.iter().map(|r| r.status).collect()
}

#[tokio::test]
async fn test_blocking_refresh_settles_every_target() {
    let _ = tracing_subscriber::fmt::try_init();

    let registry = CheckerRegistry::new()
        .register("up", Fixed(true))
        .register("down", Fixed(false))
        .register("broken", Failing);
    let scheduler = Scheduler::new(Arc::new(registry), Duration::from_secs(60));

    scheduler
        .reload(vec![
            target("a", "up", "http://a"),
            target("b", "down", "http://b"),
            target("c", "broken", "http://c"),
            target("d", "fumble", "http://d"),
        ])
        .await;

    assert_eq!(
        states(&scheduler.snapshot().await),
        vec![TargetState::Unknown; 4],
        "a fresh generation starts unknown"
    );
    assert_eq!(scheduler.phase().await, RefreshPhase::Idle);

    let outcome = scheduler.refresh(RefreshMode::Wait).await;
    assert_eq!(outcome, RefreshOutcome::Dispatched { probes: 3 });

    assert_eq!(
        states(&scheduler.snapshot().await),
        vec![TargetState::Online, TargetState::Offline, TargetState::Offline, TargetState::Offline]
    );
    assert_eq!(scheduler.phase().await, RefreshPhase::Settled);
}

#[tokio::test]
async fn test_snapshot_preserves_config_order_and_fields() {
    let registry = CheckerRegistry::new().register("up", Fixed(true));
    let scheduler = Scheduler::new(Arc::new(registry), Duration::from_secs(60));

    scheduler
        .reload(vec![
            target("first", "up", "http://1").with_description("one"),
            target("second", "up", "http://2"),
        ])
        .await;
    scheduler.refresh(RefreshMode::Wait).await;

    let rows = scheduler.snapshot().await;
    assert_eq!(rows[0].name, "first");
    assert_eq!(rows[0].description.as_deref(), Some("one"));
    assert_eq!(rows[1].name, "second");
    assert_eq!(rows[1].kind, "up");
    assert_eq!(rows[1].url, "http://2");
}

#[tokio::test]
async fn test_empty_target_list() {
    let scheduler = Scheduler::new(Arc::new(CheckerRegistry::new()), Duration::from_secs(60));
    scheduler.reload(Vec::new()).await;

    let outcome = scheduler.refresh(RefreshMode::Wait).await;
    assert_eq!(outcome, RefreshOutcome::Dispatched { probes: 0 });
    assert!(scheduler.snapshot().await.is_empty());
}

#[tokio::test]
async fn test_debounce_suppresses_repeat_dispatch() {
    let calls = Arc::new(AtomicUsize::new(0));
    let registry = CheckerRegistry::new().register("count", Counting { calls: calls.clone() });
    let scheduler = Scheduler::new(Arc::new(registry), Duration::from_secs(60));

    let targets = vec![target("a", "count", "http://a")];
    scheduler.reload(targets.clone()).await;

    assert_eq!(scheduler.refresh(RefreshMode::Wait).await, RefreshOutcome::Dispatched { probes: 1 });
    assert_eq!(scheduler.refresh(RefreshMode::Wait).await, RefreshOutcome::Debounced);
    assert_eq!(scheduler.refresh(RefreshMode::NoWait).await, RefreshOutcome::Debounced);
    assert_eq!(calls.load(Ordering::SeqCst), 1, "debounced refreshes launch nothing");

    // A reload starts a new generation that has never been dispatched
    scheduler.reload(targets).await;
    assert_eq!(scheduler.refresh(RefreshMode::Wait).await, RefreshOutcome::Dispatched { probes: 1 });
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_back_to_back_non_blocking_refreshes_dispatch_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let registry = CheckerRegistry::new().register("count", Counting { calls: calls.clone() });
    let scheduler = Scheduler::new(Arc::new(registry), Duration::from_secs(60));

    scheduler
        .reload(vec![target("a", "count", "http://a"), target("b", "count", "http://b")])
        .await;

    assert_eq!(scheduler.refresh(RefreshMode::NoWait).await, RefreshOutcome::Dispatched { probes: 2 });
    assert_eq!(scheduler.refresh(RefreshMode::NoWait).await, RefreshOutcome::Debounced);

    // Settle the first dispatch before counting
    scheduler.refresh(RefreshMode::Wait).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_zero_debounce_always_dispatches() {
    let calls = Arc::new(AtomicUsize::new(0));
    let registry = CheckerRegistry::new().register("count", Counting { calls: calls.clone() });
    let scheduler = Scheduler::new(Arc::new(registry), Duration::ZERO);

    scheduler.reload(vec![target("a", "count", "http://a")]).await;
    for _ in 0..3 {
        assert_eq!(scheduler.refresh(RefreshMode::Wait).await, RefreshOutcome::Dispatched { probes: 1 });
    }
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_blocking_refresh_in_window_waits_for_inflight_batch() {
    let registry = CheckerRegistry::new().register("slow", Slow(Duration::from_millis(200)));
    let scheduler = Scheduler::new(Arc::new(registry), Duration::from_secs(60));

    scheduler
        .reload(vec![target("a", "slow", "http://a"), target("b", "slow", "http://b")])
        .await;

    assert_eq!(scheduler.refresh(RefreshMode::NoWait).await, RefreshOutcome::Dispatched { probes: 2 });
    assert_eq!(scheduler.phase().await, RefreshPhase::Dispatching);

    assert_eq!(scheduler.refresh(RefreshMode::Wait).await, RefreshOutcome::Debounced);
    assert_eq!(
        states(&scheduler.snapshot().await),
        vec![TargetState::Online, TargetState::Online],
        "a blocking caller never sees unknown"
    );
}

#[tokio::test]
async fn test_stale_result_is_discarded_after_reload() {
    let _ = tracing_subscriber::fmt::try_init();

    let release = Arc::new(Notify::new());
    let finished = Arc::new(Notify::new());
    let registry = CheckerRegistry::new().register(
        "gated",
        Gated { release: release.clone(), finished: finished.clone() },
    );
    let scheduler = Scheduler::new(Arc::new(registry), Duration::from_secs(60));

    let first = scheduler.reload(vec![target("svc", "gated", "slow")]).await;
    assert_eq!(scheduler.refresh(RefreshMode::NoWait).await, RefreshOutcome::Dispatched { probes: 1 });

    let second = scheduler.reload(vec![target("svc", "gated", "fast")]).await;
    assert_eq!(second, first + 1);
    assert_eq!(scheduler.generation().await, second);

    assert_eq!(scheduler.refresh(RefreshMode::Wait).await, RefreshOutcome::Dispatched { probes: 1 });
    assert_eq!(states(&scheduler.snapshot().await), vec![TargetState::Online]);

    // Let the first generation's probe report offline, then give its task
    // time to reach the table
    release.notify_one();
    finished.notified().await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(
        states(&scheduler.snapshot().await),
        vec![TargetState::Online],
        "a result from a replaced generation must not overwrite the table"
    );
}

#[tokio::test]
async fn test_panicking_probe_settles_offline() {
    let registry = CheckerRegistry::new()
        .register("boom", Panicking)
        .register("up", Fixed(true));
    let scheduler = Scheduler::new(Arc::new(registry), Duration::from_secs(60));

    scheduler
        .reload(vec![target("a", "boom", "http://a"), target("b", "up", "http://b")])
        .await;

    let outcome = tokio::time::timeout(Duration::from_secs(5), scheduler.refresh(RefreshMode::Wait))
        .await
        .expect("blocking refresh returned");
    assert_eq!(outcome, RefreshOutcome::Dispatched { probes: 2 });

    let rows = scheduler.snapshot().await;
    assert_eq!(rows[0].status, TargetState::Offline, "a dead probe task counts as a failed check");
    assert_eq!(rows[1].status, TargetState::Online);
    assert_eq!(scheduler.phase().await, RefreshPhase::Settled);
}

#[tokio::test]
async fn test_reload_during_blocking_refresh_settles_new_generation() {
    let registry = CheckerRegistry::new().register("slow", Slow(Duration::from_millis(200)));
    let scheduler = Scheduler::new(Arc::new(registry), Duration::from_secs(60));
    scheduler.reload(vec![target("a", "slow", "http://a")]).await;

    let waiter = {
        let scheduler = scheduler.clone();
        tokio::spawn(async move { scheduler.refresh(RefreshMode::Wait).await })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    let live = scheduler
        .reload(vec![target("a", "slow", "http://a"), target("b", "slow", "http://b")])
        .await;

    assert_eq!(waiter.await.unwrap(), RefreshOutcome::Dispatched { probes: 1 });
    assert_eq!(scheduler.generation().await, live);
    assert_eq!(
        states(&scheduler.snapshot().await),
        vec![TargetState::Online, TargetState::Online],
        "the blocking caller returns only once the live generation has settled"
    );
    assert_eq!(scheduler.phase().await, RefreshPhase::Settled);
}

#[tokio::test]
async fn test_concurrent_blocking_refreshes() {
    let calls = Arc::new(AtomicUsize::new(0));
    let registry = CheckerRegistry::new().register("count", Counting { calls: calls.clone() });
    let scheduler = Scheduler::new(Arc::new(registry), Duration::from_secs(60));
    scheduler
        .reload((0..8).map(|i| target(&format!("t{i}"), "count", &format!("http://{i}"))).collect())
        .await;

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let scheduler = scheduler.clone();
            tokio::spawn(async move { scheduler.refresh(RefreshMode::Wait).await })
        })
        .collect();

    let mut dispatched = 0;
    for handle in handles {
        if let RefreshOutcome::Dispatched { .. } = handle.await.unwrap() {
            dispatched += 1;
        }
    }

    assert_eq!(dispatched, 1, "only one caller dispatches within the window");
    assert_eq!(calls.load(Ordering::SeqCst), 8);
    assert!(states(&scheduler.snapshot().await).iter().all(|s| *s == TargetState::Online));
}
