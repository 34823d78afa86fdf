//! Refresh scheduler.
//!
//! A refresh fans out one task per target and writes results into the
//! status table. Results are tagged with the configuration generation that
//! launched them; a result whose generation has been replaced by a reload
//! is dropped on completion instead of cancelling the probe.
//!
//! The table lock is never held across a probe or across the blocking join.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinError;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::checker::{Checker, CheckerRegistry};
use crate::status::{StatusTable, TargetState, TargetStatus};
use crate::target::Target;
use crate::CheckResult;

/// Whether `refresh` returns before or after the probes complete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshMode {
    Wait,
    NoWait,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Probes were launched for every target with a checker
    Dispatched { probes: usize },
    /// The current generation was refreshed too recently; nothing launched
    Debounced,
}

/// Where the current generation stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshPhase {
    /// Not dispatched since the last reload
    Idle,
    /// Probes of the latest dispatch are still running
    Dispatching,
    /// Every probe of the latest dispatch has been applied or discarded
    Settled,
}

/// Pending-probe counter of one dispatch
#[derive(Clone)]
struct Batch {
    pending: Arc<watch::Sender<usize>>,
}

impl Batch {
    fn new(probes: usize) -> Self {
        let (pending, _) = watch::channel(probes);
        Self { pending: Arc::new(pending) }
    }

    fn is_done(&self) -> bool {
        *self.pending.borrow() == 0
    }

    async fn wait(&self) {
        let mut rx = self.pending.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = rx.wait_for(|pending| *pending == 0).await;
    }
}

/// Decrements the batch counter once a probe task has settled its entry
struct PendingGuard(Arc<watch::Sender<usize>>);

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.0.send_modify(|pending| *pending = pending.saturating_sub(1));
    }
}

struct State {
    generation: u64,
    dispatched: Option<u64>,
    next_allowed_refresh: Option<Instant>,
    table: StatusTable,
    batch: Option<Batch>,
}

struct Shared {
    registry: Arc<CheckerRegistry>,
    debounce: Duration,
    state: Mutex<State>,
}

impl Shared {
    /// Apply a finished probe if its generation is still live
    async fn complete(&self, index: usize, generation: u64, target: &Target, result: CheckResult) {
        let mut state = self.state.lock().await;
        if state.generation != generation {
            debug!(
                target = %target.name,
                url = %target.url,
                launched = generation,
                live = state.generation,
                "took too long, generation has passed; discarding result"
            );
            return;
        }

        state.table.set(index, TargetState::from_result(&result));
        drop(state);

        match result {
            Ok(true) => debug!(target = %target.name, kind = %target.kind, url = %target.url, "online"),
            Ok(false) => info!(target = %target.name, kind = %target.kind, url = %target.url, "service reports unhealthy"),
            Err(e) => warn!(target = %target.name, kind = %target.kind, url = %target.url, error = %e, "check failed"),
        }
    }

    /// A probe task that ended without a result leaves its entry offline
    async fn abandon(&self, index: usize, generation: u64, target: &Target, cause: JoinError) {
        error!(target = %target.name, kind = %target.kind, url = %target.url, error = %cause, "probe task died");

        let mut state = self.state.lock().await;
        if state.generation == generation {
            state.table.set(index, TargetState::Offline);
        }
    }
}

/// What a single pass of `refresh` did, and the batch a blocking caller joins
struct Dispatch {
    outcome: RefreshOutcome,
    generation: u64,
    batch: Option<Batch>,
}

/// Owns the status table and dispatches probes through the registry
#[derive(Clone)]
pub struct Scheduler {
    shared: Arc<Shared>,
}

impl Scheduler {
    /// `debounce` is the minimum interval between two dispatches of the same
    /// generation
    pub fn new(registry: Arc<CheckerRegistry>, debounce: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                registry,
                debounce,
                state: Mutex::new(State {
                    generation: 0,
                    dispatched: None,
                    next_allowed_refresh: None,
                    table: StatusTable::new(),
                    batch: None,
                }),
            }),
        }
    }

    /// Replace the target list wholesale and start a new generation.
    ///
    /// Every entry starts out unknown; probes still running for the previous
    /// generation become no-ops.
    pub async fn reload(&self, targets: Vec<Target>) -> u64 {
        let table = StatusTable::load(targets, &self.shared.registry);
        let count = table.len();
        let empty = table.is_empty();

        let mut state = self.shared.state.lock().await;
        state.generation += 1;
        state.table = table;
        state.batch = None;

        if empty {
            warn!(generation = state.generation, "configuration has no targets");
        } else {
            info!(generation = state.generation, targets = count, "configuration loaded");
        }
        state.generation
    }

    /// Probe every target of the current generation.
    ///
    /// Within the debounce window a refresh of an already dispatched
    /// generation launches nothing; with [`RefreshMode::Wait`] it still waits
    /// for the probes of the latest dispatch so the caller never sees an
    /// unknown state. A reload that lands during the wait sends the caller
    /// on to settle the new generation as well.
    pub async fn refresh(&self, mode: RefreshMode) -> RefreshOutcome {
        let first = self.dispatch().await;
        let outcome = first.outcome;
        if mode == RefreshMode::NoWait {
            return outcome;
        }

        let mut current = first;
        loop {
            if let Some(batch) = &current.batch {
                batch.wait().await;
            }

            let mut state = self.shared.state.lock().await;
            if state.generation == current.generation {
                if matches!(current.outcome, RefreshOutcome::Dispatched { .. }) {
                    state.next_allowed_refresh = Some(Instant::now() + self.shared.debounce);
                }
                break;
            }
            let live = state.generation;
            drop(state);

            debug!(joined = current.generation, live, "generation replaced during blocking refresh");
            current = self.dispatch().await;
        }

        outcome
    }

    /// Launch a batch for the live generation unless one is debounced
    async fn dispatch(&self) -> Dispatch {
        let mut state = self.shared.state.lock().await;
        let now = Instant::now();
        let generation = state.generation;

        let already_dispatched = state.dispatched == Some(generation);
        let in_window = state.next_allowed_refresh.is_some_and(|next| now < next);
        if already_dispatched && in_window {
            return Dispatch { outcome: RefreshOutcome::Debounced, generation, batch: state.batch.clone() };
        }

        let plan: Vec<(usize, Arc<Target>, Option<Arc<dyn Checker>>)> = state
            .table
            .entries()
            .iter()
            .enumerate()
            .map(|(index, entry)| (index, Arc::clone(entry.target()), entry.checker().cloned()))
            .collect();

        let probes = plan.iter().filter(|(_, _, checker)| checker.is_some()).count();
        let batch = Batch::new(probes);

        for (index, target, checker) in plan {
            let Some(checker) = checker else {
                error!(target = %target.name, kind = %target.kind, url = %target.url, "no usable checker, marking offline");
                state.table.set(index, TargetState::Offline);
                continue;
            };

            state.table.set(index, TargetState::Unknown);
            self.launch(index, generation, target, checker, &batch);
        }

        state.dispatched = Some(generation);
        state.next_allowed_refresh = Some(now + self.shared.debounce);
        state.batch = Some(batch.clone());
        drop(state);

        debug!(generation, probes, "dispatched refresh");
        Dispatch { outcome: RefreshOutcome::Dispatched { probes }, generation, batch: Some(batch) }
    }

    fn launch(
        &self,
        index: usize,
        generation: u64,
        target: Arc<Target>,
        checker: Arc<dyn Checker>,
        batch: &Batch,
    ) {
        let shared = Arc::clone(&self.shared);
        let guard = PendingGuard(Arc::clone(&batch.pending));

        tokio::spawn(async move {
            let _guard = guard;

            let probe = {
                let target = Arc::clone(&target);
                tokio::spawn(async move { checker.check(&target).await })
            };

            match probe.await {
                Ok(result) => shared.complete(index, generation, &target, result).await,
                Err(cause) => shared.abandon(index, generation, &target, cause).await,
            }
        });
    }

    /// Rows for the presentation layer, in configuration order
    pub async fn snapshot(&self) -> Vec<TargetStatus> {
        self.shared.state.lock().await.table.snapshot()
    }

    pub async fn generation(&self) -> u64 {
        self.shared.state.lock().await.generation
    }

    pub async fn phase(&self) -> RefreshPhase {
        let state = self.shared.state.lock().await;
        if state.dispatched != Some(state.generation) {
            return RefreshPhase::Idle;
        }
        match &state.batch {
            Some(batch) if !batch.is_done() => RefreshPhase::Dispatching,
            _ => RefreshPhase::Settled,
        }
    }
}
