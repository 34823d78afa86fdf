use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::error;

use crate::checker::{Checker, CheckerRegistry};
use crate::target::Target;
use crate::CheckResult;

/// Last known state of a target
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetState {
    /// No probe of the current generation has completed yet
    #[default]
    Unknown,
    Online,
    Offline,
}

impl TargetState {
    /// Online only for a healthy answer; errors and unhealthy answers are
    /// both offline
    pub fn from_result(result: &CheckResult) -> Self {
        match result {
            Ok(true) => TargetState::Online,
            Ok(false) | Err(_) => TargetState::Offline,
        }
    }
}

impl fmt::Display for TargetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetState::Unknown => write!(f, "unknown"),
            TargetState::Online => write!(f, "online"),
            TargetState::Offline => write!(f, "offline"),
        }
    }
}

/// One row of the status listing handed to the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetStatus {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: TargetState,
}

/// A target, the checker resolved for it and its last known state
pub struct StatusEntry {
    target: Arc<Target>,
    checker: Option<Arc<dyn Checker>>,
    state: TargetState,
}

impl StatusEntry {
    pub fn target(&self) -> &Arc<Target> {
        &self.target
    }

    /// `None` when the target's type is unknown or its address is invalid
    pub fn checker(&self) -> Option<&Arc<dyn Checker>> {
        self.checker.as_ref()
    }

    pub fn state(&self) -> TargetState {
        self.state
    }
}

/// Status of every target of one configuration generation, in config order
#[derive(Default)]
pub struct StatusTable {
    entries: Vec<StatusEntry>,
}

impl StatusTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve each target's checker once; unknown types and addresses the
    /// checker rejects are logged as configuration errors and left without
    /// a checker
    pub fn load(targets: Vec<Target>, registry: &CheckerRegistry) -> Self {
        let entries = targets
            .into_iter()
            .map(|target| {
                let checker = match registry.get(&target.kind) {
                    Some(checker) => match checker.validate(&target) {
                        Ok(()) => Some(checker),
                        Err(e) => {
                            error!(target = %target.name, kind = %target.kind, error = %e, "invalid target");
                            None
                        }
                    },
                    None => {
                        error!(target = %target.name, kind = %target.kind, url = %target.url, "unknown type");
                        None
                    }
                };

                StatusEntry { target: Arc::new(target), checker, state: TargetState::Unknown }
            })
            .collect();

        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[StatusEntry] {
        &self.entries
    }

    /// Returns false when `index` is out of range
    pub fn set(&mut self, index: usize, state: TargetState) -> bool {
        match self.entries.get_mut(index) {
            Some(entry) => {
                entry.state = state;
                true
            }
            None => false,
        }
    }

    pub fn snapshot(&self) -> Vec<TargetStatus> {
        self.entries
            .iter()
            .map(|e| TargetStatus {
                name: e.target.name.clone(),
                kind: e.target.kind.clone(),
                url: e.target.url.clone(),
                description: e.target.description.clone(),
                status: e.state,
            })
            .collect()
    }
}
