//! Per-run outcome log and the summary printed by the tools.

use std::fmt;

use anacan_shared::ProvisioningOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Database,
    Collection,
    Attribute,
    Index,
    Document,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRecord {
    pub kind: ResourceKind,
    /// e.g. `posts`, `posts.slug`, `posts[slug=hello]`
    pub resource: String,
    pub outcome: ProvisioningOutcome,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub created: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "created: {}, skipped (already exists): {}, failed: {}",
            self.created, self.skipped, self.failed
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct Report {
    pub steps: Vec<StepRecord>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, kind: ResourceKind, resource: impl Into<String>, outcome: ProvisioningOutcome) {
        self.steps.push(StepRecord {
            kind,
            resource: resource.into(),
            outcome,
        });
    }

    pub fn outcome_of(&self, kind: ResourceKind, resource: &str) -> Option<&ProvisioningOutcome> {
        self.steps
            .iter()
            .find(|s| s.kind == kind && s.resource == resource)
            .map(|s| &s.outcome)
    }

    pub fn summary(&self) -> Summary {
        let mut summary = Summary::default();
        for step in &self.steps {
            match step.outcome {
                ProvisioningOutcome::Created => summary.created += 1,
                ProvisioningOutcome::AlreadyExists => summary.skipped += 1,
                ProvisioningOutcome::Failed(_) => summary.failed += 1,
            }
        }
        summary
    }

    /// Failures at collection granularity make the run unsuccessful.
    pub fn has_fatal(&self) -> bool {
        self.steps.iter().any(|s| {
            matches!(s.kind, ResourceKind::Database | ResourceKind::Collection)
                && s.outcome.is_failed()
        })
    }

    pub fn failures(&self) -> impl Iterator<Item = &StepRecord> {
        self.steps.iter().filter(|s| s.outcome.is_failed())
    }
}
