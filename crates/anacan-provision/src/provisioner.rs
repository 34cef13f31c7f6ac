//! Schema provisioner.
//!
//! Walks the schema catalog in order: database, then for each collection the
//! collection itself, its attributes, then its indexes. Every step is an
//! idempotent create, so running the provisioner against a fully provisioned
//! database changes nothing and reports every resource as already existing.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{error, info, warn};

use anacan_shared::constants::DATABASE_NAME;
use anacan_shared::{FailureReason, ProvisioningOutcome, SchemaDefinition};

use crate::error::ProvisionError;
use crate::report::{Report, ResourceKind};
use crate::retry::{call_with_retry, run_with_retry, RetryPolicy};
use crate::service::SchemaService;
use crate::settle::SettlePolicy;

pub struct Provisioner {
    service: Arc<dyn SchemaService>,
    database_id: String,
    retry: RetryPolicy,
    settle: SettlePolicy,
}

impl Provisioner {
    pub fn new(service: Arc<dyn SchemaService>, database_id: impl Into<String>) -> Self {
        Self {
            service,
            database_id: database_id.into(),
            retry: RetryPolicy::default(),
            settle: SettlePolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_settle(mut self, settle: SettlePolicy) -> Self {
        self.settle = settle;
        self
    }

    /// Provision every definition, in order.
    ///
    /// Definitions are validated before any remote call. Failing to ensure
    /// the database aborts the run; a failed collection skips its attributes
    /// and indexes and the run moves on to the next collection.
    pub async fn run(&self, definitions: &[SchemaDefinition]) -> Result<Report, ProvisionError> {
        for definition in definitions {
            definition.validate()?;
        }

        let mut report = Report::new();
        let outcome = self.ensure_database().await?;
        report.record(ResourceKind::Database, self.database_id.as_str(), outcome);

        for definition in definitions {
            self.provision_collection(definition, &mut report).await;
        }

        let summary = report.summary();
        info!(database = %self.database_id, %summary, "Provisioning finished");
        Ok(report)
    }

    async fn ensure_database(&self) -> Result<ProvisioningOutcome, ProvisionError> {
        let service = self.service.as_ref();
        let database_id = self.database_id.as_str();

        let probe = format!("database:{database_id}");
        let found =
            call_with_retry(&self.retry, &probe, move || service.get_database(database_id)).await;
        match found {
            Ok(()) => {
                info!(database = database_id, "Database already exists");
                return Ok(ProvisioningOutcome::AlreadyExists);
            }
            Err(e) if e.is_not_found() => {
                info!(database = database_id, "Database not found, creating");
            }
            Err(e) => {
                return Err(ProvisionError::Database {
                    database_id: database_id.to_string(),
                    reason: e.to_string(),
                });
            }
        }

        let outcome = run_with_retry(&self.retry, &probe, move || {
            service.create_database(database_id, DATABASE_NAME)
        })
        .await;

        match outcome {
            ProvisioningOutcome::Failed(reason) => Err(ProvisionError::Database {
                database_id: database_id.to_string(),
                reason: reason.to_string(),
            }),
            present => Ok(present),
        }
    }

    async fn provision_collection(&self, definition: &SchemaDefinition, report: &mut Report) {
        let service = self.service.as_ref();
        let database_id = self.database_id.as_str();
        let collection_id = definition.collection_id.as_str();

        let outcome = run_with_retry(&self.retry, collection_id, move || {
            service.create_collection(database_id, definition)
        })
        .await;
        let collection_ok = outcome.is_present();
        report.record(ResourceKind::Collection, collection_id, outcome);

        if !collection_ok {
            error!(
                collection = collection_id,
                attributes = definition.attributes.len(),
                indexes = definition.indexes.len(),
                "Collection unavailable, skipping its attributes and indexes"
            );
            return;
        }

        let mut present: HashMap<&str, bool> = HashMap::new();
        for attribute in &definition.attributes {
            let resource = format!("{collection_id}.{}", attribute.key);
            let outcome = run_with_retry(&self.retry, &resource, move || {
                service.create_attribute(database_id, collection_id, attribute)
            })
            .await;

            if outcome == ProvisioningOutcome::Created {
                self.settle
                    .wait_for_attribute(service, database_id, collection_id, &attribute.key)
                    .await;
            }
            present.insert(attribute.key.as_str(), outcome.is_present());
            report.record(ResourceKind::Attribute, resource, outcome);
        }

        for index in &definition.indexes {
            let resource = format!("{collection_id}.{}", index.key);
            let missing: Vec<&str> = index
                .attribute_keys
                .iter()
                .map(String::as_str)
                .filter(|key| !present.get(key).copied().unwrap_or(false))
                .collect();
            if !missing.is_empty() {
                let reason = format!("attributes not available: {}", missing.join(", "));
                warn!(index = %resource, %reason, "Skipping index");
                report.record(
                    ResourceKind::Index,
                    resource,
                    ProvisioningOutcome::Failed(FailureReason::Skipped(reason)),
                );
                continue;
            }

            let outcome = run_with_retry(&self.retry, &resource, move || {
                service.create_index(database_id, collection_id, index)
            })
            .await;
            if outcome == ProvisioningOutcome::Created {
                self.settle.pause().await;
            }
            report.record(ResourceKind::Index, resource, outcome);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryBackend;
    use anacan_shared::catalog::schema_catalog;
    use anacan_shared::{AttributeSpec, IndexSpec};

    fn provisioner(backend: &Arc<InMemoryBackend>) -> Provisioner {
        Provisioner::new(backend.clone(), "anacan")
            .with_retry(RetryPolicy::immediate(3))
            .with_settle(SettlePolicy::none())
    }

    fn posts() -> SchemaDefinition {
        SchemaDefinition::new("posts", "Posts")
            .attribute(AttributeSpec::string("title", 255).required())
            .attribute(AttributeSpec::string("slug", 255).required())
            .attribute(AttributeSpec::string("category_id", 64))
            .index(IndexSpec::unique("idx_slug", &["slug"]))
            .index(IndexSpec::key("idx_category", &["category_id"]))
    }

    fn tags() -> SchemaDefinition {
        SchemaDefinition::new("tags", "Tags").attribute(AttributeSpec::string("name", 64))
    }

    #[tokio::test]
    async fn test_fresh_database_is_created() {
        let backend = Arc::new(InMemoryBackend::new());
        let report = provisioner(&backend).run(&[posts()]).await.unwrap();

        assert_eq!(
            report.outcome_of(ResourceKind::Database, "anacan"),
            Some(&ProvisioningOutcome::Created)
        );
        assert_eq!(report.summary().created, 1 + 1 + 3 + 2);
        assert_eq!(report.summary().failed, 0);
        assert_eq!(
            backend.attribute_keys("posts").await,
            vec!["title", "slug", "category_id"]
        );
        assert_eq!(backend.index_keys("posts").await, vec!["idx_slug", "idx_category"]);
    }

    #[tokio::test]
    async fn test_second_run_changes_nothing() {
        let backend = Arc::new(InMemoryBackend::new());
        let provisioner = provisioner(&backend);
        provisioner.run(&[posts()]).await.unwrap();
        let calls_after_first = backend.calls().await;

        let report = provisioner.run(&[posts()]).await.unwrap();
        let summary = report.summary();
        assert_eq!(summary.created, 0);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.skipped, report.steps.len());
        assert_eq!(backend.calls().await, calls_after_first);
    }

    #[tokio::test]
    async fn test_attribute_created_before_dependent_index() {
        let backend = Arc::new(InMemoryBackend::new());
        provisioner(&backend).run(&[posts()]).await.unwrap();

        let calls = backend.calls().await;
        let position = |label: &str| calls.iter().position(|c| c == label).unwrap();
        assert!(position("attribute:posts.slug") < position("index:posts.idx_slug"));
        assert!(position("collection:posts") < position("attribute:posts.title"));
    }

    #[tokio::test]
    async fn test_collection_failure_skips_children_and_continues() {
        let backend = Arc::new(InMemoryBackend::new());
        backend.fail_fatal("collection:posts", "quota exceeded").await;

        let report = provisioner(&backend).run(&[posts(), tags()]).await.unwrap();

        assert!(report.has_fatal());
        assert!(matches!(
            report.outcome_of(ResourceKind::Collection, "posts"),
            Some(ProvisioningOutcome::Failed(FailureReason::Other(_)))
        ));
        assert!(report.outcome_of(ResourceKind::Attribute, "posts.slug").is_none());
        assert_eq!(
            report.outcome_of(ResourceKind::Collection, "tags"),
            Some(&ProvisioningOutcome::Created)
        );
        assert_eq!(backend.attribute_keys("tags").await, vec!["name"]);
    }

    #[tokio::test]
    async fn test_failed_attribute_skips_dependent_index_only() {
        let backend = Arc::new(InMemoryBackend::new());
        backend.fail_fatal("attribute:posts.slug", "invalid size").await;

        let report = provisioner(&backend).run(&[posts()]).await.unwrap();

        assert!(!report.has_fatal());
        assert!(matches!(
            report.outcome_of(ResourceKind::Index, "posts.idx_slug"),
            Some(ProvisioningOutcome::Failed(FailureReason::Skipped(_)))
        ));
        assert_eq!(
            report.outcome_of(ResourceKind::Attribute, "posts.category_id"),
            Some(&ProvisioningOutcome::Created)
        );
        assert_eq!(
            report.outcome_of(ResourceKind::Index, "posts.idx_category"),
            Some(&ProvisioningOutcome::Created)
        );
        assert!(!backend.calls().await.contains(&"index:posts.idx_slug".to_string()));
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let backend = Arc::new(InMemoryBackend::new());
        backend.fail_transient("collection:posts", 2).await;
        backend.fail_transient("attribute:posts.slug", 1).await;

        let report = provisioner(&backend).run(&[posts()]).await.unwrap();
        assert_eq!(report.summary().failed, 0);
        assert!(backend.has_collection("posts").await);
    }

    #[tokio::test]
    async fn test_retry_budget_exhausted_reports_network() {
        let backend = Arc::new(InMemoryBackend::new());
        backend.fail_transient("index:posts.idx_slug", 5).await;

        let report = provisioner(&backend).run(&[posts()]).await.unwrap();
        assert_eq!(
            report.outcome_of(ResourceKind::Index, "posts.idx_slug"),
            Some(&ProvisioningOutcome::Failed(FailureReason::Network))
        );
    }

    #[tokio::test]
    async fn test_database_failure_aborts() {
        let backend = Arc::new(InMemoryBackend::new());
        backend.fail_fatal("database", "unauthorized").await;

        let err = provisioner(&backend).run(&[posts()]).await.unwrap_err();
        assert!(matches!(err, ProvisionError::Database { .. }));
        assert!(!backend.has_collection("posts").await);
    }

    #[tokio::test]
    async fn test_database_probe_retries_transport_failures() {
        let backend = Arc::new(InMemoryBackend::new());
        backend.fail_transient("database:get", 2).await;

        let report = provisioner(&backend).run(&[tags()]).await.unwrap();
        assert_eq!(
            report.outcome_of(ResourceKind::Database, "anacan"),
            Some(&ProvisioningOutcome::Created)
        );
        assert!(backend.has_collection("tags").await);

        backend.fail_transient("database:get", 2).await;
        let report = provisioner(&backend).run(&[tags()]).await.unwrap();
        assert_eq!(
            report.outcome_of(ResourceKind::Database, "anacan"),
            Some(&ProvisioningOutcome::AlreadyExists)
        );
    }

    #[tokio::test]
    async fn test_database_probe_error_aborts_without_create() {
        let backend = Arc::new(InMemoryBackend::new());
        backend.fail_fatal("database:get", "invalid api key").await;

        let err = provisioner(&backend).run(&[posts()]).await.unwrap_err();
        assert!(matches!(err, ProvisionError::Database { .. }));
        assert!(backend.calls().await.is_empty());
        assert!(!backend.has_collection("posts").await);
    }

    #[tokio::test]
    async fn test_invalid_definition_makes_no_calls() {
        let backend = Arc::new(InMemoryBackend::new());
        let broken = SchemaDefinition::new("broken", "Broken")
            .index(IndexSpec::key("idx_missing", &["missing"]));

        let err = provisioner(&backend).run(&[posts(), broken]).await.unwrap_err();
        assert!(matches!(err, ProvisionError::Schema(_)));
        assert!(backend.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_full_catalog_provisions() {
        let backend = Arc::new(InMemoryBackend::new());
        let catalog = schema_catalog();
        let report = provisioner(&backend).run(&catalog).await.unwrap();

        assert_eq!(report.summary().failed, 0);
        for definition in &catalog {
            assert!(backend.has_collection(&definition.collection_id).await);
            assert_eq!(
                backend.index_keys(&definition.collection_id).await.len(),
                definition.indexes.len()
            );
        }
    }
}
