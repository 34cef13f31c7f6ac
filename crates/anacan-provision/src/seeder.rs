//! Demo content loader.
//!
//! Each seed is looked up by its natural key before it is created, so running
//! the seeder twice never duplicates a record. A failing seed is reported and
//! the run continues with the next one.

use std::sync::Arc;

use tracing::{error, info};

use anacan_shared::constants::UNIQUE_ID;
use anacan_shared::{FailureReason, ProvisioningOutcome, SeedRecord};

use crate::error::{ErrorClass, RemoteError};
use crate::query::Query;
use crate::report::{Report, ResourceKind};
use crate::retry::{call_with_retry, run_with_retry, RetryPolicy};
use crate::service::DocumentService;

pub struct Seeder {
    service: Arc<dyn DocumentService>,
    database_id: String,
    retry: RetryPolicy,
}

impl Seeder {
    pub fn new(service: Arc<dyn DocumentService>, database_id: impl Into<String>) -> Self {
        Self {
            service,
            database_id: database_id.into(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub async fn run(&self, seeds: &[SeedRecord]) -> Report {
        let mut report = Report::new();
        for seed in seeds {
            let outcome = self.seed_one(seed).await;
            report.record(ResourceKind::Document, seed.label(), outcome);
        }
        let summary = report.summary();
        info!(database = %self.database_id, %summary, "Seeding finished");
        report
    }

    async fn seed_one(&self, seed: &SeedRecord) -> ProvisioningOutcome {
        let label = seed.label();
        if let Err(e) = seed.validate() {
            error!(seed = %label, error = %e, "Invalid seed record");
            return ProvisioningOutcome::Failed(FailureReason::Other(e.to_string()));
        }

        match self.exists(seed, &label).await {
            Ok(true) => {
                info!(seed = %label, "Already seeded");
                return ProvisioningOutcome::AlreadyExists;
            }
            Ok(false) => {}
            Err(e) => {
                error!(seed = %label, error = %e, "Lookup failed");
                return match e.class() {
                    ErrorClass::Transient => ProvisioningOutcome::Failed(FailureReason::Network),
                    _ => ProvisioningOutcome::Failed(FailureReason::Other(e.to_string())),
                };
            }
        }

        let service = self.service.as_ref();
        let database_id = self.database_id.as_str();
        let collection_id = seed.collection_id.as_str();
        let document_id = seed.document_id.as_deref().unwrap_or(UNIQUE_ID);
        let data = &seed.data;
        run_with_retry(&self.retry, &label, move || {
            service.create_document(database_id, collection_id, document_id, data)
        })
        .await
    }

    async fn exists(&self, seed: &SeedRecord, label: &str) -> Result<bool, RemoteError> {
        let mut queries: Vec<Query> = seed
            .key_values()
            .into_iter()
            .map(|(field, value)| Query::equal(field, value.clone()))
            .collect();
        queries.push(Query::limit(1));

        let service = self.service.as_ref();
        let database_id = self.database_id.as_str();
        let collection_id = seed.collection_id.as_str();
        let queries = queries.as_slice();
        let list = call_with_retry(&self.retry, label, move || {
            service.list_documents(database_id, collection_id, queries)
        })
        .await?;
        Ok(list.total > 0 || !list.documents.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::memory::InMemoryBackend;
    use crate::provisioner::Provisioner;
    use crate::service::SchemaService;
    use crate::settle::SettlePolicy;
    use anacan_shared::catalog::schema_catalog;
    use anacan_shared::seeds::seed_catalog;
    use anacan_shared::{AttributeSpec, SchemaDefinition};

    async fn backend() -> Arc<InMemoryBackend> {
        let backend = Arc::new(InMemoryBackend::new());
        backend.create_database("anacan", "Anacan").await.unwrap();
        for name in ["categories", "posts"] {
            backend
                .create_collection(
                    "anacan",
                    &SchemaDefinition::new(name, name).attribute(AttributeSpec::string("slug", 64)),
                )
                .await
                .unwrap();
        }
        backend
    }

    fn seeder(backend: &Arc<InMemoryBackend>) -> Seeder {
        Seeder::new(backend.clone(), "anacan").with_retry(RetryPolicy::immediate(3))
    }

    fn category(slug: &str) -> SeedRecord {
        SeedRecord::new("categories", &["slug"], json!({ "slug": slug, "name": slug })).with_id(slug)
    }

    #[tokio::test]
    async fn test_seeding_twice_creates_once() {
        let backend = backend().await;
        let seeds = vec![
            category("saglamliq"),
            SeedRecord::new("posts", &["slug"], json!({ "slug": "ilk-yazi" })),
        ];

        let first = seeder(&backend).run(&seeds).await;
        assert_eq!(first.summary().created, 2);

        let second = seeder(&backend).run(&seeds).await;
        assert_eq!(second.summary().skipped, 2);
        assert_eq!(backend.documents("posts").await.len(), 1);
        assert_eq!(backend.documents("categories").await[0].id, "saglamliq");
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_the_run() {
        let backend = backend().await;
        backend.fail_fatal("document:categories", "write denied").await;
        let seeds = vec![
            category("tehsil"),
            SeedRecord::new("posts", &["slug"], json!({ "slug": "ikinci-yazi" })),
        ];

        let report = seeder(&backend).run(&seeds).await;
        assert!(matches!(
            report.outcome_of(ResourceKind::Document, "categories[slug=tehsil]"),
            Some(ProvisioningOutcome::Failed(FailureReason::Other(_)))
        ));
        assert_eq!(
            report.outcome_of(ResourceKind::Document, "posts[slug=ikinci-yazi]"),
            Some(&ProvisioningOutcome::Created)
        );
    }

    #[tokio::test]
    async fn test_lookup_retries_transient_failures() {
        let backend = backend().await;
        backend.fail_transient("list:posts", 2).await;
        let seeds = vec![SeedRecord::new("posts", &["slug"], json!({ "slug": "x" }))];

        let report = seeder(&backend).run(&seeds).await;
        assert_eq!(report.summary().created, 1);
    }

    #[tokio::test]
    async fn test_invalid_seed_is_reported() {
        let backend = backend().await;
        let seeds = vec![SeedRecord::new("posts", &["slug"], json!({ "title": "no slug" }))];

        let report = seeder(&backend).run(&seeds).await;
        assert_eq!(report.summary().failed, 1);
        assert!(backend.documents("posts").await.is_empty());
    }

    #[tokio::test]
    async fn test_demo_content_loads_into_provisioned_schema() {
        let backend = Arc::new(InMemoryBackend::new());
        Provisioner::new(backend.clone(), "anacan")
            .with_retry(RetryPolicy::immediate(1))
            .with_settle(SettlePolicy::none())
            .run(&schema_catalog())
            .await
            .unwrap();

        let seeds = seed_catalog();
        let report = seeder(&backend).run(&seeds).await;
        assert_eq!(report.summary().failed, 0);
        assert_eq!(report.summary().created, seeds.len());

        let again = seeder(&backend).run(&seeds).await;
        assert_eq!(again.summary().skipped, seeds.len());
    }
}
