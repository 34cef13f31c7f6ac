//! # anacan-provision
//!
//! Brings the hosted document database of Anacan.az into conformance with the
//! declared schema, and loads demo content into it.
//!
//! Every remote mutation goes through [`retry::run_with_retry`], which turns a
//! create call into a [`ProvisioningOutcome`](anacan_shared::ProvisioningOutcome):
//! a conflict means the resource already exists, transport failures are
//! retried within a [`RetryPolicy`](retry::RetryPolicy), anything else fails
//! that one resource.

pub mod config;
pub mod error;
pub mod http;
pub mod memory;
pub mod provisioner;
pub mod query;
pub mod report;
pub mod retry;
pub mod seeder;
pub mod service;
pub mod settle;

pub use config::{ProvisionConfig, RemoteConfig};
pub use error::{ConfigError, ErrorClass, ProvisionError, RemoteError};
pub use http::HttpBackend;
pub use memory::InMemoryBackend;
pub use provisioner::Provisioner;
pub use query::Query;
pub use report::{Report, ResourceKind, StepRecord, Summary};
pub use retry::RetryPolicy;
pub use seeder::Seeder;
pub use service::{AttributeStatus, Document, DocumentList, DocumentService, SchemaService};
pub use settle::SettlePolicy;

/// Install the `tracing` subscriber used by the command-line tools.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,anacan_provision=debug")),
        )
        .with_target(false)
        .init();
}
