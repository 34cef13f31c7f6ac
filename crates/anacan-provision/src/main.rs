//! # anacan-provision
//!
//! Creates the Anacan.az database, its collections, attributes and indexes
//! on the hosted document service. Safe to run repeatedly: resources that
//! already exist are reported and left alone.
//!
//! Exits non-zero when the database or any collection could not be ensured.

use std::sync::Arc;

use anyhow::bail;
use tracing::{error, info};

use anacan_provision::{init_tracing, HttpBackend, ProvisionConfig, Provisioner};
use anacan_shared::catalog::schema_catalog;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    info!("Starting schema provisioning v{}", env!("CARGO_PKG_VERSION"));

    let config = ProvisionConfig::from_env()?;
    info!(
        endpoint = %config.remote.endpoint,
        project = %config.remote.project_id,
        database = %config.remote.database_id,
        "Loaded configuration"
    );

    let backend = Arc::new(HttpBackend::new(&config.remote)?);
    let report = Provisioner::new(backend, config.remote.database_id.clone())
        .with_retry(config.retry)
        .with_settle(config.settle)
        .run(&schema_catalog())
        .await?;

    for step in report.failures() {
        error!(resource = %step.resource, kind = ?step.kind, outcome = %step.outcome, "Not provisioned");
    }
    println!("{}", report.summary());

    if report.has_fatal() {
        bail!("provisioning incomplete: one or more collections could not be created");
    }
    Ok(())
}
