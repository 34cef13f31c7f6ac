//! # anacan-seed
//!
//! Loads the demo categories, pages, forums, posts and newsletter subscriber
//! into a provisioned database. Records are matched by natural key, so a
//! second run creates nothing.

use std::sync::Arc;

use anyhow::bail;
use tracing::{error, info};

use anacan_provision::{init_tracing, HttpBackend, ProvisionConfig, Seeder};
use anacan_shared::seeds::seed_catalog;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    info!("Starting demo content seeding v{}", env!("CARGO_PKG_VERSION"));

    let config = ProvisionConfig::from_env()?;
    let backend = Arc::new(HttpBackend::new(&config.remote)?);
    let report = Seeder::new(backend, config.remote.database_id.clone())
        .with_retry(config.retry)
        .run(&seed_catalog())
        .await;

    for step in report.failures() {
        error!(record = %step.resource, outcome = %step.outcome, "Not seeded");
    }
    println!("{}", report.summary());

    let failed = report.summary().failed;
    if failed > 0 {
        bail!("{failed} seed record(s) failed");
    }
    Ok(())
}
