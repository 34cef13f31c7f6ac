//! Readiness barrier between dependent schema mutations.
//!
//! A freshly created attribute is not usable until the remote service has
//! finished processing it; issuing the next mutation too early can leave the
//! attribute half-defined. The barrier either polls the attribute status with
//! exponential backoff or, when polling is off or unsupported, sleeps a fixed
//! settle delay.

use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

use anacan_shared::constants::DEFAULT_SETTLE_MS;

use crate::service::{AttributeStatus, SchemaService};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlePolicy {
    /// Fixed pause after a mutation when not polling.
    pub delay: Duration,
    /// Poll attribute status instead of sleeping blindly.
    pub poll: bool,
    /// Number of status checks before giving up.
    pub poll_attempts: u32,
    /// First backoff interval between status checks; doubles each time.
    pub poll_base: Duration,
}

impl Default for SettlePolicy {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(DEFAULT_SETTLE_MS),
            poll: true,
            poll_attempts: 5,
            poll_base: Duration::from_millis(500),
        }
    }
}

impl SettlePolicy {
    /// No waiting at all; for in-memory backends and tests.
    pub fn none() -> Self {
        Self {
            delay: Duration::ZERO,
            poll: false,
            poll_attempts: 0,
            poll_base: Duration::ZERO,
        }
    }

    /// Fixed pause after a mutation that does not report readiness.
    pub async fn pause(&self) {
        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }
    }

    /// Wait until a newly created attribute is available.
    ///
    /// Returns the last status seen, or `None` when the barrier fell back to
    /// the fixed delay.
    pub async fn wait_for_attribute(
        &self,
        service: &dyn SchemaService,
        database_id: &str,
        collection_id: &str,
        key: &str,
    ) -> Option<AttributeStatus> {
        if !self.poll || self.poll_attempts == 0 {
            self.pause().await;
            return None;
        }

        let mut backoff = self.poll_base;
        let mut last = None;
        for check in 1..=self.poll_attempts {
            match service.attribute_status(database_id, collection_id, key).await {
                Ok(AttributeStatus::Available) => {
                    debug!(collection = collection_id, key, check, "Attribute available");
                    return Some(AttributeStatus::Available);
                }
                Ok(status @ (AttributeStatus::Failed | AttributeStatus::Stuck)) => {
                    warn!(collection = collection_id, key, ?status, "Attribute did not settle");
                    return Some(status);
                }
                Ok(status) => {
                    debug!(collection = collection_id, key, ?status, check, "Attribute not ready");
                    last = Some(status);
                }
                Err(e) => {
                    debug!(
                        collection = collection_id,
                        key,
                        error = %e,
                        "Status unavailable, falling back to fixed delay"
                    );
                    self.pause().await;
                    return None;
                }
            }
            if check < self.poll_attempts {
                sleep(backoff).await;
                backoff = backoff.saturating_mul(2);
            }
        }

        warn!(
            collection = collection_id,
            key,
            attempts = self.poll_attempts,
            "Attribute still processing, continuing anyway"
        );
        last
    }
}
