use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::SchemaError;

/// Why a remote resource could not be brought into existence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureReason {
    /// Transient network failures outlasted the retry budget.
    Network,
    /// The remote service rejected the operation.
    Other(String),
    /// Not attempted because a resource it depends on is missing.
    Skipped(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Network => write!(f, "network failure, retries exhausted"),
            FailureReason::Other(msg) => write!(f, "{msg}"),
            FailureReason::Skipped(msg) => write!(f, "skipped: {msg}"),
        }
    }
}

/// Result of one idempotent create step. Reporting only, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProvisioningOutcome {
    Created,
    AlreadyExists,
    Failed(FailureReason),
}

impl ProvisioningOutcome {
    /// `true` when the resource exists after the step, whoever created it.
    pub fn is_present(&self) -> bool {
        matches!(
            self,
            ProvisioningOutcome::Created | ProvisioningOutcome::AlreadyExists
        )
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ProvisioningOutcome::Failed(_))
    }
}

impl fmt::Display for ProvisioningOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProvisioningOutcome::Created => write!(f, "created"),
            ProvisioningOutcome::AlreadyExists => write!(f, "already exists"),
            ProvisioningOutcome::Failed(reason) => write!(f, "failed ({reason})"),
        }
    }
}

/// A fixed demo document, identified by its natural key rather than by a
/// generated id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedRecord {
    pub collection_id: String,
    /// Field names whose values together identify the record.
    pub natural_key: Vec<String>,
    /// Fixed document id, so other seeds can reference this record. `None`
    /// lets the remote service generate one.
    pub document_id: Option<String>,
    pub data: Map<String, Value>,
}

impl SeedRecord {
    /// Build a record from a JSON object literal. Non-object values produce
    /// an empty document, which `validate` then rejects.
    pub fn new(collection_id: &str, natural_key: &[&str], data: Value) -> Self {
        let data = match data {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            collection_id: collection_id.to_string(),
            natural_key: natural_key.iter().map(|k| k.to_string()).collect(),
            document_id: None,
            data,
        }
    }

    pub fn with_id(mut self, document_id: &str) -> Self {
        self.document_id = Some(document_id.to_string());
        self
    }

    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.natural_key.is_empty() {
            return Err(SchemaError::EmptyNaturalKey {
                collection: self.collection_id.clone(),
            });
        }
        for field in &self.natural_key {
            if !self.data.contains_key(field) {
                return Err(SchemaError::MissingNaturalKeyField {
                    collection: self.collection_id.clone(),
                    field: field.clone(),
                });
            }
        }
        Ok(())
    }

    /// Natural-key field/value pairs, in declared order.
    pub fn key_values(&self) -> Vec<(&str, &Value)> {
        self.natural_key
            .iter()
            .filter_map(|k| self.data.get(k).map(|v| (k.as_str(), v)))
            .collect()
    }

    /// Short label for logs, e.g. `posts[slug=yeni-dogulmus]`.
    pub fn label(&self) -> String {
        let parts: Vec<String> = self
            .key_values()
            .into_iter()
            .map(|(k, v)| match v {
                Value::String(s) => format!("{k}={s}"),
                other => format!("{k}={other}"),
            })
            .collect();
        format!("{}[{}]", self.collection_id, parts.join(","))
    }
}
