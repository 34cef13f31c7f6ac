//! The remote service seams.
//!
//! [`SchemaService`] covers database / collection / attribute / index
//! management, [`DocumentService`] covers document reads and writes. The HTTP
//! client implements both, and so does the in-memory backend used in tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use anacan_shared::{AttributeSpec, IndexSpec, SchemaDefinition};

use crate::error::RemoteError;
use crate::query::Query;

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Lifecycle state the service reports for an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeStatus {
    Available,
    Processing,
    Deleting,
    Stuck,
    Failed,
    #[serde(other)]
    Unknown,
}

/// A stored document: system fields plus the user-defined data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(rename = "$createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(rename = "$updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

impl Document {
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentList {
    pub total: u64,
    pub documents: Vec<Document>,
}

#[async_trait]
pub trait SchemaService: Send + Sync {
    /// Succeeds if the database exists; a 404 API error otherwise.
    async fn get_database(&self, database_id: &str) -> RemoteResult<()>;
    async fn create_database(&self, database_id: &str, name: &str) -> RemoteResult<()>;
    async fn create_collection(
        &self,
        database_id: &str,
        definition: &SchemaDefinition,
    ) -> RemoteResult<()>;
    async fn create_attribute(
        &self,
        database_id: &str,
        collection_id: &str,
        attribute: &AttributeSpec,
    ) -> RemoteResult<()>;
    async fn attribute_status(
        &self,
        database_id: &str,
        collection_id: &str,
        key: &str,
    ) -> RemoteResult<AttributeStatus>;
    async fn create_index(
        &self,
        database_id: &str,
        collection_id: &str,
        index: &IndexSpec,
    ) -> RemoteResult<()>;
}

#[async_trait]
pub trait DocumentService: Send + Sync {
    async fn list_documents(
        &self,
        database_id: &str,
        collection_id: &str,
        queries: &[Query],
    ) -> RemoteResult<DocumentList>;
    async fn create_document(
        &self,
        database_id: &str,
        collection_id: &str,
        document_id: &str,
        data: &Map<String, Value>,
    ) -> RemoteResult<Document>;
}
