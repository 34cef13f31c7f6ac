//! In-memory implementation of the remote services.
//!
//! Mirrors the behaviour the provisioner relies on: duplicate creation is a
//! 409 conflict, missing parents are 404s, an index over an unknown attribute
//! is rejected, unique indexes are enforced on documents. Faults can be
//! injected per operation to exercise the retry and error paths.
//!
//! Operation labels used for fault injection:
//! `database`, `collection:<c>`, `attribute:<c>.<key>`, `index:<c>.<key>`,
//! `document:<c>`, `list:<c>`.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use anacan_shared::constants::UNIQUE_ID;
use anacan_shared::{AttributeSpec, IndexKind, IndexSpec, SchemaDefinition};

use crate::error::RemoteError;
use crate::query::Query;
use crate::service::{
    AttributeStatus, Document, DocumentList, DocumentService, RemoteResult, SchemaService,
};

#[derive(Debug, Default)]
struct MemoryCollection {
    attributes: Vec<AttributeSpec>,
    /// Status checks left before an attribute reports `available`.
    pending: HashMap<String, u32>,
    indexes: Vec<IndexSpec>,
    documents: Vec<Document>,
}

#[derive(Debug, Default)]
struct MemoryState {
    databases: HashSet<String>,
    collections: HashMap<String, MemoryCollection>,
    transient: HashMap<String, u32>,
    fatal: HashMap<String, String>,
    readiness_lag: u32,
    status_checks: u32,
    next_id: u64,
    /// Every mutation that reached the backend, in order.
    calls: Vec<String>,
}

impl MemoryState {
    /// Apply injected faults for `label`, then log the call.
    fn enter(&mut self, label: &str) -> RemoteResult<()> {
        if let Some(remaining) = self.transient.get_mut(label) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(RemoteError::Transport(format!("{label}: connection reset")));
            }
        }
        if let Some(message) = self.fatal.get(label) {
            return Err(RemoteError::api(500, "general_server_error", message.clone()));
        }
        Ok(())
    }

    fn collection(&mut self, database_id: &str, collection_id: &str) -> RemoteResult<&mut MemoryCollection> {
        if !self.databases.contains(database_id) {
            return Err(RemoteError::api(404, "database_not_found", database_id));
        }
        self.collections
            .get_mut(collection_id)
            .ok_or_else(|| RemoteError::api(404, "collection_not_found", collection_id))
    }
}

/// Thread-safe in-memory backend.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    state: Mutex<MemoryState>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `times` calls of `label` with a transport error.
    pub async fn fail_transient(&self, label: &str, times: u32) {
        self.state
            .lock()
            .await
            .transient
            .insert(label.to_string(), times);
    }

    /// Fail every call of `label` with a server error.
    pub async fn fail_fatal(&self, label: &str, message: &str) {
        self.state
            .lock()
            .await
            .fatal
            .insert(label.to_string(), message.to_string());
    }

    /// New attributes report `processing` for this many status checks.
    pub async fn set_readiness_lag(&self, checks: u32) {
        self.state.lock().await.readiness_lag = checks;
    }

    pub async fn status_checks(&self) -> u32 {
        self.state.lock().await.status_checks
    }

    /// Labels of every mutation that was applied, in order.
    pub async fn calls(&self) -> Vec<String> {
        self.state.lock().await.calls.clone()
    }

    pub async fn has_collection(&self, collection_id: &str) -> bool {
        self.state.lock().await.collections.contains_key(collection_id)
    }

    pub async fn attribute_keys(&self, collection_id: &str) -> Vec<String> {
        let state = self.state.lock().await;
        state
            .collections
            .get(collection_id)
            .map(|c| c.attributes.iter().map(|a| a.key.clone()).collect())
            .unwrap_or_default()
    }

    pub async fn index_keys(&self, collection_id: &str) -> Vec<String> {
        let state = self.state.lock().await;
        state
            .collections
            .get(collection_id)
            .map(|c| c.indexes.iter().map(|i| i.key.clone()).collect())
            .unwrap_or_default()
    }

    pub async fn documents(&self, collection_id: &str) -> Vec<Document> {
        let state = self.state.lock().await;
        state
            .collections
            .get(collection_id)
            .map(|c| c.documents.clone())
            .unwrap_or_default()
    }
}

fn matches_query(doc: &Document, query: &Query) -> bool {
    match query {
        Query::Equal(attribute, values) => match doc.data.get(attribute) {
            Some(Value::Array(items)) => items.iter().any(|i| values.contains(i)),
            Some(value) => values.contains(value),
            None => false,
        },
        _ => true,
    }
}

fn compare_field(a: &Document, b: &Document, field: &str) -> std::cmp::Ordering {
    let key = |d: &Document| d.data.get(field).map(|v| v.to_string()).unwrap_or_default();
    key(a).cmp(&key(b))
}

#[async_trait]
impl SchemaService for InMemoryBackend {
    async fn get_database(&self, database_id: &str) -> RemoteResult<()> {
        let mut state = self.state.lock().await;
        state.enter("database:get")?;
        if state.databases.contains(database_id) {
            Ok(())
        } else {
            Err(RemoteError::api(404, "database_not_found", database_id))
        }
    }

    async fn create_database(&self, database_id: &str, _name: &str) -> RemoteResult<()> {
        let mut state = self.state.lock().await;
        state.enter("database")?;
        if !state.databases.insert(database_id.to_string()) {
            return Err(RemoteError::api(409, "database_already_exists", database_id));
        }
        state.calls.push("database".to_string());
        Ok(())
    }

    async fn create_collection(
        &self,
        database_id: &str,
        definition: &SchemaDefinition,
    ) -> RemoteResult<()> {
        let label = format!("collection:{}", definition.collection_id);
        let mut state = self.state.lock().await;
        state.enter(&label)?;
        if !state.databases.contains(database_id) {
            return Err(RemoteError::api(404, "database_not_found", database_id));
        }
        if state.collections.contains_key(&definition.collection_id) {
            return Err(RemoteError::api(
                409,
                "collection_already_exists",
                definition.collection_id.clone(),
            ));
        }
        state
            .collections
            .insert(definition.collection_id.clone(), MemoryCollection::default());
        state.calls.push(label);
        Ok(())
    }

    async fn create_attribute(
        &self,
        database_id: &str,
        collection_id: &str,
        attribute: &AttributeSpec,
    ) -> RemoteResult<()> {
        let label = format!("attribute:{collection_id}.{}", attribute.key);
        let mut state = self.state.lock().await;
        state.enter(&label)?;
        let lag = state.readiness_lag;
        let collection = state.collection(database_id, collection_id)?;
        if collection.attributes.iter().any(|a| a.key == attribute.key) {
            return Err(RemoteError::api(409, "attribute_already_exists", attribute.key.clone()));
        }
        if attribute.required && attribute.default_value.is_some() {
            return Err(RemoteError::api(
                400,
                "attribute_default_unsupported",
                "Cannot set default value for required attribute",
            ));
        }
        collection.attributes.push(attribute.clone());
        collection.pending.insert(attribute.key.clone(), lag);
        state.calls.push(label);
        Ok(())
    }

    async fn attribute_status(
        &self,
        database_id: &str,
        collection_id: &str,
        key: &str,
    ) -> RemoteResult<AttributeStatus> {
        let mut state = self.state.lock().await;
        state.status_checks += 1;
        let collection = state.collection(database_id, collection_id)?;
        if !collection.attributes.iter().any(|a| a.key == key) {
            return Err(RemoteError::api(404, "attribute_not_found", key));
        }
        match collection.pending.get_mut(key) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                Ok(AttributeStatus::Processing)
            }
            _ => Ok(AttributeStatus::Available),
        }
    }

    async fn create_index(
        &self,
        database_id: &str,
        collection_id: &str,
        index: &IndexSpec,
    ) -> RemoteResult<()> {
        let label = format!("index:{collection_id}.{}", index.key);
        let mut state = self.state.lock().await;
        state.enter(&label)?;
        let collection = state.collection(database_id, collection_id)?;
        if collection.indexes.iter().any(|i| i.key == index.key) {
            return Err(RemoteError::api(409, "index_already_exists", index.key.clone()));
        }
        for key in &index.attribute_keys {
            if !collection.attributes.iter().any(|a| &a.key == key) {
                return Err(RemoteError::api(
                    400,
                    "attribute_unknown",
                    format!("Unknown attribute: {key}"),
                ));
            }
        }
        collection.indexes.push(index.clone());
        state.calls.push(label);
        Ok(())
    }
}

#[async_trait]
impl DocumentService for InMemoryBackend {
    async fn list_documents(
        &self,
        database_id: &str,
        collection_id: &str,
        queries: &[Query],
    ) -> RemoteResult<DocumentList> {
        let mut state = self.state.lock().await;
        state.enter(&format!("list:{collection_id}"))?;
        let collection = state.collection(database_id, collection_id)?;

        let mut documents: Vec<Document> = collection
            .documents
            .iter()
            .filter(|d| queries.iter().all(|q| matches_query(d, q)))
            .cloned()
            .collect();
        let total = documents.len() as u64;

        for query in queries {
            match query {
                Query::OrderAsc(field) => documents.sort_by(|a, b| compare_field(a, b, field)),
                Query::OrderDesc(field) => documents.sort_by(|a, b| compare_field(b, a, field)),
                _ => {}
            }
        }
        if let Some(limit) = queries.iter().find_map(|q| match q {
            Query::Limit(n) => Some(*n as usize),
            _ => None,
        }) {
            documents.truncate(limit);
        }

        Ok(DocumentList { total, documents })
    }

    async fn create_document(
        &self,
        database_id: &str,
        collection_id: &str,
        document_id: &str,
        data: &Map<String, Value>,
    ) -> RemoteResult<Document> {
        let label = format!("document:{collection_id}");
        let mut state = self.state.lock().await;
        state.enter(&label)?;
        state.next_id += 1;
        let generated = format!("doc{:06}", state.next_id);
        let collection = state.collection(database_id, collection_id)?;

        let id = if document_id == UNIQUE_ID {
            generated
        } else {
            document_id.to_string()
        };
        if collection.documents.iter().any(|d| d.id == id) {
            return Err(RemoteError::api(409, "document_already_exists", id));
        }
        for index in collection.indexes.iter().filter(|i| i.kind == IndexKind::Unique) {
            let clash = collection.documents.iter().any(|d| {
                index
                    .attribute_keys
                    .iter()
                    .all(|k| d.data.get(k).is_some() && d.data.get(k) == data.get(k))
            });
            if clash {
                return Err(RemoteError::api(
                    409,
                    "document_already_exists",
                    format!("Unique index {} violated", index.key),
                ));
            }
        }

        let document = Document {
            id,
            created_at: Some("2024-01-01T00:00:00.000+00:00".to_string()),
            updated_at: Some("2024-01-01T00:00:00.000+00:00".to_string()),
            data: data.clone(),
        };
        collection.documents.push(document.clone());
        state.calls.push(label);
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn seeded() -> InMemoryBackend {
        let backend = InMemoryBackend::new();
        backend.create_database("db", "db").await.unwrap();
        let def = SchemaDefinition::new("posts", "Posts");
        backend.create_collection("db", &def).await.unwrap();
        backend
            .create_attribute("db", "posts", &AttributeSpec::string("slug", 64))
            .await
            .unwrap();
        backend
            .create_index("db", "posts", &IndexSpec::unique("idx_slug", &["slug"]))
            .await
            .unwrap();
        backend
    }

    fn data(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_duplicate_collection_conflicts() {
        let backend = seeded().await;
        let err = backend
            .create_collection("db", &SchemaDefinition::new("posts", "Posts"))
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::Api { status: 409, .. }));
    }

    #[tokio::test]
    async fn test_index_requires_attribute() {
        let backend = seeded().await;
        let err = backend
            .create_index("db", "posts", &IndexSpec::key("idx_cat", &["category_id"]))
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::Api { status: 400, .. }));
    }

    #[tokio::test]
    async fn test_unique_index_enforced() {
        let backend = seeded().await;
        let doc = data(json!({ "slug": "a" }));
        backend
            .create_document("db", "posts", UNIQUE_ID, &doc)
            .await
            .unwrap();
        let err = backend
            .create_document("db", "posts", UNIQUE_ID, &doc)
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::Api { status: 409, .. }));
    }

    #[tokio::test]
    async fn test_list_filters_orders_and_limits() {
        let backend = seeded().await;
        for (slug, status) in [("a", "draft"), ("b", "published"), ("c", "published")] {
            backend
                .create_document(
                    "db",
                    "posts",
                    UNIQUE_ID,
                    &data(json!({ "slug": slug, "status": status })),
                )
                .await
                .unwrap();
        }

        let list = backend
            .list_documents(
                "db",
                "posts",
                &[
                    Query::equal("status", "published"),
                    Query::order_desc("slug"),
                    Query::limit(1),
                ],
            )
            .await
            .unwrap();
        assert_eq!(list.total, 2);
        assert_eq!(list.documents.len(), 1);
        assert_eq!(list.documents[0].str_field("slug"), Some("c"));
    }

    #[tokio::test]
    async fn test_transient_fault_injection() {
        let backend = InMemoryBackend::new();
        backend.fail_transient("database", 1).await;
        assert!(matches!(
            backend.create_database("db", "db").await,
            Err(RemoteError::Transport(_))
        ));
        backend.create_database("db", "db").await.unwrap();
        assert_eq!(backend.calls().await, vec!["database".to_string()]);
    }
}
