//! HTTP client for the hosted, Appwrite-compatible REST API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::debug;

use anacan_shared::{AttributeKind, AttributeSpec, IndexSpec, SchemaDefinition};

use crate::config::RemoteConfig;
use crate::error::RemoteError;
use crate::query::Query;
use crate::service::{
    AttributeStatus, Document, DocumentList, DocumentService, RemoteResult, SchemaService,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Error body returned by the service.
#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
    #[serde(rename = "type", default)]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct AttributeBody {
    status: AttributeStatus,
}

/// Authenticated client for one project.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    endpoint: String,
    project_id: String,
    api_key: Option<String>,
}

impl HttpBackend {
    pub fn new(config: &RemoteConfig) -> RemoteResult<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| RemoteError::Transport(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            project_id: config.project_id.clone(),
            api_key: config.api_key.clone(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.endpoint, path);
        debug!(%method, %url, "Remote request");

        let builder = self
            .client
            .request(method, url)
            .header("X-Appwrite-Project", &self.project_id)
            .header("X-Appwrite-Response-Format", "1.5.0");
        match &self.api_key {
            Some(key) => builder.header("X-Appwrite-Key", key),
            None => builder,
        }
    }

    async fn send(builder: RequestBuilder) -> RemoteResult<Response> {
        let response = builder
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body: ApiErrorBody = response.json().await.unwrap_or_default();
        Err(RemoteError::Api {
            status: status.as_u16(),
            kind: body.kind,
            message: body.message,
        })
    }

    async fn send_json<T: DeserializeOwned>(builder: RequestBuilder) -> RemoteResult<T> {
        Self::send(builder)
            .await?
            .json()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))
    }

    async fn send_unit(builder: RequestBuilder) -> RemoteResult<()> {
        Self::send(builder).await.map(|_| ())
    }
}

fn collection_path(database_id: &str, collection_id: &str) -> String {
    format!("/databases/{database_id}/collections/{collection_id}")
}

/// Request body for `POST .../attributes/{kind}`.
pub(crate) fn attribute_body(attribute: &AttributeSpec) -> Value {
    let mut body = json!({
        "key": attribute.key,
        "required": attribute.required,
        "array": attribute.is_array,
    });
    if let Some(default) = &attribute.default_value {
        body["default"] = default.clone();
    }
    // The email endpoint takes no size; a declared one stays local.
    if attribute.kind == AttributeKind::String {
        if let Some(size) = attribute.size {
            body["size"] = json!(size);
        }
    }
    if matches!(attribute.kind, AttributeKind::Integer | AttributeKind::Float) {
        let integer = attribute.kind == AttributeKind::Integer;
        let bound = |v: f64| if integer { json!(v as i64) } else { json!(v) };
        if let Some(min) = attribute.min {
            body["min"] = bound(min);
        }
        if let Some(max) = attribute.max {
            body["max"] = bound(max);
        }
    }
    body
}

/// Request body for `POST .../indexes`.
pub(crate) fn index_body(index: &IndexSpec) -> Value {
    let mut body = json!({
        "key": index.key,
        "type": index.kind.as_str(),
        "attributes": index.attribute_keys,
    });
    if let Some(orders) = &index.sort_orders {
        body["orders"] = json!(orders.iter().map(|o| o.as_str()).collect::<Vec<_>>());
    }
    body
}

/// Request body for `POST /databases/{db}/collections`.
pub(crate) fn collection_body(definition: &SchemaDefinition) -> Value {
    json!({
        "collectionId": definition.collection_id,
        "name": definition.display_name,
        "permissions": definition
            .permissions
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>(),
        "documentSecurity": definition.document_security,
    })
}

#[async_trait]
impl SchemaService for HttpBackend {
    async fn get_database(&self, database_id: &str) -> RemoteResult<()> {
        Self::send_unit(self.request(Method::GET, &format!("/databases/{database_id}"))).await
    }

    async fn create_database(&self, database_id: &str, name: &str) -> RemoteResult<()> {
        let body = json!({ "databaseId": database_id, "name": name });
        Self::send_unit(self.request(Method::POST, "/databases").json(&body)).await
    }

    async fn create_collection(
        &self,
        database_id: &str,
        definition: &SchemaDefinition,
    ) -> RemoteResult<()> {
        let path = format!("/databases/{database_id}/collections");
        Self::send_unit(
            self.request(Method::POST, &path)
                .json(&collection_body(definition)),
        )
        .await
    }

    async fn create_attribute(
        &self,
        database_id: &str,
        collection_id: &str,
        attribute: &AttributeSpec,
    ) -> RemoteResult<()> {
        let path = format!(
            "{}/attributes/{}",
            collection_path(database_id, collection_id),
            attribute.kind.as_str()
        );
        Self::send_unit(
            self.request(Method::POST, &path)
                .json(&attribute_body(attribute)),
        )
        .await
    }

    async fn attribute_status(
        &self,
        database_id: &str,
        collection_id: &str,
        key: &str,
    ) -> RemoteResult<AttributeStatus> {
        let path = format!(
            "{}/attributes/{key}",
            collection_path(database_id, collection_id)
        );
        let body: AttributeBody = Self::send_json(self.request(Method::GET, &path)).await?;
        Ok(body.status)
    }

    async fn create_index(
        &self,
        database_id: &str,
        collection_id: &str,
        index: &IndexSpec,
    ) -> RemoteResult<()> {
        let path = format!("{}/indexes", collection_path(database_id, collection_id));
        Self::send_unit(self.request(Method::POST, &path).json(&index_body(index))).await
    }
}

#[async_trait]
impl DocumentService for HttpBackend {
    async fn list_documents(
        &self,
        database_id: &str,
        collection_id: &str,
        queries: &[Query],
    ) -> RemoteResult<DocumentList> {
        let path = format!("{}/documents", collection_path(database_id, collection_id));
        let params: Vec<(&str, String)> = queries
            .iter()
            .map(|q| ("queries[]", q.to_wire()))
            .collect();
        Self::send_json(self.request(Method::GET, &path).query(&params)).await
    }

    async fn create_document(
        &self,
        database_id: &str,
        collection_id: &str,
        document_id: &str,
        data: &Map<String, Value>,
    ) -> RemoteResult<Document> {
        let path = format!("{}/documents", collection_path(database_id, collection_id));
        let body = json!({ "documentId": document_id, "data": data });
        Self::send_json(self.request(Method::POST, &path).json(&body)).await
    }
}
