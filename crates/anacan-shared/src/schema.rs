//! Declarative schema model.
//!
//! A [`SchemaDefinition`] describes one remote collection: its permissions,
//! its ordered attributes and its ordered indexes. Definitions are plain data
//! and are consumed by the provisioner, which turns each entry into one
//! idempotent remote call.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SchemaError;

// ---------------------------------------------------------------------------
// Permissions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionAction {
    Read,
    Create,
    Update,
    Delete,
}

/// Who a permission applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionRole {
    /// Anyone, including anonymous visitors.
    Any,
    /// Any authenticated user.
    Users,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PermissionRule {
    pub action: PermissionAction,
    pub role: PermissionRole,
}

impl PermissionRule {
    pub const fn new(action: PermissionAction, role: PermissionRole) -> Self {
        Self { action, role }
    }

    pub const fn read_any() -> Self {
        Self::new(PermissionAction::Read, PermissionRole::Any)
    }

    pub const fn create_users() -> Self {
        Self::new(PermissionAction::Create, PermissionRole::Users)
    }

    pub const fn update_users() -> Self {
        Self::new(PermissionAction::Update, PermissionRole::Users)
    }

    pub const fn delete_users() -> Self {
        Self::new(PermissionAction::Delete, PermissionRole::Users)
    }
}

/// Wire form used by the remote service, e.g. `read("any")`.
impl fmt::Display for PermissionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let action = match self.action {
            PermissionAction::Read => "read",
            PermissionAction::Create => "create",
            PermissionAction::Update => "update",
            PermissionAction::Delete => "delete",
        };
        let role = match self.role {
            PermissionRole::Any => "any",
            PermissionRole::Users => "users",
        };
        write!(f, "{action}(\"{role}\")")
    }
}

// ---------------------------------------------------------------------------
// Attributes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeKind {
    String,
    Integer,
    Boolean,
    Float,
    Datetime,
    Email,
}

impl AttributeKind {
    /// Path segment of the create-attribute endpoint.
    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeKind::String => "string",
            AttributeKind::Integer => "integer",
            AttributeKind::Boolean => "boolean",
            AttributeKind::Float => "float",
            AttributeKind::Datetime => "datetime",
            AttributeKind::Email => "email",
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        match self {
            AttributeKind::String | AttributeKind::Email | AttributeKind::Datetime => {
                value.is_string()
            }
            AttributeKind::Integer => value.is_i64() || value.is_u64(),
            AttributeKind::Float => value.is_number(),
            AttributeKind::Boolean => value.is_boolean(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeSpec {
    pub key: String,
    pub kind: AttributeKind,
    /// Maximum length; string attributes only.
    pub size: Option<u32>,
    pub required: bool,
    pub default_value: Option<Value>,
    pub is_array: bool,
    /// Lower bound for integer / float attributes.
    pub min: Option<f64>,
    /// Upper bound for integer / float attributes.
    pub max: Option<f64>,
}

impl AttributeSpec {
    fn new(key: &str, kind: AttributeKind, size: Option<u32>) -> Self {
        Self {
            key: key.to_string(),
            kind,
            size,
            required: false,
            default_value: None,
            is_array: false,
            min: None,
            max: None,
        }
    }

    pub fn string(key: &str, size: u32) -> Self {
        Self::new(key, AttributeKind::String, Some(size))
    }

    pub fn integer(key: &str) -> Self {
        Self::new(key, AttributeKind::Integer, None)
    }

    pub fn boolean(key: &str) -> Self {
        Self::new(key, AttributeKind::Boolean, None)
    }

    pub fn float(key: &str) -> Self {
        Self::new(key, AttributeKind::Float, None)
    }

    pub fn datetime(key: &str) -> Self {
        Self::new(key, AttributeKind::Datetime, None)
    }

    pub fn email(key: &str) -> Self {
        Self::new(key, AttributeKind::Email, None)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn array(mut self) -> Self {
        self.is_array = true;
        self
    }

    pub fn range(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }
}

// ---------------------------------------------------------------------------
// Indexes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    Key,
    Unique,
    Fulltext,
}

impl IndexKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexKind::Key => "key",
            IndexKind::Unique => "unique",
            IndexKind::Fulltext => "fulltext",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortOrder {
    #[serde(rename = "ASC")]
    Asc,
    #[serde(rename = "DESC")]
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSpec {
    pub key: String,
    pub kind: IndexKind,
    pub attribute_keys: Vec<String>,
    /// Parallel to `attribute_keys` when present.
    pub sort_orders: Option<Vec<SortOrder>>,
}

impl IndexSpec {
    fn new(key: &str, kind: IndexKind, attributes: &[&str]) -> Self {
        Self {
            key: key.to_string(),
            kind,
            attribute_keys: attributes.iter().map(|a| a.to_string()).collect(),
            sort_orders: None,
        }
    }

    pub fn key(key: &str, attributes: &[&str]) -> Self {
        Self::new(key, IndexKind::Key, attributes)
    }

    pub fn unique(key: &str, attributes: &[&str]) -> Self {
        Self::new(key, IndexKind::Unique, attributes)
    }

    pub fn fulltext(key: &str, attributes: &[&str]) -> Self {
        Self::new(key, IndexKind::Fulltext, attributes)
    }

    pub fn orders(mut self, orders: &[SortOrder]) -> Self {
        self.sort_orders = Some(orders.to_vec());
        self
    }
}

// ---------------------------------------------------------------------------
// Collection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDefinition {
    pub collection_id: String,
    pub display_name: String,
    pub permissions: Vec<PermissionRule>,
    /// Whether per-document permissions are honoured in addition to the
    /// collection-level ones.
    pub document_security: bool,
    pub attributes: Vec<AttributeSpec>,
    pub indexes: Vec<IndexSpec>,
}

impl SchemaDefinition {
    pub fn new(collection_id: &str, display_name: &str) -> Self {
        Self {
            collection_id: collection_id.to_string(),
            display_name: display_name.to_string(),
            permissions: Vec::new(),
            document_security: false,
            attributes: Vec::new(),
            indexes: Vec::new(),
        }
    }

    pub fn permissions(mut self, rules: &[PermissionRule]) -> Self {
        for rule in rules {
            if !self.permissions.contains(rule) {
                self.permissions.push(*rule);
            }
        }
        self
    }

    pub fn document_security(mut self) -> Self {
        self.document_security = true;
        self
    }

    pub fn attribute(mut self, attribute: AttributeSpec) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn index(mut self, index: IndexSpec) -> Self {
        self.indexes.push(index);
        self
    }

    pub fn find_attribute(&self, key: &str) -> Option<&AttributeSpec> {
        self.attributes.iter().find(|a| a.key == key)
    }

    /// Check the invariants the remote service would otherwise reject, or
    /// silently accept in a broken form.
    pub fn validate(&self) -> Result<(), SchemaError> {
        let collection = || self.collection_id.clone();

        let mut seen = HashSet::new();
        for attr in &self.attributes {
            if !seen.insert(attr.key.as_str()) {
                return Err(SchemaError::DuplicateAttribute {
                    collection: collection(),
                    key: attr.key.clone(),
                });
            }
            if attr.required && attr.default_value.is_some() {
                return Err(SchemaError::RequiredWithDefault {
                    collection: collection(),
                    key: attr.key.clone(),
                });
            }
            match (attr.kind, attr.size) {
                (AttributeKind::String, None) => {
                    return Err(SchemaError::MissingSize {
                        collection: collection(),
                        key: attr.key.clone(),
                    });
                }
                (AttributeKind::String | AttributeKind::Email, Some(_)) | (_, None) => {}
                (_, Some(_)) => {
                    return Err(SchemaError::UnexpectedSize {
                        collection: collection(),
                        key: attr.key.clone(),
                    });
                }
            }
            if let Some(default) = &attr.default_value {
                if !attr.kind.accepts(default) {
                    return Err(SchemaError::DefaultTypeMismatch {
                        collection: collection(),
                        key: attr.key.clone(),
                    });
                }
            }
        }

        let mut seen = HashSet::new();
        for index in &self.indexes {
            if !seen.insert(index.key.as_str()) {
                return Err(SchemaError::DuplicateIndex {
                    collection: collection(),
                    key: index.key.clone(),
                });
            }
            if index.attribute_keys.is_empty() {
                return Err(SchemaError::EmptyIndex {
                    collection: collection(),
                    index: index.key.clone(),
                });
            }
            for attribute in &index.attribute_keys {
                if self.find_attribute(attribute).is_none() {
                    return Err(SchemaError::UnknownIndexAttribute {
                        collection: collection(),
                        index: index.key.clone(),
                        attribute: attribute.clone(),
                    });
                }
            }
            if let Some(orders) = &index.sort_orders {
                if orders.len() != index.attribute_keys.len() {
                    return Err(SchemaError::SortOrderMismatch {
                        collection: collection(),
                        index: index.key.clone(),
                        attributes: index.attribute_keys.len(),
                        orders: orders.len(),
                    });
                }
            }
        }

        Ok(())
    }
}
