//! # anacan-shared
//!
//! Types shared by the Anacan.az provisioning tools, the sitemap server and
//! the offline cache: the declarative schema model, provisioning outcomes,
//! seed records, and the built-in schema and seed catalogs.

pub mod catalog;
pub mod constants;
pub mod error;
pub mod schema;
pub mod seeds;
pub mod types;

pub use error::SchemaError;
pub use schema::{
    AttributeKind, AttributeSpec, IndexKind, IndexSpec, PermissionAction, PermissionRole,
    PermissionRule, SchemaDefinition, SortOrder,
};
pub use types::{FailureReason, ProvisioningOutcome, SeedRecord};
