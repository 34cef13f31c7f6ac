use thiserror::Error;

/// Problems found while validating a declared schema or seed record.
///
/// These are caught before any remote call is made.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("{collection}: duplicate attribute key '{key}'")]
    DuplicateAttribute { collection: String, key: String },

    #[error("{collection}: duplicate index key '{key}'")]
    DuplicateIndex { collection: String, key: String },

    #[error("{collection}.{key}: a required attribute cannot declare a default value")]
    RequiredWithDefault { collection: String, key: String },

    #[error("{collection}.{key}: string attributes need a size")]
    MissingSize { collection: String, key: String },

    #[error("{collection}.{key}: size is only meaningful for string and email attributes")]
    UnexpectedSize { collection: String, key: String },

    #[error("{collection}.{key}: default value does not match the attribute kind")]
    DefaultTypeMismatch { collection: String, key: String },

    #[error("{collection}.{index}: index has no attributes")]
    EmptyIndex { collection: String, index: String },

    #[error("{collection}.{index}: index references unknown attribute '{attribute}'")]
    UnknownIndexAttribute {
        collection: String,
        index: String,
        attribute: String,
    },

    #[error("{collection}.{index}: {orders} sort orders for {attributes} attributes")]
    SortOrderMismatch {
        collection: String,
        index: String,
        attributes: usize,
        orders: usize,
    },

    #[error("seed for {collection}: natural key is empty")]
    EmptyNaturalKey { collection: String },

    #[error("seed for {collection}: natural key field '{field}' missing from data")]
    MissingNaturalKeyField { collection: String, field: String },
}
