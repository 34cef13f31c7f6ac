//! Document query filters.
//!
//! Serialized to the JSON query form the remote service accepts in
//! `queries[]` parameters, e.g. `{"method":"equal","attribute":"slug","values":["x"]}`.

use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    /// Attribute equals any of the values (or, for array attributes, contains one).
    Equal(String, Vec<Value>),
    OrderAsc(String),
    OrderDesc(String),
    Limit(u32),
}

impl Query {
    pub fn equal(attribute: &str, value: impl Into<Value>) -> Self {
        Query::Equal(attribute.to_string(), vec![value.into()])
    }

    pub fn order_asc(attribute: &str) -> Self {
        Query::OrderAsc(attribute.to_string())
    }

    pub fn order_desc(attribute: &str) -> Self {
        Query::OrderDesc(attribute.to_string())
    }

    pub fn limit(n: u32) -> Self {
        Query::Limit(n)
    }

    pub fn to_wire(&self) -> String {
        let value = match self {
            Query::Equal(attribute, values) => json!({
                "method": "equal",
                "attribute": attribute,
                "values": values,
            }),
            Query::OrderAsc(attribute) => json!({
                "method": "orderAsc",
                "attribute": attribute,
            }),
            Query::OrderDesc(attribute) => json!({
                "method": "orderDesc",
                "attribute": attribute,
            }),
            Query::Limit(n) => json!({
                "method": "limit",
                "values": [n],
            }),
        };
        value.to_string()
    }
}
