//! # anacan-store
//!
//! Offline cache for the Anacan.az reader: posts, reading lists and their
//! items kept in a local SQLite file so they stay readable without a
//! connection.
//!
//! [`OfflineCache`] opens its connection lazily on first use and runs the
//! schema migrations at that point. Every operation is a single statement,
//! so each one is its own transaction.

pub mod cache;
pub mod migrations;
pub mod models;
pub mod posts;
pub mod reading_lists;

mod error;

pub use cache::OfflineCache;
pub use error::{Result, StoreError};
pub use models::*;
