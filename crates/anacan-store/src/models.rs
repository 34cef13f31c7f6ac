//! Records kept in the offline cache.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A post saved for offline reading. `id` is the remote document id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedPost {
    pub id: String,
    pub slug: String,
    pub category_id: Option<String>,
    pub title: String,
    pub excerpt: Option<String>,
    pub content: String,
    pub cover_image: Option<String>,
    pub language: String,
    pub status: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// A user's named collection of saved posts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingList {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ReadingList {
    /// New list with a locally generated id.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            description: None,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingListItem {
    pub id: String,
    pub list_id: String,
    pub post_id: String,
    pub added_at: DateTime<Utc>,
}

impl ReadingListItem {
    pub fn new(list_id: &str, post_id: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            list_id: list_id.to_string(),
            post_id: post_id.to_string(),
            added_at: Utc::now(),
        }
    }
}
