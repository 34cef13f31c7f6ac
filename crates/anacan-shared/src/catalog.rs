//! The declared remote schema of the Anacan.az site.
//!
//! Order matters: collections are provisioned top to bottom, and inside each
//! collection attributes always precede indexes.

use crate::constants::*;
use crate::schema::{
    AttributeSpec as A, IndexSpec as I, PermissionAction, PermissionRole, PermissionRule as P,
    SchemaDefinition, SortOrder,
};

/// Content readable by everyone, editable by signed-in editors.
const PUBLIC_CONTENT: [P; 4] = [
    P::read_any(),
    P::create_users(),
    P::update_users(),
    P::delete_users(),
];

/// Public threads written by users; edits go through per-document permissions.
const COMMUNITY: [P; 2] = [P::read_any(), P::create_users()];

/// Private to the owning user through per-document permissions.
const USER_OWNED: [P; 1] = [P::create_users()];

pub fn schema_catalog() -> Vec<SchemaDefinition> {
    vec![
        categories(),
        posts(),
        pages(),
        forums(),
        forum_topics(),
        comments(),
        reading_lists(),
        reading_list_items(),
        newsletter_subscribers(),
    ]
}

fn categories() -> SchemaDefinition {
    SchemaDefinition::new(COLLECTION_CATEGORIES, "Categories")
        .permissions(&PUBLIC_CONTENT)
        .attribute(A::string("name_az", 255).required())
        .attribute(A::string("name_ru", 255))
        .attribute(A::string("slug", 128).required())
        .attribute(A::string("description_az", 1000))
        .attribute(A::string("description_ru", 1000))
        .attribute(A::string("icon", 64))
        .attribute(A::integer("sort_order").with_default(0))
        .attribute(A::boolean("is_active").with_default(true))
        .index(I::unique("idx_slug", &["slug"]))
        .index(I::key("idx_sort_order", &["sort_order"]).orders(&[SortOrder::Asc]))
}

fn posts() -> SchemaDefinition {
    SchemaDefinition::new(COLLECTION_POSTS, "Posts")
        .permissions(&PUBLIC_CONTENT)
        .attribute(A::string("title", 255).required())
        .attribute(A::string("slug", 255).required())
        .attribute(A::string("excerpt", 500))
        .attribute(A::string("content", 100_000).required())
        .attribute(A::string("cover_image", 2048))
        .attribute(A::string("category_id", 64).required())
        .attribute(A::string("author_name", 128))
        .attribute(A::string("language", 8).with_default("az"))
        .attribute(A::string("status", 32).with_default("draft"))
        .attribute(A::string("tags", 64).array())
        .attribute(A::boolean("featured").with_default(false))
        .attribute(A::integer("views").with_default(0).range(0.0, 1e12))
        .attribute(A::integer("reading_time").range(0.0, 600.0))
        .attribute(A::datetime("published_at"))
        .index(I::unique("idx_slug", &["slug"]))
        .index(I::key("idx_category", &["category_id"]))
        .index(
            I::key("idx_status_published", &["status", "published_at"])
                .orders(&[SortOrder::Asc, SortOrder::Desc]),
        )
        .index(I::key("idx_language", &["language"]))
        .index(I::fulltext("idx_title_search", &["title"]))
}

fn pages() -> SchemaDefinition {
    SchemaDefinition::new(COLLECTION_PAGES, "Pages")
        .permissions(&PUBLIC_CONTENT)
        .attribute(A::string("title", 255).required())
        .attribute(A::string("slug", 128).required())
        .attribute(A::string("content", 50_000))
        .attribute(A::string("language", 8).with_default("az"))
        .attribute(A::string("status", 32).with_default("draft"))
        .index(I::unique("idx_slug", &["slug"]))
}

fn forums() -> SchemaDefinition {
    SchemaDefinition::new(COLLECTION_FORUMS, "Forums")
        .permissions(&PUBLIC_CONTENT)
        .attribute(A::string("name", 255).required())
        .attribute(A::string("slug", 128).required())
        .attribute(A::string("description", 1000))
        .attribute(A::boolean("is_active").with_default(true))
        .attribute(A::integer("sort_order").with_default(0))
        .index(I::unique("idx_slug", &["slug"]))
}

fn forum_topics() -> SchemaDefinition {
    SchemaDefinition::new(COLLECTION_FORUM_TOPICS, "Forum topics")
        .permissions(&COMMUNITY)
        .document_security()
        .attribute(A::string("forum_id", 64).required())
        .attribute(A::string("title", 255).required())
        .attribute(A::string("slug", 255).required())
        .attribute(A::string("content", 20_000).required())
        .attribute(A::string("author_id", 64).required())
        .attribute(A::string("author_name", 128))
        .attribute(A::integer("reply_count").with_default(0))
        .attribute(A::boolean("is_pinned").with_default(false))
        .index(I::key("idx_forum", &["forum_id"]))
        .index(I::unique("idx_slug", &["slug"]))
}

fn comments() -> SchemaDefinition {
    SchemaDefinition::new(COLLECTION_COMMENTS, "Comments")
        .permissions(&COMMUNITY)
        .document_security()
        .attribute(A::string("post_id", 64).required())
        .attribute(A::string("author_id", 64))
        .attribute(A::string("author_name", 128).required())
        .attribute(A::string("content", 2000).required())
        .attribute(A::string("status", 32).with_default("pending"))
        .index(I::key("idx_post", &["post_id"]))
        .index(I::key("idx_status", &["status"]))
}

fn reading_lists() -> SchemaDefinition {
    SchemaDefinition::new(COLLECTION_READING_LISTS, "Reading lists")
        .permissions(&USER_OWNED)
        .document_security()
        .attribute(A::string("user_id", 64).required())
        .attribute(A::string("name", 255).required())
        .attribute(A::string("description", 1000))
        .attribute(A::boolean("is_public").with_default(false))
        .index(I::key("idx_user", &["user_id"]))
}

fn reading_list_items() -> SchemaDefinition {
    SchemaDefinition::new(COLLECTION_READING_LIST_ITEMS, "Reading list items")
        .permissions(&USER_OWNED)
        .document_security()
        .attribute(A::string("list_id", 64).required())
        .attribute(A::string("post_id", 64).required())
        .attribute(A::integer("position").with_default(0))
        .index(I::key("idx_list", &["list_id"]))
        .index(I::unique("idx_list_post", &["list_id", "post_id"]))
}

fn newsletter_subscribers() -> SchemaDefinition {
    SchemaDefinition::new(COLLECTION_SUBSCRIBERS, "Newsletter subscribers")
        .permissions(&[P::new(PermissionAction::Create, PermissionRole::Any)])
        .attribute(A::email("email").required())
        .attribute(A::string("language", 8).with_default("az"))
        .attribute(A::boolean("is_confirmed").with_default(false))
        .attribute(A::datetime("subscribed_at"))
        .index(I::unique("idx_email", &["email"]))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_catalog_is_valid() {
        for def in schema_catalog() {
            def.validate()
                .unwrap_or_else(|e| panic!("{} is invalid: {e}", def.collection_id));
        }
    }

    #[test]
    fn test_collection_ids_unique() {
        let catalog = schema_catalog();
        let ids: HashSet<_> = catalog.iter().map(|d| d.collection_id.as_str()).collect();
        assert_eq!(ids.len(), catalog.len());
    }

    #[test]
    fn test_posts_slug_is_unique_indexed() {
        let posts = schema_catalog()
            .into_iter()
            .find(|d| d.collection_id == COLLECTION_POSTS)
            .unwrap();
        let idx = posts.indexes.iter().find(|i| i.key == "idx_slug").unwrap();
        assert_eq!(idx.kind, crate::schema::IndexKind::Unique);
        assert_eq!(idx.attribute_keys, vec!["slug".to_string()]);
    }
}
