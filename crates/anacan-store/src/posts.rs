//! The `posts` partition.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::cache::OfflineCache;
use crate::error::Result;
use crate::models::CachedPost;

const POST_COLUMNS: &str = "id, slug, category_id, title, excerpt, content, cover_image, \
                            language, status, tags, published_at, updated_at";

impl OfflineCache {
    /// Insert or replace a post. The last write for an id wins.
    pub fn put_post(&self, post: &CachedPost) -> Result<()> {
        let tags = serde_json::to_string(&post.tags)?;
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO posts (id, slug, category_id, title, excerpt, content, cover_image,
                                    language, status, tags, published_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                 ON CONFLICT(id) DO UPDATE SET
                    slug = excluded.slug,
                    category_id = excluded.category_id,
                    title = excluded.title,
                    excerpt = excluded.excerpt,
                    content = excluded.content,
                    cover_image = excluded.cover_image,
                    language = excluded.language,
                    status = excluded.status,
                    tags = excluded.tags,
                    published_at = excluded.published_at,
                    updated_at = excluded.updated_at",
                params![
                    post.id,
                    post.slug,
                    post.category_id,
                    post.title,
                    post.excerpt,
                    post.content,
                    post.cover_image,
                    post.language,
                    post.status,
                    tags,
                    post.published_at.map(|t| t.to_rfc3339()),
                    post.updated_at.to_rfc3339(),
                ],
            )?;
            Ok(())
        })
    }

    /// `None` if the post is not cached.
    pub fn get_post(&self, id: &str) -> Result<Option<CachedPost>> {
        self.with_conn(|conn| query_one(conn, "id", id))
    }

    pub fn get_post_by_slug(&self, slug: &str) -> Result<Option<CachedPost>> {
        self.with_conn(|conn| query_one(conn, "slug", slug))
    }

    /// Every cached post, in primary key order.
    pub fn get_all_posts(&self) -> Result<Vec<CachedPost>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {POST_COLUMNS} FROM posts ORDER BY id");
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map([], row_to_post)?;
            collect(rows)
        })
    }

    pub fn posts_by_category(&self, category_id: &str) -> Result<Vec<CachedPost>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE category_id = ?1 ORDER BY id");
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![category_id], row_to_post)?;
            collect(rows)
        })
    }

    /// Remove a post. Returns `true` if a row was deleted.
    pub fn delete_post(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let affected = conn.execute("DELETE FROM posts WHERE id = ?1", params![id])?;
            Ok(affected > 0)
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn query_one(conn: &Connection, column: &str, value: &str) -> Result<Option<CachedPost>> {
    let sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE {column} = ?1");
    Ok(conn
        .query_row(&sql, params![value], row_to_post)
        .optional()?)
}

fn collect(rows: impl Iterator<Item = rusqlite::Result<CachedPost>>) -> Result<Vec<CachedPost>> {
    let mut posts = Vec::new();
    for row in rows {
        posts.push(row?);
    }
    Ok(posts)
}

pub(crate) fn parse_time(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn row_to_post(row: &rusqlite::Row<'_>) -> rusqlite::Result<CachedPost> {
    let tags_json: String = row.get(9)?;
    let tags: Vec<String> = serde_json::from_str(&tags_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(9, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let published_str: Option<String> = row.get(10)?;
    let updated_str: String = row.get(11)?;

    Ok(CachedPost {
        id: row.get(0)?,
        slug: row.get(1)?,
        category_id: row.get(2)?,
        title: row.get(3)?,
        excerpt: row.get(4)?,
        content: row.get(5)?,
        cover_image: row.get(6)?,
        language: row.get(7)?,
        status: row.get(8)?,
        tags,
        published_at: published_str.map(|s| parse_time(10, &s)).transpose()?,
        updated_at: parse_time(11, &updated_str)?,
    })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn cache() -> (tempfile::TempDir, OfflineCache) {
        let dir = tempfile::tempdir().unwrap();
        let cache = OfflineCache::new(dir.path().join("cache.db"));
        (dir, cache)
    }

    fn post(id: &str, slug: &str, category: &str) -> CachedPost {
        CachedPost {
            id: id.to_string(),
            slug: slug.to_string(),
            category_id: Some(category.to_string()),
            title: format!("Title of {slug}"),
            excerpt: Some("Qısa məzmun".to_string()),
            content: "<p>Mətn</p>".to_string(),
            cover_image: None,
            language: "az".to_string(),
            status: "published".to_string(),
            tags: vec!["hamiləlik".to_string(), "sağlamlıq".to_string()],
            published_at: Some(Utc.with_ymd_and_hms(2024, 3, 8, 9, 0, 0).unwrap()),
            updated_at: Utc.with_ymd_and_hms(2024, 3, 9, 12, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_put_get_round_trip() {
        let (_dir, cache) = cache();
        let original = post("p1", "ilk-addimlar", "saglamliq");
        cache.put_post(&original).unwrap();

        assert_eq!(cache.get_post("p1").unwrap(), Some(original));
    }

    #[test]
    fn test_missing_key_is_none() {
        let (_dir, cache) = cache();
        assert_eq!(cache.get_post("nope").unwrap(), None);
    }

    #[test]
    fn test_delete_then_get_is_none() {
        let (_dir, cache) = cache();
        cache.put_post(&post("p1", "a", "c")).unwrap();

        assert!(cache.delete_post("p1").unwrap());
        assert_eq!(cache.get_post("p1").unwrap(), None);
        assert!(!cache.delete_post("p1").unwrap());
    }

    #[test]
    fn test_upsert_last_write_wins() {
        let (_dir, cache) = cache();
        let mut first = post("p1", "a", "c");
        cache.put_post(&first).unwrap();

        first.title = "Yenilənmiş başlıq".to_string();
        first.published_at = None;
        cache.put_post(&first).unwrap();

        let all = cache.get_all_posts().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0], first);
    }

    #[test]
    fn test_slug_conflict_across_ids_is_rejected() {
        let (_dir, cache) = cache();
        cache.put_post(&post("p1", "same", "c")).unwrap();
        assert!(cache.put_post(&post("p2", "same", "c")).is_err());
        assert_eq!(cache.get_all_posts().unwrap().len(), 1);
    }

    #[test]
    fn test_secondary_lookups() {
        let (_dir, cache) = cache();
        cache.put_post(&post("p2", "b", "tehsil")).unwrap();
        cache.put_post(&post("p1", "a", "saglamliq")).unwrap();
        cache.put_post(&post("p3", "c", "tehsil")).unwrap();

        assert_eq!(cache.get_post_by_slug("a").unwrap().map(|p| p.id), Some("p1".into()));
        assert_eq!(cache.get_post_by_slug("zzz").unwrap(), None);

        let ids: Vec<String> = cache
            .posts_by_category("tehsil")
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec!["p2", "p3"]);

        let all: Vec<String> = cache.get_all_posts().unwrap().into_iter().map(|p| p.id).collect();
        assert_eq!(all, vec!["p1", "p2", "p3"]);
    }

    #[test]
    fn test_data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.db");
        OfflineCache::new(&path).put_post(&post("p1", "a", "c")).unwrap();

        let reopened = OfflineCache::new(&path);
        assert!(reopened.get_post("p1").unwrap().is_some());
    }
}
