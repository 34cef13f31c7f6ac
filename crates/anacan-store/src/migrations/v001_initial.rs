//! v001 -- Initial cache schema.
//!
//! Creates the `posts` and `reading_lists` partitions.

use rusqlite::Connection;

const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Posts
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS posts (
    id           TEXT PRIMARY KEY NOT NULL,   -- remote document id
    slug         TEXT NOT NULL,
    category_id  TEXT,
    title        TEXT NOT NULL,
    excerpt      TEXT,
    content      TEXT NOT NULL,
    cover_image  TEXT,
    language     TEXT NOT NULL,
    status       TEXT NOT NULL,
    tags         TEXT NOT NULL DEFAULT '[]',  -- JSON array of strings
    published_at TEXT,                        -- RFC-3339
    updated_at   TEXT NOT NULL                -- RFC-3339
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_posts_slug ON posts(slug);
CREATE INDEX IF NOT EXISTS idx_posts_category_id ON posts(category_id);

-- ----------------------------------------------------------------
-- Reading lists
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS reading_lists (
    id          TEXT PRIMARY KEY NOT NULL,
    name        TEXT NOT NULL,
    description TEXT,
    created_at  TEXT NOT NULL
);
"#;

pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
