use rusqlite::Connection;

const UP_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS reading_list_items (
    id       TEXT PRIMARY KEY NOT NULL,
    list_id  TEXT NOT NULL,                  -- reading_lists(id)
    post_id  TEXT NOT NULL,                  -- posts(id), may not be cached
    added_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_reading_list_items_list_id ON reading_list_items(list_id);
"#;

pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
