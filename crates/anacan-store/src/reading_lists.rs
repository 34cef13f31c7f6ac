//! The `reading_lists` and `reading_list_items` partitions.

use rusqlite::{params, OptionalExtension};

use crate::cache::OfflineCache;
use crate::error::Result;
use crate::models::{ReadingList, ReadingListItem};
use crate::posts::parse_time;

impl OfflineCache {
    // ------------------------------------------------------------------
    // Reading lists
    // ------------------------------------------------------------------

    pub fn put_reading_list(&self, list: &ReadingList) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO reading_lists (id, name, description, created_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(id) DO UPDATE SET
                    name = excluded.name,
                    description = excluded.description,
                    created_at = excluded.created_at",
                params![list.id, list.name, list.description, list.created_at.to_rfc3339()],
            )?;
            Ok(())
        })
    }

    pub fn get_reading_list(&self, id: &str) -> Result<Option<ReadingList>> {
        self.with_conn(|conn| {
            Ok(conn
                .query_row(
                    "SELECT id, name, description, created_at FROM reading_lists WHERE id = ?1",
                    params![id],
                    row_to_list,
                )
                .optional()?)
        })
    }

    pub fn get_all_reading_lists(&self) -> Result<Vec<ReadingList>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, description, created_at FROM reading_lists ORDER BY id",
            )?;
            let rows = stmt.query_map([], row_to_list)?;

            let mut lists = Vec::new();
            for row in rows {
                lists.push(row?);
            }
            Ok(lists)
        })
    }

    /// Remove a list. Its items are left in place; they are a separate
    /// partition and are removed with [`delete_reading_list_item`].
    ///
    /// [`delete_reading_list_item`]: OfflineCache::delete_reading_list_item
    pub fn delete_reading_list(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let affected = conn.execute("DELETE FROM reading_lists WHERE id = ?1", params![id])?;
            Ok(affected > 0)
        })
    }

    // ------------------------------------------------------------------
    // Reading list items
    // ------------------------------------------------------------------

    pub fn put_reading_list_item(&self, item: &ReadingListItem) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO reading_list_items (id, list_id, post_id, added_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(id) DO UPDATE SET
                    list_id = excluded.list_id,
                    post_id = excluded.post_id,
                    added_at = excluded.added_at",
                params![item.id, item.list_id, item.post_id, item.added_at.to_rfc3339()],
            )?;
            Ok(())
        })
    }

    pub fn get_reading_list_item(&self, id: &str) -> Result<Option<ReadingListItem>> {
        self.with_conn(|conn| {
            Ok(conn
                .query_row(
                    "SELECT id, list_id, post_id, added_at FROM reading_list_items WHERE id = ?1",
                    params![id],
                    row_to_item,
                )
                .optional()?)
        })
    }

    pub fn get_all_reading_list_items(&self) -> Result<Vec<ReadingListItem>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, list_id, post_id, added_at FROM reading_list_items ORDER BY id",
            )?;
            let rows = stmt.query_map([], row_to_item)?;

            let mut items = Vec::new();
            for row in rows {
                items.push(row?);
            }
            Ok(items)
        })
    }

    /// Items of one list, oldest first.
    pub fn items_for_list(&self, list_id: &str) -> Result<Vec<ReadingListItem>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, list_id, post_id, added_at
                 FROM reading_list_items
                 WHERE list_id = ?1
                 ORDER BY added_at ASC, id ASC",
            )?;
            let rows = stmt.query_map(params![list_id], row_to_item)?;

            let mut items = Vec::new();
            for row in rows {
                items.push(row?);
            }
            Ok(items)
        })
    }

    pub fn delete_reading_list_item(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let affected =
                conn.execute("DELETE FROM reading_list_items WHERE id = ?1", params![id])?;
            Ok(affected > 0)
        })
    }
}

fn row_to_list(row: &rusqlite::Row<'_>) -> rusqlite::Result<ReadingList> {
    let created_str: String = row.get(3)?;
    Ok(ReadingList {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        created_at: parse_time(3, &created_str)?,
    })
}

fn row_to_item(row: &rusqlite::Row<'_>) -> rusqlite::Result<ReadingListItem> {
    let added_str: String = row.get(3)?;
    Ok(ReadingListItem {
        id: row.get(0)?,
        list_id: row.get(1)?,
        post_id: row.get(2)?,
        added_at: parse_time(3, &added_str)?,
    })
}
