//! Standalone query functions.
//!
//! Each function takes a `&Connection` so it can run inside
//! [`PostStore::call`](crate::PostStore::call) or against a plain
//! connection in tests.

use crate::{NewPost, Post, StoreResult};
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;
use ulid::Ulid;

const POST_COLUMNS: &str = "id, topic, description, link, tag, source, timestamp";

/// Insert a new post, assigning its id and creation time.
pub fn insert_post(conn: &Connection, new: &NewPost) -> StoreResult<Post> {
    let post = Post {
        id: Ulid::new().to_string(),
        topic: new.topic.clone(),
        description: new.description.clone(),
        message: new.description.clone(),
        link: new.link.clone(),
        tag: new.tag.clone(),
        source: new.source.clone(),
        // Stored with microsecond precision.
        timestamp: Utc::now().trunc_subsecs(6),
    };

    conn.execute(
        "INSERT INTO posts (id, topic, description, link, tag, source, timestamp)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            post.id,
            post.topic,
            post.description,
            post.link,
            post.tag,
            post.source,
            format_timestamp(&post.timestamp),
        ],
    )?;

    Ok(post)
}

/// Delete every post beyond the newest `keep`. Returns how many were removed.
pub fn evict_oldest(conn: &Connection, keep: usize) -> StoreResult<usize> {
    let removed = conn.execute(
        "DELETE FROM posts WHERE seq NOT IN (
             SELECT seq FROM posts ORDER BY timestamp DESC, seq DESC LIMIT ?1
         )",
        params![keep as i64],
    )?;
    if removed > 0 {
        debug!(removed, keep, "Evicted oldest posts");
    }
    Ok(removed)
}

/// All posts, newest first.
pub fn list_posts(conn: &Connection) -> StoreResult<Vec<Post>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {} FROM posts ORDER BY timestamp DESC, seq DESC",
        POST_COLUMNS
    ))?;
    let posts = stmt
        .query_map([], row_to_post)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(posts)
}

/// Get a post by ID.
pub fn get_post(conn: &Connection, id: &str) -> StoreResult<Option<Post>> {
    let mut stmt =
        conn.prepare_cached(&format!("SELECT {} FROM posts WHERE id = ?1", POST_COLUMNS))?;
    let post = stmt.query_row(params![id], row_to_post).optional()?;
    Ok(post)
}

/// Delete a post by ID. Returns whether a row was removed.
pub fn delete_post(conn: &Connection, id: &str) -> StoreResult<bool> {
    let count = conn.execute("DELETE FROM posts WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

/// Number of stored posts.
pub fn count_posts(conn: &Connection) -> StoreResult<usize> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM posts", [], |row| row.get(0))?;
    Ok(count as usize)
}

fn row_to_post(row: &Row<'_>) -> rusqlite::Result<Post> {
    let description: String = row.get(2)?;
    Ok(Post {
        id: row.get(0)?,
        topic: row.get(1)?,
        message: description.clone(),
        description,
        link: row.get(3)?,
        tag: row.get(4)?,
        source: row.get(5)?,
        timestamp: parse_timestamp(row, 6)?,
    })
}

/// Fixed-width UTC form so that text order matches time order.
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
