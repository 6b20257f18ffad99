//! Async post store on a dedicated SQLite thread.
//!
//! Every query is shipped to one background thread owned by
//! `tokio_rusqlite::Connection` and executed in FIFO order, so request
//! handlers await results without blocking the runtime.
//!
//! Only SQL and light row mapping belong inside [`PostStore::call`].

use crate::{migrations, queries, NewPost, Post, StoreError, StoreResult};
use std::path::Path;
use tokio_rusqlite::Connection;
use tracing::{debug, info};

/// Handle to the capped post store. Cheap to clone.
#[derive(Clone)]
pub struct PostStore {
    conn: Connection,
    path: String,
    max_posts: usize,
}

impl PostStore {
    /// Open (or create) the store at `path`.
    ///
    /// Creates the parent directory, enables WAL mode and runs pending
    /// migrations.
    pub async fn open(path: &Path, max_posts: usize) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let path_str = path.to_string_lossy().to_string();
        info!(path = %path_str, max_posts, "Opening post store");

        let conn = Connection::open(path)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        let store = Self {
            conn,
            path: path_str,
            max_posts,
        };
        store
            .call_sqlite(|conn| {
                conn.execute_batch(
                    "
                    PRAGMA journal_mode = WAL;
                    PRAGMA synchronous = NORMAL;
                    PRAGMA busy_timeout = 5000;
                    ",
                )
            })
            .await?;
        store.call(migrations::run_migrations).await?;

        info!(path = %store.path, "Post store initialized with WAL mode");
        Ok(store)
    }

    /// Open a throwaway in-memory store.
    pub async fn open_in_memory(max_posts: usize) -> StoreResult<Self> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        let store = Self {
            conn,
            path: ":memory:".to_string(),
            max_posts,
        };
        store.call(migrations::run_migrations).await?;
        Ok(store)
    }

    /// Execute a closure on the store's connection thread.
    pub async fn call<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&rusqlite::Connection) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        // Carry our own result through tokio_rusqlite's Ok variant.
        self.conn.call(move |conn| Ok(f(conn))).await?
    }

    /// Execute a closure that only produces rusqlite errors.
    pub async fn call_sqlite<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&rusqlite::Connection) -> rusqlite::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        Ok(self.conn.call(move |conn| Ok(f(conn)?)).await?)
    }

    /// Insert a post and evict whatever falls beyond the cap, atomically.
    pub async fn insert(&self, new: NewPost) -> StoreResult<Post> {
        let keep = self.max_posts;
        let (post, evicted) = self
            .call(move |conn| {
                let tx = conn.unchecked_transaction()?;
                let post = queries::insert_post(&tx, &new)?;
                let evicted = queries::evict_oldest(&tx, keep)?;
                tx.commit()?;
                Ok((post, evicted))
            })
            .await?;

        debug!(post_id = %post.id, tag = %post.tag, evicted, "Post stored");
        Ok(post)
    }

    /// All stored posts, newest first.
    pub async fn list(&self) -> StoreResult<Vec<Post>> {
        self.call(queries::list_posts).await
    }

    pub async fn get(&self, id: &str) -> StoreResult<Option<Post>> {
        let id = id.to_string();
        self.call(move |conn| queries::get_post(conn, &id)).await
    }

    /// Delete a post. Returns `false` when no post had that id.
    pub async fn delete(&self, id: &str) -> StoreResult<bool> {
        let id = id.to_string();
        self.call(move |conn| queries::delete_post(conn, &id)).await
    }

    pub async fn count(&self) -> StoreResult<usize> {
        self.call(queries::count_posts).await
    }

    pub fn max_posts(&self) -> usize {
        self.max_posts
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Close the connection after pending operations complete.
    pub async fn close(self) -> StoreResult<()> {
        self.conn
            .close()
            .await
            .map_err(|e| StoreError::Connection(format!("Failed to close store: {}", e)))?;
        info!(path = %self.path, "Post store closed");
        Ok(())
    }
}
