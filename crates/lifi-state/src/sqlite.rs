//! SQLite-backed store using sqlx
//!
//! Timestamps are stored as Unix milliseconds. Writes run inside a
//! transaction and behind an in-process lock, so concurrent recordings from
//! the reader and request handlers are applied one at a time.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lifi_core::{
    MeshMessage, MeshStats, MessageRecord, MessageType, MessageView, Node, NodeId, NodeStatus,
    NodeUpdate,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::path::Path;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{Result, StateError};
use crate::store::MeshStore;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS nodes (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        latitude REAL,
        longitude REAL,
        status TEXT NOT NULL DEFAULT 'unknown',
        last_seen INTEGER
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS messages (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        sender_id TEXT NOT NULL REFERENCES nodes(id),
        type INTEGER NOT NULL,
        content TEXT NOT NULL,
        is_sos INTEGER NOT NULL DEFAULT 0,
        timestamp INTEGER NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_messages_timestamp ON messages (timestamp)",
];

/// Persistent [`MeshStore`] on a SQLite database
#[derive(Debug)]
pub struct SqliteStore {
    pool: SqlitePool,
    write_lock: Mutex<()>,
}

impl SqliteStore {
    /// Connect using a sqlx URL such as `sqlite:hq.db?mode=rwc`
    pub async fn new(url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await
            .map_err(|e| StateError::Connection(e.to_string()))?;
        Self::from_pool(pool).await
    }

    /// Open (creating if missing) a database file
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| StateError::Connection(e.to_string()))?;
        info!(path = %path.as_ref().display(), "Opened SQLite store");
        Self::from_pool(pool).await
    }

    /// Private in-memory database.
    ///
    /// Each SQLite connection has its own memory database, so the pool is
    /// pinned to one connection that never expires.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| StateError::Connection(e.to_string()))?;
        Self::from_pool(pool).await
    }

    async fn from_pool(pool: SqlitePool) -> Result<Self> {
        let store = Self {
            pool,
            write_lock: Mutex::new(()),
        };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        self.seed_hq().await
    }

    /// Insert the HQ node unless it already exists
    async fn seed_hq(&self) -> Result<()> {
        let hq = Node::headquarters(Utc::now());
        let inserted = sqlx::query(
            "INSERT OR IGNORE INTO nodes (id, name, latitude, longitude, status, last_seen)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(hq.id.as_str())
        .bind(&hq.name)
        .bind(hq.latitude)
        .bind(hq.longitude)
        .bind(hq.status.as_str())
        .bind(hq.last_seen.map(|t| t.timestamp_millis()))
        .execute(&self.pool)
        .await?
        .rows_affected();

        if inserted > 0 {
            debug!("Seeded headquarters node");
        }
        Ok(())
    }

    /// Close the underlying pool
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn from_millis(ms: i64) -> Result<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .ok_or_else(|| StateError::InvalidData(format!("timestamp out of range: {}", ms)))
}

fn node_from_row(row: &SqliteRow) -> Result<Node> {
    let status: String = row.try_get("status")?;
    let last_seen: Option<i64> = row.try_get("last_seen")?;
    Ok(Node {
        id: NodeId(row.try_get("id")?),
        name: row.try_get("name")?,
        latitude: row.try_get("latitude")?,
        longitude: row.try_get("longitude")?,
        status: status.parse::<NodeStatus>()?,
        last_seen: last_seen.map(from_millis).transpose()?,
    })
}

fn record_from_row(row: &SqliteRow) -> Result<MessageRecord> {
    let code: i64 = row.try_get("type")?;
    let code = u8::try_from(code)
        .map_err(|_| StateError::InvalidData(format!("message type out of range: {}", code)))?;
    Ok(MessageRecord {
        id: row.try_get("id")?,
        sender_id: NodeId(row.try_get("sender_id")?),
        message_type: MessageType::try_from(code)?,
        content: row.try_get("content")?,
        is_emergency: row.try_get("is_sos")?,
        timestamp: from_millis(row.try_get("timestamp")?)?,
    })
}

#[async_trait]
impl MeshStore for SqliteStore {
    async fn record_message(
        &self,
        sender_id: &NodeId,
        message_type: MessageType,
        content: &str,
    ) -> Result<MessageRecord> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;
        let now_ms = Utc::now().timestamp_millis();

        let created = sqlx::query(
            "INSERT OR IGNORE INTO nodes (id, name, status, last_seen) VALUES (?, ?, 'unknown', ?)",
        )
        .bind(sender_id.as_str())
        .bind(Node::default_name(sender_id))
        .bind(now_ms)
        .execute(&mut *tx)
        .await?
        .rows_affected();
        if created > 0 {
            debug!(node = %sender_id, "Creating node on first message");
        }

        let status = if message_type.is_emergency() {
            NodeStatus::Sos
        } else {
            NodeStatus::Active
        };
        sqlx::query("UPDATE nodes SET status = ?, last_seen = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(now_ms)
            .bind(sender_id.as_str())
            .execute(&mut *tx)
            .await?;

        let last: Option<i64> = sqlx::query_scalar("SELECT MAX(timestamp) FROM messages")
            .fetch_one(&mut *tx)
            .await?;
        let timestamp_ms = last.map_or(now_ms, |last| last.max(now_ms));

        let id = sqlx::query(
            "INSERT INTO messages (sender_id, type, content, is_sos, timestamp)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(sender_id.as_str())
        .bind(i64::from(message_type.code()))
        .bind(content)
        .bind(message_type.is_emergency())
        .bind(timestamp_ms)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        tx.commit().await?;

        let message = MeshMessage::new(sender_id.clone(), message_type, content);
        Ok(MessageRecord::new(id, message, from_millis(timestamp_ms)?))
    }

    async fn get_nodes(&self) -> Result<Vec<Node>> {
        let rows = sqlx::query("SELECT * FROM nodes ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(node_from_row).collect()
    }

    async fn get_node(&self, id: &NodeId) -> Result<Option<Node>> {
        let row = sqlx::query("SELECT * FROM nodes WHERE id = ?")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(node_from_row).transpose()
    }

    async fn update_node(&self, id: &NodeId, update: &NodeUpdate) -> Result<Option<Node>> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT * FROM nodes WHERE id = ?")
            .bind(id.as_str())
            .fetch_optional(&mut *tx)
            .await?;
        let Some(mut node) = row.as_ref().map(node_from_row).transpose()? else {
            return Ok(None);
        };

        if update.apply_to(&mut node, Utc::now()) {
            sqlx::query(
                "UPDATE nodes SET name = ?, latitude = ?, longitude = ?, status = ?, last_seen = ?
                 WHERE id = ?",
            )
            .bind(&node.name)
            .bind(node.latitude)
            .bind(node.longitude)
            .bind(node.status.as_str())
            .bind(node.last_seen.map(|t| t.timestamp_millis()))
            .bind(id.as_str())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(Some(node))
    }

    async fn get_messages(&self, limit: usize) -> Result<Vec<MessageView>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = sqlx::query(
            "SELECT m.*, n.name AS sender_name
             FROM messages m
             LEFT JOIN nodes n ON m.sender_id = n.id
             ORDER BY m.timestamp DESC, m.id DESC
             LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let record = record_from_row(row)?;
                let name: Option<String> = row.try_get("sender_name")?;
                let name = name.unwrap_or_else(|| record.sender_id.to_string());
                Ok(MessageView::new(record, name))
            })
            .collect()
    }

    async fn get_stats(&self) -> Result<MeshStats> {
        let row = sqlx::query(
            "SELECT
                (SELECT COUNT(*) FROM nodes) AS total_nodes,
                (SELECT COUNT(*) FROM nodes WHERE status = 'active') AS active_nodes,
                (SELECT COUNT(*) FROM nodes WHERE status = 'sos') AS sos_nodes,
                (SELECT COUNT(*) FROM messages) AS total_messages,
                (SELECT COUNT(*) FROM messages WHERE is_sos = 1) AS sos_count",
        )
        .fetch_one(&self.pool)
        .await?;

        let count = |column: &str| -> Result<u64> {
            let value: i64 = row.try_get(column)?;
            Ok(value.max(0) as u64)
        };
        Ok(MeshStats {
            total_nodes: count("total_nodes")?,
            active_nodes: count("active_nodes")?,
            sos_nodes: count("sos_nodes")?,
            total_messages: count("total_messages")?,
            sos_count: count("sos_count")?,
        })
    }

    async fn clear(&self) -> Result<()> {
        {
            let _guard = self.write_lock.lock().await;
            let mut tx = self.pool.begin().await?;
            sqlx::query("DELETE FROM messages").execute(&mut *tx).await?;
            sqlx::query("DELETE FROM nodes").execute(&mut *tx).await?;
            tx.commit().await?;
        }
        info!("Cleared store");
        self.seed_hq().await
    }
}
