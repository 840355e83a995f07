//! Key-value access to the local store.
//!
//! Every write replaces a whole value; there are no partial updates.

use chrono::Utc;
use sqlx::{Row, SqlitePool};

use crate::errors::AppError;
use crate::models::{Session, StateDocument};

const STATE_KEY: &str = "state";
const SESSION_KEY: &str = "session";

/// Durable store for the State Document and the authentication session.
#[derive(Clone)]
pub struct LocalStore {
    pool: SqlitePool,
}

impl LocalStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let row = sqlx::query("SELECT value FROM kv WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get("value")))
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), AppError> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO kv (key, value, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(value)
        .bind(&now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM kv WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Read the persisted document. An unreadable value is treated as absent.
    pub async fn load_state(&self) -> Result<Option<StateDocument>, AppError> {
        let Some(raw) = self.get(STATE_KEY).await? else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(doc) => Ok(Some(doc)),
            Err(e) => {
                tracing::warn!("Stored state is unreadable, falling back to seed: {}", e);
                Ok(None)
            }
        }
    }

    pub async fn save_state(&self, doc: &StateDocument) -> Result<(), AppError> {
        let raw = serde_json::to_string(doc)?;
        self.put(STATE_KEY, &raw).await
    }

    /// Load the persisted document, creating and saving the seed on first run.
    pub async fn load_or_seed(
        &self,
        default_remote_url: Option<&str>,
    ) -> Result<StateDocument, AppError> {
        let mut doc = match self.load_state().await? {
            Some(doc) => doc,
            None => {
                tracing::info!("No stored state found, writing seed document");
                let seed = StateDocument::seed();
                self.save_state(&seed).await?;
                seed
            }
        };
        doc.fill_defaults(default_remote_url);
        Ok(doc)
    }

    pub async fn get_session(&self) -> Result<Option<Session>, AppError> {
        let Some(raw) = self.get(SESSION_KEY).await? else {
            return Ok(None);
        };
        Ok(serde_json::from_str(&raw).ok())
    }

    /// Store a session, replacing any previous one.
    pub async fn set_session(&self, session: &Session) -> Result<(), AppError> {
        let raw = serde_json::to_string(session)?;
        self.put(SESSION_KEY, &raw).await
    }

    pub async fn clear_session(&self) -> Result<(), AppError> {
        self.remove(SESSION_KEY).await
    }
}
