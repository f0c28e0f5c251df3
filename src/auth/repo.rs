use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::RwLock;

use crate::auth::repo_types::Admin;

/// Admin credential store. Accounts are only ever added, never changed.
#[async_trait]
pub trait AdminDirectory: Send + Sync {
    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<Admin>>;
    /// Adds the admin unless the username exists. Returns whether a row was added.
    async fn insert_if_absent(&self, username: &str, password_hash: &str) -> anyhow::Result<bool>;
}

#[derive(Clone)]
pub struct PgAdminDirectory {
    db: PgPool,
}

impl PgAdminDirectory {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AdminDirectory for PgAdminDirectory {
    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<Admin>> {
        let admin = sqlx::query_as::<_, Admin>(
            r#"
            SELECT username, password_hash
            FROM admins
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await?;
        Ok(admin)
    }

    async fn insert_if_absent(&self, username: &str, password_hash: &str) -> anyhow::Result<bool> {
        let res = sqlx::query(
            r#"
            INSERT INTO admins (username, password_hash)
            VALUES ($1, $2)
            ON CONFLICT (username) DO NOTHING
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .execute(&self.db)
        .await?;
        Ok(res.rows_affected() > 0)
    }
}

#[derive(Default)]
pub struct MemoryAdminDirectory {
    admins: RwLock<HashMap<String, Admin>>,
}

impl MemoryAdminDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AdminDirectory for MemoryAdminDirectory {
    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<Admin>> {
        Ok(self.admins.read().await.get(username).cloned())
    }

    async fn insert_if_absent(&self, username: &str, password_hash: &str) -> anyhow::Result<bool> {
        let mut admins = self.admins.write().await;
        if admins.contains_key(username) {
            return Ok(false);
        }
        admins.insert(
            username.to_string(),
            Admin {
                username: username.to_string(),
                password_hash: password_hash.to_string(),
            },
        );
        Ok(true)
    }
}
