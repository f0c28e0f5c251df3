use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use tracing::info;

use crate::config::AppConfig;

pub async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
    let url = config
        .database_url
        .as_deref()
        .context("DATABASE_URL must be set")?;
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(url)
        .await
        .context("connect to database")?;
    info!("database connected");
    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("run migrations")?;
    info!("migrations applied");
    Ok(())
}
