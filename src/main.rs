mod app;
mod auth;
mod config;
mod db;
mod reservations;
mod seating;
mod state;
mod views;

use crate::{auth::services::provision_admins, config::AppConfig, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "seatbook=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = AppConfig::from_env()?;
    let app_state = AppState::init(config).await?;

    let created = provision_admins(
        app_state.admins.as_ref(),
        &app_state.config.admin_bootstrap,
    )
    .await?;
    if created > 0 {
        tracing::info!(created, "bootstrap admins created");
    }

    let host = app_state.config.host.clone();
    let port = app_state.config.port;
    let app = app::build_app(app_state);
    app::serve(app, &host, port).await
}
