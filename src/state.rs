use std::sync::Arc;

use tracing::info;

use crate::auth::{
    password::{Argon2Verifier, CredentialVerifier},
    repo::{AdminDirectory, MemoryAdminDirectory, PgAdminDirectory},
};
use crate::config::{AppConfig, StoreBackend};
use crate::db;
use crate::reservations::repo::{MemoryReservationStore, PgReservationStore, ReservationStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub reservations: Arc<dyn ReservationStore>,
    pub admins: Arc<dyn AdminDirectory>,
    pub verifier: Arc<dyn CredentialVerifier>,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let config = Arc::new(config);
        match config.store_backend {
            StoreBackend::Postgres => {
                let pool = db::connect(&config).await?;
                db::run_migrations(&pool).await?;
                Ok(Self {
                    reservations: Arc::new(PgReservationStore::new(pool.clone())),
                    admins: Arc::new(PgAdminDirectory::new(pool)),
                    verifier: Arc::new(Argon2Verifier),
                    config,
                })
            }
            StoreBackend::Memory => {
                info!("using in-memory stores; data is lost on restart");
                Ok(Self::in_memory(config))
            }
        }
    }

    pub fn in_memory(config: Arc<AppConfig>) -> Self {
        Self {
            config,
            reservations: Arc::new(MemoryReservationStore::new()),
            admins: Arc::new(MemoryAdminDirectory::new()),
            verifier: Arc::new(Argon2Verifier),
        }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        Self::in_memory(Arc::new(AppConfig::for_tests()))
    }
}
