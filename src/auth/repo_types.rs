use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Admin account in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Admin {
    pub username: String,      // primary key
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 PHC string, never exposed
}
