use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "pg" => Ok(Self::Postgres),
            "memory" | "mem" => Ok(Self::Memory),
            other => anyhow::bail!("unknown STORE_BACKEND {other:?}; expected postgres or memory"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub store_backend: StoreBackend,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub jwt: JwtConfig,
    /// `(username, password)` pairs created at startup when missing.
    pub admin_bootstrap: Vec<(String, String)>,
    pub cookie_secure: bool,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

/// Parses `user:pass,user2:pass2`. Blank entries are skipped.
pub fn parse_admin_bootstrap(raw: &str) -> anyhow::Result<Vec<(String, String)>> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| -> anyhow::Result<(String, String)> {
            let (user, pass) = entry
                .split_once(':')
                .context("ADMIN_BOOTSTRAP entries must be username:password")?;
            let user = user.trim();
            if user.is_empty() || pass.is_empty() {
                anyhow::bail!("ADMIN_BOOTSTRAP entries need a username and a password");
            }
            Ok((user.to_string(), pass.to_string()))
        })
        .collect()
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let store_backend = match std::env::var("STORE_BACKEND") {
            Ok(v) => v.parse()?,
            Err(_) => StoreBackend::Postgres,
        };
        let database_url = std::env::var("DATABASE_URL").ok();
        if store_backend == StoreBackend::Postgres && database_url.is_none() {
            anyhow::bail!("DATABASE_URL must be set for the postgres store");
        }

        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "seatbook".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "seatbook-admin".into()),
            ttl_minutes: env_or("JWT_TTL_MINUTES", 60),
        };

        let admin_bootstrap = match std::env::var("ADMIN_BOOTSTRAP") {
            Ok(raw) => parse_admin_bootstrap(&raw)?,
            Err(_) => Vec::new(),
        };

        Ok(Self {
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env_or("APP_PORT", 5001),
            store_backend,
            database_url,
            db_max_connections: env_or("DB_MAX_CONNECTIONS", 10),
            jwt,
            admin_bootstrap,
            cookie_secure: env_or("COOKIE_SECURE", false),
        })
    }

    /// Config used by unit tests: in-memory stores, fixed secret.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            store_backend: StoreBackend::Memory,
            database_url: None,
            db_max_connections: 1,
            jwt: JwtConfig {
                secret: "test".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 5,
            },
            admin_bootstrap: Vec::new(),
            cookie_secure: false,
        }
    }
}
