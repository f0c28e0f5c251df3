use argon2::{password_hash::SaltString, Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use rand::rngs::OsRng;
use tracing::error;

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

/// Checks a submitted secret against what the admin directory stores for it.
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, plain: &str, stored: &str) -> anyhow::Result<bool>;
}

/// Salted Argon2id verification of PHC-format hashes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2Verifier;

impl CredentialVerifier for Argon2Verifier {
    fn verify(&self, plain: &str, stored: &str) -> anyhow::Result<bool> {
        verify_password(plain, stored)
    }
}
