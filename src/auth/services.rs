use tracing::{info, warn};

use crate::auth::{
    password::{hash_password, CredentialVerifier},
    repo::AdminDirectory,
};

/// True when `username` exists and `password` matches its stored hash.
pub async fn authenticate(
    admins: &dyn AdminDirectory,
    verifier: &dyn CredentialVerifier,
    username: &str,
    password: &str,
) -> anyhow::Result<bool> {
    let Some(admin) = admins.find_by_username(username).await? else {
        warn!(%username, "login for unknown admin");
        return Ok(false);
    };
    let ok = verifier.verify(password, &admin.password_hash)?;
    if !ok {
        warn!(%username, "login with wrong password");
    }
    Ok(ok)
}

/// Creates the listed admins (hashing their passwords) when they do not exist yet.
/// Existing accounts keep their stored password.
pub async fn provision_admins(
    admins: &dyn AdminDirectory,
    accounts: &[(String, String)],
) -> anyhow::Result<usize> {
    let mut created = 0;
    for (username, password) in accounts {
        if admins.find_by_username(username).await?.is_some() {
            continue;
        }
        let hash = hash_password(password)?;
        if admins.insert_if_absent(username, &hash).await? {
            info!(%username, "admin provisioned");
            created += 1;
        }
    }
    Ok(created)
}
