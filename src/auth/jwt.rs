use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;

use crate::{auth::claims::Claims, config::JwtConfig, state::AppState};

/// Holds session signing and verification keys with config data.
#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub ttl: Duration,
}

impl From<&JwtConfig> for JwtKeys {
    fn from(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: Duration::from_secs((cfg.ttl_minutes.max(1) as u64) * 60),
        }
    }
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        Self::from(&state.config.jwt)
    }
}

impl JwtKeys {
    pub fn sign(&self, username: &str) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::seconds(self.ttl.as_secs() as i64);
        let claims = Claims {
            sub: username.to_string(),
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(%username, "session token signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(username = %data.claims.sub, "session token verified");
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys(secret: &str, issuer: &str, audience: &str) -> JwtKeys {
        JwtKeys::from(&JwtConfig {
            secret: secret.into(),
            issuer: issuer.into(),
            audience: audience.into(),
            ttl_minutes: 5,
        })
    }

    #[test]
    fn sign_and_verify_session_token() {
        let keys = make_keys("dev-secret", "test-issuer", "test-aud");
        let token = keys.sign("admin1").expect("sign");
        let claims = keys.verify(&token).expect("verify token");
        assert_eq!(claims.sub, "admin1");
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.aud, "test-aud");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn verify_rejects_wrong_issuer_or_audience() {
        let good_keys = make_keys("same-secret", "good-iss", "good-aud");
        let bad_keys = make_keys("same-secret", "bad-iss", "bad-aud");
        let token = good_keys.sign("admin1").expect("sign");
        assert!(bad_keys.verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_other_secret() {
        let a = make_keys("secret-a", "iss", "aud");
        let b = make_keys("secret-b", "iss", "aud");
        let token = a.sign("admin1").expect("sign");
        assert!(b.verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_garbage() {
        let keys = make_keys("dev-secret", "iss", "aud");
        assert!(keys.verify("not.a.jwt").is_err());
    }
}
