use serde::{Deserialize, Serialize};

/// JWT payload carried by the admin session cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // admin username
    pub iat: usize,  // issued at (unix timestamp)
    pub exp: usize,  // expires at (unix timestamp)
    pub iss: String, // issuer
    pub aud: String, // audience
}
