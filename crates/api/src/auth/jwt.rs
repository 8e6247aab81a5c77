//! Access and refresh tokens.
//!
//! Access tokens are HS256 JWTs carrying [`Claims`]. Refresh tokens are
//! opaque UUIDs handed to the client once; `user_sessions` keeps only their
//! SHA-256 hex digest, looked up again through [`hash_refresh_token`].

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use mes_core::types::DbId;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

const DEFAULT_ACCESS_EXPIRY_MINS: i64 = 24 * 60;
const DEFAULT_REFRESH_EXPIRY_DAYS: i64 = 7;

/// Payload of an access token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// User id.
    pub sub: DbId,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
    /// Per-token UUID, so two tokens issued in the same second still differ.
    pub jti: String,
}

/// Signing secret and token lifetimes.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expiry_mins: i64,
    pub refresh_token_expiry_days: i64,
}

/// A freshly minted refresh token and the session row fields derived from it.
#[derive(Debug, Clone)]
pub struct IssuedRefreshToken {
    /// Returned to the client; never stored.
    pub token: String,
    /// Stored as `user_sessions.refresh_token_hash`.
    pub hash: String,
    pub expires_at: DateTime<Utc>,
}

impl JwtConfig {
    /// Read `JWT_SECRET` (required), `JWT_ACCESS_EXPIRY_MINS` (default 1440)
    /// and `JWT_REFRESH_EXPIRY_DAYS` (default 7).
    ///
    /// # Panics
    ///
    /// On a missing or empty secret, or a lifetime that is not a positive integer.
    pub fn from_env() -> Self {
        let secret = std::env::var("JWT_SECRET").unwrap_or_default();
        assert!(!secret.is_empty(), "JWT_SECRET must be set and non-empty");

        Self {
            secret,
            access_token_expiry_mins: positive_env(
                "JWT_ACCESS_EXPIRY_MINS",
                DEFAULT_ACCESS_EXPIRY_MINS,
            ),
            refresh_token_expiry_days: positive_env(
                "JWT_REFRESH_EXPIRY_DAYS",
                DEFAULT_REFRESH_EXPIRY_DAYS,
            ),
        }
    }

    /// Access token lifetime in seconds, reported to clients as `expires_in`.
    pub fn access_expiry_secs(&self) -> i64 {
        self.access_token_expiry_mins * 60
    }

    /// Sign an access token for `user_id` acting as `role`.
    pub fn sign_access_token(
        &self,
        user_id: DbId,
        role: &str,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let iat = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id,
            role: role.to_string(),
            exp: iat + self.access_expiry_secs(),
            iat,
            jti: Uuid::new_v4().to_string(),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
    }

    /// Check signature and expiry, returning the claims.
    pub fn verify_access_token(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
    }

    /// Mint a refresh token valid for `refresh_token_expiry_days` from now.
    pub fn issue_refresh_token(&self) -> IssuedRefreshToken {
        let token = Uuid::new_v4().to_string();
        IssuedRefreshToken {
            hash: hash_refresh_token(&token),
            expires_at: Utc::now() + Duration::days(self.refresh_token_expiry_days),
            token,
        }
    }
}

/// SHA-256 hex digest under which a refresh token's session is stored.
pub fn hash_refresh_token(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

fn positive_env(key: &str, default: i64) -> i64 {
    match std::env::var(key) {
        Ok(raw) => match raw.parse::<i64>() {
            Ok(value) if value > 0 => value,
            _ => panic!("{key} must be a positive integer, got {raw:?}"),
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(secret: &str) -> JwtConfig {
        JwtConfig {
            secret: secret.to_string(),
            access_token_expiry_mins: 60,
            refresh_token_expiry_days: 7,
        }
    }

    #[test]
    fn access_token_round_trips_claims() {
        let jwt = config("shop-floor-secret");
        let token = jwt.sign_access_token(42, "admin").unwrap();

        let claims = jwt.verify_access_token(&token).unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.role, "admin");
        assert_eq!(claims.exp - claims.iat, 3600);
        assert!(Uuid::parse_str(&claims.jti).is_ok());
    }

    #[test]
    fn tokens_issued_together_have_distinct_ids() {
        let jwt = config("shop-floor-secret");
        let first = jwt.verify_access_token(&jwt.sign_access_token(1, "user").unwrap()).unwrap();
        let second = jwt.verify_access_token(&jwt.sign_access_token(1, "user").unwrap()).unwrap();
        assert_ne!(first.jti, second.jti);
    }

    #[test]
    fn expired_token_is_rejected() {
        let jwt = config("shop-floor-secret");
        // Five minutes past expiry clears the 60-second validation leeway.
        let now = Utc::now().timestamp();
        let stale = Claims {
            sub: 1,
            role: "user".to_string(),
            exp: now - 300,
            iat: now - 600,
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode(
            &Header::default(),
            &stale,
            &EncodingKey::from_secret(jwt.secret.as_bytes()),
        )
        .unwrap();

        assert!(jwt.verify_access_token(&token).is_err());
    }

    #[test]
    fn foreign_secret_is_rejected() {
        let token = config("press-line").sign_access_token(1, "user").unwrap();
        assert!(config("paint-line").verify_access_token(&token).is_err());
    }

    #[test]
    fn refresh_token_is_stored_by_hash() {
        let jwt = config("shop-floor-secret");
        let issued = jwt.issue_refresh_token();

        assert_eq!(issued.hash, hash_refresh_token(&issued.token));
        assert_eq!(issued.hash.len(), 64);
        assert_ne!(issued.hash, issued.token);
        assert_ne!(jwt.issue_refresh_token().token, issued.token);

        let days = (issued.expires_at - Utc::now()).num_days();
        assert!((6..=7).contains(&days));
    }
}
