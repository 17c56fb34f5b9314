//! HS256 bearer tokens carrying the user id.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::domain::error::StockfolioError;
use crate::domain::settings::{AuthSettings, MAX_TOKEN_TTL_HOURS};
use crate::ports::token_port::TokenPort;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
}

pub struct JwtTokens {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl JwtTokens {
    /// `ttl_hours` is clamped to `1..=MAX_TOKEN_TTL_HOURS`.
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(ttl_hours.clamp(1, MAX_TOKEN_TTL_HOURS)),
        }
    }

    pub fn from_settings(settings: &AuthSettings) -> Self {
        Self::new(&settings.jwt_secret, settings.token_ttl_hours)
    }

    fn issue_at(&self, user_id: &str, iat: i64) -> Result<String, StockfolioError> {
        let claims = Claims {
            sub: user_id.to_string(),
            iat,
            exp: iat + self.ttl.num_seconds(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(|e| {
            StockfolioError::Internal {
                reason: format!("failed to sign token: {}", e),
            }
        })
    }
}

impl TokenPort for JwtTokens {
    fn issue(&self, user_id: &str) -> Result<String, StockfolioError> {
        self.issue_at(user_id, Utc::now().timestamp())
    }

    fn verify(&self, token: &str) -> Result<String, StockfolioError> {
        decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims.sub)
            .map_err(|_| StockfolioError::unauthorized("Token is not valid"))
    }
}
