use chrono::{Duration, Utc};
use fleet_core::access::Principal;
use fleet_core::user::Role;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sessions last a week; there is no refresh
pub const SESSION_TTL_DAYS: i64 = 7;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub email: String,
    pub role: Role,
    pub iat: usize,
    pub exp: usize,
}

/// Signs and verifies session tokens with the configured shared secret
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::days(SESSION_TTL_DAYS),
        }
    }

    pub fn ttl_seconds(&self) -> i64 {
        self.ttl.num_seconds()
    }

    /// Sign a session token for the principal; returns the token and its expiry
    pub fn issue(&self, principal: &Principal) -> Result<(String, usize), String> {
        let now = Utc::now();
        let claims = SessionClaims {
            sub: principal.id.to_string(),
            email: principal.email.clone(),
            role: principal.role,
            iat: now.timestamp() as usize,
            exp: (now + self.ttl).timestamp() as usize,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map(|token| (token, claims.exp))
            .map_err(|err| format!("Failed to sign session token: {}", err))
    }

    pub fn decode_claims(&self, token: &str) -> Result<SessionClaims, String> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map(|decoded| decoded.claims)
            .map_err(|err| format!("Invalid session token: {}", err))
    }

    /// Resolve a token to its principal. Any failure yields `None`.
    pub fn verify(&self, token: &str) -> Option<Principal> {
        let claims = match self.decode_claims(token) {
            Ok(claims) => claims,
            Err(err) => {
                tracing::debug!("{}", err);
                return None;
            }
        };
        let id = Uuid::parse_str(&claims.sub).ok()?;
        Some(Principal {
            id,
            email: claims.email,
            role: claims.role,
        })
    }

    #[cfg(test)]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}
