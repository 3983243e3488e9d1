use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Issuer claim stamped on every bearer token.
pub const ISSUER: &str = "openhardware-platform.com";

/// Bearer token lifetime. Clients are expected to refresh before this.
const LIFETIME_MINUTES: i64 = 10;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub iss: String,
    /// Id of the user in the database.
    pub sub: Uuid,
    /// Expiration, seconds since epoch.
    pub exp: i64,
    /// Pseudo of the user.
    pub name: String,
    /// Url of the user picture, empty if none.
    pub picture: String,
}

impl Claims {
    /// Issuer and expiration are set here, never by the caller.
    pub fn new(user_id: Uuid, name: String, picture: String) -> Self {
        Self {
            iss: ISSUER.to_string(),
            sub: user_id,
            exp: (Utc::now() + Duration::minutes(LIFETIME_MINUTES)).timestamp(),
            name,
            picture,
        }
    }
}

pub fn encode_token(claims: &Claims, secret: &str) -> Result<String, String> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| format!("JWT encode failed: {e}"))
}

pub fn decode_token(token: &str, secret: &str) -> Result<Claims, String> {
    let mut validation = Validation::default();
    validation.set_issuer(&[ISSUER]);
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| format!("JWT decode failed: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "unit-test-secret";

    #[test]
    fn round_trip_claims() {
        let user_id = Uuid::now_v7();
        let claims = Claims::new(user_id, "alice".to_string(), "http://pic".to_string());
        let token = encode_token(&claims, SECRET).unwrap();
        let decoded = decode_token(&token, SECRET).unwrap();
        assert_eq!(decoded.sub, user_id);
        assert_eq!(decoded.name, "alice");
        assert_eq!(decoded.iss, ISSUER);
    }

    #[test]
    fn rejects_wrong_secret() {
        let claims = Claims::new(Uuid::now_v7(), "alice".to_string(), String::new());
        let token = encode_token(&claims, SECRET).unwrap();
        assert!(decode_token(&token, "other-secret").is_err());
    }

    #[test]
    fn rejects_expired_token() {
        let mut claims = Claims::new(Uuid::now_v7(), "alice".to_string(), String::new());
        // well past the default decode leeway
        claims.exp = (Utc::now() - Duration::hours(1)).timestamp();
        let token = encode_token(&claims, SECRET).unwrap();
        assert!(decode_token(&token, SECRET).is_err());
    }

    #[test]
    fn rejects_foreign_issuer() {
        let mut claims = Claims::new(Uuid::now_v7(), "alice".to_string(), String::new());
        claims.iss = "somewhere-else.example".to_string();
        let token = encode_token(&claims, SECRET).unwrap();
        assert!(decode_token(&token, SECRET).is_err());
    }
}
