use anyhow::Result;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const TOKEN_DURATION_SECS: i64 = 24 * 3600; // 24 hours

/// Token capability consumed by the realtime handshake and the HTTP layer.
pub trait AuthService: Send + Sync {
    /// Resolve a token to a user id, if valid and unexpired.
    fn verify_token(&self, token: &str) -> Option<String>;

    /// Mint a token for a user id.
    fn create_token(&self, user_id: &str) -> Result<String>;
}

/// JWT Claims stored in the token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
    pub jti: String,
}

/// JWT-backed [`AuthService`].
#[derive(Clone)]
pub struct JwtAuthService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
}

impl JwtAuthService {
    pub fn new(secret: &str, issuer: String) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
        }
    }
}

impl AuthService for JwtAuthService {
    fn verify_token(&self, token: &str) -> Option<String> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.issuer]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims.sub)
            .ok()
    }

    fn create_token(&self, user_id: &str) -> Result<String> {
        let now = chrono::Utc::now();
        let exp = now + chrono::Duration::seconds(TOKEN_DURATION_SECS);

        let claims = Claims {
            sub: user_id.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            iss: self.issuer.clone(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service() -> JwtAuthService {
        JwtAuthService::new("test-secret-key", "rota".to_string())
    }

    #[test]
    fn roundtrip_token() {
        let svc = test_service();
        let token = svc.create_token("user-1").unwrap();
        assert_eq!(svc.verify_token(&token).as_deref(), Some("user-1"));
    }

    #[test]
    fn rejects_invalid_token() {
        let svc = test_service();
        assert!(svc.verify_token("garbage").is_none());
    }

    #[test]
    fn rejects_wrong_secret() {
        let svc1 = JwtAuthService::new("secret-a", "rota".to_string());
        let svc2 = JwtAuthService::new("secret-b", "rota".to_string());
        let token = svc1.create_token("user-1").unwrap();
        assert!(svc2.verify_token(&token).is_none());
    }

    #[test]
    fn rejects_wrong_issuer() {
        let svc1 = JwtAuthService::new("secret", "rota".to_string());
        let svc2 = JwtAuthService::new("secret", "other".to_string());
        let token = svc1.create_token("user-1").unwrap();
        assert!(svc2.verify_token(&token).is_none());
    }
}
