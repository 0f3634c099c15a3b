use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

use super::models::{ADMIN_ROLE, ADMIN_SUBJECT, Claims};

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("JWT encoding error: {0}")]
    Encoding(#[from] jsonwebtoken::errors::Error),
    #[error("JWT decoding error: {0}")]
    Decoding(String),
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Token does not carry the admin role")]
    NotAdmin,
}

#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_ref()),
            decoding_key: DecodingKey::from_secret(secret.as_ref()),
        }
    }

    pub fn generate_admin_token(&self) -> Result<String, JwtError> {
        let now = Utc::now();
        let expiration = now + Duration::hours(24);

        let claims = Claims {
            sub: ADMIN_SUBJECT.to_string(),
            role: ADMIN_ROLE.to_string(),
            exp: expiration.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        let header = Header::new(Algorithm::HS256);
        encode(&header, &claims, &self.encoding_key).map_err(JwtError::Encoding)
    }

    pub fn verify_admin_token(&self, token: &str) -> Result<Claims, JwtError> {
        if token.is_empty() {
            return Err(JwtError::InvalidToken);
        }

        let validation = Validation::new(Algorithm::HS256);
        match decode::<Claims>(token, &self.decoding_key, &validation) {
            Ok(token_data) => {
                if token_data.claims.role != ADMIN_ROLE {
                    return Err(JwtError::NotAdmin);
                }
                Ok(token_data.claims)
            }
            Err(err) => match err.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => Err(JwtError::TokenExpired),
                jsonwebtoken::errors::ErrorKind::InvalidToken
                | jsonwebtoken::errors::ErrorKind::InvalidSignature => Err(JwtError::InvalidToken),
                _ => Err(JwtError::Decoding(err.to_string())),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_tokens_verify_round_trip() {
        let service = JwtService::new("test-secret");
        let token = service.generate_admin_token().unwrap();
        let claims = service.verify_admin_token(&token).unwrap();
        assert_eq!(claims.sub, ADMIN_SUBJECT);
        assert_eq!(claims.role, ADMIN_ROLE);
    }

    #[test]
    fn tokens_from_another_secret_are_rejected() {
        let issuer = JwtService::new("secret-a");
        let verifier = JwtService::new("secret-b");
        let token = issuer.generate_admin_token().unwrap();
        assert!(matches!(
            verifier.verify_admin_token(&token),
            Err(JwtError::InvalidToken)
        ));
    }

    #[test]
    fn empty_token_is_invalid() {
        let service = JwtService::new("test-secret");
        assert!(matches!(
            service.verify_admin_token(""),
            Err(JwtError::InvalidToken)
        ));
    }
}
