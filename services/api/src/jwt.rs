//! JWT service for token generation and validation
//!
//! Access and refresh tokens are HS256 tokens signed with distinct secrets,
//! so a refresh token can never pass as an access token and vice versa.

use anyhow::Result;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::models::User;

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret for signing access tokens
    pub access_token_secret: String,
    /// Access token expiration time in seconds
    pub access_token_expiry: u64,
    /// Secret for signing refresh tokens
    pub refresh_token_secret: String,
    /// Refresh token expiration time in seconds
    pub refresh_token_expiry: u64,
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: Uuid,
    /// Unique token id, keeps rotated refresh tokens distinct
    pub jti: Uuid,
    /// Username (access tokens only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Email (access tokens only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Display name (access tokens only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
    /// Token type (access or refresh)
    pub token_type: TokenType,
}

/// Token type enum
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    /// Access token
    Access,
    /// Refresh token
    Refresh,
}

/// A freshly issued access/refresh pair
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone)]
struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SigningKeys {
    fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// JWT service
#[derive(Clone)]
pub struct JwtService {
    access: SigningKeys,
    refresh: SigningKeys,
    validation: Validation,
    config: JwtConfig,
}

impl JwtService {
    /// Initialize a new JWT service
    pub fn new(config: JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        JwtService {
            access: SigningKeys::from_secret(&config.access_token_secret),
            refresh: SigningKeys::from_secret(&config.refresh_token_secret),
            validation,
            config,
        }
    }

    fn now() -> Result<u64> {
        Ok(SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| anyhow::anyhow!("Failed to get current time: {}", e))?
            .as_secs())
    }

    /// Generate an access token for a user
    pub fn generate_access_token(&self, user: &User) -> Result<String> {
        let now = Self::now()?;

        let claims = Claims {
            sub: user.id,
            jti: Uuid::new_v4(),
            username: Some(user.username.clone()),
            email: Some(user.email.clone()),
            full_name: Some(user.full_name.clone()),
            iat: now,
            exp: now + self.config.access_token_expiry,
            token_type: TokenType::Access,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.access.encoding)?;
        Ok(token)
    }

    /// Generate a refresh token for a user
    pub fn generate_refresh_token(&self, user: &User) -> Result<String> {
        let now = Self::now()?;

        let claims = Claims {
            sub: user.id,
            jti: Uuid::new_v4(),
            username: None,
            email: None,
            full_name: None,
            iat: now,
            exp: now + self.config.refresh_token_expiry,
            token_type: TokenType::Refresh,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.refresh.encoding)?;
        Ok(token)
    }

    /// Generate both tokens for a user
    pub fn generate_token_pair(&self, user: &User) -> Result<TokenPair> {
        Ok(TokenPair {
            access_token: self.generate_access_token(user)?,
            refresh_token: self.generate_refresh_token(user)?,
        })
    }

    /// Validate an access token and return the claims
    pub fn validate_access_token(&self, token: &str) -> Result<Claims> {
        let claims = decode::<Claims>(token, &self.access.decoding, &self.validation)?.claims;
        if claims.token_type != TokenType::Access {
            anyhow::bail!("Token is not an access token");
        }
        Ok(claims)
    }

    /// Validate a refresh token and return the claims
    pub fn validate_refresh_token(&self, token: &str) -> Result<Claims> {
        let claims = decode::<Claims>(token, &self.refresh.decoding, &self.validation)?.claims;
        if claims.token_type != TokenType::Refresh {
            anyhow::bail!("Token is not a refresh token");
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn service() -> JwtService {
        JwtService::new(JwtConfig {
            access_token_secret: "access-secret".to_string(),
            access_token_expiry: 900,
            refresh_token_secret: "refresh-secret".to_string(),
            refresh_token_expiry: 3600,
        })
    }

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            full_name: "Alice Liddell".to_string(),
            avatar: "http://localhost/media/avatar.png".to_string(),
            cover_image: None,
            password_hash: "hash".to_string(),
            refresh_token: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_access_token_round_trip() {
        let jwt = service();
        let user = user();

        let token = jwt.generate_access_token(&user).unwrap();
        let claims = jwt.validate_access_token(&token).unwrap();

        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.username.as_deref(), Some("alice"));
        assert_eq!(claims.token_type, TokenType::Access);
        assert_eq!(claims.exp - claims.iat, 900);
    }

    #[test]
    fn test_tokens_are_not_interchangeable() {
        let jwt = service();
        let pair = jwt.generate_token_pair(&user()).unwrap();

        assert!(jwt.validate_access_token(&pair.refresh_token).is_err());
        assert!(jwt.validate_refresh_token(&pair.access_token).is_err());
        assert!(jwt.validate_refresh_token(&pair.refresh_token).is_ok());
    }

    #[test]
    fn test_refresh_tokens_are_unique() {
        let jwt = service();
        let user = user();

        let first = jwt.generate_refresh_token(&user).unwrap();
        let second = jwt.generate_refresh_token(&user).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let jwt = service();
        let now = JwtService::now().unwrap();
        let claims = Claims {
            sub: Uuid::new_v4(),
            jti: Uuid::new_v4(),
            username: None,
            email: None,
            full_name: None,
            iat: now - 7200,
            exp: now - 3600,
            token_type: TokenType::Access,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &jwt.access.encoding).unwrap();

        assert!(jwt.validate_access_token(&token).is_err());
    }

    #[test]
    fn test_tampered_token_is_rejected() {
        let jwt = service();
        let other = JwtService::new(JwtConfig {
            access_token_secret: "another-secret".to_string(),
            access_token_expiry: 900,
            refresh_token_secret: "refresh-secret".to_string(),
            refresh_token_expiry: 3600,
        });

        let token = other.generate_access_token(&user()).unwrap();
        assert!(jwt.validate_access_token(&token).is_err());
    }
}
