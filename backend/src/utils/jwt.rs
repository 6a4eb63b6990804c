//! JWT token utilities for authentication.
//!
//! Provides signed, expiring session tokens. A token carries the account
//! email as its subject plus a kind marker distinguishing the short-lived
//! access token from the long-lived refresh token. Validity is determined
//! entirely by the HMAC signature and the expiry claim; there is no
//! server-side revocation.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::errors::ServiceError;

/// Which flavor of session token a set of claims represents.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT claims for a session token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Account email
    pub sub: String,
    /// Access or refresh
    pub kind: TokenKind,
    /// Token expiration timestamp
    pub exp: usize,
    /// Token issued at timestamp
    pub iat: usize,
}

/// JWT token utility for creating and validating tokens.
///
/// Built once at startup from config and shared read-only afterwards.
pub struct JwtUtils {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl JwtUtils {
    /// Create a new JwtUtils instance from the application config.
    pub fn new(config: &Config) -> Self {
        Self::with_secret(
            &config.jwt_secret,
            config.access_token_ttl_seconds,
            config.refresh_token_ttl_seconds,
        )
    }

    /// Create a JwtUtils from an explicit secret and TTLs.
    pub fn with_secret(secret: &str, access_ttl_seconds: u64, refresh_ttl_seconds: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        JwtUtils {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            access_ttl: Duration::seconds(access_ttl_seconds as i64),
            refresh_ttl: Duration::seconds(refresh_ttl_seconds as i64),
        }
    }

    /// Generate a signed token for the given subject and kind.
    pub fn issue(&self, subject: &str, kind: TokenKind) -> Result<String, ServiceError> {
        let now = Utc::now();
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };

        let claims = Claims {
            sub: subject.to_string(),
            kind,
            exp: (now + ttl).timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| ServiceError::internal(format!("Token generation failed: {e}")))
    }

    /// Validate and decode a token.
    ///
    /// Fails with `InvalidToken` on a bad signature, malformed structure,
    /// or elapsed expiry. Absence of a token is the caller's concern.
    pub fn verify(&self, token: &str) -> Result<Claims, ServiceError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| ServiceError::invalid_token(e.to_string()))
    }

    /// Lifetime of an access token, in seconds.
    pub fn access_ttl_seconds(&self) -> u64 {
        self.access_ttl.num_seconds() as u64
    }

    /// Lifetime of a refresh token, in seconds.
    pub fn refresh_ttl_seconds(&self) -> u64 {
        self.refresh_ttl.num_seconds() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ServiceError;

    fn utils() -> JwtUtils {
        JwtUtils::with_secret("test-secret", 900, 604_800)
    }

    #[test]
    fn test_issue_verify_roundtrip() {
        let jwt = utils();
        let token = jwt.issue("a@x.com", TokenKind::Access).unwrap();
        let claims = jwt.verify(&token).unwrap();

        assert_eq!(claims.sub, "a@x.com");
        assert_eq!(claims.kind, TokenKind::Access);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_access_and_refresh_expiries_differ() {
        let jwt = utils();
        let access = jwt.verify(&jwt.issue("a@x.com", TokenKind::Access).unwrap()).unwrap();
        let refresh = jwt
            .verify(&jwt.issue("a@x.com", TokenKind::Refresh).unwrap())
            .unwrap();

        assert!(refresh.exp > access.exp);
        assert_eq!(refresh.exp - refresh.iat, 604_800);
        assert_eq!(access.exp - access.iat, 900);
    }

    #[test]
    fn test_expired_token_rejected() {
        let jwt = utils();
        let now = Utc::now().timestamp() as usize;
        let claims = Claims {
            sub: "a@x.com".to_string(),
            kind: TokenKind::Access,
            exp: now - 3600,
            iat: now - 7200,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        let err = jwt.verify(&token).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidToken { .. }));
    }

    #[test]
    fn test_tampered_token_rejected() {
        let jwt = utils();
        let other = JwtUtils::with_secret("another-secret", 900, 604_800);

        let token = other.issue("a@x.com", TokenKind::Access).unwrap();
        assert!(matches!(
            jwt.verify(&token),
            Err(ServiceError::InvalidToken { .. })
        ));

        assert!(matches!(
            jwt.verify("not-a-token"),
            Err(ServiceError::InvalidToken { .. })
        ));
    }
}
