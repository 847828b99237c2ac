use std::time::Duration;

use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

use super::claims::Claims;
use crate::config::{JwtConfig, MAX_JWT_TTL_HOURS};

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("JWT_SECRET is not configured")]
    NotConfigured,
    #[error("token expired")]
    Expired,
    #[error("invalid token: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),
    #[error("failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

/// HS256 signing and verification keys plus the default token lifetime.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    configured: bool,
    pub ttl: Duration,
}

impl JwtKeys {
    pub fn from_config(cfg: &JwtConfig) -> Self {
        let secret = cfg.secret.as_bytes();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            configured: !secret.is_empty(),
            ttl: Duration::from_secs(
                u64::try_from(cfg.ttl_hours.clamp(0, MAX_JWT_TTL_HOURS))
                    .ok()
                    .and_then(|h| h.checked_mul(3600))
                    .unwrap_or(0),
            ),
        }
    }

    pub fn sign(&self, user_id: Uuid, email: &str) -> Result<String, TokenError> {
        self.sign_with_ttl(user_id, email, self.ttl)
    }

    pub fn sign_with_ttl(
        &self,
        user_id: Uuid,
        email: &str,
        ttl: Duration,
    ) -> Result<String, TokenError> {
        let now = OffsetDateTime::now_utc().unix_timestamp() as usize;
        let claims = Claims {
            user_id,
            email: email.to_string(),
            iat: now,
            exp: now.saturating_add(usize::try_from(ttl.as_secs()).unwrap_or(usize::MAX)),
        };
        let token = self.encode_claims(&claims)?;
        debug!(user_id = %user_id, ttl_secs = ttl.as_secs(), "jwt signed");
        Ok(token)
    }

    pub(crate) fn encode_claims(&self, claims: &Claims) -> Result<String, TokenError> {
        if !self.configured {
            return Err(TokenError::NotConfigured);
        }
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding).map_err(TokenError::Signing)
    }

    /// Checks signature and `exp` (no leeway).
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        if !self.configured {
            return Err(TokenError::NotConfigured);
        }
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e),
            }
        })?;
        debug!(user_id = %data.claims.user_id, "jwt verified");
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys(secret: &str) -> JwtKeys {
        JwtKeys::from_config(&JwtConfig {
            secret: secret.into(),
            ttl_hours: 24,
        })
    }

    #[test]
    fn sign_and_verify_roundtrip() {
        let keys = make_keys("dev-secret");
        let user_id = Uuid::new_v4();
        let token = keys.sign(user_id, "ada@example.com").expect("sign");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.user_id, user_id);
        assert_eq!(claims.email, "ada@example.com");
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn claims_use_user_id_key() {
        let keys = make_keys("dev-secret");
        let token = keys.sign(Uuid::new_v4(), "a@b.co").unwrap();
        let claims = keys.verify(&token).unwrap();
        let json = serde_json::to_value(&claims).unwrap();
        assert!(json.get("userId").is_some());
        assert!(json.get("user_id").is_none());
    }

    #[test]
    fn custom_ttl_is_honoured() {
        let keys = make_keys("dev-secret");
        let token = keys
            .sign_with_ttl(Uuid::new_v4(), "a@b.co", Duration::from_secs(3600))
            .unwrap();
        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn rejects_token_signed_with_other_secret() {
        let token = make_keys("secret-a").sign(Uuid::new_v4(), "a@b.co").unwrap();
        let err = make_keys("secret-b").verify(&token).unwrap_err();
        assert!(matches!(err, TokenError::Invalid(_)));
    }

    #[test]
    fn rejects_garbage() {
        let err = make_keys("dev-secret").verify("not.a.jwt").unwrap_err();
        assert!(matches!(err, TokenError::Invalid(_)));
    }

    #[test]
    fn reports_expiry_distinctly() {
        let keys = make_keys("dev-secret");
        let now = OffsetDateTime::now_utc().unix_timestamp() as usize;
        let token = keys
            .encode_claims(&Claims {
                user_id: Uuid::new_v4(),
                email: "a@b.co".into(),
                iat: now - 7200,
                exp: now - 60,
            })
            .unwrap();
        assert!(matches!(keys.verify(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn out_of_range_ttl_is_clamped() {
        let keys = JwtKeys::from_config(&JwtConfig {
            secret: "dev-secret".into(),
            ttl_hours: i64::MAX,
        });
        assert_eq!(keys.ttl, Duration::from_secs(MAX_JWT_TTL_HOURS as u64 * 3600));

        let keys = JwtKeys::from_config(&JwtConfig {
            secret: "dev-secret".into(),
            ttl_hours: -5,
        });
        assert_eq!(keys.ttl, Duration::ZERO);
    }

    #[test]
    fn empty_secret_cannot_sign() {
        let keys = make_keys("");
        let err = keys.sign(Uuid::new_v4(), "a@b.co").unwrap_err();
        assert!(matches!(err, TokenError::NotConfigured));
        assert_eq!(err.to_string(), "JWT_SECRET is not configured");
    }
}
