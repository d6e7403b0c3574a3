use crate::config::parameter;
use crate::dto::token_dto::{AccessTokenClaims, RefreshTokenClaims};
use crate::entity::user::User;
use crate::error::token_error::TokenError;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, TokenData, Validation};
use sha2::{Digest, Sha256};
use uuid::Uuid;

const MIN_SECRET_BYTES: usize = 32;

/// Signs and verifies access and refresh tokens. The two token kinds use
/// distinct secrets, so one can never be accepted in place of the other.
#[derive(Clone)]
pub struct TokenService {
    access_secret: String,
    refresh_secret: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

pub trait TokenServiceTrait {
    fn generate_access_token(&self, user: &User) -> Result<String, TokenError>;
    fn generate_refresh_token(&self, user: &User) -> Result<String, TokenError>;
    fn retrieve_access_claims(&self, token: &str) -> jsonwebtoken::errors::Result<TokenData<AccessTokenClaims>>;
    fn retrieve_refresh_claims(&self, token: &str) -> jsonwebtoken::errors::Result<TokenData<RefreshTokenClaims>>;
}

impl TokenService {
    pub fn new(
        access_secret: String,
        refresh_secret: String,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Result<Self, TokenError> {
        // HS256 keys below 256 bits are brute-forceable
        for (name, secret) in [("ACCESS_TOKEN_SECRET", &access_secret), ("REFRESH_TOKEN_SECRET", &refresh_secret)] {
            if secret.len() < MIN_SECRET_BYTES {
                return Err(TokenError::Misconfigured(format!(
                    "{} must be at least {} bytes, got {}",
                    name,
                    MIN_SECRET_BYTES,
                    secret.len()
                )));
            }
        }
        if access_secret == refresh_secret {
            return Err(TokenError::Misconfigured(
                "ACCESS_TOKEN_SECRET and REFRESH_TOKEN_SECRET must differ".to_string(),
            ));
        }

        Ok(Self {
            access_secret,
            refresh_secret,
            access_ttl,
            refresh_ttl,
        })
    }

    pub fn from_parameters() -> Result<Self, TokenError> {
        let secret = |key: &str| parameter::require(key).map_err(|e| TokenError::Misconfigured(e.to_string()));
        Self::new(
            secret("ACCESS_TOKEN_SECRET")?,
            secret("REFRESH_TOKEN_SECRET")?,
            Duration::minutes(parameter::get_i64("ACCESS_TOKEN_TTL_MINUTES")),
            Duration::days(parameter::get_i64("REFRESH_TOKEN_TTL_DAYS")),
        )
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    /// Digest stored in place of the raw refresh token
    pub fn hash_refresh_token(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    fn window(&self, ttl: Duration) -> Result<(i64, i64), TokenError> {
        let now = Utc::now();
        let exp = now
            .checked_add_signed(ttl)
            .ok_or_else(|| TokenError::Misconfigured("Token expiration calculation overflow".to_string()))?;
        Ok((now.timestamp(), exp.timestamp()))
    }

    fn validation() -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 30; // seconds of clock skew
        validation
    }
}

impl TokenServiceTrait for TokenService {
    fn generate_access_token(&self, user: &User) -> Result<String, TokenError> {
        let (iat, exp) = self.window(self.access_ttl)?;
        let claims = AccessTokenClaims {
            sub: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
            full_name: user.full_name.clone(),
            iat,
            exp,
            jti: Uuid::new_v4().to_string(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.access_secret.as_ref()),
        )
        .map_err(|e| TokenError::Misconfigured(e.to_string()))
    }

    fn generate_refresh_token(&self, user: &User) -> Result<String, TokenError> {
        let (iat, exp) = self.window(self.refresh_ttl)?;
        let claims = RefreshTokenClaims {
            sub: user.id,
            iat,
            exp,
            jti: Uuid::new_v4().to_string(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.refresh_secret.as_ref()),
        )
        .map_err(|e| TokenError::Misconfigured(e.to_string()))
    }

    fn retrieve_access_claims(&self, token: &str) -> jsonwebtoken::errors::Result<TokenData<AccessTokenClaims>> {
        decode::<AccessTokenClaims>(
            token,
            &DecodingKey::from_secret(self.access_secret.as_ref()),
            &Self::validation(),
        )
    }

    fn retrieve_refresh_claims(&self, token: &str) -> jsonwebtoken::errors::Result<TokenData<RefreshTokenClaims>> {
        decode::<RefreshTokenClaims>(
            token,
            &DecodingKey::from_secret(self.refresh_secret.as_ref()),
            &Self::validation(),
        )
    }
}
