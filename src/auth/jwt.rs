//! JWT token service
//!
//! Issues and validates HS256 bearer tokens. The subject is the user's uuid;
//! the admin flag travels in the claims but the gate always re-reads it from
//! the user row.

use crate::{
    auth::password::generate_secret,
    config::settings::SecurityConfig,
    entities::user,
    errors::{Error, Result},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Length of the signing key generated when none is configured
const GENERATED_SECRET_LENGTH: usize = 64;

/// Claims carried by every token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User uuid (subject)
    pub sub: String,
    /// Username at issue time
    pub username: String,
    /// Admin flag at issue time
    pub admin: bool,
    /// Expiry timestamp
    pub exp: i64,
    /// Issue timestamp
    pub iat: i64,
    /// Issuer
    pub iss: String,
}

/// Token service
#[derive(Debug, Clone)]
pub struct JwtService {
    issuer: String,
    lifetime: Duration,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    /// Creates a service signing with `secret`.
    #[must_use]
    pub fn new(secret: &str, issuer: &str, lifetime: Duration) -> Self {
        Self {
            issuer: issuer.to_string(),
            lifetime,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Creates a service from the `[security]` section.
    ///
    /// Without a configured secret a random one is generated, so tokens do
    /// not survive a restart.
    #[must_use]
    pub fn from_config(security: &SecurityConfig) -> Self {
        let secret = security.jwt_secret.clone().unwrap_or_else(|| {
            warn!("No JWT secret configured, generating one for this run");
            generate_secret(GENERATED_SECRET_LENGTH, &security.character_list)
        });
        let lifetime =
            Duration::try_hours(security.token_lifetime_hours).unwrap_or_else(|| Duration::days(1));
        Self::new(&secret, &security.jwt_issuer, lifetime)
    }

    /// How long issued tokens stay valid.
    #[must_use]
    pub const fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Issues a token for `user`.
    ///
    /// # Errors
    /// Returns [`Error::Token`] if signing fails.
    pub fn generate_token(&self, user: &user::Model) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.uuid.clone(),
            username: user.username.clone(),
            admin: user.admin,
            exp: (now + self.lifetime).timestamp(),
            iat: now.timestamp(),
            iss: self.issuer.clone(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(Into::into)
    }

    /// Validates signature, expiry and issuer, returning the claims.
    ///
    /// # Errors
    /// Returns [`Error::Token`] describing why the token was rejected.
    pub fn validate_token(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["sub", "exp", "iat", "iss"]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(Error::from)
    }

    /// Extracts the token from an `Authorization` header value
    #[must_use]
    pub fn extract_from_header(header: &str) -> Option<&str> {
        header.strip_prefix("Bearer ")
    }
}
