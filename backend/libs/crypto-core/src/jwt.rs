/// JWT issuance and validation for the forum backend
///
/// Tokens are signed with HS256 using a shared secret. The keys live in a
/// [`JwtKeys`] value built once at startup and handed to whoever needs it,
/// so there is no process-wide key storage to initialize.
///
/// ## Usage
///
/// ```rust
/// use crypto_core::jwt::JwtKeys;
/// use uuid::Uuid;
///
/// let keys = JwtKeys::from_secret("a-very-long-development-secret-value!", 7).unwrap();
/// let token = keys.issue(Uuid::new_v4(), "ada@example.com", "ada").unwrap();
/// let claims = keys.validate(&token).unwrap().claims;
/// assert_eq!(claims.username, "ada");
/// ```
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, Algorithm, DecodingKey, EncodingKey, Header, TokenData, Validation,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{CryptoError, Result};

const JWT_ALGORITHM: Algorithm = Algorithm::HS256;

/// Default token lifetime in days.
pub const DEFAULT_EXPIRY_DAYS: i64 = 7;

/// JWT claims carried by every access token
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Token type, always "access" for now
    pub token_type: String,
    pub email: String,
    pub username: String,
}

impl Claims {
    /// Parse the subject claim as a user id
    pub fn user_id(&self) -> Result<Uuid> {
        Uuid::parse_str(&self.sub).map_err(|e| CryptoError::Subject(e.to_string()))
    }
}

/// Signing and verification keys plus the token lifetime
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    expiry: Duration,
}

impl std::fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtKeys")
            .field("secret", &"[REDACTED]")
            .field("expiry", &self.expiry)
            .finish()
    }
}

impl JwtKeys {
    /// Build keys from a shared secret
    ///
    /// Returns `CryptoError::InvalidKey` for an empty secret or a
    /// non-positive lifetime.
    pub fn from_secret(secret: &str, expiry_days: i64) -> Result<Self> {
        if secret.is_empty() {
            return Err(CryptoError::InvalidKey("secret must not be empty".into()));
        }
        if expiry_days <= 0 {
            return Err(CryptoError::InvalidKey(format!(
                "token lifetime must be positive, got {expiry_days} days"
            )));
        }

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            expiry: Duration::days(expiry_days),
        })
    }

    /// Issue a signed access token for a user
    pub fn issue(&self, user_id: Uuid, email: &str, username: &str) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + self.expiry).timestamp(),
            token_type: "access".to_string(),
            email: email.to_string(),
            username: username.to_string(),
        };

        Ok(encode(&Header::new(JWT_ALGORITHM), &claims, &self.encoding)?)
    }

    /// Validate signature and expiry, returning the decoded claims
    pub fn validate(&self, token: &str) -> Result<TokenData<Claims>> {
        let mut validation = Validation::new(JWT_ALGORITHM);
        validation.validate_exp = true;

        Ok(decode::<Claims>(token, &self.decoding, &validation)?)
    }

    /// Validate a token and return the user id it was issued for
    pub fn user_id_from_token(&self, token: &str) -> Result<Uuid> {
        self.validate(token)?.claims.user_id()
    }

    /// Token lifetime in seconds, for clients that want to schedule a refresh
    pub fn expires_in_secs(&self) -> i64 {
        self.expiry.num_seconds()
    }
}
