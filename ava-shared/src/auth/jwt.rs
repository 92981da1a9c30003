/// Credential token codec
///
/// Tokens are compact JWS strings signed with HS256 using a process-configured
/// shared secret. The claim set carries the principal's id, email, role and a
/// snapshot of the account at issue time.
///
/// # Validation
///
/// - Only HS256 is accepted; a token whose header names any other algorithm
///   is rejected before the signature is looked at.
/// - Signature, issuer, `exp` and `nbf` are checked with zero leeway.
/// - Failures collapse into exactly one of [`JwtError::Expired`],
///   [`JwtError::NotYetValid`] or [`JwtError::Invalid`].
///
/// # Example
///
/// ```no_run
/// use ava_shared::auth::jwt::TokenCodec;
/// # use ava_shared::models::account::Account;
///
/// # fn example(account: &Account) -> Result<(), Box<dyn std::error::Error>> {
/// let codec = TokenCodec::new("your-secret-key-at-least-32-bytes-long");
///
/// let claims = codec.build_claims(account);
/// let token = codec.encode(&claims)?;
///
/// let decoded = codec.decode(&token)?;
/// assert_eq!(decoded.sub, account.id);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};

use crate::models::{
    account::{Account, AccountSnapshot},
    role::Role,
};

/// Issuer written into and required from every token
pub const TOKEN_ISSUER: &str = "ava_admin";

/// Error type for token operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Token could not be signed
    #[error("Failed to sign token: {0}")]
    Signing(String),

    /// Token `exp` is in the past
    #[error("Token has expired")]
    Expired,

    /// Token `nbf` is in the future
    #[error("Token is not valid yet")]
    NotYetValid,

    /// Bad signature, wrong algorithm, wrong issuer or malformed token
    #[error("Invalid token: {0}")]
    Invalid(String),
}

/// Claim set embedded in a credential token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Issuer
    pub iss: String,

    /// Subject - account ID
    pub sub: i64,

    /// Account email at issue time
    pub email: String,

    /// Role snapshot
    pub role: Role,

    /// Account snapshot
    pub user: AccountSnapshot,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Checks if the claim set has expired
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now().timestamp())
    }

    /// Same rule as `decode`: still valid during the `exp` second itself
    pub fn is_expired_at(&self, now: i64) -> bool {
        now > self.exp
    }
}

/// Signs and verifies credential tokens with a shared HS256 secret
#[derive(Clone)]
pub struct TokenCodec {
    secret: String,
    ttl: Duration,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("secret", &"<redacted>")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TokenCodec {
    /// Default token lifetime
    pub fn default_ttl() -> Duration {
        Duration::hours(24)
    }

    /// Creates a codec with the default 24 hour lifetime
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ttl: Self::default_ttl(),
        }
    }

    /// Overrides the token lifetime
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Builds the claim set for an account
    ///
    /// `iat` and `nbf` are set to now, `exp` to now plus the configured TTL.
    pub fn build_claims(&self, account: &Account) -> Claims {
        let now = Utc::now();

        Claims {
            iss: TOKEN_ISSUER.to_string(),
            sub: account.id,
            email: account.email.clone(),
            role: account.role.clone(),
            user: AccountSnapshot::from(account),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        }
    }

    /// Signs a claim set
    ///
    /// # Errors
    ///
    /// Returns `JwtError::Signing` if no secret is configured or encoding fails.
    pub fn encode(&self, claims: &Claims) -> Result<String, JwtError> {
        if self.secret.is_empty() {
            return Err(JwtError::Signing("signing secret is not configured".to_string()));
        }

        let key = EncodingKey::from_secret(self.secret.as_bytes());

        encode(&Header::new(Algorithm::HS256), claims, &key)
            .map_err(|e| JwtError::Signing(format!("Token encoding failed: {}", e)))
    }

    /// Verifies a token and extracts its claims
    pub fn decode(&self, token: &str) -> Result<Claims, JwtError> {
        if self.secret.is_empty() {
            return Err(JwtError::Invalid("signing secret is not configured".to_string()));
        }

        let key = DecodingKey::from_secret(self.secret.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[TOKEN_ISSUER]);
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.leeway = 0;

        let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => JwtError::Expired,
            ErrorKind::ImmatureSignature => JwtError::NotYetValid,
            _ => JwtError::Invalid(e.to_string()),
        })?;

        Ok(token_data.claims)
    }
}
