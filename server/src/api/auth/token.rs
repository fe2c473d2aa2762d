//! JWT identity token handling

use std::fmt;

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use super::identity::{Identity, Role};

/// Token validation or signing error
///
/// Verification failures are kept distinct here for operator logs; the auth
/// gate collapses them into a single invalid-token response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("Token has expired")]
    Expired,
    #[error("Token signature is invalid")]
    InvalidSignature,
    #[error("Token is not valid yet")]
    Immature,
    #[error("Malformed token: {0}")]
    Malformed(String),
    #[error("Failed to sign token: {0}")]
    Signing(String),
}

impl TokenError {
    /// Short machine-readable reason for log fields
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Expired => "expired",
            Self::InvalidSignature => "invalid_signature",
            Self::Immature => "immature",
            Self::Malformed(_) => "malformed",
            Self::Signing(_) => "signing",
        }
    }
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::ImmatureSignature => Self::Immature,
            _ => Self::Malformed(e.to_string()),
        }
    }
}

/// Claims bundle carried by identity tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawClaims")]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// Wire shape accepted on decode. Tokens from the legacy auth service carry
/// the user ID as `id`, some carry both; `sub` wins when present.
#[derive(Deserialize)]
struct RawClaims {
    sub: Option<String>,
    id: Option<String>,
    role: Role,
    #[serde(default)]
    iat: i64,
    exp: i64,
}

impl TryFrom<RawClaims> for Claims {
    type Error = &'static str;

    fn try_from(raw: RawClaims) -> Result<Self, Self::Error> {
        let sub = raw.sub.or(raw.id).ok_or("missing subject claim (sub or id)")?;
        Ok(Self {
            sub,
            role: raw.role,
            iat: raw.iat,
            exp: raw.exp,
        })
    }
}

impl Claims {
    pub fn new(subject: &str, role: Role, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: subject.to_string(),
            role,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        }
    }

    pub fn identity(&self) -> Identity {
        Identity::new(self.sub.clone(), self.role)
    }
}

/// Signing and verification keys derived from the shared secret
///
/// Built once at startup and shared read-only across requests.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl fmt::Debug for TokenKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenKeys")
            .field("secret", &"[REDACTED]")
            .field("leeway", &self.validation.leeway)
            .finish()
    }
}

impl TokenKeys {
    /// Create HS256 keys; `leeway_secs` is the tolerated clock skew on `exp`
    pub fn new(secret: &[u8], leeway_secs: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = leeway_secs;

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Sign a fresh token for `subject` valid for `ttl`
    pub fn issue(&self, subject: &str, role: Role, ttl: Duration) -> Result<String, TokenError> {
        self.sign(&Claims::new(subject, role, ttl))
    }

    /// Sign an explicit claims bundle
    pub fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Validate signature and expiry, then decode the claims
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)?;
        Ok(data.claims)
    }
}
