//! Stateless bearer tokens.
//!
//! Tokens are JWTs signed with HMAC-SHA256 over the process-wide signing
//! secret. Nothing is stored server side: a token is valid exactly when its
//! signature checks out under the secret and its expiry is still ahead.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{AuthError, Subject};
use crate::config::SigningSecret;

/// The only algorithm tokens are minted with or accepted under.
pub const ALGORITHM: Algorithm = Algorithm::HS256;
const ALGORITHM_NAME: &str = "HS256";

/// Represents the claims encoded within a token.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject of the token: the user's id.
    pub sub: i32,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
}

/// Mints signed tokens for an already-authenticated subject.
#[derive(Clone)]
pub struct TokenSigner {
    key: EncodingKey,
    ttl_secs: i64,
}

impl TokenSigner {
    pub fn new(secret: &SigningSecret, ttl: Duration) -> Self {
        Self {
            key: EncodingKey::from_secret(secret.as_bytes()),
            ttl_secs: i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX),
        }
    }

    pub fn sign(&self, subject: Subject) -> Result<String, AuthError> {
        self.sign_at(subject, Utc::now())
    }

    /// Signs a token as if issued at `issued_at`.
    pub fn sign_at(&self, subject: Subject, issued_at: DateTime<Utc>) -> Result<String, AuthError> {
        let iat = issued_at.timestamp();
        let claims = Claims {
            sub: subject.user_id(),
            iat,
            exp: iat.saturating_add(self.ttl_secs),
        };

        encode(&Header::new(ALGORITHM), &claims, &self.key)
            .map_err(|e| AuthError::Internal(format!("Failed to generate token: {}", e)))
    }
}

/// Validates tokens and recovers their subject. Performs no I/O.
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
    // Same rules with the signature check switched off, used only to read
    // `exp` ahead of signature verification.
    unverified: Validation,
}

#[derive(Deserialize)]
struct RawHeader {
    alg: String,
}

impl TokenVerifier {
    pub fn new(secret: &SigningSecret) -> Self {
        let mut validation = Validation::new(ALGORITHM);
        // Expiry is checked by hand against a strict `exp > now`.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        let mut unverified = validation.clone();
        unverified.insecure_disable_signature_validation();

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            unverified,
        }
    }

    pub fn verify(&self, token: &str) -> Result<Subject, AuthError> {
        self.verify_at(token, Utc::now())
    }

    /// Verifies `token` as of the instant `now`.
    ///
    /// Checks run in a fixed order: algorithm, structure and expiry, then
    /// signature. An expired token is `Expired` whatever its signature.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Subject, AuthError> {
        // The algorithm is read from the raw header rather than through
        // jsonwebtoken, which cannot represent names such as "none" and would
        // report them as a parse failure.
        if header_algorithm(token)? != ALGORITHM_NAME {
            return Err(AuthError::UnexpectedAlgorithm);
        }

        let untrusted = decode::<Claims>(token, &self.key, &self.unverified)
            .map_err(classify)?
            .claims;
        if untrusted.exp <= now.timestamp() {
            return Err(AuthError::Expired);
        }

        let claims = decode::<Claims>(token, &self.key, &self.validation)
            .map_err(classify)?
            .claims;
        Ok(Subject(claims.sub))
    }
}

fn classify(error: jsonwebtoken::errors::Error) -> AuthError {
    match error.kind() {
        ErrorKind::InvalidSignature => AuthError::InvalidSignature,
        ErrorKind::InvalidAlgorithm => AuthError::UnexpectedAlgorithm,
        ErrorKind::ExpiredSignature => AuthError::Expired,
        _ => AuthError::Malformed,
    }
}

fn header_algorithm(token: &str) -> Result<String, AuthError> {
    let mut parts = token.split('.');
    let (Some(header), Some(_payload), Some(_signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(AuthError::Malformed);
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(header)
        .map_err(|_| AuthError::Malformed)?;
    let header: RawHeader = serde_json::from_slice(&bytes).map_err(|_| AuthError::Malformed)?;
    Ok(header.alg)
}
