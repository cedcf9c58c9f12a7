pub mod extractors;
pub mod guard;
pub mod middleware;
pub mod password;
pub mod token;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::User;

// Re-export necessary items
pub use extractors::AuthenticatedUser;
pub use guard::AuthGuard;
pub use middleware::AuthMiddleware;
pub use password::{hash_password, verify_password};
pub use token::{Claims, TokenSigner, TokenVerifier};

lazy_static! {
    // Regex for username validation: alphanumeric, underscores, hyphens
    static ref USERNAME_REGEX: regex::Regex = regex::Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap();
}

/// The identity recovered from a verified token: the user's id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Subject(pub i32);

impl Subject {
    pub fn user_id(&self) -> i32 {
        self.0
    }
}

/// Why a caller was not admitted.
///
/// Every variant except `Storage` and `Internal` reaches the client as the
/// same generic 401; the kind is kept for logging and tests.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("missing authorization header")]
    MissingToken,
    #[error("authorization header is not of the form `Bearer <token>`")]
    MalformedHeader,
    #[error("token is structurally invalid")]
    Malformed,
    #[error("token uses an unexpected signing algorithm")]
    UnexpectedAlgorithm,
    #[error("token signature does not match")]
    InvalidSignature,
    #[error("token has expired")]
    Expired,
    #[error("invalid credentials")]
    InvalidCredentials,
    /// The credential store failed underneath a login attempt.
    #[error("credential lookup failed: {0}")]
    Storage(String),
    /// Hashing or signing failed for reasons unrelated to the caller's input.
    #[error("internal authentication failure: {0}")]
    Internal(String),
}

/// Represents the payload for a user login request.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Account name. 1 to 64 characters, alphanumeric, underscores or hyphens.
    #[validate(
        length(min = 1, max = 64),
        regex(path = "USERNAME_REGEX", message = "Username must be alphanumeric, underscores, or hyphens")
    )]
    pub username: String,
    /// Plain-text password. bcrypt only looks at the first 72 bytes.
    #[validate(length(min = 1, max = 72))]
    pub password: String,
}

/// Response structure after a successful login.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Signed bearer token to send as `Authorization: Bearer <token>`.
    pub token: String,
    /// The authenticated user.
    pub user: User,
}
