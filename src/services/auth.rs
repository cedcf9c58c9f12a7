use std::sync::Arc;

use crate::auth::{verify_password, AuthError, Subject, TokenSigner};
use crate::models::User;
use crate::store::CredentialStore;

/// A freshly minted token and the user it was issued to.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub user: User,
}

/// Turns a username and password into a signed token.
#[derive(Clone)]
pub struct TokenIssuer {
    credentials: Arc<dyn CredentialStore>,
    signer: TokenSigner,
}

impl TokenIssuer {
    pub fn new(credentials: Arc<dyn CredentialStore>, signer: TokenSigner) -> Self {
        Self {
            credentials,
            signer,
        }
    }

    /// Looks the user up and checks the password against the stored hash.
    ///
    /// Unknown users and wrong passwords fail identically with
    /// `InvalidCredentials`. The password is never logged.
    pub async fn issue(&self, username: &str, password: &str) -> Result<IssuedToken, AuthError> {
        let Some(user) = self
            .credentials
            .find_by_username(username)
            .await
            .map_err(|e| AuthError::Storage(e.to_string()))?
        else {
            log::debug!("login rejected: unknown user");
            return Err(AuthError::InvalidCredentials);
        };

        // bcrypt is deliberately slow; keep it off the async workers.
        let password = password.to_owned();
        let hash = user.password_hash.clone();
        let verdict = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| AuthError::Internal(format!("password check aborted: {}", e)))?;

        // A stored hash bcrypt cannot read never matches anything.
        let matches = verdict.unwrap_or_else(|e| {
            log::error!("unreadable password hash for user {}: {}", user.id, e);
            false
        });

        if !matches {
            log::debug!("login rejected for user {}: wrong password", user.id);
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.signer.sign(Subject(user.id))?;
        log::info!("issued token for user {}", user.id);
        Ok(IssuedToken {
            token,
            user: user.to_user(),
        })
    }
}
