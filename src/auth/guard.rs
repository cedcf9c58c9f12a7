use super::{AuthError, Subject, TokenVerifier};

const BEARER: &str = "Bearer";

/// Admits or rejects a request from its raw `Authorization` header.
///
/// Holds only the verifier, which is immutable, so one guard can be cloned
/// into every worker.
#[derive(Clone)]
pub struct AuthGuard {
    verifier: TokenVerifier,
}

impl AuthGuard {
    pub fn new(verifier: TokenVerifier) -> Self {
        Self { verifier }
    }

    /// Checks the header shape, then delegates the token to the verifier.
    pub fn admit(&self, authorization: Option<&str>) -> Result<Subject, AuthError> {
        let raw = match authorization.map(str::trim) {
            None | Some("") => return Err(AuthError::MissingToken),
            Some(raw) => raw,
        };

        let token = match raw.split_once(' ') {
            Some((BEARER, token)) if !token.is_empty() && !token.contains(char::is_whitespace) => {
                token
            }
            _ => return Err(AuthError::MalformedHeader),
        };

        self.verifier.verify(token)
    }
}
