use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};

use super::{AuthError, Subject};
use crate::error::AppError;

/// Extracts the authenticated subject from request extensions.
///
/// Only meaningful on routes wrapped by `AuthMiddleware`, which inserts the
/// `Subject` after a successful admission. If it is absent the handler is
/// refused with a 401 rather than run without an identity.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser(pub Subject);

impl AuthenticatedUser {
    pub fn user_id(&self) -> i32 {
        self.0.user_id()
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<Subject>().copied() {
            Some(subject) => ready(Ok(AuthenticatedUser(subject))),
            None => {
                log::error!("{} reached a handler without an admitted subject", req.path());
                ready(Err(AppError::from(AuthError::MissingToken).into()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::dev::Payload;
    use actix_web::http::StatusCode;
    use actix_web::test;

    #[actix_rt::test]
    async fn test_authenticated_user_extractor_success() {
        let req = test::TestRequest::default().to_http_request();
        req.extensions_mut().insert(Subject(123));

        let mut payload = Payload::None;
        let extracted = AuthenticatedUser::from_request(&req, &mut payload).await;
        assert_eq!(extracted.unwrap().user_id(), 123);
    }

    #[actix_rt::test]
    async fn test_authenticated_user_extractor_failure() {
        let req = test::TestRequest::default().to_http_request();

        let mut payload = Payload::None;
        let err = AuthenticatedUser::from_request(&req, &mut payload)
            .await
            .unwrap_err();
        assert_eq!(err.error_response().status(), StatusCode::UNAUTHORIZED);
    }
}
