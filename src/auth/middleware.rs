use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use std::rc::Rc;

use super::{AuthError, AuthGuard};
use crate::error::AppError;

/// Runs `AuthGuard` in front of every route in the wrapped scope.
///
/// On success the `Subject` is stored in the request extensions for
/// `AuthenticatedUser` to pick up. On failure the inner service is never
/// called.
pub struct AuthMiddleware {
    guard: Rc<AuthGuard>,
}

impl AuthMiddleware {
    pub fn new(guard: AuthGuard) -> Self {
        Self {
            guard: Rc::new(guard),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service,
            guard: Rc::clone(&self.guard),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
    guard: Rc<AuthGuard>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let admitted = match req.headers().get(header::AUTHORIZATION) {
            None => self.guard.admit(None),
            Some(value) => match value.to_str() {
                Ok(raw) => self.guard.admit(Some(raw)),
                Err(_) => Err(AuthError::MalformedHeader),
            },
        };

        match admitted {
            Ok(subject) => {
                req.extensions_mut().insert(subject);
                Box::pin(self.service.call(req))
            }
            Err(auth_err) => {
                log::debug!("{} {} rejected: {}", req.method(), req.path(), auth_err);
                let app_err = AppError::from(auth_err);
                Box::pin(async move { Err(app_err.into()) })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthenticatedUser, Subject, TokenSigner, TokenVerifier};
    use crate::config::SigningSecret;
    use actix_web::{http::StatusCode, test, web, App, HttpResponse};
    use std::time::Duration;

    async fn whoami(user: AuthenticatedUser) -> HttpResponse {
        HttpResponse::Ok().body(user.0.user_id().to_string())
    }

    #[actix_rt::test]
    async fn test_middleware_admits_and_rejects() {
        let secret = SigningSecret::new("middleware-secret");
        let guard = AuthGuard::new(TokenVerifier::new(&secret));
        let token = TokenSigner::new(&secret, Duration::from_secs(60))
            .sign(Subject(42))
            .unwrap();

        let app = test::init_service(
            App::new().service(
                web::scope("/private")
                    .wrap(AuthMiddleware::new(guard))
                    .route("/me", web::get().to(whoami)),
            ),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/private/me")
            .insert_header((header::AUTHORIZATION, format!("Bearer {}", token)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(test::read_body(resp).await, "42");

        let req = test::TestRequest::get().uri("/private/me").to_request();
        let err = test::try_call_service(&app, req).await.unwrap_err();
        assert_eq!(err.as_response_error().status_code(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::get()
            .uri("/private/me")
            .insert_header((header::AUTHORIZATION, format!("Token {}", token)))
            .to_request();
        let err = test::try_call_service(&app, req).await.unwrap_err();
        assert_eq!(err.as_response_error().status_code(), StatusCode::UNAUTHORIZED);
    }
}
