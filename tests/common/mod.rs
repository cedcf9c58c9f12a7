#![allow(dead_code)]

use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{test, web};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use taskgate::auth::{AuthGuard, LoginResponse, TokenSigner, TokenVerifier};
use taskgate::config::SigningSecret;
use taskgate::seed;
use taskgate::store::{InMemoryCredentialStore, InMemoryTaskStore};
use taskgate::{TaskService, TokenIssuer};

pub const SECRET: &str = "integration-test-secret";

/// Everything an app instance needs, backed by the in-memory stores and the
/// seed users (alex/password123, maria/secret456).
pub struct TestState {
    pub tasks: web::Data<TaskService>,
    pub issuer: web::Data<TokenIssuer>,
    pub guard: AuthGuard,
    pub signer: TokenSigner,
}

pub fn state() -> TestState {
    let secret = SigningSecret::new(SECRET);
    let signer = TokenSigner::new(&secret, Duration::from_secs(3600));
    let users = seed::credentials(4).expect("seed credentials");

    TestState {
        tasks: web::Data::new(TaskService::new(Arc::new(InMemoryTaskStore::new()))),
        issuer: web::Data::new(TokenIssuer::new(
            Arc::new(InMemoryCredentialStore::new(users)),
            signer.clone(),
        )),
        guard: AuthGuard::new(TokenVerifier::new(&secret)),
        signer,
    }
}

/// Builds the full application over a `TestState`.
macro_rules! test_app {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data($state.tasks.clone())
                .app_data($state.issuer.clone())
                .wrap(actix_web::middleware::Logger::default())
                .configure(taskgate::routes::configure($state.guard.clone())),
        )
        .await
    };
}

/// Status of a request whether the app answered with a response or with an
/// error (middleware rejections surface as the latter under `init_service`).
pub async fn status_of<S, B>(app: &S, req: Request) -> StatusCode
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    match test::try_call_service(app, req).await {
        Ok(resp) => resp.status(),
        Err(err) => err.as_response_error().status_code(),
    }
}

pub async fn login(
    app: &impl Service<
        Request,
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
    >,
    username: &str,
    password: &str,
) -> LoginResponse {
    let req = test::TestRequest::post()
        .uri("/login")
        .set_json(json!({ "username": username, "password": password }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), StatusCode::OK, "login as {} failed", username);
    test::read_body_json(resp).await
}

pub fn bearer(token: &str) -> (actix_web::http::header::HeaderName, String) {
    (
        actix_web::http::header::AUTHORIZATION,
        format!("Bearer {}", token),
    )
}
