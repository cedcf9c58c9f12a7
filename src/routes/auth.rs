use crate::{
    auth::{AuthError, LoginRequest, LoginResponse},
    error::AppError,
    services::TokenIssuer,
};
use actix_web::{post, web, HttpResponse, Responder};
use validator::Validate;

/// Login user
///
/// Exchanges a username and password for a signed bearer token.
///
/// ## Responses:
/// - `200 OK`: `{ "token": ..., "user": { ... } }`
/// - `400 Bad Request`: The body is not valid JSON or lacks a field.
/// - `401 Unauthorized`: Unknown user, wrong password, or input that could
///   never match an account.
#[post("/login")]
pub async fn login(
    issuer: web::Data<TokenIssuer>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    // Input that fails the shape rules cannot belong to an account; answer it
    // like any other bad login without touching storage.
    if login_data.validate().is_err() {
        return Err(AuthError::InvalidCredentials.into());
    }

    let issued = issuer
        .issue(&login_data.username, &login_data.password)
        .await?;

    Ok(HttpResponse::Ok().json(LoginResponse {
        token: issued.token,
        user: issued.user,
    }))
}
