pub mod auth;
pub mod health;
pub mod tasks;

use actix_web::{error::JsonPayloadError, web, HttpRequest};

use crate::auth::{AuthGuard, AuthMiddleware};
use crate::error::AppError;

/// Registers every route. `/login` and `/health` are public; the `/tasks`
/// scope sits behind `AuthMiddleware`, so no handler in it runs for an
/// unauthenticated request.
///
/// Used as `App::new().configure(routes::configure(guard))`.
pub fn configure(guard: AuthGuard) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.app_data(json_config())
            .service(health::health)
            .service(auth::login)
            .service(
                web::scope("/tasks")
                    .wrap(AuthMiddleware::new(guard))
                    .service(tasks::get_tasks)
                    .service(tasks::create_task)
                    .service(tasks::update_task)
                    .service(tasks::delete_task),
            );
    }
}

/// Reports unparseable JSON bodies as a 400 with the usual error envelope.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err: JsonPayloadError, _req: &HttpRequest| {
        log::debug!("rejecting request body: {}", err);
        AppError::BadRequest("Invalid JSON".into()).into()
    })
}
