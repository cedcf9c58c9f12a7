use actix_web::{get, web, HttpResponse, Responder};
use chrono::Utc;
use serde_json::json;

use crate::services::TaskService;

/// Readiness probe. Public; answers 503 while task storage is unreachable.
#[get("/health")]
pub async fn health(tasks: web::Data<TaskService>) -> impl Responder {
    let ready = tasks.storage_ready().await;
    let mut response = if ready {
        HttpResponse::Ok()
    } else {
        HttpResponse::ServiceUnavailable()
    };

    response.json(json!({
        "status": if ready { "ok" } else { "degraded" },
        "storage": if ready { "ok" } else { "unavailable" },
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now()
    }))
}
