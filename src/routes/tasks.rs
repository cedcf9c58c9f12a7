use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    models::{TaskInput, TaskQuery},
    services::TaskService,
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};

/// Lists the authenticated user's active tasks in creation order.
///
/// ## Responses:
/// - `200 OK`: JSON array of `Task` objects.
/// - `401 Unauthorized`: Missing or invalid bearer token.
#[get("")]
pub async fn get_tasks(
    service: web::Data<TaskService>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let tasks = service.list(TaskQuery::owned_by(user.user_id())).await?;
    Ok(HttpResponse::Ok().json(tasks))
}

/// Creates a task owned by the authenticated user.
///
/// ## Request Body:
/// `{ "title": "...", "status": "pending" | "in_progress" | "done" }`
/// (legacy spellings such as `todo` are accepted and stored canonically).
///
/// ## Responses:
/// - `200 OK`: The stored `Task`, including its assigned `id`.
/// - `400 Bad Request`: Unparseable body, empty title, or unknown status.
/// - `401 Unauthorized`: Missing or invalid bearer token.
#[post("")]
pub async fn create_task(
    service: web::Data<TaskService>,
    task_data: web::Json<TaskInput>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let task = service.create(user.user_id(), &task_data).await?;
    Ok(HttpResponse::Ok().json(task))
}

/// Replaces title and status of a task the authenticated user owns.
///
/// ## Responses:
/// - `200 OK`: The refreshed `Task`.
/// - `400 Bad Request`: Validation failure.
/// - `401 Unauthorized`: Missing or invalid bearer token.
/// - `403 Forbidden`: The task belongs to another user.
/// - `404 Not Found`: No active task with that id.
#[put("/{id}")]
pub async fn update_task(
    service: web::Data<TaskService>,
    task_id: web::Path<i32>,
    task_data: web::Json<TaskInput>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let task = service
        .update(task_id.into_inner(), user.user_id(), &task_data)
        .await?;
    Ok(HttpResponse::Ok().json(task))
}

/// Soft-deletes a task the authenticated user owns.
///
/// ## Responses:
/// - `204 No Content`: The task is now deleted.
/// - `401 Unauthorized`: Missing or invalid bearer token.
/// - `403 Forbidden`: The task belongs to another user.
/// - `404 Not Found`: No active task with that id.
#[delete("/{id}")]
pub async fn delete_task(
    service: web::Data<TaskService>,
    task_id: web::Path<i32>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    service.delete(task_id.into_inner(), user.user_id()).await?;
    Ok(HttpResponse::NoContent().finish())
}
