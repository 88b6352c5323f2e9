use crate::{
    auth::AuthenticatedUserId,
    error::AppError,
    models::{
        CreateTaskRequest, Task, TaskListResponse, TaskQuery, TaskResponse, UpdateTaskRequest,
    },
    store::{Database, TaskFilter},
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use bson::oid::ObjectId;
use serde_json::json;
use validator::Validate;

fn parse_task_id(raw: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(raw).map_err(|_| AppError::BadRequest("Invalid task ID.".into()))
}

fn task_not_found() -> AppError {
    AppError::NotFound("Task not found.".into())
}

/// Retrieves the authenticated user's tasks.
///
/// ## Query Parameters:
/// - `status` (optional): `pending` or `completed`.
/// - `search` (optional, at most 200 characters): matched case-insensitively
///   and literally against titles and descriptions.
///
/// ## Responses:
/// - `200 OK`: `{tasks, total}`, newest first. `tasks` holds at most 1000
///   entries; `total` counts every match.
/// - `400 Bad Request`: unknown `status` value.
/// - `422 Unprocessable Entity`: `search` is too long.
#[get("")]
pub async fn get_tasks(
    db: web::Data<Database>,
    user_id: AuthenticatedUserId,
    query_params: web::Query<TaskQuery>,
) -> Result<impl Responder, AppError> {
    query_params.validate()?;
    let TaskQuery { status, search } = query_params.into_inner();
    let filter = TaskFilter {
        owner_id: user_id.0,
        status,
        search,
    };

    let tasks = db.tasks.list_tasks(&filter).await?;
    let total = db.tasks.count_tasks(&filter).await?;

    Ok(HttpResponse::Ok().json(TaskListResponse {
        tasks: tasks.into_iter().map(TaskResponse::from).collect(),
        total,
    }))
}

/// Creates a new task owned by the authenticated user.
///
/// ## Request Body:
/// - `title`: 1 to 200 characters (required).
/// - `description` (optional): up to 2000 characters, defaults to `""`.
/// - `status` (optional): defaults to `pending`.
/// - `priority` (optional): `low`, `medium` or `high`, defaults to `medium`.
///
/// ## Responses:
/// - `201 Created`: the new task.
/// - `400 Bad Request`: malformed JSON or unknown enum value.
/// - `422 Unprocessable Entity`: a field fails validation.
#[post("")]
pub async fn create_task(
    db: web::Data<Database>,
    user_id: AuthenticatedUserId,
    task_data: web::Json<CreateTaskRequest>,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;

    let task = Task::new(task_data.into_inner(), user_id.0);
    db.tasks.create_task(&task).await?;

    Ok(HttpResponse::Created().json(TaskResponse::from(task)))
}

/// Retrieves one of the authenticated user's tasks.
///
/// ## Responses:
/// - `200 OK`: the task.
/// - `400 Bad Request`: `id` is not a valid task id.
/// - `404 Not Found`: no such task, or it belongs to someone else.
#[get("/{id}")]
pub async fn get_task(
    db: web::Data<Database>,
    user_id: AuthenticatedUserId,
    task_id: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let id = parse_task_id(&task_id)?;

    let task = db
        .tasks
        .find_task(user_id.0, id)
        .await?
        .ok_or_else(task_not_found)?;

    Ok(HttpResponse::Ok().json(TaskResponse::from(task)))
}

/// Partially updates one of the authenticated user's tasks.
///
/// Only the fields present in the body change.
///
/// ## Responses:
/// - `200 OK`: the updated task.
/// - `400 Bad Request`: malformed `id`, or a body with no fields.
/// - `404 Not Found`: no such task, or it belongs to someone else.
/// - `422 Unprocessable Entity`: a field fails validation.
#[put("/{id}")]
pub async fn update_task(
    db: web::Data<Database>,
    user_id: AuthenticatedUserId,
    task_id: web::Path<String>,
    task_data: web::Json<UpdateTaskRequest>,
) -> Result<impl Responder, AppError> {
    let id = parse_task_id(&task_id)?;
    task_data.validate()?;
    if task_data.is_empty() {
        return Err(AppError::BadRequest("No fields to update.".into()));
    }

    let task = db
        .tasks
        .update_task(user_id.0, id, &task_data)
        .await?
        .ok_or_else(task_not_found)?;

    Ok(HttpResponse::Ok().json(TaskResponse::from(task)))
}

/// Deletes one of the authenticated user's tasks.
///
/// ## Responses:
/// - `200 OK`: `{"message": "Task deleted successfully."}`.
/// - `400 Bad Request`: `id` is not a valid task id.
/// - `404 Not Found`: no such task, or it belongs to someone else.
#[delete("/{id}")]
pub async fn delete_task(
    db: web::Data<Database>,
    user_id: AuthenticatedUserId,
    task_id: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let id = parse_task_id(&task_id)?;

    if !db.tasks.delete_task(user_id.0, id).await? {
        return Err(task_not_found());
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Task deleted successfully." })))
}
