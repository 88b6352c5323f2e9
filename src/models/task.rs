use bson::oid::ObjectId;
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Represents the priority of a task.
#[derive(Debug, Default, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }
}

/// Represents the status of a task.
#[derive(Debug, Default, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Task is yet to be done.
    #[default]
    Pending,
    /// Task is done.
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Completed => "completed",
        }
    }
}

/// Payload for creating a task. Everything but the title has a default.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateTaskRequest {
    /// The title of the task.
    /// Must be between 1 and 200 characters.
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    /// Maximum length of 2000 characters.
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub description: String,

    #[serde(default)]
    pub status: TaskStatus,

    #[serde(default)]
    pub priority: TaskPriority,
}

/// Partial update of a task. Fields left out of the body are not touched.
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
}

impl UpdateTaskRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
    }
}

/// Represents a task as stored in the `tasks` collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    /// The user who owns the task. Every query filters on this.
    pub owner_id: ObjectId,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Creates a new `Task` owned by `owner_id` with a fresh id.
    /// `created_at` is truncated to milliseconds, the precision the store keeps.
    pub fn new(input: CreateTaskRequest, owner_id: ObjectId) -> Self {
        Self {
            id: ObjectId::new(),
            title: input.title,
            description: input.description,
            status: input.status,
            priority: input.priority,
            owner_id,
            created_at: Utc::now().trunc_subsecs(3),
        }
    }

    /// Applies the fields present in `update`, leaving the rest unchanged.
    pub fn apply(&mut self, update: &UpdateTaskRequest) {
        if let Some(title) = &update.title {
            self.title = title.clone();
        }
        if let Some(description) = &update.description {
            self.description = description.clone();
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(priority) = update.priority {
            self.priority = priority;
        }
    }
}

/// Query parameters accepted when listing tasks.
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct TaskQuery {
    /// Only tasks with this status.
    pub status: Option<TaskStatus>,
    /// Case-insensitive substring of the title or description.
    #[validate(length(max = 200))]
    pub search: Option<String>,
}

/// A task as returned by the API.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct TaskResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self {
            id: task.id.to_hex(),
            title: task.title,
            description: task.description,
            status: task.status,
            priority: task.priority,
            owner_id: task.owner_id.to_hex(),
            created_at: task.created_at,
        }
    }
}

/// Body of `GET /tasks`. `total` counts every match, even past the page cap.
#[derive(Debug, Serialize, Deserialize)]
pub struct TaskListResponse {
    pub tasks: Vec<TaskResponse>,
    pub total: u64,
}
