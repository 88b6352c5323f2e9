pub mod task;
pub mod user;

pub use task::{
    CreateTaskRequest, Task, TaskListResponse, TaskPriority, TaskQuery, TaskResponse, TaskStatus,
    UpdateTaskRequest,
};
pub use user::{normalize_email, UpdateUserRequest, User, UserProfile};
