//! Data access for users and tasks.
//!
//! Handlers only see the [`UserStore`] and [`TaskStore`] traits through a
//! [`Database`] handle. Production runs on [`mongo::MongoStore`]; tests and local
//! experiments can use [`memory::MemoryStore`], which keeps the same uniqueness,
//! ownership, search and ordering rules.

pub mod memory;
pub mod mongo;

use async_trait::async_trait;
use bson::oid::ObjectId;
use std::sync::Arc;

use crate::config::Config;
use crate::error::AppError;
use crate::models::{Task, TaskStatus, UpdateTaskRequest, UpdateUserRequest, User};

pub use memory::MemoryStore;
pub use mongo::MongoStore;

/// Upper bound on the number of tasks returned by one listing.
pub const MAX_LISTED_TASKS: usize = 1000;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a new user. Fails with `AppError::Conflict` if the email is taken.
    async fn create_user(&self, user: &User) -> Result<(), AppError>;

    async fn find_user(&self, id: ObjectId) -> Result<Option<User>, AppError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Applies the present fields of `update` and returns the updated user,
    /// or `None` if no user has this id.
    async fn update_user(
        &self,
        id: ObjectId,
        update: &UpdateUserRequest,
    ) -> Result<Option<User>, AppError>;
}

/// Task persistence. Every lookup and mutation takes the owner's id; a task that
/// exists but belongs to someone else is indistinguishable from a missing one.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn create_task(&self, task: &Task) -> Result<(), AppError>;

    /// Matching tasks, newest first, at most [`MAX_LISTED_TASKS`].
    async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>, AppError>;

    /// Number of tasks matching `filter`, ignoring the listing cap.
    async fn count_tasks(&self, filter: &TaskFilter) -> Result<u64, AppError>;

    async fn find_task(&self, owner_id: ObjectId, id: ObjectId)
        -> Result<Option<Task>, AppError>;

    async fn update_task(
        &self,
        owner_id: ObjectId,
        id: ObjectId,
        update: &UpdateTaskRequest,
    ) -> Result<Option<Task>, AppError>;

    /// Returns whether a task was deleted.
    async fn delete_task(&self, owner_id: ObjectId, id: ObjectId) -> Result<bool, AppError>;
}

/// Which of an owner's tasks to list.
#[derive(Debug, Clone)]
pub struct TaskFilter {
    pub owner_id: ObjectId,
    pub status: Option<TaskStatus>,
    /// Matched case-insensitively and literally against title and description.
    pub search: Option<String>,
}

impl TaskFilter {
    pub fn owned_by(owner_id: ObjectId) -> Self {
        Self {
            owner_id,
            status: None,
            search: None,
        }
    }

    /// The search term as a regex matching it literally; empty terms match everything.
    pub(crate) fn search_pattern(&self) -> Option<String> {
        self.search
            .as_deref()
            .filter(|term| !term.is_empty())
            .map(regex::escape)
    }
}

/// The handle shared with every handler through `web::Data<Database>`.
#[derive(Clone)]
pub struct Database {
    pub users: Arc<dyn UserStore>,
    pub tasks: Arc<dyn TaskStore>,
    client: Option<mongodb::Client>,
}

impl Database {
    /// Connects to MongoDB and makes sure the indexes exist.
    pub async fn connect(config: &Config) -> Result<Self, AppError> {
        let store = MongoStore::connect(&config.mongodb_uri, &config.mongodb_database).await?;
        store.ensure_indexes().await?;
        let client = store.client();
        Ok(Self::from_store(Arc::new(store), Some(client)))
    }

    pub fn in_memory() -> Self {
        Self::from_store(Arc::new(MemoryStore::default()), None)
    }

    fn from_store<S>(store: Arc<S>, client: Option<mongodb::Client>) -> Self
    where
        S: UserStore + TaskStore + 'static,
    {
        Self {
            users: store.clone(),
            tasks: store,
            client,
        }
    }

    /// Drops the store handles and shuts the driver's connection pool down.
    pub async fn close(self) {
        drop(self.users);
        drop(self.tasks);
        if let Some(client) = self.client {
            client.shutdown().await;
            log::info!("MongoDB connection pool shut down");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_pattern_escapes_metacharacters() {
        let mut filter = TaskFilter::owned_by(ObjectId::new());
        assert_eq!(filter.search_pattern(), None);

        filter.search = Some(String::new());
        assert_eq!(filter.search_pattern(), None);

        filter.search = Some("a.b*(c)".to_string());
        assert_eq!(filter.search_pattern().as_deref(), Some(r"a\.b\*\(c\)"));
    }

    #[actix_rt::test]
    async fn test_close_only_shuts_down_a_real_pool() {
        let database = Database::in_memory();
        assert!(database.client.is_none());
        // Other handles stay usable after one clone is closed.
        let kept = database.clone();
        database.close().await;
        assert!(kept.users.find_user(ObjectId::new()).await.unwrap().is_none());
    }
}
