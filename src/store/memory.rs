use async_trait::async_trait;
use bson::oid::ObjectId;
use regex::{Regex, RegexBuilder};
use std::cmp::Reverse;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{TaskFilter, TaskStore, UserStore, MAX_LISTED_TASKS};
use crate::error::AppError;
use crate::models::{Task, UpdateTaskRequest, UpdateUserRequest, User};

/// A process-local store with the same observable behaviour as MongoDB for the
/// queries this service issues: unique emails, owner scoping, literal
/// case-insensitive search and newest-first ordering.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<ObjectId, User>>,
    tasks: RwLock<HashMap<ObjectId, Task>>,
}

fn email_conflict() -> AppError {
    AppError::Conflict("A user with this email already exists.".into())
}

fn search_regex(filter: &TaskFilter) -> Result<Option<Regex>, AppError> {
    filter
        .search_pattern()
        .map(|pattern| {
            RegexBuilder::new(&pattern)
                .case_insensitive(true)
                .build()
                .map_err(|e| AppError::InternalServerError(e.to_string()))
        })
        .transpose()
}

impl MemoryStore {
    async fn matching(&self, filter: &TaskFilter) -> Result<Vec<Task>, AppError> {
        let search = search_regex(filter)?;
        let tasks = self.tasks.read().await;
        Ok(tasks
            .values()
            .filter(|task| task.owner_id == filter.owner_id)
            .filter(|task| filter.status.map_or(true, |status| task.status == status))
            .filter(|task| {
                search.as_ref().map_or(true, |re| {
                    re.is_match(&task.title) || re.is_match(&task.description)
                })
            })
            .cloned()
            .collect())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, user: &User) -> Result<(), AppError> {
        let mut users = self.users.write().await;
        if users.values().any(|existing| existing.email == user.email) {
            return Err(email_conflict());
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_user(&self, id: ObjectId) -> Result<Option<User>, AppError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let users = self.users.read().await;
        Ok(users.values().find(|user| user.email == email).cloned())
    }

    async fn update_user(
        &self,
        id: ObjectId,
        update: &UpdateUserRequest,
    ) -> Result<Option<User>, AppError> {
        let mut users = self.users.write().await;
        if let Some(email) = &update.email {
            if users
                .values()
                .any(|other| other.id != id && &other.email == email)
            {
                return Err(email_conflict());
            }
        }
        Ok(users.get_mut(&id).map(|user| {
            if let Some(name) = &update.name {
                user.name = name.clone();
            }
            if let Some(email) = &update.email {
                user.email = email.clone();
            }
            user.clone()
        }))
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn create_task(&self, task: &Task) -> Result<(), AppError> {
        self.tasks.write().await.insert(task.id, task.clone());
        Ok(())
    }

    async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>, AppError> {
        let mut tasks = self.matching(filter).await?;
        tasks.sort_by_key(|task| Reverse((task.created_at, task.id)));
        tasks.truncate(MAX_LISTED_TASKS);
        Ok(tasks)
    }

    async fn count_tasks(&self, filter: &TaskFilter) -> Result<u64, AppError> {
        Ok(self.matching(filter).await?.len() as u64)
    }

    async fn find_task(
        &self,
        owner_id: ObjectId,
        id: ObjectId,
    ) -> Result<Option<Task>, AppError> {
        let tasks = self.tasks.read().await;
        Ok(tasks
            .get(&id)
            .filter(|task| task.owner_id == owner_id)
            .cloned())
    }

    async fn update_task(
        &self,
        owner_id: ObjectId,
        id: ObjectId,
        update: &UpdateTaskRequest,
    ) -> Result<Option<Task>, AppError> {
        let mut tasks = self.tasks.write().await;
        Ok(tasks
            .get_mut(&id)
            .filter(|task| task.owner_id == owner_id)
            .map(|task| {
                task.apply(update);
                task.clone()
            }))
    }

    async fn delete_task(&self, owner_id: ObjectId, id: ObjectId) -> Result<bool, AppError> {
        let mut tasks = self.tasks.write().await;
        let owned = tasks
            .get(&id)
            .map_or(false, |task| task.owner_id == owner_id);
        if owned {
            tasks.remove(&id);
        }
        Ok(owned)
    }
}
