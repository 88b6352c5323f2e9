use async_trait::async_trait;
use bson::{doc, oid::ObjectId, Document};
use futures::TryStreamExt;
use mongodb::{
    options::{
        ClientOptions, FindOneAndUpdateOptions, FindOptions, IndexOptions, ReturnDocument,
    },
    Client, Collection, IndexModel,
};

use super::{TaskFilter, TaskStore, UserStore, MAX_LISTED_TASKS};
use crate::error::AppError;
use crate::models::{Task, UpdateTaskRequest, UpdateUserRequest, User};

const USERS: &str = "users";
const TASKS: &str = "tasks";

/// MongoDB-backed store. Both collections share the driver's pooled client,
/// which is safe to use from every worker.
pub struct MongoStore {
    client: Client,
    users: Collection<User>,
    tasks: Collection<Task>,
}

impl MongoStore {
    /// Connects and pings the server so a bad URI fails at startup.
    ///
    /// The database named in the URI wins; `fallback_database` is used when the
    /// URI names none.
    pub async fn connect(uri: &str, fallback_database: &str) -> Result<Self, AppError> {
        let options = ClientOptions::parse(uri).await?;
        let client = Client::with_options(options)?;
        let database = client
            .default_database()
            .unwrap_or_else(|| client.database(fallback_database));

        database.run_command(doc! { "ping": 1 }, None).await?;
        log::info!("Connected to MongoDB database {}", database.name());

        Ok(Self {
            client,
            users: database.collection(USERS),
            tasks: database.collection(TASKS),
        })
    }

    /// A handle to the pooled client, for shutting it down.
    pub fn client(&self) -> Client {
        self.client.clone()
    }

    /// Creates the indexes the queries rely on. Safe to run on every startup.
    pub async fn ensure_indexes(&self) -> Result<(), AppError> {
        let unique_email = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.users.create_index(unique_email, None).await?;

        let task_indexes = vec![
            IndexModel::builder().keys(doc! { "owner_id": 1 }).build(),
            IndexModel::builder().keys(doc! { "status": 1 }).build(),
            IndexModel::builder()
                .keys(doc! { "title": "text", "description": "text" })
                .build(),
        ];
        self.tasks.create_indexes(task_indexes, None).await?;

        log::info!("Indexes ensured on {} and {}", USERS, TASKS);
        Ok(())
    }
}

fn owned(owner_id: ObjectId, id: ObjectId) -> Document {
    doc! { "_id": id, "owner_id": owner_id }
}

pub(crate) fn task_query(filter: &TaskFilter) -> Document {
    let mut query = doc! { "owner_id": filter.owner_id };
    if let Some(status) = filter.status {
        query.insert("status", status.as_str());
    }
    if let Some(pattern) = filter.search_pattern() {
        query.insert(
            "$or",
            vec![
                doc! { "title": { "$regex": pattern.as_str(), "$options": "i" } },
                doc! { "description": { "$regex": pattern.as_str(), "$options": "i" } },
            ],
        );
    }
    query
}

pub(crate) fn task_changes(update: &UpdateTaskRequest) -> Document {
    let mut changes = Document::new();
    if let Some(title) = &update.title {
        changes.insert("title", title.as_str());
    }
    if let Some(description) = &update.description {
        changes.insert("description", description.as_str());
    }
    if let Some(status) = update.status {
        changes.insert("status", status.as_str());
    }
    if let Some(priority) = update.priority {
        changes.insert("priority", priority.as_str());
    }
    changes
}

pub(crate) fn user_changes(update: &UpdateUserRequest) -> Document {
    let mut changes = Document::new();
    if let Some(name) = &update.name {
        changes.insert("name", name.as_str());
    }
    if let Some(email) = &update.email {
        changes.insert("email", email.as_str());
    }
    changes
}

fn return_updated() -> FindOneAndUpdateOptions {
    FindOneAndUpdateOptions::builder()
        .return_document(ReturnDocument::After)
        .build()
}

#[async_trait]
impl UserStore for MongoStore {
    async fn create_user(&self, user: &User) -> Result<(), AppError> {
        self.users.insert_one(user, None).await?;
        Ok(())
    }

    async fn find_user(&self, id: ObjectId) -> Result<Option<User>, AppError> {
        Ok(self.users.find_one(doc! { "_id": id }, None).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.find_one(doc! { "email": email }, None).await?)
    }

    async fn update_user(
        &self,
        id: ObjectId,
        update: &UpdateUserRequest,
    ) -> Result<Option<User>, AppError> {
        let changes = user_changes(update);
        if changes.is_empty() {
            return self.find_user(id).await;
        }
        Ok(self
            .users
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": changes }, return_updated())
            .await?)
    }
}

#[async_trait]
impl TaskStore for MongoStore {
    async fn create_task(&self, task: &Task) -> Result<(), AppError> {
        self.tasks.insert_one(task, None).await?;
        Ok(())
    }

    async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>, AppError> {
        let options = FindOptions::builder()
            .sort(doc! { "created_at": -1, "_id": -1 })
            .limit(MAX_LISTED_TASKS as i64)
            .build();
        let cursor = self.tasks.find(task_query(filter), options).await?;
        Ok(cursor.try_collect::<Vec<Task>>().await?)
    }

    async fn count_tasks(&self, filter: &TaskFilter) -> Result<u64, AppError> {
        Ok(self
            .tasks
            .count_documents(task_query(filter), None)
            .await?)
    }

    async fn find_task(
        &self,
        owner_id: ObjectId,
        id: ObjectId,
    ) -> Result<Option<Task>, AppError> {
        Ok(self.tasks.find_one(owned(owner_id, id), None).await?)
    }

    async fn update_task(
        &self,
        owner_id: ObjectId,
        id: ObjectId,
        update: &UpdateTaskRequest,
    ) -> Result<Option<Task>, AppError> {
        let changes = task_changes(update);
        if changes.is_empty() {
            return self.find_task(owner_id, id).await;
        }
        Ok(self
            .tasks
            .find_one_and_update(owned(owner_id, id), doc! { "$set": changes }, return_updated())
            .await?)
    }

    async fn delete_task(&self, owner_id: ObjectId, id: ObjectId) -> Result<bool, AppError> {
        let result = self.tasks.delete_one(owned(owner_id, id), None).await?;
        Ok(result.deleted_count > 0)
    }
}
