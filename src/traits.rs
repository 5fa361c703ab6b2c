//! The collaborators this crate talks to
use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::StoreError;
use crate::id::{TaskId, UserId};
use crate::task::{Task, TaskFields};

/// Selects the tasks a listener is interested in.
///
/// This is an equality predicate on `userId`, and optionally on `dueDate`.
/// Scoping every query on the owner is the only access control there is.
#[derive(Clone, Debug, PartialEq)]
pub struct TaskQuery {
    pub user_id: UserId,
    pub due_date: Option<String>,
}

impl TaskQuery {
    /// Every task owned by `user_id`
    pub fn owned_by(user_id: UserId) -> Self {
        Self { user_id, due_date: None }
    }

    /// Tasks owned by `user_id` that are due on `date` (`YYYY-MM-DD`)
    pub fn due_on(user_id: UserId, date: &str) -> Self {
        Self { user_id, due_date: Some(date.to_string()) }
    }

    pub fn matches(&self, task: &Task) -> bool {
        task.user_id() == &self.user_id
            && self.due_date.as_deref().map_or(true, |date| task.due_date() == date)
    }
}

/// What a live listener receives
#[derive(Debug)]
pub enum ListenEvent {
    /// The whole set of matching tasks, in no particular order
    Snapshot(Vec<Task>),
    /// The transport broke. Nothing will be sent after this
    Failed(StoreError),
}

/// The receiving end of a live query.
///
/// Dropping it detaches the listener: stores must stop sending to closed channels and forget about them.
pub type Listener = mpsc::UnboundedReceiver<ListenEvent>;

/// A remote document collection that holds tasks
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Start a live query.
    ///
    /// The store sends a first snapshot as soon as it can, then a new full snapshot every time the matching set changes
    async fn listen(&self, query: &TaskQuery) -> Result<Listener, StoreError>;

    /// Whether the store chooses the ids of new tasks.
    /// When it does not, callers must provide one to [`Self::insert`]
    fn assigns_ids(&self) -> bool {
        true
    }

    /// Create a task and return its id.
    ///
    /// `id` is `None` when the store is expected to pick one
    async fn insert(&self, id: Option<TaskId>, owner: &UserId, fields: TaskFields) -> Result<TaskId, StoreError>;
    /// Overwrite the writable fields of an existing task
    async fn update(&self, id: &TaskId, fields: TaskFields) -> Result<(), StoreError>;
    /// Set the completion flag of an existing task
    async fn set_completed(&self, id: &TaskId, completed: bool) -> Result<(), StoreError>;
    /// Remove a task
    async fn delete(&self, id: &TaskId) -> Result<(), StoreError>;
}

/// Tells who is currently signed in
pub trait IdentityProvider: Send + Sync {
    /// Returns `None` when there is no session
    fn current_user(&self) -> Option<UserId>;
}

impl IdentityProvider for Option<UserId> {
    fn current_user(&self) -> Option<UserId> {
        self.clone()
    }
}

/// Turns free text into a list of formatted addresses
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>, StoreError>;
}
