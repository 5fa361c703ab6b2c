//! Errors returned by the view model and its subscriptions

use std::error::Error;

use thiserror::Error;

use crate::id::TaskId;

/// The error type of collaborators (remote stores, geocoders...)
pub type StoreError = Box<dyn Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum TaskError {
    /// Bad user input. Nothing was sent to the store
    #[error("invalid task: {0}")]
    Validation(String),

    /// The task is not part of the current local projection. Nothing was sent to the store
    #[error("no task with id {0} in the current view")]
    NotFound(TaskId),

    /// The store rejected the write, or did not answer in time. The local projection is unchanged
    #[error("remote write failed: {0}")]
    RemoteWriteFailed(#[source] StoreError),

    /// The live snapshot stream broke. This subscription will not deliver anything more
    #[error("subscription failed: {0}")]
    Subscription(#[source] StoreError),

    /// No user is signed in, so there is nothing to query
    #[error("no authenticated user")]
    Unauthenticated,
}

impl TaskError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, TaskError::NotFound(_))
    }
}
