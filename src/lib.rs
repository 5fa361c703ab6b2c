//! This crate keeps a live, filterable view over a to-do list stored in a remote document collection.
//!
//! The remote collection is abstracted by the [`TaskStore`](traits::TaskStore) trait, and the signed-in user by
//! [`IdentityProvider`](traits::IdentityProvider). Both are handed to a [`TaskViewModel`], which subscribes to the
//! tasks of the current user and maintains a local projection of them. \
//! Filtering (all / today / overdue) and calendar views are pure functions of that projection, in the [`view`] module. \
//! Mutations (toggle, delete, create/update) are written through to the store; their effect becomes visible with the next snapshot.
//!
//! An in-memory store is provided in the [`memory`] module, for tests and demos.

pub mod traits;

mod id;
pub use id::{TaskId, UserId};
mod task;
pub use task::{Priority, Task, TaskFields};
pub mod error;
pub use error::TaskError;

pub mod subscription;
pub use subscription::{Subscription, SubscriptionState};
pub mod view;
pub mod draft;
pub use draft::TaskDraft;
pub mod view_model;
pub use view_model::TaskViewModel;

pub mod memory;
pub mod mock_behaviour;

pub mod debounce;
pub mod location;

pub mod config;
pub use config::Settings;
pub mod utils;
