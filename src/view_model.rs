//! The task list, as a screen sees it
//!
//! A [`TaskViewModel`] owns a live [`Subscription`] to the tasks of the signed-in user, and keeps the latest snapshot
//! as its local projection. Filters and calendar views are computed from that projection.
//!
//! Mutations are written through to the store and never applied locally: their effect shows up with the next snapshot,
//! which the caller receives from [`TaskViewModel::next_update`]. Two quick toggles of the same task are not serialized,
//! they race at the store.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use crate::config::Settings;
use crate::draft::TaskDraft;
use crate::error::{StoreError, TaskError};
use crate::id::{TaskId, UserId};
use crate::subscription::{StateReceiver, Subscription, SubscriptionState};
use crate::task::{Priority, Task};
use crate::traits::{IdentityProvider, TaskQuery, TaskStore};
use crate::view::{self, Filter, FilterCounts};

pub struct TaskViewModel<S: ?Sized, I> {
    store: Arc<S>,
    identity: I,
    settings: Settings,

    subscription: Option<Subscription>,
    /// The latest snapshot, newest task first
    tasks: Vec<Task>,
    /// Whether a snapshot (or an error) has been received since the last subscription
    loaded: bool,
    filter: Filter,
}

impl<S, I> TaskViewModel<S, I>
where
    S: TaskStore + ?Sized,
    I: IdentityProvider,
{
    pub fn new(store: Arc<S>, identity: I, settings: Settings) -> Self {
        Self {
            store,
            identity,
            settings,
            subscription: None,
            tasks: Vec::new(),
            loaded: false,
            filter: Filter::default(),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Start listening to the tasks of the current user.
    ///
    /// Any previous subscription is released first, and the projection is emptied until the first snapshot arrives.
    /// Fails with [`TaskError::Unauthenticated`] (without querying anything) when nobody is signed in. The tasks of
    /// a previous session are dropped in that case too.
    pub async fn subscribe(&mut self) -> Result<StateReceiver, TaskError> {
        self.unsubscribe();
        self.tasks.clear();
        self.loaded = false;
        let user_id = self.identity.current_user().ok_or(TaskError::Unauthenticated)?;

        let mut subscription = Subscription::new(TaskQuery::owned_by(user_id));
        let state = subscription.state_receiver();
        let started = subscription.start(&*self.store).await;
        self.subscription = Some(subscription);
        started?;
        Ok(state)
    }

    /// Release the current subscription. Calling this when there is none is fine
    pub fn unsubscribe(&mut self) {
        if let Some(subscription) = self.subscription.as_mut() {
            subscription.cancel();
        }
    }

    pub fn subscription_state(&self) -> SubscriptionState {
        self.subscription.as_ref()
            .map(|s| s.state())
            .unwrap_or_default()
    }

    /// Wait for the next snapshot and make it the new projection.
    ///
    /// The projection is replaced as a whole. Returns `None` when there is no active subscription;
    /// a subscription error is returned once and ends the subscription (call [`Self::subscribe`] again to recover).
    pub async fn next_update(&mut self) -> Option<Result<(), TaskError>> {
        let subscription = self.subscription.as_mut()?;
        match subscription.next_snapshot().await? {
            Ok(tasks) => {
                log::debug!("Projection updated ({} tasks)", tasks.len());
                self.tasks = tasks;
                self.loaded = true;
                Some(Ok(()))
            },
            Err(err) => {
                self.loaded = true;
                Some(Err(err))
            },
        }
    }

    /// Whether a subscription is waiting for its first snapshot
    pub fn is_loading(&self) -> bool {
        let running = matches!(
            self.subscription_state(),
            SubscriptionState::Subscribing | SubscriptionState::Active
        );
        running && !self.loaded
    }

    /// Every task of the latest snapshot, newest first
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn find(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id() == id)
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    pub fn set_filter(&mut self, filter: Filter) {
        self.filter = filter;
    }

    /// The tasks selected by the current filter. `today` is a `YYYY-MM-DD` date
    pub fn visible_tasks(&self, today: &str) -> Vec<Task> {
        view::filter(&self.tasks, self.filter, today)
    }

    pub fn counts(&self, today: &str) -> FilterCounts {
        FilterCounts::compute(&self.tasks, today)
    }

    /// The tasks due on `date`, ordered for a calendar day view
    pub fn day_view(&self, date: &str) -> Vec<Task> {
        let due: Vec<Task> = self.tasks.iter()
            .filter(|t| t.due_date() == date)
            .cloned()
            .collect();
        view::sort_for_date_view(&due)
    }

    pub fn marked_dates(&self) -> BTreeMap<String, Priority> {
        view::marked_dates(&self.tasks)
    }

    /// Ask the store to flip the completion status of a task, and return the requested status
    pub async fn toggle_complete(&self, id: &TaskId) -> Result<bool, TaskError> {
        self.owner()?;
        let task = self.find(id).ok_or_else(|| TaskError::NotFound(id.clone()))?;
        let completed = !task.completed();
        log::info!("Marking task {} as {}", id, if completed { "completed" } else { "not completed" });
        self.write("update a task", self.store.set_completed(id, completed)).await?;
        Ok(completed)
    }

    /// Ask the store to delete a task.
    ///
    /// Asking the user for confirmation is up to the caller.
    pub async fn delete(&self, id: &TaskId) -> Result<(), TaskError> {
        self.owner()?;
        if self.find(id).is_none() {
            return Err(TaskError::NotFound(id.clone()));
        }
        log::info!("Deleting task {}", id);
        self.write("delete a task", self.store.delete(id)).await
    }

    /// Create a new task, or update an existing one, and return its id.
    ///
    /// The draft is validated first. New tasks get their id from the store when it picks ids, or a random one otherwise.
    pub async fn save(&self, draft: &TaskDraft, today: &str) -> Result<TaskId, TaskError> {
        let fields = draft.to_fields(today)?;
        let owner = self.owner()?;

        match &draft.id {
            Some(id) => {
                if self.find(id).is_none() {
                    return Err(TaskError::NotFound(id.clone()));
                }
                log::info!("Updating task {}", id);
                self.write("update a task", self.store.update(id, fields)).await?;
                Ok(id.clone())
            },
            None => {
                let client_id = if self.store.assigns_ids() {
                    None
                } else {
                    Some(TaskId::random())
                };
                let id = self.write("create a task", self.store.insert(client_id, &owner, fields)).await?;
                log::info!("Created task {}", id);
                Ok(id)
            },
        }
    }

    /// The signed-in user, who must also be the one the projection belongs to
    fn owner(&self) -> Result<UserId, TaskError> {
        let user_id = self.identity.current_user().ok_or(TaskError::Unauthenticated)?;
        match &self.subscription {
            Some(subscription) if subscription.query().user_id != user_id => {
                log::warn!("{} is signed in, but the tasks on display belong to {}", user_id, subscription.query().user_id);
                Err(TaskError::Unauthenticated)
            },
            _ => Ok(user_id),
        }
    }

    async fn write<T, F>(&self, what: &str, write: F) -> Result<T, TaskError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        let timeout = self.settings.write_timeout();
        match tokio::time::timeout(timeout, write).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => {
                log::warn!("Unable to {}: {}", what, err);
                Err(TaskError::RemoteWriteFailed(err))
            },
            Err(_) => {
                log::warn!("Unable to {}: no answer after {:?}", what, timeout);
                Err(TaskError::RemoteWriteFailed(format!("timed out after {:?}", timeout).into()))
            },
        }
    }
}
