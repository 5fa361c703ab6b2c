//! Live subscriptions to a remote task collection
//!
//! A [`Subscription`] wraps a store [`Listener`] and turns its raw events into sorted snapshots.
//! Its lifecycle is `Unsubscribed → Subscribing → Active → (Error | Unsubscribed)`, and can be
//! followed from the outside with [`Subscription::state_receiver`].

use std::cmp::Ordering;
use std::fmt::{Display, Error, Formatter};

use tokio::sync::watch;

use crate::error::TaskError;
use crate::task::Task;
use crate::traits::{ListenEvent, Listener, TaskQuery, TaskStore};

/// Where a subscription is in its lifecycle
#[derive(Clone, Debug, PartialEq)]
pub enum SubscriptionState {
    /// Not started yet, or cancelled
    Unsubscribed,
    /// Waiting for the store to accept the live query
    Subscribing,
    /// Snapshots are being delivered
    Active,
    /// The stream broke. This is terminal for this subscription instance
    Error(String),
}

impl Display for SubscriptionState {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        match self {
            SubscriptionState::Unsubscribed => write!(f, "Unsubscribed"),
            SubscriptionState::Subscribing => write!(f, "Subscribing..."),
            SubscriptionState::Active => write!(f, "Active"),
            SubscriptionState::Error(details) => write!(f, "Failed: {}", details),
        }
    }
}

impl Default for SubscriptionState {
    fn default() -> Self {
        Self::Unsubscribed
    }
}

/// See [`Subscription::state_receiver`]
pub type StateReceiver = watch::Receiver<SubscriptionState>;


/// A standing query on a task store
pub struct Subscription {
    query: TaskQuery,
    listener: Option<Listener>,
    state: watch::Sender<SubscriptionState>,
    // Keeps the channel open even when nobody watches
    _state_keeper: StateReceiver,
}

impl Subscription {
    /// Create a subscription. Nothing is sent to the store until [`Self::start`] is called
    pub fn new(query: TaskQuery) -> Self {
        let (state, _state_keeper) = watch::channel(SubscriptionState::default());
        Self { query, listener: None, state, _state_keeper }
    }

    /// Create and start a subscription
    pub async fn open<S>(store: &S, query: TaskQuery) -> Result<Self, TaskError>
    where
        S: TaskStore + ?Sized,
    {
        let mut sub = Self::new(query);
        sub.start(store).await?;
        Ok(sub)
    }

    pub fn query(&self) -> &TaskQuery {
        &self.query
    }

    pub fn state(&self) -> SubscriptionState {
        self.state.borrow().clone()
    }

    /// Get a channel that reflects every state change of this subscription
    pub fn state_receiver(&self) -> StateReceiver {
        self.state.subscribe()
    }

    pub fn is_active(&self) -> bool {
        self.state() == SubscriptionState::Active
    }

    /// Ask the store for a live query.
    ///
    /// This only works from the `Unsubscribed` state. A failed subscription cannot be restarted, open a new one instead.
    pub async fn start<S>(&mut self, store: &S) -> Result<(), TaskError>
    where
        S: TaskStore + ?Sized,
    {
        match self.state() {
            SubscriptionState::Unsubscribed => (),
            SubscriptionState::Error(_) => {
                return Err(TaskError::Subscription("this subscription has failed already".into()));
            },
            other => {
                log::debug!("Subscription for {} already started ({})", self.query.user_id, other);
                return Ok(());
            },
        }

        self.set_state(SubscriptionState::Subscribing);
        match store.listen(&self.query).await {
            Ok(listener) => {
                log::debug!("Listening to tasks of {}", self.query.user_id);
                self.listener = Some(listener);
                self.set_state(SubscriptionState::Active);
                Ok(())
            },
            Err(err) => {
                log::warn!("Unable to listen to tasks of {}: {}", self.query.user_id, err);
                self.set_state(SubscriptionState::Error(err.to_string()));
                Err(TaskError::Subscription(err))
            },
        }
    }

    /// Wait for the next snapshot.
    ///
    /// Returns `None` when this subscription is not active (never started, cancelled, or failed).
    /// A transport failure is returned exactly once, as `Some(Err(_))`; every later call returns `None`.
    pub async fn next_snapshot(&mut self) -> Option<Result<Vec<Task>, TaskError>> {
        let listener = self.listener.as_mut()?;

        let event = listener.recv().await;
        match event {
            Some(ListenEvent::Snapshot(mut tasks)) => {
                sort_by_creation_date(&mut tasks);
                log::trace!("Got a snapshot of {} tasks for {}", tasks.len(), self.query.user_id);
                Some(Ok(tasks))
            },
            Some(ListenEvent::Failed(err)) => {
                Some(Err(self.fail(err)))
            },
            None => {
                Some(Err(self.fail("the store closed this listener".into())))
            },
        }
    }

    /// Release this subscription. No snapshot will be delivered afterwards.
    ///
    /// Calling this more than once is fine.
    pub fn cancel(&mut self) {
        if self.listener.take().is_some() {
            log::debug!("Stopped listening to tasks of {}", self.query.user_id);
        }
        if let SubscriptionState::Error(_) = self.state() {
            return;
        }
        self.set_state(SubscriptionState::Unsubscribed);
    }

    fn fail(&mut self, err: crate::error::StoreError) -> TaskError {
        log::error!("Subscription for {} failed: {}", self.query.user_id, err);
        self.listener = None;
        self.set_state(SubscriptionState::Error(err.to_string()));
        TaskError::Subscription(err)
    }

    fn set_state(&self, new_state: SubscriptionState) {
        let _ = self.state.send(new_state);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}


/// Sort tasks by creation date, newest first.
///
/// Tasks without a creation date come first (their server timestamp is still pending, so they are the newest),
/// and keep their relative order. They do not keep their position among the timestamped tasks of the snapshot:
/// "unordered against everything" is not a total order, and sorting needs one.
pub fn sort_by_creation_date(tasks: &mut [Task]) {
    tasks.sort_by(|a, b| compare_creation_dates(a, b));
}

fn compare_creation_dates(a: &Task, b: &Task) -> Ordering {
    match (a.created_at(), b.created_at()) {
        (Some(a), Some(b)) => b.cmp(a),
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
    }
}
