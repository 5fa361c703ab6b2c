//! An in-process task store
//!
//! [`MemoryStore`] behaves like a hosted document collection with live queries: it picks ids and creation dates,
//! and pushes a full snapshot to every listener whose query is affected by a write.
//! It is used by tests and demos, and can be made to fail with a [`MockBehaviour`].

use std::collections::HashSet;
use std::error::Error;
use std::io::Read;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::mpsc;

use crate::error::StoreError;
use crate::id::{TaskId, UserId};
use crate::mock_behaviour::MockBehaviour;
use crate::task::{Task, TaskFields};
use crate::traits::{ListenEvent, Listener, TaskQuery, TaskStore};

struct RegisteredListener {
    query: TaskQuery,
    sender: mpsc::UnboundedSender<ListenEvent>,
}

#[derive(Default)]
struct StoreData {
    /// In insertion order
    tasks: Vec<Task>,
    listeners: Vec<RegisteredListener>,
    write_calls: usize,
}

/// A [`TaskStore`] that keeps everything in memory
#[derive(Default)]
pub struct MemoryStore {
    data: Mutex<StoreData>,
    client_ids: bool,
    listen_delay: Option<Duration>,
    write_delay: Option<Duration>,
    mock_behaviour: Option<Arc<Mutex<MockBehaviour>>>,
}

impl MemoryStore {
    /// An empty store, that assigns ids to new tasks
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty store that expects clients to pick the ids of new tasks
    pub fn with_client_ids() -> Self {
        Self { client_ids: true, ..Self::default() }
    }

    /// A store seeded with a JSON array of task documents. Ids must be unique
    pub fn from_json<R: Read>(reader: R) -> Result<Self, Box<dyn Error>> {
        let tasks: Vec<Task> = serde_json::from_reader(reader)?;
        let mut seen = HashSet::new();
        for task in &tasks {
            if !seen.insert(task.id()) {
                return Err(format!("task id {} appears more than once", task.id()).into());
            }
        }
        let store = Self::new();
        store.lock().tasks = tasks;
        Ok(store)
    }

    /// Make this store fail some operations, see [`MockBehaviour`]
    pub fn set_mock_behaviour(&mut self, mock_behaviour: Option<Arc<Mutex<MockBehaviour>>>) {
        self.mock_behaviour = mock_behaviour;
    }

    /// Make the store take this long to accept a live query
    pub fn set_listen_delay(&mut self, delay: Option<Duration>) {
        self.listen_delay = delay;
    }

    /// Make every write take this long
    pub fn set_write_delay(&mut self, delay: Option<Duration>) {
        self.write_delay = delay;
    }

    /// The tasks currently stored, in insertion order
    pub fn tasks(&self) -> Vec<Task> {
        self.lock().tasks.clone()
    }

    /// Returns how many times a write (insert, update, set_completed, delete) has been requested, including failed ones
    pub fn write_calls(&self) -> usize {
        self.lock().write_calls
    }

    /// Returns the number of listeners that have not been dropped yet
    pub fn listener_count(&self) -> usize {
        let mut data = self.lock();
        data.listeners.retain(|l| !l.sender.is_closed());
        data.listeners.len()
    }

    /// Simulate a broken connection: every live listener receives an error, then is forgotten
    pub fn break_transport(&self) {
        let listeners = std::mem::take(&mut self.lock().listeners);
        log::info!("Breaking the transport of {} listeners", listeners.len());
        for listener in listeners {
            let _ = listener.sender.send(ListenEvent::Failed("connection lost".into()));
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreData> {
        self.data.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check(&self, check: fn(&mut MockBehaviour) -> Result<(), StoreError>) -> Result<(), StoreError> {
        match &self.mock_behaviour {
            None => Ok(()),
            Some(behaviour) => {
                let mut behaviour = behaviour.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                check(&mut *behaviour)
            },
        }
    }

    async fn begin_write(&self, check: fn(&mut MockBehaviour) -> Result<(), StoreError>) -> Result<(), StoreError> {
        self.lock().write_calls += 1;
        if let Some(delay) = self.write_delay {
            tokio::time::sleep(delay).await;
        }
        self.check(check)
    }
}

impl StoreData {
    /// Send a fresh snapshot to every listener that may see a difference between `before` and `after`
    fn notify(&mut self, before: Option<&Task>, after: Option<&Task>) {
        let tasks = &self.tasks;
        self.listeners.retain(|listener| {
            let affected = before.map_or(false, |t| listener.query.matches(t))
                || after.map_or(false, |t| listener.query.matches(t));
            if !affected {
                return !listener.sender.is_closed();
            }
            let snapshot = matching(tasks, &listener.query);
            listener.sender.send(ListenEvent::Snapshot(snapshot)).is_ok()
        });
    }

    fn position(&self, id: &TaskId) -> Result<usize, StoreError> {
        self.tasks.iter()
            .position(|t| t.id() == id)
            .ok_or_else(|| format!("no task with id {}", id).into())
    }
}

fn matching(tasks: &[Task], query: &TaskQuery) -> Vec<Task> {
    tasks.iter()
        .filter(|t| query.matches(t))
        .cloned()
        .collect()
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn listen(&self, query: &TaskQuery) -> Result<Listener, StoreError> {
        if let Some(delay) = self.listen_delay {
            tokio::time::sleep(delay).await;
        }
        self.check(MockBehaviour::can_listen)?;

        let (sender, receiver) = mpsc::unbounded_channel();
        let mut data = self.lock();
        let initial = matching(&data.tasks, query);
        log::debug!("New listener for {:?}, {} tasks match", query, initial.len());
        sender.send(ListenEvent::Snapshot(initial))
            .map_err(|_| "listener dropped before the first snapshot")?;
        data.listeners.push(RegisteredListener { query: query.clone(), sender });
        Ok(receiver)
    }

    fn assigns_ids(&self) -> bool {
        !self.client_ids
    }

    async fn insert(&self, id: Option<TaskId>, owner: &UserId, fields: TaskFields) -> Result<TaskId, StoreError> {
        self.begin_write(MockBehaviour::can_insert).await?;

        let mut data = self.lock();
        let id = match id {
            Some(id) => {
                if data.tasks.iter().any(|t| t.id() == &id) {
                    return Err(format!("a task with id {} exists already", id).into());
                }
                id
            },
            None if self.client_ids => return Err("this store expects the client to choose an id".into()),
            None => TaskId::random(),
        };

        let task = Task::new(id.clone(), owner.clone(), fields, Some(Utc::now()));
        log::debug!("Inserting task {} for {}", id, owner);
        data.tasks.push(task.clone());
        data.notify(None, Some(&task));
        Ok(id)
    }

    async fn update(&self, id: &TaskId, fields: TaskFields) -> Result<(), StoreError> {
        self.begin_write(MockBehaviour::can_update).await?;

        let mut data = self.lock();
        let index = data.position(id)?;
        let before = data.tasks[index].clone();
        data.tasks[index].set_fields(fields);
        let after = data.tasks[index].clone();
        data.notify(Some(&before), Some(&after));
        Ok(())
    }

    async fn set_completed(&self, id: &TaskId, completed: bool) -> Result<(), StoreError> {
        self.begin_write(MockBehaviour::can_set_completed).await?;

        let mut data = self.lock();
        let index = data.position(id)?;
        data.tasks[index].set_completed(completed);
        let after = data.tasks[index].clone();
        data.notify(Some(&after), Some(&after));
        Ok(())
    }

    async fn delete(&self, id: &TaskId) -> Result<(), StoreError> {
        self.begin_write(MockBehaviour::can_delete).await?;

        let mut data = self.lock();
        let index = data.position(id)?;
        let removed = data.tasks.remove(index);
        log::debug!("Deleted task {}", id);
        data.notify(Some(&removed), None);
        Ok(())
    }
}
