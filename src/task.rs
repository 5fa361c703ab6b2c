//! To-do tasks, as stored in the remote document collection

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

use crate::id::{TaskId, UserId};

/// How urgent a task is.
///
/// This is a closed set: documents carrying any other value fail to deserialize
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

impl Display for Priority {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::High => write!(f, "high"),
            Priority::Medium => write!(f, "medium"),
            Priority::Low => write!(f, "low"),
        }
    }
}

impl FromStr for Priority {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            other => Err(format!("Unknown priority {:?}", other)),
        }
    }
}


/// The part of a task a user can write.
///
/// `due_date` and `due_time` hold the canonical `YYYY-MM-DD` and `HH:MM` encodings, which is what makes
/// plain string comparisons order them correctly. Use [`TaskDraft`](crate::draft::TaskDraft) to build normalized fields from user input.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskFields {
    pub title: String,
    pub due_date: String,
    pub due_time: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub has_location: bool,
    #[serde(default)]
    pub has_weather: bool,
}


/// A to-do task, as delivered by a snapshot of the remote store
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Assigned once, when the task is created
    id: TaskId,
    /// The owner of this task
    user_id: UserId,
    /// Set by the server. Documents written by older clients may lack it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_at: Option<DateTime<Utc>>,

    #[serde(flatten)]
    fields: TaskFields,
}

impl Task {
    pub fn new(id: TaskId, user_id: UserId, fields: TaskFields, created_at: Option<DateTime<Utc>>) -> Self {
        Self { id, user_id, created_at, fields }
    }

    pub fn id(&self) -> &TaskId          { &self.id }
    pub fn user_id(&self) -> &UserId     { &self.user_id }
    pub fn title(&self) -> &str          { &self.fields.title }
    pub fn due_date(&self) -> &str       { &self.fields.due_date }
    pub fn due_time(&self) -> &str       { &self.fields.due_time }
    pub fn priority(&self) -> Priority   { self.fields.priority }
    pub fn completed(&self) -> bool      { self.fields.is_completed }
    pub fn has_location(&self) -> bool   { self.fields.has_location }
    pub fn has_weather(&self) -> bool    { self.fields.has_weather }
    pub fn fields(&self) -> &TaskFields  { &self.fields }
    pub fn created_at(&self) -> Option<&DateTime<Utc>> { self.created_at.as_ref() }

    /// Replace the writable fields. Only stores call this; clients go through the view model
    pub fn set_fields(&mut self, fields: TaskFields) {
        self.fields = fields;
    }

    pub fn set_completed(&mut self, completed: bool) {
        self.fields.is_completed = completed;
    }
}
