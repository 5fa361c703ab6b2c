//! User input for new or edited tasks
//!
//! A [`TaskDraft`] is what an add/edit form produces. It is validated and normalized into [`TaskFields`] before anything is written,
//! so that the `YYYY-MM-DD` / `HH:MM` encodings can safely be compared as strings afterwards.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime};

use crate::error::TaskError;
use crate::id::TaskId;
use crate::task::{Priority, Task, TaskFields};

/// The due time of a draft that does not set one
pub const DEFAULT_DUE_TIME: &str = "09:00";

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M";
/// Accepted time inputs, tried in this order
const TIME_INPUT_FORMATS: [&str; 3] = ["%H:%M", "%H:%M:%S", "%I:%M %p"];


#[derive(Clone, Debug, Default, PartialEq)]
pub struct TaskDraft {
    /// Set when editing an existing task
    pub id: Option<TaskId>,
    pub title: String,
    /// Defaults to the current date
    pub due_date: Option<String>,
    /// Defaults to [`DEFAULT_DUE_TIME`]
    pub due_time: Option<String>,
    pub priority: Priority,
    pub is_completed: bool,
    pub has_location: bool,
    pub has_weather: bool,
}

impl TaskDraft {
    /// A draft for a brand new task
    pub fn new<S: Into<String>>(title: S) -> Self {
        Self { title: title.into(), ..Self::default() }
    }

    /// A draft to edit `task`, pre-filled with its current values
    pub fn edit(task: &Task) -> Self {
        Self {
            id: Some(task.id().clone()),
            title: task.title().to_string(),
            due_date: Some(task.due_date().to_string()),
            due_time: Some(task.due_time().to_string()),
            priority: task.priority(),
            is_completed: task.completed(),
            has_location: task.has_location(),
            has_weather: task.has_weather(),
        }
    }

    pub fn due(mut self, date: &str, time: &str) -> Self {
        self.due_date = Some(date.to_string());
        self.due_time = Some(time.to_string());
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    /// Validate this draft, and turn it into fields ready to be written.
    ///
    /// `today` (`YYYY-MM-DD`) is used when no due date was given.
    pub fn to_fields(&self, today: &str) -> Result<TaskFields, TaskError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(TaskError::Validation("a task needs a title".to_string()));
        }

        let due_date = match non_blank(&self.due_date) {
            Some(date) => normalize_date(date)?,
            None => normalize_date(today)?,
        };
        let due_time = match non_blank(&self.due_time) {
            Some(time) => normalize_time(time)?,
            None => DEFAULT_DUE_TIME.to_string(),
        };

        Ok(TaskFields {
            title: title.to_string(),
            due_date,
            due_time,
            priority: self.priority,
            is_completed: self.is_completed,
            has_location: self.has_location,
            has_weather: self.has_weather,
        })
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Returns the canonical `YYYY-MM-DD` form of a date.
///
/// Accepts dates with or without zero padding, and RFC 3339 timestamps (whose date part is kept as is)
pub fn normalize_date(input: &str) -> Result<String, TaskError> {
    let input = input.trim();
    let date = match NaiveDate::parse_from_str(input, DATE_FORMAT) {
        Ok(date) => date,
        Err(_) => match DateTime::parse_from_rfc3339(input) {
            Ok(timestamp) => timestamp.naive_local().date(),
            Err(_) => return Err(TaskError::Validation(format!("invalid due date {:?}", input))),
        },
    };
    // Dates are compared as strings, which only works with four-digit years
    if !(0..=9999).contains(&date.year()) {
        return Err(TaskError::Validation(format!("due date {:?} is out of range", input)));
    }
    Ok(date.format(DATE_FORMAT).to_string())
}

/// Returns the canonical `HH:MM` (24-hour) form of a time of day.
///
/// Accepts `H:MM`, `HH:MM:SS` and 12-hour `h:MM AM`/`h:MM PM`. Seconds are dropped
pub fn normalize_time(input: &str) -> Result<String, TaskError> {
    let input = input.trim();
    TIME_INPUT_FORMATS.iter()
        .find_map(|format| NaiveTime::parse_from_str(input, format).ok())
        .map(|time| time.format(TIME_FORMAT).to_string())
        .ok_or_else(|| TaskError::Validation(format!("invalid due time {:?}", input)))
}
