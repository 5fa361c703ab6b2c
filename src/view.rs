//! Local projections over a snapshot of tasks
//!
//! Everything here is pure: dates are plain `YYYY-MM-DD` strings supplied by the caller, never read from the clock.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::task::{Priority, Task};

/// Which tasks a list should display
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    /// Return all tasks
    All,
    /// Return tasks due today
    Today,
    /// Return uncompleted tasks whose due date has passed
    Overdue,
}

impl Default for Filter {
    fn default() -> Self {
        Filter::All
    }
}

impl Filter {
    /// Whether `task` belongs to this filter, `today` being a `YYYY-MM-DD` date
    pub fn accepts(&self, task: &Task, today: &str) -> bool {
        match self {
            Filter::All => true,
            Filter::Today => task.due_date() == today,
            // A completed task is never overdue
            Filter::Overdue => task.due_date() < today && !task.completed(),
        }
    }
}

/// Keep the tasks accepted by `filter`, in their original order
pub fn filter(tasks: &[Task], filter: Filter, today: &str) -> Vec<Task> {
    tasks.iter()
        .filter(|task| filter.accepts(task, today))
        .cloned()
        .collect()
}

/// Order tasks for the calendar view of a single day.
///
/// Uncompleted tasks come first, then tasks are ordered by due time. Ties keep their input order.
pub fn sort_for_date_view(tasks: &[Task]) -> Vec<Task> {
    let mut sorted = tasks.to_vec();
    sorted.sort_by(|a, b| {
        a.completed().cmp(&b.completed())
            .then_with(|| a.due_time().cmp(b.due_time()))
    });
    sorted
}

/// How many tasks each filter would return
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FilterCounts {
    pub all: usize,
    pub today: usize,
    pub overdue: usize,
}

impl FilterCounts {
    pub fn compute(tasks: &[Task], today: &str) -> Self {
        let mut counts = Self { all: tasks.len(), ..Self::default() };
        for task in tasks {
            if Filter::Today.accepts(task, today) {
                counts.today += 1;
            }
            if Filter::Overdue.accepts(task, today) {
                counts.overdue += 1;
            }
        }
        counts
    }

    pub fn get(&self, filter: Filter) -> usize {
        match filter {
            Filter::All => self.all,
            Filter::Today => self.today,
            Filter::Overdue => self.overdue,
        }
    }
}

/// The dates that have at least one task due, for calendar marking.
///
/// Each date is mapped to the priority of the first of its tasks in `tasks`
pub fn marked_dates(tasks: &[Task]) -> BTreeMap<String, Priority> {
    let mut dates = BTreeMap::new();
    for task in tasks {
        if task.due_date().is_empty() {
            continue;
        }
        dates.entry(task.due_date().to_string())
            .or_insert_with(|| task.priority());
    }
    dates
}
