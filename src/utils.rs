//! Some utility functions

use chrono::{Duration, NaiveDate, NaiveTime};

use crate::task::{Priority, Task};

/// Format a `HH:MM` time the 12-hour way (`"09:05"` becomes `"9:05 AM"`).
/// Unparsable input is returned as is
pub fn display_time(time: &str) -> String {
    match NaiveTime::parse_from_str(time, "%H:%M") {
        Ok(t) => t.format("%-I:%M %p").to_string(),
        Err(_) => time.to_string(),
    }
}

/// Describe a `YYYY-MM-DD` date relatively to `today`: "Today", "Yesterday", "Tomorrow", or the date itself (e.g. "Jun 1, 2024")
pub fn display_date(date: &str, today: NaiveDate) -> String {
    let parsed = match NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        Ok(d) => d,
        Err(_) => return date.to_string(),
    };
    match parsed.signed_duration_since(today) {
        d if d == Duration::zero() => "Today".to_string(),
        d if d == Duration::days(-1) => "Yesterday".to_string(),
        d if d == Duration::days(1) => "Tomorrow".to_string(),
        _ => parsed.format("%b %-d, %Y").to_string(),
    }
}

/// A debug utility that pretty-prints a task list
pub fn print_task_list(title: &str, tasks: &[Task]) {
    println!("---- {} ({} tasks)", title, tasks.len());
    for task in tasks {
        print_task(task);
    }
}

pub fn print_task(task: &Task) {
    let completion = if task.completed() { "✓" } else { " " };
    let priority = match task.priority() {
        Priority::High => "!!",
        Priority::Medium => "! ",
        Priority::Low => "  ",
    };
    println!("    {}{} {}\t{} {}\t{}", completion, priority, task.title(), task.due_date(), task.due_time(), task.id());
}
