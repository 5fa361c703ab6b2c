//! Drives a task list over an in-memory store, and prints every snapshot
use std::error::Error;
use std::sync::Arc;

use task_sync::memory::MemoryStore;
use task_sync::utils::print_task_list;
use task_sync::view::Filter;
use task_sync::{Priority, Settings, TaskDraft, TaskViewModel, UserId};

const TODAY: &str = "2024-06-02";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let store = Arc::new(MemoryStore::new());
    let mut model = TaskViewModel::new(store, Some(UserId::new("demo-user")), Settings::default());
    model.subscribe().await?;
    if let Some(update) = model.next_update().await {
        update?;
    }
    print_task_list("initial", model.tasks());

    let drafts = vec![
        TaskDraft::new("Pay the rent").due("2024-06-01", "10:00").with_priority(Priority::High),
        TaskDraft::new("Team meeting").due(TODAY, "3:30 PM"),
        TaskDraft::new("Water the plants").due(TODAY, "8:00").with_priority(Priority::Low),
    ];
    for draft in &drafts {
        model.save(draft, TODAY).await?;
        if let Some(update) = model.next_update().await {
            update?;
        }
    }
    print_task_list("after creation", model.tasks());

    let first = model.tasks()[0].id().clone();
    model.toggle_complete(&first).await?;
    if let Some(update) = model.next_update().await {
        update?;
    }
    print_task_list(&format!("day view of {}", TODAY), &model.day_view(TODAY));

    model.set_filter(Filter::Overdue);
    print_task_list("overdue", &model.visible_tasks(TODAY));
    println!("{:?}", model.counts(TODAY));

    model.unsubscribe();
    Ok(())
}
