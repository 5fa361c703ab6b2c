use std::sync::{Arc, Mutex};
use std::time::Duration;

use task_sync::memory::MemoryStore;
use task_sync::mock_behaviour::MockBehaviour;
use task_sync::traits::{IdentityProvider, TaskStore};
use task_sync::view::Filter;
use task_sync::{Priority, Settings, SubscriptionState, TaskDraft, TaskError, TaskId, TaskViewModel, UserId};

const TODAY: &str = "2024-06-02";

/// Two tasks for "alice" and one for "bob". Alice's tasks are listed oldest first
const SEED: &str = r#"[
    {"id": "1", "userId": "alice", "title": "Pay the rent", "dueDate": "2024-06-01", "dueTime": "10:00",
     "priority": "high", "isCompleted": false, "createdAt": "2024-05-01T08:00:00Z"},
    {"id": "2", "userId": "alice", "title": "Team meeting", "dueDate": "2024-06-02", "dueTime": "15:30",
     "priority": "medium", "isCompleted": false, "createdAt": "2024-05-02T08:00:00Z"},
    {"id": "3", "userId": "bob", "title": "Bob's task", "dueDate": "2024-06-02", "dueTime": "09:00",
     "priority": "low", "isCompleted": false, "createdAt": "2024-05-03T08:00:00Z"}
]"#;

fn seeded_store() -> MemoryStore {
    MemoryStore::from_json(SEED.as_bytes()).unwrap()
}

fn alice() -> Option<UserId> {
    Some(UserId::new("alice"))
}

fn ids<I: IdentityProvider>(model: &TaskViewModel<MemoryStore, I>) -> Vec<String> {
    model.tasks().iter().map(|t| t.id().to_string()).collect()
}

async fn subscribed(store: MemoryStore) -> TaskViewModel<MemoryStore, Option<UserId>> {
    let mut model = TaskViewModel::new(Arc::new(store), alice(), Settings::default());
    model.subscribe().await.unwrap();
    assert!(model.is_loading());
    model.next_update().await.unwrap().unwrap();
    assert!(!model.is_loading());
    model
}

/// A session that can be signed in and out while a view model uses it
#[derive(Clone, Default)]
struct Session(Arc<Mutex<Option<UserId>>>);

impl Session {
    fn sign_in(&self, user: &str) {
        *self.0.lock().unwrap() = Some(UserId::new(user));
    }

    fn sign_out(&self) {
        *self.0.lock().unwrap() = None;
    }
}

impl IdentityProvider for Session {
    fn current_user(&self) -> Option<UserId> {
        self.0.lock().unwrap().clone()
    }
}

#[tokio::test]
async fn test_no_identity_no_query() {
    let _ = env_logger::builder().is_test(true).try_init();

    let store = Arc::new(seeded_store());
    let mut model = TaskViewModel::new(store.clone(), None::<UserId>, Settings::default());
    assert!(matches!(model.subscribe().await, Err(TaskError::Unauthenticated)));
    assert_eq!(store.listener_count(), 0);
    assert_eq!(model.subscription_state(), SubscriptionState::Unsubscribed);
    assert!(model.next_update().await.is_none());

    let draft = TaskDraft::new("Orphan");
    assert!(matches!(model.save(&draft, TODAY).await, Err(TaskError::Unauthenticated)));
    assert_eq!(store.write_calls(), 0);
}

#[tokio::test]
async fn test_initial_snapshot_is_scoped_and_sorted() {
    let _ = env_logger::builder().is_test(true).try_init();

    let model = subscribed(seeded_store()).await;
    assert_eq!(model.subscription_state(), SubscriptionState::Active);
    // Newest first, and nothing from bob
    assert_eq!(ids(&model), vec!["2", "1"]);
}

#[tokio::test]
async fn test_toggle_is_not_optimistic() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut model = subscribed(seeded_store()).await;
    let id = TaskId::from("1");

    assert_eq!(model.toggle_complete(&id).await.unwrap(), true);
    // Still the previous snapshot
    assert!(!model.find(&id).unwrap().completed());

    model.next_update().await.unwrap().unwrap();
    assert!(model.find(&id).unwrap().completed());
}

#[tokio::test]
async fn test_toggle_twice_restores_the_task() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut model = subscribed(seeded_store()).await;
    let id = TaskId::from("2");
    let original = model.find(&id).unwrap().completed();

    model.toggle_complete(&id).await.unwrap();
    model.next_update().await.unwrap().unwrap();
    assert_ne!(model.find(&id).unwrap().completed(), original);

    model.toggle_complete(&id).await.unwrap();
    model.next_update().await.unwrap().unwrap();
    assert_eq!(model.find(&id).unwrap().completed(), original);
}

#[tokio::test]
async fn test_unknown_tasks_are_not_written() {
    let _ = env_logger::builder().is_test(true).try_init();

    let model = subscribed(seeded_store()).await;
    let missing = TaskId::from("missing-id");
    assert!(model.delete(&missing).await.unwrap_err().is_not_found());
    assert!(model.toggle_complete(&missing).await.unwrap_err().is_not_found());

    // Bob's task exists in the store, but not in Alice's view
    let bobs = TaskId::from("3");
    assert!(model.delete(&bobs).await.unwrap_err().is_not_found());

    let mut draft = TaskDraft::new("Edited");
    draft.id = Some(bobs);
    assert!(model.save(&draft, TODAY).await.unwrap_err().is_not_found());

    assert_eq!(model.store().write_calls(), 0);
    assert_eq!(model.store().tasks().len(), 3);
}

#[tokio::test]
async fn test_delete() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut model = subscribed(seeded_store()).await;
    model.delete(&TaskId::from("2")).await.unwrap();
    assert_eq!(ids(&model), vec!["2", "1"]);

    model.next_update().await.unwrap().unwrap();
    assert_eq!(ids(&model), vec!["1"]);
}

#[tokio::test]
async fn test_rejected_writes() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut store = seeded_store();
    let behaviour = Arc::new(Mutex::new(MockBehaviour {
        set_completed_behaviour: (0, 1),
        delete_behaviour: (0, 1),
        ..MockBehaviour::default()
    }));
    store.set_mock_behaviour(Some(behaviour));
    let mut model = subscribed(store).await;
    let id = TaskId::from("1");

    assert!(matches!(model.toggle_complete(&id).await, Err(TaskError::RemoteWriteFailed(_))));
    assert!(matches!(model.delete(&id).await, Err(TaskError::RemoteWriteFailed(_))));
    assert!(!model.find(&id).unwrap().completed());
    assert_eq!(model.store().tasks().len(), 3);

    // The mocked failures are used up, the next attempt goes through
    model.toggle_complete(&id).await.unwrap();
    model.next_update().await.unwrap().unwrap();
    assert!(model.find(&id).unwrap().completed());
}

#[tokio::test(start_paused = true)]
async fn test_write_timeout() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut store = seeded_store();
    store.set_write_delay(Some(Duration::from_secs(5)));
    let settings = Settings { write_timeout_ms: 100, ..Settings::default() };
    let mut model = TaskViewModel::new(Arc::new(store), alice(), settings);
    model.subscribe().await.unwrap();
    model.next_update().await.unwrap().unwrap();

    let result = model.toggle_complete(&TaskId::from("1")).await;
    assert!(matches!(result, Err(TaskError::RemoteWriteFailed(_))));
    assert!(!model.find(&TaskId::from("1")).unwrap().completed());
}

#[tokio::test]
async fn test_create_and_edit() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut model = subscribed(seeded_store()).await;

    let blank = TaskDraft::new("   ");
    assert!(matches!(model.save(&blank, TODAY).await, Err(TaskError::Validation(_))));
    assert_eq!(model.store().write_calls(), 0);

    let draft = TaskDraft::new(" Buy milk ").due("2024-6-3", "7:05 PM").with_priority(Priority::Low);
    let id = model.save(&draft, TODAY).await.unwrap();
    model.next_update().await.unwrap().unwrap();

    let created = model.find(&id).unwrap().clone();
    assert_eq!(created.title(), "Buy milk");
    assert_eq!(created.due_date(), "2024-06-03");
    assert_eq!(created.due_time(), "19:05");
    assert_eq!(created.user_id(), &UserId::new("alice"));
    assert!(created.created_at().is_some());
    // The newest task comes first
    assert_eq!(model.tasks()[0].id(), &id);

    let mut edit = TaskDraft::edit(&created);
    edit.title = "Buy oat milk".to_string();
    edit.has_location = true;
    assert_eq!(model.save(&edit, TODAY).await.unwrap(), id);
    model.next_update().await.unwrap().unwrap();

    let edited = model.find(&id).unwrap();
    assert_eq!(edited.title(), "Buy oat milk");
    assert!(edited.has_location());
    assert_eq!(edited.due_time(), "19:05");
}

#[tokio::test]
async fn test_client_side_ids() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut model = subscribed(MemoryStore::with_client_ids()).await;
    assert!(model.tasks().is_empty());

    let id = model.save(&TaskDraft::new("Client id"), TODAY).await.unwrap();
    model.next_update().await.unwrap().unwrap();
    assert_eq!(model.tasks().len(), 1);
    assert_eq!(model.tasks()[0].id(), &id);
    assert_eq!(model.tasks()[0].due_date(), TODAY);
    assert_eq!(model.tasks()[0].due_time(), "09:00");
}

#[tokio::test]
async fn test_views() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut model = subscribed(seeded_store()).await;
    for (title, date, time) in &[("Stretch", TODAY, "07:00"), ("Read", TODAY, "21:00")] {
        model.save(&TaskDraft::new(*title).due(date, time), TODAY).await.unwrap();
        model.next_update().await.unwrap().unwrap();
    }

    assert_eq!(model.filter(), Filter::All);
    assert_eq!(model.visible_tasks(TODAY).len(), 4);

    model.set_filter(Filter::Overdue);
    let overdue = model.visible_tasks(TODAY);
    assert_eq!(overdue.len(), 1);
    assert_eq!(overdue[0].title(), "Pay the rent");

    model.set_filter(Filter::Today);
    assert_eq!(model.visible_tasks(TODAY).len(), 3);

    let counts = model.counts(TODAY);
    assert_eq!((counts.all, counts.today, counts.overdue), (4, 3, 1));

    let day: Vec<String> = model.day_view(TODAY).iter().map(|t| t.title().to_string()).collect();
    assert_eq!(day, vec!["Stretch", "Team meeting", "Read"]);

    let marks = model.marked_dates();
    assert_eq!(marks.len(), 2);
    assert_eq!(marks.get("2024-06-01"), Some(&Priority::High));
}

#[tokio::test]
async fn test_snapshot_replaces_the_view_at_once() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut model = subscribed(seeded_store()).await;
    for (title, time) in &[("Early", "08:00"), ("Late", "18:00")] {
        model.save(&TaskDraft::new(*title).due(TODAY, time), TODAY).await.unwrap();
        model.next_update().await.unwrap().unwrap();
    }
    let titles = |model: &TaskViewModel<MemoryStore, Option<UserId>>| -> Vec<String> {
        model.day_view(TODAY).iter().map(|t| t.title().to_string()).collect()
    };
    let snapshot_a = titles(&model);
    assert_eq!(snapshot_a, vec!["Early", "Team meeting", "Late"]);

    // Someone else (e.g. another device) completes a task
    let early = model.tasks().iter().find(|t| t.title() == "Early").unwrap().id().clone();
    model.store().set_completed(&early, true).await.unwrap();
    // Nothing moves until the snapshot is consumed
    assert_eq!(titles(&model), snapshot_a);

    model.next_update().await.unwrap().unwrap();
    assert_eq!(titles(&model), vec!["Team meeting", "Late", "Early"]);
}

#[tokio::test]
async fn test_sign_out_ends_the_session() {
    let _ = env_logger::builder().is_test(true).try_init();

    let store = Arc::new(seeded_store());
    let session = Session::default();
    session.sign_in("alice");
    let mut model = TaskViewModel::new(store.clone(), session.clone(), Settings::default());
    model.subscribe().await.unwrap();
    model.next_update().await.unwrap().unwrap();
    assert_eq!(model.tasks().len(), 2);

    session.sign_out();
    let id = TaskId::from("1");
    assert!(matches!(model.toggle_complete(&id).await, Err(TaskError::Unauthenticated)));
    assert!(matches!(model.delete(&id).await, Err(TaskError::Unauthenticated)));
    let mut edit = TaskDraft::edit(model.find(&id).unwrap());
    edit.title = "Hijacked".to_string();
    assert!(matches!(model.save(&edit, TODAY).await, Err(TaskError::Unauthenticated)));
    assert_eq!(store.write_calls(), 0);

    // Nothing of the previous session survives a refused subscription
    assert!(matches!(model.subscribe().await, Err(TaskError::Unauthenticated)));
    assert_eq!(model.subscription_state(), SubscriptionState::Unsubscribed);
    assert_eq!(store.listener_count(), 0);
    assert!(model.tasks().is_empty());
    assert!(!model.is_loading());
    assert!(model.next_update().await.is_none());
    assert_eq!(store.tasks().len(), 3);
}

#[tokio::test]
async fn test_switching_users_requires_a_new_subscription() {
    let _ = env_logger::builder().is_test(true).try_init();

    let store = Arc::new(seeded_store());
    let session = Session::default();
    session.sign_in("alice");
    let mut model = TaskViewModel::new(store.clone(), session.clone(), Settings::default());
    model.subscribe().await.unwrap();
    model.next_update().await.unwrap().unwrap();

    // Alice's tasks are still on display, bob cannot touch them
    session.sign_in("bob");
    assert!(matches!(model.toggle_complete(&TaskId::from("1")).await, Err(TaskError::Unauthenticated)));
    assert!(matches!(model.save(&TaskDraft::new("Bob's new task"), TODAY).await, Err(TaskError::Unauthenticated)));
    assert_eq!(store.write_calls(), 0);

    model.subscribe().await.unwrap();
    model.next_update().await.unwrap().unwrap();
    assert_eq!(ids(&model), vec!["3"]);
    model.toggle_complete(&TaskId::from("3")).await.unwrap();
    assert_eq!(store.write_calls(), 1);
}

#[tokio::test]
async fn test_unsubscribing_stops_loading() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut model = TaskViewModel::new(Arc::new(seeded_store()), alice(), Settings::default());
    model.subscribe().await.unwrap();
    assert!(model.is_loading());

    model.unsubscribe();
    assert_eq!(model.subscription_state(), SubscriptionState::Unsubscribed);
    assert!(!model.is_loading());
}
