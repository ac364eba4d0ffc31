//! Remote variant tests against an in-process fake todo service.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use todo_card::client::{ClientError, TodoClient};
use todo_card::form::Draft;
use todo_card::manager::{IdentityPolicy, TodoManager};
use todo_card::models::*;

// ============================================================
// Fake Todo Service
// ============================================================

/// Stores todos in memory. Trims topics on write so tests can observe the
/// client adopting the service's representation.
#[derive(Default)]
struct FakeService {
    todos: Vec<Todo>,
    next_id: i64,
    failing: bool,
    put_calls: usize,
    delete_calls: usize,
    first_put_delay: Option<Duration>,
    /// Added to the id echoed back by updates.
    echo_id_offset: i64,
}

type Shared = Arc<Mutex<FakeService>>;

impl FakeService {
    fn new() -> Self {
        Self {
            next_id: 100,
            ..Self::default()
        }
    }

    fn seeded(todos: Vec<Todo>) -> Self {
        Self {
            todos,
            ..Self::new()
        }
    }
}

async fn list(State(svc): State<Shared>) -> Result<Json<Vec<Todo>>, StatusCode> {
    let svc = svc.lock().unwrap();
    if svc.failing {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    Ok(Json(svc.todos.clone()))
}

async fn create(
    State(svc): State<Shared>,
    Json(input): Json<NewTodo>,
) -> Result<(StatusCode, Json<Todo>), StatusCode> {
    let mut svc = svc.lock().unwrap();
    if svc.failing {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    let id = svc.next_id;
    svc.next_id += 1;
    let mut todo = Todo::from_new(id, input);
    todo.topic = todo.topic.trim().to_string();
    svc.todos.push(todo.clone());
    Ok((StatusCode::CREATED, Json(todo)))
}

async fn update(
    State(svc): State<Shared>,
    Path(id): Path<i64>,
    Json(mut todo): Json<Todo>,
) -> Result<Json<Todo>, StatusCode> {
    let delay = {
        let mut svc = svc.lock().unwrap();
        if svc.failing {
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
        svc.put_calls += 1;
        if svc.put_calls == 1 {
            svc.first_put_delay
        } else {
            None
        }
    };
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    let mut svc = svc.lock().unwrap();
    todo.id = id;
    todo.topic = todo.topic.trim().to_string();
    let offset = svc.echo_id_offset;
    let slot = svc
        .todos
        .iter_mut()
        .find(|t| t.id == id)
        .ok_or(StatusCode::NOT_FOUND)?;
    *slot = todo.clone();
    todo.id += offset;
    Ok(Json(todo))
}

async fn remove(State(svc): State<Shared>, Path(id): Path<i64>) -> StatusCode {
    let mut svc = svc.lock().unwrap();
    if svc.failing {
        return StatusCode::INTERNAL_SERVER_ERROR;
    }
    svc.delete_calls += 1;
    let before = svc.todos.len();
    svc.todos.retain(|t| t.id != id);
    if svc.todos.len() < before {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn spawn(service: FakeService) -> (TodoClient, Shared) {
    let shared = Arc::new(Mutex::new(service));
    let app = Router::new()
        .route("/todos", get(list).post(create))
        .route("/todos/{id}", put(update).delete(remove))
        .with_state(shared.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind fake service");
    let addr = listener.local_addr().expect("Failed to read address");
    tokio::spawn(async move {
        axum::serve(listener, app)
            .await
            .expect("Fake service stopped");
    });

    (TodoClient::new(format!("http://{}/", addr)), shared)
}

async fn setup(service: FakeService) -> (TodoManager, Shared) {
    let (client, shared) = spawn(service).await;
    let manager = TodoManager::remote(client);
    manager.load().await.expect("Failed to load");
    (manager, shared)
}

fn todo(id: i64, topic: &str) -> Todo {
    Todo {
        id,
        topic: topic.to_string(),
        name: "Alice".to_string(),
        url: "photo.png".to_string(),
        detail: String::new(),
        done: false,
    }
}

// ============================================================
// Client
// ============================================================

mod client {
    use super::*;

    #[tokio::test]
    async fn strips_trailing_slash_from_base_url() {
        let client = TodoClient::new("http://localhost:3000/");
        assert_eq!(client.base_url(), "http://localhost:3000");
    }

    #[tokio::test]
    async fn maps_missing_record_to_not_found() {
        let (client, _) = spawn(FakeService::new()).await;

        let result = client.update(&todo(7, "Missing")).await;
        assert!(matches!(result, Err(ClientError::NotFound(_))));
    }

    #[tokio::test]
    async fn maps_server_failures() {
        let (client, shared) = spawn(FakeService::new()).await;
        shared.lock().unwrap().failing = true;

        match client.list().await {
            Err(ClientError::Server(message)) => assert!(message.starts_with("500")),
            other => panic!("expected server error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn reports_unreachable_service() {
        let client = TodoClient::new("http://127.0.0.1:1");
        assert!(matches!(client.list().await, Err(ClientError::Http(_))));
    }
}

// ============================================================
// Load
// ============================================================

mod load {
    use super::*;

    #[tokio::test]
    async fn replaces_the_list_in_service_order() {
        let (manager, _) =
            setup(FakeService::seeded(vec![todo(5, "B"), todo(2, "A")])).await;

        assert_eq!(manager.identity_policy(), IdentityPolicy::Service);
        let ids: Vec<i64> = manager.todos().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![5, 2]);
    }

    #[tokio::test]
    async fn failure_keeps_the_current_list() {
        let (manager, shared) = setup(FakeService::seeded(vec![todo(1, "A")])).await;
        shared.lock().unwrap().failing = true;

        assert!(manager.load().await.is_err());
        assert_eq!(manager.len(), 1);
    }
}

// ============================================================
// Create
// ============================================================

mod create {
    use super::*;

    #[tokio::test]
    async fn submit_appends_the_service_record_and_clears_the_draft() {
        let (manager, shared) = setup(FakeService::seeded(vec![todo(1, "Existing")])).await;
        manager.with_draft(|d| {
            d.set_topic("Trip");
            d.set_name("Alice");
            d.set_url("photo.png");
            d.set_detail("Fun");
        });

        let created = manager
            .submit()
            .await
            .expect("Submit failed")
            .expect("Submission was blocked");

        assert_eq!(created.id, 100);
        assert_eq!(created.detail, "Fun");
        assert!(!created.done);
        assert_eq!(manager.todos().last(), Some(&created));
        assert_eq!(manager.draft(), Draft::default());
        assert_eq!(shared.lock().unwrap().todos.len(), 2);
    }

    #[tokio::test]
    async fn adopts_the_service_representation() {
        let (manager, _) = setup(FakeService::new()).await;

        let created = manager
            .create(NewTodo::new("  Trip  ", "Alice", "photo.png", ""))
            .await
            .expect("Create failed");

        assert_eq!(created.topic, "Trip");
        assert_eq!(manager.get(100).expect("Record missing").topic, "Trip");
    }

    #[tokio::test]
    async fn blocked_submission_sends_nothing() {
        let (manager, shared) = setup(FakeService::new()).await;
        manager.with_draft(|d| {
            d.set_topic("Trip");
            d.set_name("Alice");
            d.set_url("notaurl");
        });

        assert!(manager.submit().await.expect("Submit failed").is_none());
        assert!(shared.lock().unwrap().todos.is_empty());
        assert!(manager.draft().url_error());
    }

    #[tokio::test]
    async fn failure_leaves_list_and_draft_untouched() {
        let (manager, shared) = setup(FakeService::new()).await;
        shared.lock().unwrap().failing = true;
        manager.with_draft(|d| {
            d.set_topic("Trip");
            d.set_name("Alice");
            d.set_url("photo.png");
        });

        assert!(manager.submit().await.is_err());
        assert!(manager.is_empty());
        assert_eq!(manager.draft().topic(), "Trip");
    }
}

// ============================================================
// Toggle
// ============================================================

mod toggle {
    use super::*;

    #[tokio::test]
    async fn sends_the_flipped_record_and_updates_only_it() {
        let (manager, shared) =
            setup(FakeService::seeded(vec![todo(1, "First"), todo(2, "Second")])).await;

        let updated = manager
            .toggle_done(2)
            .await
            .expect("Toggle failed")
            .expect("Record not found");

        assert!(updated.done);
        assert_eq!(manager.todos(), vec![todo(1, "First"), Todo { done: true, ..todo(2, "Second") }]);
        assert!(shared.lock().unwrap().todos[1].done);
    }

    #[tokio::test]
    async fn adopts_divergent_service_fields() {
        let (manager, _) = setup(FakeService::seeded(vec![todo(1, " padded ")])).await;

        manager.toggle_done(1).await.expect("Toggle failed");

        assert_eq!(manager.get(1).expect("Record missing").topic, "padded");
    }

    #[tokio::test]
    async fn unknown_id_sends_nothing() {
        let (manager, shared) = setup(FakeService::seeded(vec![todo(1, "A")])).await;

        assert!(manager.toggle_done(9).await.expect("Toggle failed").is_none());
        assert_eq!(shared.lock().unwrap().put_calls, 0);
    }

    #[tokio::test]
    async fn failure_keeps_the_local_record() {
        let (manager, shared) = setup(FakeService::seeded(vec![todo(1, "A")])).await;
        shared.lock().unwrap().failing = true;

        assert!(matches!(
            manager.toggle_done(1).await,
            Err(ClientError::Server(_))
        ));
        assert!(!manager.get(1).expect("Record missing").done);
    }

    #[tokio::test]
    async fn keeps_the_requested_id_when_the_service_echoes_another() {
        let mut service = FakeService::seeded(vec![todo(1, "A"), todo(2, "B")]);
        service.echo_id_offset = 1;
        let (manager, _) = setup(service).await;

        let updated = manager
            .toggle_done(1)
            .await
            .expect("Toggle failed")
            .expect("Record not found");

        assert_eq!(updated.id, 1);
        let ids: Vec<i64> = manager.todos().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert!(manager.get(1).expect("Record missing").done);
        assert!(!manager.get(2).expect("Record missing").done);
    }

    #[tokio::test]
    async fn applies_when_a_concurrent_delete_fails() {
        let mut service = FakeService::seeded(vec![todo(1, "A")]);
        service.first_put_delay = Some(Duration::from_millis(300));
        let (manager, shared) = setup(service).await;

        let (toggled, deleted) = tokio::join!(manager.toggle_done(1), async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            shared.lock().unwrap().failing = true;
            manager.delete(1).await
        });

        assert!(deleted.is_err());
        let toggled = toggled
            .expect("Toggle failed")
            .expect("Toggle was discarded");
        assert!(toggled.done);
        assert!(manager.get(1).expect("Record missing").done);
    }

    #[tokio::test]
    async fn discards_a_completion_overtaken_by_a_newer_toggle() {
        let mut service = FakeService::seeded(vec![todo(1, "A")]);
        service.first_put_delay = Some(Duration::from_millis(300));
        let (manager, shared) = setup(service).await;

        let (first, second) = tokio::join!(manager.toggle_done(1), async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            manager.toggle_done(1).await
        });

        assert!(first.expect("First toggle failed").is_none());
        assert!(second.expect("Second toggle failed").is_some());
        assert!(manager.get(1).expect("Record missing").done);
        assert_eq!(shared.lock().unwrap().put_calls, 2);
    }
}

// ============================================================
// Delete
// ============================================================

mod delete {
    use super::*;

    #[tokio::test]
    async fn removes_the_record_remotely_and_locally() {
        let (manager, shared) =
            setup(FakeService::seeded(vec![todo(1, "A"), todo(2, "B"), todo(3, "C")])).await;

        assert!(manager.delete(2).await.expect("Delete failed"));

        let ids: Vec<i64> = manager.todos().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(shared.lock().unwrap().todos.len(), 2);
    }

    #[tokio::test]
    async fn repeated_delete_is_a_local_no_op() {
        let (manager, shared) = setup(FakeService::seeded(vec![todo(1, "A")])).await;

        assert!(manager.delete(1).await.expect("Delete failed"));
        assert!(!manager.delete(1).await.expect("Delete failed"));
        assert_eq!(shared.lock().unwrap().delete_calls, 1);
    }

    #[tokio::test]
    async fn double_delete_removes_once_without_error() {
        let (manager, shared) = setup(FakeService::seeded(vec![todo(1, "A")])).await;

        let (first, second) = tokio::join!(manager.delete(1), manager.delete(1));

        let removed = [
            first.expect("First delete failed"),
            second.expect("Second delete failed"),
        ];
        assert_eq!(removed.iter().filter(|r| **r).count(), 1);
        assert!(manager.is_empty());
        assert_eq!(shared.lock().unwrap().delete_calls, 2);
    }

    #[tokio::test]
    async fn record_already_gone_from_the_service_is_removed_locally() {
        let (manager, shared) = setup(FakeService::seeded(vec![todo(1, "A"), todo(2, "B")])).await;
        shared.lock().unwrap().todos.retain(|t| t.id != 1);

        assert!(manager.delete(1).await.expect("Delete failed"));

        let ids: Vec<i64> = manager.todos().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![2]);
    }

    #[tokio::test]
    async fn failure_keeps_the_record() {
        let (manager, shared) = setup(FakeService::seeded(vec![todo(1, "A")])).await;
        shared.lock().unwrap().failing = true;

        assert!(manager.delete(1).await.is_err());
        assert_eq!(manager.len(), 1);
    }
}
