//! Todo list manager.
//!
//! Owns the card list, the form draft and the expanded-state side table, and
//! applies every mutation. A manager is built for one of two identity
//! policies:
//!
//! - [`TodoManager::local`]: records live only in memory and identifiers come
//!   from a counter starting at 0 that is never rewound.
//! - [`TodoManager::remote`]: every mutation is a single round-trip to the todo
//!   service and identifiers are whatever the service assigns.
//!
//! The manager is cheap to clone; clones share state. The state lock is never
//! held across a request, so several requests can be in flight at once.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::client::{ClientError, TodoClient};
use crate::form::Draft;
use crate::models::{NewTodo, Todo};
use crate::presentation::CardView;

/// How records receive their identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityPolicy {
    /// Manager-owned counter.
    LocalCounter,
    /// Assigned by the todo service on create.
    Service,
}

#[derive(Debug, Clone)]
enum Backend {
    Local,
    Remote(TodoClient),
}

#[derive(Debug, Default)]
struct ListState {
    todos: Vec<Todo>,
    draft: Draft,
    /// Absent means collapsed. Entries outlive their records.
    expanded: HashMap<i64, bool>,
    next_id: i64,
    next_seq: u64,
    /// Sequence number of the most recent toggle issued per record.
    latest_seq: HashMap<i64, u64>,
}

impl ListState {
    fn position(&self, id: i64) -> Option<usize> {
        self.todos.iter().position(|t| t.id == id)
    }

    fn issue(&mut self, id: i64) -> u64 {
        self.next_seq += 1;
        self.latest_seq.insert(id, self.next_seq);
        self.next_seq
    }

    /// Whether `seq` is still the latest mutation issued for `id`. The entry
    /// is cleared when it is, so the table only holds records with requests in
    /// flight.
    fn settle(&mut self, id: i64, seq: u64) -> bool {
        if self.latest_seq.get(&id) == Some(&seq) {
            self.latest_seq.remove(&id);
            true
        } else {
            false
        }
    }

    /// Append, or replace in place if the id is already listed.
    fn upsert(&mut self, todo: Todo) {
        match self.position(todo.id) {
            Some(index) => self.todos[index] = todo,
            None => self.todos.push(todo),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TodoManager {
    backend: Backend,
    state: Arc<Mutex<ListState>>,
}

impl TodoManager {
    /// In-memory manager with a local identifier counter.
    pub fn local() -> Self {
        Self::with_backend(Backend::Local)
    }

    /// Manager synced against the todo service behind `client`.
    pub fn remote(client: TodoClient) -> Self {
        Self::with_backend(Backend::Remote(client))
    }

    fn with_backend(backend: Backend) -> Self {
        Self {
            backend,
            state: Arc::new(Mutex::new(ListState::default())),
        }
    }

    pub fn identity_policy(&self) -> IdentityPolicy {
        match self.backend {
            Backend::Local => IdentityPolicy::LocalCounter,
            Backend::Remote(_) => IdentityPolicy::Service,
        }
    }

    fn lock(&self) -> MutexGuard<'_, ListState> {
        self.state.lock().expect("manager lock poisoned")
    }

    // ============================================================
    // Reads
    // ============================================================

    /// Snapshot of the list in display order.
    pub fn todos(&self) -> Vec<Todo> {
        self.lock().todos.clone()
    }

    pub fn get(&self, id: i64) -> Option<Todo> {
        self.lock().todos.iter().find(|t| t.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().todos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().todos.is_empty()
    }

    /// Card views for the whole list.
    pub fn cards(&self) -> Vec<CardView> {
        let state = self.lock();
        state
            .todos
            .iter()
            .map(|todo| {
                let expanded = state.expanded.get(&todo.id).copied().unwrap_or(false);
                CardView::derive(todo, expanded)
            })
            .collect()
    }

    // ============================================================
    // Draft
    // ============================================================

    pub fn draft(&self) -> Draft {
        self.lock().draft.clone()
    }

    /// Edit the draft in place.
    pub fn with_draft<R>(&self, f: impl FnOnce(&mut Draft) -> R) -> R {
        f(&mut self.lock().draft)
    }

    pub fn reset_draft(&self) {
        self.lock().draft.reset();
    }

    // ============================================================
    // Expanded state
    // ============================================================

    pub fn is_expanded(&self, id: i64) -> bool {
        self.lock().expanded.get(&id).copied().unwrap_or(false)
    }

    /// Flip the expanded flag for `id`, returning the new value.
    pub fn toggle_expanded(&self, id: i64) -> bool {
        let mut state = self.lock();
        let flag = state.expanded.entry(id).or_insert(false);
        *flag = !*flag;
        *flag
    }

    // ============================================================
    // Record lifecycle
    // ============================================================

    /// Replace the list with the service's copy. Does nothing for a local
    /// manager.
    pub async fn load(&self) -> Result<(), ClientError> {
        let Backend::Remote(client) = &self.backend else {
            return Ok(());
        };

        let todos = client.list().await.map_err(|e| {
            tracing::warn!("Failed to load todos: {}", e);
            e
        })?;
        tracing::debug!("Loaded {} todos", todos.len());
        self.lock().todos = todos;
        Ok(())
    }

    /// Submit the current draft.
    ///
    /// Returns `Ok(None)` without touching anything when the draft may not be
    /// submitted. On success the draft is reset.
    pub async fn submit(&self) -> Result<Option<Todo>, ClientError> {
        let input = {
            let state = self.lock();
            if !state.draft.can_submit() {
                tracing::debug!("Submission blocked by draft validation");
                return Ok(None);
            }
            state.draft.to_new_todo()
        };

        let todo = self.create(input).await?;
        self.lock().draft.reset();
        Ok(Some(todo))
    }

    /// Create a record from `input` and append it to the list.
    ///
    /// The input is not validated here; callers gate on [`Draft::can_submit`].
    pub async fn create(&self, input: NewTodo) -> Result<Todo, ClientError> {
        let todo = match &self.backend {
            Backend::Local => {
                let mut state = self.lock();
                let id = state.next_id;
                state.next_id += 1;
                let todo = Todo::from_new(id, NewTodo { done: false, ..input });
                state.todos.push(todo.clone());
                todo
            }
            Backend::Remote(client) => {
                let todo = client
                    .create(&NewTodo { done: false, ..input })
                    .await
                    .map_err(|e| {
                        tracing::warn!("Failed to create todo: {}", e);
                        e
                    })?;
                self.lock().upsert(todo.clone());
                todo
            }
        };

        tracing::debug!("Created todo {}", todo.id);
        Ok(todo)
    }

    /// Flip the done flag of `id`.
    ///
    /// Returns the record as stored afterwards, or `None` when `id` is not
    /// listed. For a remote manager `None` is also returned when a newer
    /// toggle of the same record was issued while this one was in flight;
    /// that completion is discarded.
    pub async fn toggle_done(&self, id: i64) -> Result<Option<Todo>, ClientError> {
        match &self.backend {
            Backend::Local => {
                let mut state = self.lock();
                let Some(index) = state.position(id) else {
                    return Ok(None);
                };
                state.todos[index].done = !state.todos[index].done;
                tracing::debug!("Toggled todo {} to done={}", id, state.todos[index].done);
                Ok(Some(state.todos[index].clone()))
            }
            Backend::Remote(client) => {
                let (flipped, seq) = {
                    let mut state = self.lock();
                    let Some(index) = state.position(id) else {
                        return Ok(None);
                    };
                    let flipped = state.todos[index].toggled();
                    (flipped, state.issue(id))
                };

                let mut updated = match client.update(&flipped).await {
                    Ok(updated) => updated,
                    Err(e) => {
                        tracing::warn!("Failed to update todo {}: {}", id, e);
                        self.lock().settle(id, seq);
                        return Err(e);
                    }
                };
                // The record keeps the id it was requested under.
                updated.id = id;

                let mut state = self.lock();
                if !state.settle(id, seq) {
                    tracing::warn!("Discarding stale update for todo {}", id);
                    return Ok(None);
                }
                let Some(index) = state.position(id) else {
                    return Ok(None);
                };
                state.todos[index] = updated.clone();
                tracing::debug!("Toggled todo {} to done={}", id, updated.done);
                Ok(Some(updated))
            }
        }
    }

    /// Remove `id` from the list. Returns whether a record was removed.
    ///
    /// A remote record the service no longer knows about is removed locally
    /// as well.
    pub async fn delete(&self, id: i64) -> Result<bool, ClientError> {
        if let Backend::Remote(client) = &self.backend {
            if self.lock().position(id).is_none() {
                return Ok(false);
            }

            match client.delete(id).await {
                Ok(()) => {}
                Err(ClientError::NotFound(_)) => {
                    tracing::debug!("Todo {} was already gone from the service", id);
                }
                Err(e) => {
                    tracing::warn!("Failed to delete todo {}: {}", id, e);
                    return Err(e);
                }
            }
        }

        let mut state = self.lock();
        let Some(index) = state.position(id) else {
            return Ok(false);
        };
        state.todos.remove(index);
        state.latest_seq.remove(&id);
        tracing::debug!("Deleted todo {}", id);
        Ok(true)
    }
}
