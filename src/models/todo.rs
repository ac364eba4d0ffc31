use serde::{Deserialize, Serialize};

/// A single todo card.
///
/// The identifier is either handed out by a local counter or assigned by the
/// remote todo service, depending on how the owning manager was built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: i64,
    pub topic: String,
    pub name: String,
    /// Image shown on the card.
    pub url: String,
    /// Free text, may be empty or span several lines.
    #[serde(default)]
    pub detail: String,
    #[serde(default)]
    pub done: bool,
}

impl Todo {
    /// Attach an identifier to a new record.
    pub fn from_new(id: i64, input: NewTodo) -> Self {
        Self {
            id,
            topic: input.topic,
            name: input.name,
            url: input.url,
            detail: input.detail,
            done: input.done,
        }
    }

    /// Copy of this record with the done flag flipped.
    pub fn toggled(&self) -> Self {
        Self {
            done: !self.done,
            ..self.clone()
        }
    }
}

/// Input for creating a todo. Sent as the body of `POST /todos`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTodo {
    pub topic: String,
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub detail: String,
    #[serde(default)]
    pub done: bool,
}

impl NewTodo {
    pub fn new(
        topic: impl Into<String>,
        name: impl Into<String>,
        url: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            topic: topic.into(),
            name: name.into(),
            url: url.into(),
            detail: detail.into(),
            done: false,
        }
    }
}
