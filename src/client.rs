//! HTTP client for the remote todo service.
//!
//! The binary reads the base URL from `--url` or `TODO_CARD_URL`
//! (default: `http://localhost:3000`).

use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::models::{NewTodo, Todo};

/// Default URL for local development.
pub const DEFAULT_URL: &str = "http://localhost:3000";

/// Environment variable holding the service base URL.
pub const URL_ENV: &str = "TODO_CARD_URL";

/// HTTP client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Server error: {0}")]
    Server(String),
}

/// HTTP client for the todo service.
#[derive(Debug, Clone)]
pub struct TodoClient {
    base_url: String,
    client: Client,
}

impl TodoClient {
    /// Create with explicit base URL. A trailing slash is ignored.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client.request(method, &url)
    }

    /// Handle response, converting HTTP errors to ClientError.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();
        if status.is_success() {
            Ok(response.json().await?)
        } else {
            Err(Self::status_error(status, response).await)
        }
    }

    /// Handle a response whose body is ignored.
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<(), ClientError> {
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Self::status_error(status, response).await)
        }
    }

    async fn status_error(status: StatusCode, response: reqwest::Response) -> ClientError {
        let body = response.text().await.unwrap_or_default();
        match status {
            StatusCode::NOT_FOUND => ClientError::NotFound(body),
            StatusCode::BAD_REQUEST => ClientError::BadRequest(body),
            _ => ClientError::Server(format!("{}: {}", status, body)),
        }
    }

    /// List every todo, in service order.
    pub async fn list(&self) -> Result<Vec<Todo>, ClientError> {
        let response = self.request(Method::GET, "/todos").send().await?;
        self.handle_response(response).await
    }

    /// Create a todo. The service assigns its identifier.
    pub async fn create(&self, input: &NewTodo) -> Result<Todo, ClientError> {
        let response = self
            .request(Method::POST, "/todos")
            .json(input)
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Replace a todo with `todo`, returning the service's copy.
    pub async fn update(&self, todo: &Todo) -> Result<Todo, ClientError> {
        let response = self
            .request(Method::PUT, &format!("/todos/{}", todo.id))
            .json(todo)
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Delete a todo.
    pub async fn delete(&self, id: i64) -> Result<(), ClientError> {
        let response = self
            .request(Method::DELETE, &format!("/todos/{}", id))
            .send()
            .await?;
        self.handle_empty_response(response).await
    }
}
