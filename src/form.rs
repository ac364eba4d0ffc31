//! Form draft and image URL validation.
//!
//! The draft holds the four text fields of the entry form. Only the URL is
//! checked for format, and only when it changes; the other fields are checked
//! for non-emptiness when deciding whether the form may be submitted.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::NewTodo;

static IMAGE_EXTENSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\.(jpeg|jpg|png)$").expect("valid image extension pattern"));

static HTTP_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^https?://[^\s/$.?#][^\s]*$").expect("valid http link pattern")
});

const URL_HELP: &str = "Enter an image URL";
const URL_ERROR_HELP: &str = "Please enter a valid image URL (.jpeg, .png) or link";

/// Returns true if `value` ends with an image extension or looks like an
/// http(s) link.
pub fn is_valid_image_url(value: &str) -> bool {
    IMAGE_EXTENSION.is_match(value) || HTTP_LINK.is_match(value)
}

/// Unsaved form values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    topic: String,
    name: String,
    url: String,
    detail: String,
    url_error: bool,
}

impl Draft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }

    /// Whether the URL failed validation on its last change.
    pub fn url_error(&self) -> bool {
        self.url_error
    }

    pub fn set_topic(&mut self, value: impl Into<String>) {
        self.topic = value.into();
    }

    pub fn set_name(&mut self, value: impl Into<String>) {
        self.name = value.into();
    }

    pub fn set_detail(&mut self, value: impl Into<String>) {
        self.detail = value.into();
    }

    /// Store the URL and re-run validation.
    pub fn set_url(&mut self, value: impl Into<String>) {
        self.url = value.into();
        self.url_error = !is_valid_image_url(&self.url);
    }

    /// Topic, name and url must be non-blank and the url must have validated.
    pub fn can_submit(&self) -> bool {
        !self.topic.trim().is_empty()
            && !self.name.trim().is_empty()
            && !self.url.trim().is_empty()
            && !self.url_error
    }

    /// Clear every field and the error flag.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Helper line shown under the URL field.
    pub fn url_helper_text(&self) -> &'static str {
        if self.url_error {
            URL_ERROR_HELP
        } else {
            URL_HELP
        }
    }

    /// Snapshot of the fields as entered, ready to be created.
    pub fn to_new_todo(&self) -> NewTodo {
        NewTodo::new(
            self.topic.clone(),
            self.name.clone(),
            self.url.clone(),
            self.detail.clone(),
        )
    }
}
