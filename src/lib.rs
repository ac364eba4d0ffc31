//! Todo cards built from a validated entry form.
//!
//! [`manager::TodoManager`] owns the card list and the form draft. It runs
//! either purely in memory or synced against a remote todo service through
//! [`client::TodoClient`].

pub mod client;
pub mod form;
pub mod manager;
pub mod models;
pub mod presentation;
pub mod shell;
