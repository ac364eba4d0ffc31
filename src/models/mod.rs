//! Domain models for todo cards.
//!
//! - [`Todo`]: a created card, carrying its identifier.
//! - [`NewTodo`]: the card fields before an identifier exists, also the wire
//!   shape of a create request.

mod todo;

pub use todo::*;
