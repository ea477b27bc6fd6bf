//! Table-style queries over store collections.
//!
//! A [`QueryBuilder`] records a [`QueryIntent`]; [`execute`] resolves it
//! against a [`Store`](crate::Store) and returns a [`Response`].

mod builder;
mod engine;
mod intent;
mod response;

pub use builder::QueryBuilder;
pub use engine::execute;
pub use intent::{Operation, QueryIntent, SortSpec};
pub use response::{Payload, Response};
