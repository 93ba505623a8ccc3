//! Translated workflow graph: entities, views and invariant checks.

pub mod graph;
pub mod outline;
pub mod types;
pub mod validate;

pub use graph::{BindGraph, Endpoint, ownership_graph};
pub use outline::outline;
pub use types::*;
pub use validate::{ValidationError, validate_graph};
