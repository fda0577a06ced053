//! # rf-api
//!
//! Session-scoped orchestration between a presentation layer and the core.
//! Handlers take primitive inputs and return entities or a `ForumError`;
//! no UI types cross this boundary.

pub mod handlers;

pub use handlers::AppState;
