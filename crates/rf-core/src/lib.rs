//! rusty-forum/crates/rf-core/src/lib.rs
//!
//! The entity-and-collection engine for rusty-forum: validated `Post`/`Reply`
//! values, their in-memory collections, and the persistence port.

pub mod collections;
pub mod error;
pub mod models;
pub mod traits;

// Re-exporting for easier access in other crates
pub use collections::*;
pub use error::*;
pub use models::*;
pub use traits::*;
