//! rusty-reviews/crates/rb-core/src/lib.rs
//!
//! The central domain logic and interface definitions for Rusty-Reviews:
//! the review aggregation rules shared with the service, and the client
//! synchronization engine.

pub mod aggregate;
pub mod error;
pub mod models;
pub mod reconciler;
pub mod sync;
pub mod traits;
pub mod validator;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use sync::{PostSynchronizer, Snapshot};
pub use traits::*;
pub use validator::{Rating, RatingError};
