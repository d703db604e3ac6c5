//! Lifecycle events for in-flight async tasks.
//!
//! Events are fire-and-forget: publishing with no subscribers succeeds.

pub mod publisher;

pub use publisher::{EventPublisher, PublishError, PublishedEvent};
