//! Shared domain model for the SpriteForge control plane.
//!
//! Pure types and predicates used by both the client orchestration layer
//! and the mock generation server: tasks, notifications, batches, and the
//! pipeline stage model. No I/O lives here.

pub mod batch;
pub mod error;
pub mod notification;
pub mod stage;
pub mod task;
