//! Route definitions for the mock generation server.

pub mod batch;
pub mod health;
pub mod pipeline;
