//! Client-side orchestration for the SpriteForge generation pipeline.
//!
//! Everything the control panel needs to drive long-running generation
//! jobs: an HTTP [`api::JobClient`], the [`ledger::TaskLedger`] of
//! client-visible operations, the [`notify::Notifier`] toast queue, a
//! generic poll-until-terminal [`poller`], and the [`session::Session`]
//! context that owns all of them (and their timers) explicitly.

pub mod api;
pub mod ledger;
pub mod notify;
pub mod poller;
pub mod session;
