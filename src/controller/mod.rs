//! # Controller
//!
//! Condition logic, reconciliation and the machinery that schedules it.

pub mod backoff;
pub mod condition;
pub mod reconciler;
pub mod server;
