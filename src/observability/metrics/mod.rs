//! # Metrics Module
//!
//! Prometheus metrics for monitoring the controller, organized by responsibility.
//!
//! ## Sub-modules
//!
//! - `registry` - Metrics registry setup, registration and text exposition
//! - `controller_metrics` - Reconciliations, errors, requeues and watch errors
//! - `condition_metrics` - Condition transitions, status writes and configuration parsing

pub mod condition_metrics;
pub mod controller_metrics;
pub mod registry;

pub use condition_metrics::*;
pub use controller_metrics::*;
pub use registry::*;
