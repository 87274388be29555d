//! # Runtime Module
//!
//! Runtime components of the controller: initialization, the watch loop, the
//! in-memory loop used by tests, and error handling.

pub mod error_policy;
pub mod initialization;
pub mod in_memory;
pub mod watch_loop;

pub use error_policy::*;
pub use initialization::*;
pub use in_memory::*;
pub use watch_loop::*;
