//! Share Driver Module
//!
//! Naming rules, capacity reporting and the request orchestrator, plus
//! the host-facing driver object built on top of them.

pub mod capacity;
pub mod naming;
pub mod orchestrator;
pub mod share_driver;

pub use capacity::{volume_capacity, CapacityReport};
pub use naming::*;
pub use orchestrator::ShareOrchestrator;
pub use share_driver::*;
