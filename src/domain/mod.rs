//! Domain types and ports
//!
//! Types exchanged with the host framework and the transport boundary
//! the appliance client talks through.

pub mod ports;

pub use ports::*;
