//! Data model
//!
//! Configuration, deployment targets, declared resources and the topology
//! graph that wires them together.

mod config;
mod environment;
mod resource;
mod stage;
mod topology;

// Re-exports
pub use config::*;
pub use environment::*;
pub use resource::*;
pub use stage::*;
pub use topology::*;
