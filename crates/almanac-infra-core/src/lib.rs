//! AntAlmanac infrastructure topology
//!
//! Builds, per deployment stage, the graph of cloud resources the AntAlmanac
//! API and website run on. Nothing here talks to a cloud provider: the output
//! is a validated, immutable [`ResourceTopology`] per stack that an external
//! provisioning engine reconciles against live state.
//!
//! # Architecture
//!
//! ```text
//! InfraConfig ──► select_environments ──► EnvironmentDescriptor (per stage / preview)
//!                                              │
//!                          ┌───────────────────┴───────────────────┐
//!                          ▼                                       ▼
//!                   compose_backend                         compose_website (dev only)
//!        store ◄─grant─ function ◄─route─ api ◄─route─ record     bucket ◄─route─ distribution ◄─route─ record
//!                          │                                       │
//!                          └──────────────► assemble ◄─────────────┘
//! ```
//!
//! Names are derived in one place ([`naming`]) so that `prod` and every other
//! stage resolve to distinct physical identities.

pub mod assembler;
pub mod backend;
pub mod error;
pub mod model;
pub mod naming;
pub mod selector;
pub mod website;

// Re-exports
pub use assembler::{Assembly, assemble, includes_website};
pub use backend::compose_backend;
pub use error::{Result, TopologyError};
pub use model::*;
pub use naming::{derive_name, physical_name};
pub use selector::select_environments;
pub use website::compose_website;
