//! AntAlmanac cloud assembly synthesis
//!
//! Turns assembled [`ResourceTopology`](almanac_infra_core::ResourceTopology)
//! values into CloudFormation-shaped templates and writes them, with a
//! manifest, to an output directory for the provisioning engine to pick up.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                 almanac-infra CLI                │
//! │                  (synth/validate)                │
//! └─────────────────┬───────────────────────────────┘
//!                   │ Assembly
//! ┌─────────────────▼───────────────────────────────┐
//! │               almanac-infra-synth                │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │        trait ProvisioningTarget           │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────┐  ┌──────────────────────┐    │
//! │  │   template   │  │ CloudAssemblyWriter  │    │
//! │  └──────────────┘  └──────────────────────┘    │
//! └─────────────────┬───────────────────────────────┘
//!                   │ cdk.out/
//!           provisioning engine
//! ```

pub mod assembly;
pub mod error;
pub mod manifest;
pub mod resource;
pub mod target;
pub mod template;

// Re-exports
pub use assembly::{AssemblyLock, CloudAssemblyWriter, DEFAULT_OUT_DIR};
pub use error::{Result, SynthError};
pub use manifest::{AssemblyManifest, StackArtifact};
pub use resource::{ResourceConfig, ResourceSet};
pub use target::{ProvisioningTarget, StackResult, SubmitResult};
pub use template::{TemplateFormat, render_stack, render_template};
