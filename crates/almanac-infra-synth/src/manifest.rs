//! Cloud assembly manifest
//!
//! `manifest.json` indexes the templates of one synthesis run.

use crate::template::TemplateFormat;
use almanac_infra_core::ResourceTopology;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const MANIFEST_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssemblyManifest {
    /// Manifest format version
    pub version: u32,

    pub created_at: DateTime<Utc>,

    /// Stacks in deployment order
    pub stacks: Vec<StackArtifact>,
}

impl Default for AssemblyManifest {
    fn default() -> Self {
        Self {
            version: MANIFEST_VERSION,
            created_at: Utc::now(),
            stacks: Vec::new(),
        }
    }
}

impl AssemblyManifest {
    pub fn new(stacks: Vec<StackArtifact>) -> Self {
        Self {
            stacks,
            ..Default::default()
        }
    }

    pub fn stack(&self, name: &str) -> Option<&StackArtifact> {
        self.stacks.iter().find(|s| s.stack_name == name)
    }

    pub fn total_resources(&self) -> usize {
        self.stacks.iter().map(|s| s.resource_count).sum()
    }

    pub fn total_unresolved(&self) -> usize {
        self.stacks.iter().map(|s| s.unresolved_count).sum()
    }
}

impl fmt::Display for AssemblyManifest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} stack(s), {} resource(s)",
            self.stacks.len(),
            self.total_resources()
        )?;
        let unresolved = self.total_unresolved();
        if unresolved > 0 {
            write!(f, ", {} unresolved reference(s)", unresolved)?;
        }
        Ok(())
    }
}

/// One template in the assembly
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackArtifact {
    pub stack_name: String,

    /// `aws://{account}/{region}`
    pub environment: String,

    /// Path relative to the assembly directory
    pub template_file: String,

    pub resource_count: usize,
    pub grant_count: usize,

    #[serde(default)]
    pub unresolved_count: usize,
}

impl StackArtifact {
    pub fn from_topology(topology: &ResourceTopology, format: TemplateFormat) -> Self {
        Self {
            stack_name: topology.stack_name().to_string(),
            environment: topology.environment().environment_uri(),
            template_file: template_file_name(topology.stack_name(), format),
            resource_count: topology.resources().len(),
            grant_count: topology.access_grants().len(),
            unresolved_count: topology.unresolved_references().len(),
        }
    }
}

/// `<stack>.template.<ext>`
pub fn template_file_name(stack_name: &str, format: TemplateFormat) -> String {
    format!("{}.template.{}", stack_name, format.extension())
}
