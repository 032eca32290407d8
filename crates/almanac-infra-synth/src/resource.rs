//! Flat, engine-facing view of a stack

use crate::error::Result;
use almanac_infra_core::{ResourceTopology, ResourceType};
use serde::{Deserialize, Serialize};

/// Provider name stamped on every resource
pub const PROVIDER: &str = "aws";

/// Resources of one stack in creation order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceSet {
    pub resources: Vec<ResourceConfig>,
}

impl ResourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flatten a topology, dependencies first
    pub fn from_topology(topology: &ResourceTopology) -> Result<Self> {
        let mut set = Self::new();
        for id in topology.creation_order() {
            let Some(resource) = topology.resource(id) else {
                continue;
            };
            let mut config = ResourceConfig::new(
                resource.kind.resource_type().as_str(),
                id.as_str(),
                PROVIDER,
                serde_json::to_value(&resource.kind)?,
            );
            config.depends_on = topology
                .dependencies_of(id)
                .into_iter()
                .map(|dep| dep.to_string())
                .collect();
            set.resources.push(config);
        }
        Ok(set)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceConfig> {
        self.resources.iter()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn by_type(&self, resource_type: &str) -> Vec<&ResourceConfig> {
        self.resources
            .iter()
            .filter(|r| r.resource_type == resource_type)
            .collect()
    }

    /// `(type, count)` for every type present, in [`ResourceType`] order
    pub fn type_counts(&self) -> Vec<(&'static str, usize)> {
        ResourceType::ALL
            .iter()
            .map(|t| (t.as_str(), self.by_type(t.as_str()).len()))
            .filter(|(_, count)| *count > 0)
            .collect()
    }
}

/// One resource as handed to the provisioning engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceConfig {
    /// Resource type (e.g. "session-store", "distribution")
    pub resource_type: String,

    /// Logical id within the stack
    pub id: String,

    /// Provider name
    pub provider: String,

    /// Resource-specific settings
    pub config: serde_json::Value,

    /// Logical ids that must exist first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
}

impl ResourceConfig {
    pub fn new(
        resource_type: impl Into<String>,
        id: impl Into<String>,
        provider: impl Into<String>,
        config: serde_json::Value,
    ) -> Self {
        Self {
            resource_type: resource_type.into(),
            id: id.into(),
            provider: provider.into(),
            config,
            depends_on: Vec::new(),
        }
    }
}
