//! Top-level assembly of every stack to deploy

use crate::backend::compose_backend;
use crate::error::Result;
use crate::model::{Deployment, EnvironmentDescriptor, InfraConfig, ResourceTopology};
use crate::selector::select_environments;
use crate::website::compose_website;

/// The only stage that gets a website stack
pub const WEBSITE_STAGE: &str = "dev";

/// All stacks of one run, in deployment order
#[derive(Debug, Clone)]
pub struct Assembly {
    environments: Vec<EnvironmentDescriptor>,
    stacks: Vec<ResourceTopology>,
}

impl Assembly {
    pub fn environments(&self) -> &[EnvironmentDescriptor] {
        &self.environments
    }

    pub fn stacks(&self) -> &[ResourceTopology] {
        &self.stacks
    }

    pub fn stack(&self, name: &str) -> Option<&ResourceTopology> {
        self.stacks.iter().find(|s| s.stack_name() == name)
    }

    pub fn stack_names(&self) -> Vec<&str> {
        self.stacks.iter().map(|s| s.stack_name()).collect()
    }

    pub fn is_preview(&self) -> bool {
        self.environments.iter().any(|e| e.deployment().is_preview())
    }

    pub fn into_stacks(self) -> Vec<ResourceTopology> {
        self.stacks
    }
}

/// Whether `env` gets a website stack: only the `dev` stage, never previews.
pub fn includes_website(env: &EnvironmentDescriptor) -> bool {
    match env.deployment() {
        Deployment::Preview { .. } => false,
        Deployment::Production | Deployment::NonProduction => env.stage_name() == WEBSITE_STAGE,
    }
}

/// Build every stack for `config`.
///
/// All or nothing: the first construction error aborts the whole assembly.
pub fn assemble(config: &InfraConfig) -> Result<Assembly> {
    let environments = select_environments(config);
    let mut stacks = Vec::new();

    for env in &environments {
        stacks.push(compose_backend(env, config)?);
        if includes_website(env) {
            stacks.push(compose_website(env, config)?);
        }
    }

    tracing::info!(
        environments = environments.len(),
        stacks = stacks.len(),
        preview = config.pull_request_id.is_some(),
        "Assembled stacks"
    );

    Ok(Assembly {
        environments,
        stacks,
    })
}
