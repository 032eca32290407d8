//! Deployment target descriptors

use super::stage::Deployment;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder account shown in environment URIs when `ACCOUNT_ID` is unset.
pub const UNKNOWN_ACCOUNT: &str = "unknown-account";

/// Stack kinds materialized per environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StackComponent {
    Backend,
    Website,
}

impl fmt::Display for StackComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StackComponent::Backend => write!(f, "Backend"),
            StackComponent::Website => write!(f, "Website"),
        }
    }
}

/// One deployment target.
///
/// Immutable after construction. A missing account id is carried as `None`
/// and left for the provisioning engine to reject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentDescriptor {
    stage_name: String,
    region: String,
    account_id: Option<String>,
    deployment: Deployment,
}

impl EnvironmentDescriptor {
    /// Descriptor for a named stage from the stage table
    pub fn for_stage(
        stage_name: impl Into<String>,
        region: impl Into<String>,
        account_id: Option<String>,
    ) -> Self {
        let stage_name = stage_name.into();
        let deployment = Deployment::from_stage(&stage_name);
        Self {
            stage_name,
            region: region.into(),
            account_id,
            deployment,
        }
    }

    /// Descriptor for a pull request preview; its stage name is `pr-{id}`
    pub fn preview(
        pull_request_id: impl Into<String>,
        region: impl Into<String>,
        account_id: Option<String>,
    ) -> Self {
        let pull_request_id = pull_request_id.into();
        Self {
            stage_name: format!("pr-{}", pull_request_id),
            region: region.into(),
            account_id,
            deployment: Deployment::Preview { pull_request_id },
        }
    }

    pub fn stage_name(&self) -> &str {
        &self.stage_name
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn account_id(&self) -> Option<&str> {
        self.account_id.as_deref()
    }

    pub fn pull_request_id(&self) -> Option<&str> {
        match &self.deployment {
            Deployment::Preview { pull_request_id } => Some(pull_request_id),
            _ => None,
        }
    }

    pub fn deployment(&self) -> &Deployment {
        &self.deployment
    }

    /// Stack name, e.g. `dev-us-east-1-Backend`
    pub fn stack_name(&self, component: StackComponent) -> String {
        format!("{}-{}-{}", self.stage_name, self.region, component)
    }

    /// `aws://{account}/{region}`
    pub fn environment_uri(&self) -> String {
        format!(
            "aws://{}/{}",
            self.account_id.as_deref().unwrap_or(UNKNOWN_ACCOUNT),
            self.region
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_descriptor() {
        let env = EnvironmentDescriptor::for_stage("dev", "us-east-1", Some("123".to_string()));
        assert_eq!(env.stage_name(), "dev");
        assert_eq!(env.region(), "us-east-1");
        assert_eq!(env.account_id(), Some("123"));
        assert_eq!(env.pull_request_id(), None);
        assert_eq!(env.deployment(), &Deployment::NonProduction);
        assert_eq!(env.stack_name(StackComponent::Backend), "dev-us-east-1-Backend");
        assert_eq!(env.environment_uri(), "aws://123/us-east-1");
    }

    #[test]
    fn test_preview_descriptor() {
        let env = EnvironmentDescriptor::preview("42", "us-east-1", None);
        assert_eq!(env.stage_name(), "pr-42");
        assert_eq!(env.pull_request_id(), Some("42"));
        assert!(env.deployment().is_preview());
        assert_eq!(env.stack_name(StackComponent::Backend), "pr-42-us-east-1-Backend");
        assert_eq!(env.environment_uri(), "aws://unknown-account/us-east-1");
    }
}
