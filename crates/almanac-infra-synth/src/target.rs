//! Provisioning target trait definition

use crate::error::Result;
use almanac_infra_core::Assembly;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Somewhere an assembly can be handed off to.
///
/// The provisioning engine that reconciles stacks against live cloud state
/// sits behind this seam; this crate only ships the on-disk assembly writer.
#[async_trait]
pub trait ProvisioningTarget: Send + Sync {
    /// Target name (e.g. "cloud-assembly")
    fn name(&self) -> &str;

    /// Hand every stack of `assembly` to the target
    async fn submit(&self, assembly: &Assembly) -> Result<SubmitResult>;
}

/// Result of a submission. A target either takes every stack or returns an
/// error, so there is no partial outcome to report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmitResult {
    pub succeeded: Vec<StackResult>,

    /// Total execution time in milliseconds
    pub duration_ms: u64,
}

impl SubmitResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_success(&mut self, stack_name: impl Into<String>, message: impl Into<String>) {
        self.succeeded.push(StackResult {
            stack_name: stack_name.into(),
            message: message.into(),
        });
    }
}

/// Outcome for one stack
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackResult {
    pub stack_name: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_result() {
        let mut result = SubmitResult::new();
        assert!(result.succeeded.is_empty());

        result.add_success("dev-us-east-1-Backend", "dev-us-east-1-Backend.template.json");
        assert_eq!(result.succeeded[0].stack_name, "dev-us-east-1-Backend");
        assert_eq!(result.succeeded[0].message, "dev-us-east-1-Backend.template.json");
    }
}
