//! Environment selection

use crate::model::{EnvironmentDescriptor, FALLBACK_REGION, InfraConfig};

/// Resolve which environments to build.
///
/// A pull request id takes precedence over the stage table: exactly one
/// preview environment is returned, in the region of the first table entry.
/// Otherwise one environment per table entry, in table order. A missing
/// account id is passed through untouched.
pub fn select_environments(config: &InfraConfig) -> Vec<EnvironmentDescriptor> {
    if let Some(pull_request_id) = &config.pull_request_id {
        let region = config
            .stages
            .first()
            .map(|entry| entry.region.as_str())
            .unwrap_or(FALLBACK_REGION);
        tracing::info!(pull_request_id = %pull_request_id, region, "Selected preview environment");
        return vec![EnvironmentDescriptor::preview(
            pull_request_id.clone(),
            region,
            config.account_id.clone(),
        )];
    }

    config
        .stages
        .iter()
        .map(|entry| {
            EnvironmentDescriptor::for_stage(&entry.stage, &entry.region, config.account_id.clone())
        })
        .collect()
}
