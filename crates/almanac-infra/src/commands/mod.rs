pub mod list;
pub mod synth;
pub mod validate;

use almanac_infra_core::InfraConfig;
use std::path::Path;

/// Load configuration from `root`; `--pr` overrides `PULL_REQUEST_ID`.
pub fn load_config(root: &Path, pull_request: Option<String>) -> anyhow::Result<InfraConfig> {
    let config = almanac_infra_config::load(root)?;
    Ok(match pull_request {
        Some(id) => config.with_pull_request(id),
        None => config,
    })
}
