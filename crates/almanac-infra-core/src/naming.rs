//! Physical name and domain derivation
//!
//! Every bucket name, DNS name and record label goes through here so that a
//! resource's production and non-production identities never collide.

use crate::model::{Deployment, EnvironmentDescriptor, PRODUCTION_STAGE};

/// Label prepended to names outside production
pub const NON_PRODUCTION_LABEL: &str = "dev";

/// Hosted zone every public name lives under
pub const ZONE_NAME: &str = "antalmanac.com";

/// Map a logical name to its physical name for `stage`.
///
/// `"prod"` keeps the name as is; any other stage, recognized or not, gets the
/// `dev.` prefix.
pub fn derive_name(logical_name: &str, stage: &str) -> String {
    if stage == PRODUCTION_STAGE {
        logical_name.to_string()
    } else {
        format!("{}.{}", NON_PRODUCTION_LABEL, logical_name)
    }
}

/// Physical name of `logical_name` in `env`.
///
/// Previews additionally scope the first label by pull request
/// (`api.antalmanac.com` -> `dev.api-pr-42.antalmanac.com`) so they never
/// claim the names of the shared `dev` stage.
pub fn physical_name(logical_name: &str, env: &EnvironmentDescriptor) -> String {
    match env.deployment() {
        Deployment::Production | Deployment::NonProduction => {
            derive_name(logical_name, env.stage_name())
        }
        Deployment::Preview { pull_request_id } => {
            let scoped = scope_to_pull_request(logical_name, pull_request_id);
            derive_name(&scoped, env.stage_name())
        }
    }
}

/// Record name relative to [`ZONE_NAME`]; the apex is returned unchanged.
pub fn relative_record_name(fqdn: &str) -> String {
    fqdn.strip_suffix(ZONE_NAME)
        .and_then(|label| label.strip_suffix('.'))
        .filter(|label| !label.is_empty())
        .unwrap_or(fqdn)
        .to_string()
}

fn scope_to_pull_request(logical_name: &str, pull_request_id: &str) -> String {
    if logical_name == ZONE_NAME {
        return format!("pr-{}.{}", pull_request_id, ZONE_NAME);
    }
    match logical_name.split_once('.') {
        Some((first, rest)) => format!("{}-pr-{}.{}", first, pull_request_id, rest),
        None => format!("{}-pr-{}", logical_name, pull_request_id),
    }
}
