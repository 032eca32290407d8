//! Immutable process configuration
//!
//! Built once at the entry point (see `almanac-infra-config`) and handed to
//! every composer by reference. Nothing below the entry point reads the
//! process environment.

use super::stage::{Deployment, StageTable};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the website distribution domain and DNS record are derived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebsiteDomainPolicy {
    /// Domain and record stay on the `dev.` label whatever the stage; only the
    /// bucket name follows the stage. Matches what is deployed today.
    #[default]
    Pinned,
    /// Domain and record follow the naming rule like the bucket does.
    StageDerived,
}

impl FromStr for WebsiteDomainPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pinned" => Ok(WebsiteDomainPolicy::Pinned),
            "stage" | "stage-derived" => Ok(WebsiteDomainPolicy::StageDerived),
            other => Err(format!(
                "unknown website domain policy '{}' (expected 'pinned' or 'stage')",
                other
            )),
        }
    }
}

impl fmt::Display for WebsiteDomainPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebsiteDomainPolicy::Pinned => write!(f, "pinned"),
            WebsiteDomainPolicy::StageDerived => write!(f, "stage"),
        }
    }
}

/// Secret values injected into the API function environment
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Secrets {
    pub mongodb_uri_prod: Option<String>,
    pub mongodb_uri_dev: Option<String>,
    pub google_client: Option<String>,
    pub google_secret: Option<String>,
    pub session_secret: Option<String>,
}

impl Secrets {
    /// Data source for a deployment. Previews share the non-production database.
    pub fn mongodb_uri_for(&self, deployment: &Deployment) -> Option<&str> {
        match deployment {
            Deployment::Production => self.mongodb_uri_prod.as_deref(),
            Deployment::NonProduction | Deployment::Preview { .. } => {
                self.mongodb_uri_dev.as_deref()
            }
        }
    }
}

// Values never reach logs.
impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn state(v: &Option<String>) -> &'static str {
            if v.is_some() { "<set>" } else { "<unset>" }
        }
        f.debug_struct("Secrets")
            .field("mongodb_uri_prod", &state(&self.mongodb_uri_prod))
            .field("mongodb_uri_dev", &state(&self.mongodb_uri_dev))
            .field("google_client", &state(&self.google_client))
            .field("google_secret", &state(&self.google_secret))
            .field("session_secret", &state(&self.session_secret))
            .finish()
    }
}

/// Everything the assembler needs, resolved up front
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InfraConfig {
    /// Target AWS account (`ACCOUNT_ID`)
    pub account_id: Option<String>,
    /// Pull request id; when set only a preview environment is built
    pub pull_request_id: Option<String>,
    /// Stage to region table
    pub stages: StageTable,
    pub secrets: Secrets,
    /// Route 53 hosted zone id for `antalmanac.com` (`HOSTED_ZONE_ID`)
    pub hosted_zone_id: Option<String>,
    /// ACM certificate used by the API and the distribution (`CERTIFICATE_ARN`)
    pub certificate_arn: Option<String>,
    pub website_domain: WebsiteDomainPolicy,
}

impl InfraConfig {
    /// Same configuration, forced into preview mode for `pull_request_id`
    pub fn with_pull_request(mut self, pull_request_id: impl Into<String>) -> Self {
        self.pull_request_id = Some(pull_request_id.into());
        self
    }
}
