//! Stage definitions

use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of the only stage treated as production.
pub const PRODUCTION_STAGE: &str = "prod";

/// Stages materialized when no pull request id is configured.
///
/// `prod` (us-west-1) is prepared but not yet enabled.
pub const DEFAULT_STAGES: &[(&str, &str)] = &[("dev", "us-east-1")];

/// Region used for preview environments when the stage table is empty.
pub const FALLBACK_REGION: &str = "us-east-1";

/// Deployment class of an environment.
///
/// Computed once by the environment selector; every composer matches on this
/// instead of comparing raw stage strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Deployment {
    /// The `prod` stage
    Production,
    /// Every other named stage, including ones nobody planned for
    NonProduction,
    /// Ephemeral environment for a pull request
    Preview { pull_request_id: String },
}

impl Deployment {
    /// Classify a stage name. Only the literal `"prod"` is production.
    pub fn from_stage(stage: &str) -> Self {
        if stage == PRODUCTION_STAGE {
            Deployment::Production
        } else {
            Deployment::NonProduction
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Deployment::Production)
    }

    pub fn is_preview(&self) -> bool {
        matches!(self, Deployment::Preview { .. })
    }
}

impl fmt::Display for Deployment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Deployment::Production => write!(f, "production"),
            Deployment::NonProduction => write!(f, "non-production"),
            Deployment::Preview { pull_request_id } => write!(f, "preview (PR #{})", pull_request_id),
        }
    }
}

/// One row of the stage table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageEntry {
    pub stage: String,
    pub region: String,
}

/// Ordered mapping of stage name to region.
///
/// Order is preserved: environments are produced in table order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTable {
    entries: Vec<StageEntry>,
}

impl StageTable {
    /// An empty table
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, stage: impl Into<String>, region: impl Into<String>) {
        self.entries.push(StageEntry {
            stage: stage.into(),
            region: region.into(),
        });
    }

    pub fn iter(&self) -> impl Iterator<Item = &StageEntry> {
        self.entries.iter()
    }

    pub fn first(&self) -> Option<&StageEntry> {
        self.entries.first()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for StageTable {
    fn default() -> Self {
        DEFAULT_STAGES.iter().copied().collect()
    }
}

impl<S: Into<String>, R: Into<String>> FromIterator<(S, R)> for StageTable {
    fn from_iter<I: IntoIterator<Item = (S, R)>>(iter: I) -> Self {
        let mut table = StageTable::new();
        for (stage, region) in iter {
            table.push(stage, region);
        }
        table
    }
}
