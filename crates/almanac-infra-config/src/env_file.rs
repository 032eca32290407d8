//! `.env` file parsing

use crate::error::{ConfigError, Result};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// Read `KEY=VALUE` pairs from an env file
#[tracing::instrument]
pub fn read_env_file(path: &Path) -> Result<HashMap<String, String>> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::EnvFileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let vars = parse_env_content(&content);
    info!(
        env_file = %path.display(),
        variable_count = vars.len(),
        "Loaded variables from env file"
    );
    Ok(vars)
}

/// Parse env file content.
///
/// Blank lines and `#` comments are skipped, an `export ` prefix is allowed,
/// and one level of matching quotes around the value is removed. Later
/// definitions win.
pub fn parse_env_content(content: &str) -> HashMap<String, String> {
    let mut vars = HashMap::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let line = line.strip_prefix("export ").unwrap_or(line);
        if let Some((key, value)) = line.split_once('=') {
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            let value = strip_quotes(value.trim());
            debug!(key = %key, "Read variable from env file");
            vars.insert(key.to_string(), value.to_string());
        }
    }

    vars
}

fn strip_quotes(s: &str) -> &str {
    if s.len() >= 2
        && ((s.starts_with('"') && s.ends_with('"')) || (s.starts_with('\'') && s.ends_with('\'')))
    {
        &s[1..s.len() - 1]
    } else {
        s
    }
}
