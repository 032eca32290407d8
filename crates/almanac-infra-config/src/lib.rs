//! Configuration loading
//!
//! Resolves the process environment (plus an optional `.env` file) into an
//! immutable [`InfraConfig`]. This is the only place that reads environment
//! variables; missing values stay `None` and are left for the provisioning
//! engine to reject.

pub mod env_file;
pub mod error;

pub use env_file::{parse_env_content, read_env_file};
pub use error::*;

use almanac_infra_core::{InfraConfig, Secrets, StageTable, WebsiteDomainPolicy};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Environment variable names
pub mod keys {
    pub const ACCOUNT_ID: &str = "ACCOUNT_ID";
    pub const PULL_REQUEST_ID: &str = "PULL_REQUEST_ID";
    pub const MONGODB_URI_PROD: &str = "MONGODB_URI_PROD";
    pub const MONGODB_URI_DEV: &str = "MONGODB_URI_DEV";
    pub const GOOGLE_CLIENT: &str = "GOOGLE_CLIENT";
    pub const GOOGLE_SECRET: &str = "GOOGLE_SECRET";
    pub const SESSION_SECRET: &str = "SESSION_SECRET";
    pub const HOSTED_ZONE_ID: &str = "HOSTED_ZONE_ID";
    pub const CERTIFICATE_ARN: &str = "CERTIFICATE_ARN";
    pub const WEBSITE_DOMAIN: &str = "ALMANAC_WEBSITE_DOMAIN";

    /// Every variable that feeds [`super::InfraConfig`]
    pub const ALL: &[&str] = &[
        ACCOUNT_ID,
        PULL_REQUEST_ID,
        MONGODB_URI_PROD,
        MONGODB_URI_DEV,
        GOOGLE_CLIENT,
        GOOGLE_SECRET,
        SESSION_SECRET,
        HOSTED_ZONE_ID,
        CERTIFICATE_ARN,
        WEBSITE_DOMAIN,
    ];
}

/// Points directly at an env file, bypassing discovery
pub const ENV_FILE_OVERRIDE: &str = "ALMANAC_ENV_FILE";

/// Project-local settings directory
pub const PROJECT_DIR: &str = ".almanac-infra";

/// Global settings directory (`~/.config/almanac-infra`), if the platform has one
pub fn get_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("almanac-infra"))
}

/// Locate the env file to load.
///
/// Search order:
/// 1. `ALMANAC_ENV_FILE` (direct path)
/// 2. `<root>/.env`
/// 3. `<root>/.almanac-infra/.env`
/// 4. `~/.config/almanac-infra/.env`
pub fn find_env_file(root: &Path) -> Option<PathBuf> {
    if let Ok(path) = std::env::var(ENV_FILE_OVERRIDE) {
        let path = PathBuf::from(path);
        if path.is_file() {
            return Some(path);
        }
        tracing::warn!(path = %path.display(), "{} points at a missing file, ignoring", ENV_FILE_OVERRIDE);
    }

    let candidates = [root.join(".env"), root.join(PROJECT_DIR).join(".env")];
    if let Some(found) = candidates.into_iter().find(|p| p.is_file()) {
        return Some(found);
    }

    get_config_dir()
        .map(|dir| dir.join(".env"))
        .filter(|p| p.is_file())
}

/// Build the configuration from a variable map. Empty values count as unset.
pub fn from_vars(vars: &HashMap<String, String>) -> Result<InfraConfig> {
    let get = |key: &str| {
        vars.get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    let website_domain = match get(keys::WEBSITE_DOMAIN) {
        Some(raw) => raw.parse::<WebsiteDomainPolicy>().map_err(|message| {
            ConfigError::InvalidValue {
                key: keys::WEBSITE_DOMAIN.to_string(),
                message,
            }
        })?,
        None => WebsiteDomainPolicy::default(),
    };

    Ok(InfraConfig {
        account_id: get(keys::ACCOUNT_ID),
        pull_request_id: get(keys::PULL_REQUEST_ID),
        stages: StageTable::default(),
        secrets: Secrets {
            mongodb_uri_prod: get(keys::MONGODB_URI_PROD),
            mongodb_uri_dev: get(keys::MONGODB_URI_DEV),
            google_client: get(keys::GOOGLE_CLIENT),
            google_secret: get(keys::GOOGLE_SECRET),
            session_secret: get(keys::SESSION_SECRET),
        },
        hosted_zone_id: get(keys::HOSTED_ZONE_ID),
        certificate_arn: get(keys::CERTIFICATE_ARN),
        website_domain,
    })
}

/// Collect configuration variables: env file first, process environment on top.
/// An empty process variable counts as unset and does not mask the file.
pub fn collect_vars(root: &Path) -> Result<HashMap<String, String>> {
    let mut vars = match find_env_file(root) {
        Some(path) => read_env_file(&path)?,
        None => {
            tracing::debug!(root = %root.display(), "No env file found");
            HashMap::new()
        }
    };

    for key in keys::ALL {
        match std::env::var(key) {
            Ok(value) if !value.trim().is_empty() => {
                vars.insert(key.to_string(), value);
            }
            _ => {}
        }
    }

    Ok(vars)
}

/// Load the configuration for a project rooted at `root`
pub fn load(root: &Path) -> Result<InfraConfig> {
    let vars = collect_vars(root)?;
    let config = from_vars(&vars)?;

    let missing: Vec<&str> = keys::ALL
        .iter()
        .copied()
        .filter(|k| *k != keys::PULL_REQUEST_ID && *k != keys::WEBSITE_DOMAIN)
        .filter(|k| !vars.get(*k).is_some_and(|v| !v.trim().is_empty()))
        .collect();
    if !missing.is_empty() {
        tracing::warn!(missing = ?missing, "Configuration incomplete; the provisioning engine will reject unresolved references");
    }

    tracing::debug!(?config, "Loaded configuration");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    /// Run `f` with every configuration variable unset and the global config
    /// directory pointed at an empty temporary home
    fn with_clean_env<R>(overrides: &[(&str, &str)], f: impl FnOnce() -> R) -> R {
        let home = tempfile::tempdir().unwrap();
        let home_str = home.path().to_string_lossy().to_string();
        let config_home = home.path().join(".config").to_string_lossy().to_string();

        let mut kvs: Vec<(&str, Option<&str>)> = keys::ALL.iter().map(|k| (*k, None)).collect();
        kvs.push((ENV_FILE_OVERRIDE, None));
        kvs.push(("HOME", Some(home_str.as_str())));
        kvs.push(("XDG_CONFIG_HOME", Some(config_home.as_str())));
        for &(key, value) in overrides {
            kvs.retain(|(k, _)| *k != key);
            kvs.push((key, Some(value)));
        }
        temp_env::with_vars(kvs, f)
    }

    #[test]
    fn test_from_vars_full() {
        let config = from_vars(&vars(&[
            ("ACCOUNT_ID", "123"),
            ("MONGODB_URI_PROD", "mongodb://prod"),
            ("MONGODB_URI_DEV", "mongodb://dev"),
            ("GOOGLE_CLIENT", "client"),
            ("GOOGLE_SECRET", "secret"),
            ("SESSION_SECRET", "session"),
            ("HOSTED_ZONE_ID", "Z1"),
            ("CERTIFICATE_ARN", "arn:aws:acm:us-east-1:123:certificate/abc"),
            ("ALMANAC_WEBSITE_DOMAIN", "stage"),
        ]))
        .unwrap();

        assert_eq!(config.account_id.as_deref(), Some("123"));
        assert_eq!(config.pull_request_id, None);
        assert_eq!(config.secrets.mongodb_uri_prod.as_deref(), Some("mongodb://prod"));
        assert_eq!(config.secrets.session_secret.as_deref(), Some("session"));
        assert_eq!(config.hosted_zone_id.as_deref(), Some("Z1"));
        assert_eq!(config.website_domain, WebsiteDomainPolicy::StageDerived);
        assert_eq!(config.stages, StageTable::default());
    }

    #[test]
    fn test_from_vars_empty_is_unset() {
        let config = from_vars(&vars(&[("ACCOUNT_ID", ""), ("PULL_REQUEST_ID", "  ")])).unwrap();
        assert_eq!(config.account_id, None);
        assert_eq!(config.pull_request_id, None);
        assert_eq!(config.website_domain, WebsiteDomainPolicy::Pinned);
    }

    #[test]
    fn test_from_vars_pull_request() {
        let config = from_vars(&vars(&[("PULL_REQUEST_ID", "42")])).unwrap();
        assert_eq!(config.pull_request_id.as_deref(), Some("42"));
    }

    #[test]
    fn test_from_vars_invalid_website_domain() {
        let err = from_vars(&vars(&[("ALMANAC_WEBSITE_DOMAIN", "both")])).unwrap_err();
        match err {
            ConfigError::InvalidValue { key, .. } => assert_eq!(key, "ALMANAC_WEBSITE_DOMAIN"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    #[serial]
    fn test_find_env_file_in_root() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join(".env"), "ACCOUNT_ID=1").unwrap();

        let found = with_clean_env(&[], || find_env_file(temp_dir.path()));
        assert_eq!(found, Some(temp_dir.path().join(".env")));
    }

    #[test]
    #[serial]
    fn test_root_env_file_beats_project_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::create_dir(temp_dir.path().join(PROJECT_DIR)).unwrap();
        fs::write(temp_dir.path().join(".env"), "ACCOUNT_ID=1").unwrap();
        fs::write(temp_dir.path().join(PROJECT_DIR).join(".env"), "ACCOUNT_ID=2").unwrap();

        let found = with_clean_env(&[], || find_env_file(temp_dir.path())).unwrap();
        assert!(found.ends_with(".env"));
        assert!(!found.to_string_lossy().contains(PROJECT_DIR));
    }

    #[test]
    #[serial]
    fn test_find_env_file_in_project_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::create_dir(temp_dir.path().join(PROJECT_DIR)).unwrap();
        fs::write(temp_dir.path().join(PROJECT_DIR).join(".env"), "ACCOUNT_ID=2").unwrap();

        let found = with_clean_env(&[], || find_env_file(temp_dir.path())).unwrap();
        assert!(found.ends_with(".almanac-infra/.env"));
    }

    #[test]
    #[serial]
    fn test_find_env_file_override() {
        let temp_dir = tempfile::tempdir().unwrap();
        let custom = temp_dir.path().join("custom.env");
        fs::write(&custom, "ACCOUNT_ID=3").unwrap();
        fs::write(temp_dir.path().join(".env"), "ACCOUNT_ID=1").unwrap();

        let custom_str = custom.to_string_lossy().to_string();
        let found = with_clean_env(&[(ENV_FILE_OVERRIDE, custom_str.as_str())], || {
            find_env_file(temp_dir.path())
        });
        assert_eq!(found, Some(custom));
    }

    #[test]
    #[serial]
    fn test_load_process_env_wins_over_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(
            temp_dir.path().join(".env"),
            "ACCOUNT_ID=from-file\nHOSTED_ZONE_ID=Z-file\n",
        )
        .unwrap();

        let config = with_clean_env(&[("ACCOUNT_ID", "from-process")], || {
            load(temp_dir.path())
        })
        .unwrap();
        assert_eq!(config.account_id.as_deref(), Some("from-process"));
        assert_eq!(config.hosted_zone_id.as_deref(), Some("Z-file"));
    }

    #[test]
    #[serial]
    fn test_empty_process_var_does_not_mask_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(
            temp_dir.path().join(".env"),
            "ACCOUNT_ID=from-file\nHOSTED_ZONE_ID=Z-file\n",
        )
        .unwrap();

        let config = with_clean_env(&[("ACCOUNT_ID", ""), ("HOSTED_ZONE_ID", "  ")], || {
            load(temp_dir.path())
        })
        .unwrap();
        assert_eq!(config.account_id.as_deref(), Some("from-file"));
        assert_eq!(config.hosted_zone_id.as_deref(), Some("Z-file"));
    }

    #[test]
    #[serial]
    fn test_load_without_anything_is_not_an_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = with_clean_env(&[], || load(temp_dir.path())).unwrap();
        assert_eq!(config.account_id, None);
        assert_eq!(config.pull_request_id, None);
    }

    #[test]
    #[serial]
    fn test_global_env_file_found_under_config_home() {
        let project = tempfile::tempdir().unwrap();
        let config_home = tempfile::tempdir().unwrap();
        let global_dir = config_home.path().join("almanac-infra");
        fs::create_dir(&global_dir).unwrap();
        fs::write(global_dir.join(".env"), "ACCOUNT_ID=global").unwrap();

        let config_home_str = config_home.path().to_string_lossy().to_string();
        let config = with_clean_env(&[("XDG_CONFIG_HOME", config_home_str.as_str())], || {
            load(project.path())
        })
        .unwrap();
        assert_eq!(config.account_id.as_deref(), Some("global"));
    }
}
