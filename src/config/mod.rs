//! Configuration Management
//!
//! This module resolves the database connection and chart settings for a
//! reporting session.
//!
//! # Configuration Locations
//! - Local: `.vintage/config.json` (per-project, next to the working directory)
//! - Global: `<config dir>/vintage/config.json` (per-user)
//!
//! # Resolution Precedence
//! 1. Explicit CLI flags and `VINTAGE_*` environment variables (highest priority)
//! 2. The selected profile (local profiles replace global ones of the same name)
//! 3. Built-in defaults (`localhost:3306`, strict warnings on)
//!
//! # Profiles
//! ```json
//! {
//!   "default": "winery",
//!   "chart_dir": "charts",
//!   "profiles": {
//!     "winery": { "host": "db.local", "user": "reports", "password_env": "WINERY_PW", "database": "winery" },
//!     "movies": { "host": "db.local", "user": "reports", "password_env": "WINERY_PW", "database": "movies" }
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::engine::{ConnectionConfig, DEFAULT_MYSQL_PORT};
use crate::error::{Result, VintageError};

/// Default host when neither flags nor profile name one
pub const DEFAULT_HOST: &str = "localhost";

/// Default chart output directory
pub const DEFAULT_CHART_DIR: &str = "charts";

/// One named connection profile; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// Plain-text password (prefer `password_env`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Environment variable holding the password
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_env: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strict_warnings: Option<bool>,
}

/// Contents of a config file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Named profiles
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,

    /// Profile used when none is selected explicitly
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,

    /// Directory charts are written to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart_dir: Option<PathBuf>,
}

impl ConfigFile {
    /// Overlay `local` on top of `self`: local profiles win by name,
    /// local `default` and `chart_dir` win when set
    #[must_use]
    pub fn merge(mut self, local: ConfigFile) -> ConfigFile {
        self.profiles.extend(local.profiles);
        if local.default.is_some() {
            self.default = local.default;
        }
        if local.chart_dir.is_some() {
            self.chart_dir = local.chart_dir;
        }
        self
    }

    /// Names of all profiles, sorted
    #[must_use]
    pub fn profile_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.profiles.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Values given on the command line or through `VINTAGE_*` variables
#[derive(Debug, Clone, Default)]
pub struct ConnectionOverrides {
    pub profile: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
    /// `Some(false)` when strict warnings were switched off explicitly
    pub strict_warnings: Option<bool>,
}

/// Get path to local config file (`.vintage/config.json`)
pub fn local_config_path() -> Result<PathBuf> {
    let current_dir = std::env::current_dir().map_err(|e| {
        VintageError::config_error(format!("Could not determine current directory: {e}"))
    })?;

    Ok(current_dir.join(".vintage").join("config.json"))
}

/// Get path to global config file (`<config dir>/vintage/config.json`)
pub fn global_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| VintageError::config_error("Could not determine user config directory"))?;

    Ok(config_dir.join("vintage").join("config.json"))
}

/// Load one config file; a missing file is an empty config
pub fn load_file(path: &Path) -> Result<ConfigFile> {
    if !path.exists() {
        return Ok(ConfigFile::default());
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        VintageError::config_error(format!("Could not read config file {}: {e}", path.display()))
    })?;

    serde_json::from_str(&contents).map_err(|e| {
        VintageError::config_error(format!("Invalid config file {}: {e}", path.display()))
    })
}

/// Load global then local config and merge them (local wins)
pub fn load_with_precedence() -> Result<ConfigFile> {
    let global = load_file(&global_config_path()?)?;
    let local = load_file(&local_config_path()?)?;
    Ok(global.merge(local))
}

/// Resolve the connection for a session
///
/// `fallback_database` is used when neither flags nor the profile name a
/// database. `prompt` is asked for the password as a last resort; without it a
/// missing password is a configuration error.
pub fn resolve_connection(
    file: &ConfigFile,
    overrides: &ConnectionOverrides,
    fallback_database: &str,
    prompt: Option<&dyn Fn(&str) -> Result<String>>,
) -> Result<ConnectionConfig> {
    let profile = select_profile(file, overrides.profile.as_deref(), fallback_database)?;

    let host = overrides
        .host
        .clone()
        .or_else(|| profile.host.clone())
        .unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = overrides.port.or(profile.port).unwrap_or(DEFAULT_MYSQL_PORT);

    let user = overrides.user.clone().or_else(|| profile.user.clone()).ok_or_else(|| {
        VintageError::config_error(
            "No database user configured. Pass --user, set VINTAGE_USER, or add 'user' to a profile",
        )
    })?;

    let database = overrides
        .database
        .clone()
        .or_else(|| profile.database.clone())
        .unwrap_or_else(|| fallback_database.to_string());

    let strict_warnings = overrides.strict_warnings.or(profile.strict_warnings).unwrap_or(true);

    let password = match resolve_password(overrides, &profile)? {
        Some(password) => password,
        None => match prompt {
            Some(prompt) => prompt(&format!("Password for {user}@{host}"))?,
            None => {
                return Err(VintageError::config_error(
                    "No database password configured. Set VINTAGE_PASSWORD or 'password_env' in a profile",
                ))
            }
        },
    };

    Ok(ConnectionConfig { host, port, user, password, database, strict_warnings })
}

/// Pick the profile: explicit name, then the file default, then one named
/// after the fallback database. Only an explicit name must exist.
fn select_profile(file: &ConfigFile, explicit: Option<&str>, fallback: &str) -> Result<Profile> {
    if let Some(name) = explicit {
        return file.profiles.get(name).cloned().ok_or_else(|| {
            VintageError::config_error(format!(
                "Profile '{name}' not found. Available profiles: {:?}",
                file.profile_names()
            ))
        });
    }

    let implicit = file.default.as_deref().unwrap_or(fallback);
    Ok(file.profiles.get(implicit).cloned().unwrap_or_default())
}

fn resolve_password(overrides: &ConnectionOverrides, profile: &Profile) -> Result<Option<String>> {
    if let Some(password) = &overrides.password {
        return Ok(Some(password.clone()));
    }

    if let Some(env_var) = &profile.password_env {
        return std::env::var(env_var).map(Some).map_err(|_| {
            VintageError::config_error(format!("Environment variable {env_var} not found for password"))
        });
    }

    Ok(profile.password.clone())
}

/// Chart directory: explicit flag, then config file, then `charts`
#[must_use]
pub fn resolve_chart_dir(file: &ConfigFile, explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .or_else(|| file.chart_dir.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CHART_DIR))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn winery_profile() -> Profile {
        Profile {
            host: Some("db.internal".to_string()),
            port: Some(3307),
            user: Some("reports".to_string()),
            password: Some("from-profile".to_string()),
            database: Some("winery".to_string()),
            ..Default::default()
        }
    }

    fn file_with(name: &str, profile: Profile) -> ConfigFile {
        let mut file = ConfigFile::default();
        file.profiles.insert(name.to_string(), profile);
        file
    }

    #[test]
    fn test_profile_used_for_fallback_name() {
        let file = file_with("winery", winery_profile());
        let config =
            resolve_connection(&file, &ConnectionOverrides::default(), "winery", None).unwrap();

        assert_eq!(config.host, "db.internal");
        assert_eq!(config.port, 3307);
        assert_eq!(config.user, "reports");
        assert_eq!(config.password, "from-profile");
        assert_eq!(config.database, "winery");
        assert!(config.strict_warnings);
    }

    #[test]
    fn test_overrides_beat_profile() {
        let file = file_with("winery", winery_profile());
        let overrides = ConnectionOverrides {
            host: Some("127.0.0.1".to_string()),
            password: Some("from-env".to_string()),
            strict_warnings: Some(false),
            ..Default::default()
        };
        let config = resolve_connection(&file, &overrides, "winery", None).unwrap();

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 3307);
        assert_eq!(config.password, "from-env");
        assert!(!config.strict_warnings);
    }

    #[test]
    fn test_defaults_without_profile() {
        let overrides = ConnectionOverrides {
            user: Some("root".to_string()),
            password: Some("pw".to_string()),
            ..Default::default()
        };
        let config = resolve_connection(&ConfigFile::default(), &overrides, "movies", None).unwrap();

        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.port, DEFAULT_MYSQL_PORT);
        assert_eq!(config.database, "movies");
    }

    #[test]
    fn test_missing_user_is_config_error() {
        let overrides = ConnectionOverrides { password: Some("pw".into()), ..Default::default() };
        let err = resolve_connection(&ConfigFile::default(), &overrides, "winery", None).unwrap_err();
        assert_eq!(err.error_code(), "CONFIG_ERROR");
        assert!(err.message().contains("--user"));
    }

    #[test]
    fn test_unknown_explicit_profile() {
        let file = file_with("winery", winery_profile());
        let overrides = ConnectionOverrides { profile: Some("prod".into()), ..Default::default() };
        let err = resolve_connection(&file, &overrides, "winery", None).unwrap_err();
        assert!(err.message().contains("Profile 'prod' not found"));
        assert!(err.message().contains("winery"));
    }

    #[test]
    fn test_default_profile_pointer() {
        let mut file = file_with("staging", winery_profile());
        file.default = Some("staging".to_string());
        let config =
            resolve_connection(&file, &ConnectionOverrides::default(), "winery", None).unwrap();
        assert_eq!(config.host, "db.internal");
    }

    #[test]
    fn test_password_env_resolution() {
        let env_var = "VINTAGE_TEST_PASSWORD_ENV_RESOLUTION";
        std::env::set_var(env_var, "from-env-var");

        let profile =
            Profile { password: None, password_env: Some(env_var.to_string()), ..winery_profile() };
        let file = file_with("winery", profile);
        let config =
            resolve_connection(&file, &ConnectionOverrides::default(), "winery", None).unwrap();
        assert_eq!(config.password, "from-env-var");

        std::env::remove_var(env_var);
    }

    #[test]
    fn test_password_env_missing() {
        let profile = Profile {
            password: None,
            password_env: Some("VINTAGE_TEST_UNSET_PASSWORD_VAR".to_string()),
            ..winery_profile()
        };
        let file = file_with("winery", profile);
        let err = resolve_connection(&file, &ConnectionOverrides::default(), "winery", None)
            .unwrap_err();
        assert!(err.message().contains("VINTAGE_TEST_UNSET_PASSWORD_VAR"));
    }

    #[test]
    fn test_prompt_used_as_last_resort() {
        let profile = Profile { password: None, ..winery_profile() };
        let file = file_with("winery", profile);

        let prompt = |label: &str| -> Result<String> {
            assert_eq!(label, "Password for reports@db.internal");
            Ok("typed".to_string())
        };
        let config =
            resolve_connection(&file, &ConnectionOverrides::default(), "winery", Some(&prompt))
                .unwrap();
        assert_eq!(config.password, "typed");

        let err = resolve_connection(&file, &ConnectionOverrides::default(), "winery", None)
            .unwrap_err();
        assert!(err.message().contains("No database password configured"));
    }

    #[test]
    fn test_merge_local_wins() {
        let mut global = file_with("winery", winery_profile());
        global.chart_dir = Some(PathBuf::from("/tmp/global-charts"));
        global.default = Some("winery".to_string());

        let local_profile = Profile { host: Some("localhost".into()), ..winery_profile() };
        let mut local = file_with("winery", local_profile);
        local.profiles.insert("movies".to_string(), Profile::default());

        let merged = global.merge(local);
        assert_eq!(merged.profiles["winery"].host.as_deref(), Some("localhost"));
        assert_eq!(merged.profile_names(), vec!["movies", "winery"]);
        assert_eq!(merged.default.as_deref(), Some("winery"));
        assert_eq!(merged.chart_dir, Some(PathBuf::from("/tmp/global-charts")));
    }

    #[test]
    fn test_load_file_roundtrip_and_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        assert_eq!(load_file(&path).unwrap(), ConfigFile::default());

        std::fs::write(
            &path,
            r#"{
                "default": "winery",
                "chart_dir": "out",
                "profiles": {
                    "winery": { "host": "db", "user": "reports", "password_env": "PW", "strict_warnings": false }
                }
            }"#,
        )
        .unwrap();

        let file = load_file(&path).unwrap();
        assert_eq!(file.default.as_deref(), Some("winery"));
        assert_eq!(file.chart_dir, Some(PathBuf::from("out")));
        let profile = &file.profiles["winery"];
        assert_eq!(profile.password_env.as_deref(), Some("PW"));
        assert_eq!(profile.strict_warnings, Some(false));
        assert_eq!(profile.port, None);
    }

    #[test]
    fn test_load_file_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = load_file(&path).unwrap_err();
        assert_eq!(err.error_code(), "CONFIG_ERROR");
        assert!(err.message().contains("Invalid config file"));
    }

    #[test]
    fn test_resolve_chart_dir() {
        let mut file = ConfigFile::default();
        assert_eq!(resolve_chart_dir(&file, None), PathBuf::from("charts"));

        file.chart_dir = Some(PathBuf::from("reports/charts"));
        assert_eq!(resolve_chart_dir(&file, None), PathBuf::from("reports/charts"));
        assert_eq!(resolve_chart_dir(&file, Some(Path::new("x"))), PathBuf::from("x"));
    }
}
