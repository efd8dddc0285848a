/*
    playlist-sync | Rust CLI tool to copy Spotify libraries and playlists between accounts.
    Copyright (C) 2026  The playlist-sync authors

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    This program is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Affero General Public License for more details.

    You should have received a copy of the GNU Affero General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};

use log::{info, warn};
use rspotify::Credentials;
use serde::Deserialize;
use thiserror::Error;

/// Redirect URL registered with the Spotify application by default.
pub const DEFAULT_REDIRECT_URL: &str = "http://localhost/";
/// Where token caches and library snapshots live unless overridden.
pub const DEFAULT_DATA_DIR: &str = "~/.playlist_sync";
/// Environment variable that overrides `data_dir` from the config file.
pub const DATA_DIR_ENV: &str = "PS_DATA_DIR";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error(
        "Missing Spotify credentials: set client_id/client_secret in the config file \
         or RSPOTIFY_CLIENT_ID/RSPOTIFY_CLIENT_SECRET in the environment"
    )]
    MissingCredentials,
}

/// A Spotify account referenced by the config, keyed by a friendly alias.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Account {
    pub username: String,
}

/// Runtime configuration, loaded from a YAML file.
///
/// Every field is optional in the file; missing fields fall back to the
/// defaults below, so an empty file is a valid (if useless) config.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
    pub data_dir: String,
    /// Accounts whose libraries are read and merged.
    pub sources: BTreeMap<String, Account>,
    /// Accounts the merged library is written into.
    pub destinations: BTreeMap<String, Account>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            redirect_url: DEFAULT_REDIRECT_URL.to_string(),
            data_dir: DEFAULT_DATA_DIR.to_string(),
            sources: BTreeMap::new(),
            destinations: BTreeMap::new(),
        }
    }
}

impl SyncConfig {
    /// Candidate config locations, most specific first:
    /// 1. The path given on the command line, if any.
    /// 2. `~/.playlist_sync.yaml`
    /// 3. `playlist_sync.yaml` next to the executable.
    /// 4. `/etc/playlist_sync.yaml`
    pub fn candidate_paths(explicit: Option<&Path>) -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(path) = explicit {
            paths.push(path.to_path_buf());
        }
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".playlist_sync.yaml"));
        }
        if let Ok(exe) = env::current_exe() {
            if let Some(dir) = exe.parent() {
                paths.push(dir.join("playlist_sync.yaml"));
            }
        }
        paths.push(PathBuf::from("/etc/playlist_sync.yaml"));
        paths
    }

    /// Parse a single config file. An empty file yields the defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load the first config file that exists, or the defaults if none does.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            if !path.is_file() {
                warn!(
                    "Config file {} does not exist; trying default locations",
                    path.display()
                );
            }
        }
        for path in Self::candidate_paths(explicit) {
            if path.is_file() {
                info!("Loading config from {}", path.display());
                return Self::from_file(&path);
            }
        }
        warn!("No config file found; continuing with built-in defaults");
        Ok(Self::default())
    }

    /// Working directory for token caches and snapshots, with `~` expanded.
    /// `PS_DATA_DIR` in the environment takes precedence over the file.
    pub fn data_dir(&self) -> PathBuf {
        let raw = env::var(DATA_DIR_ENV).unwrap_or_else(|_| self.data_dir.clone());
        expand_tilde(&raw)
    }

    /// Spotify application credentials, preferring the config file over the
    /// `RSPOTIFY_CLIENT_ID`/`RSPOTIFY_CLIENT_SECRET` environment variables.
    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        if !self.client_id.is_empty() && !self.client_secret.is_empty() {
            return Ok(Credentials::new(&self.client_id, &self.client_secret));
        }
        Credentials::from_env().ok_or(ConfigError::MissingCredentials)
    }

    /// Drop the account roles a one-sided run will not touch, so they are
    /// never prompted for authorization.
    pub fn retain_roles(&mut self, read_only: bool, write_only: bool) {
        if read_only {
            self.destinations.clear();
        }
        if write_only {
            self.sources.clear();
        }
    }
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn test_defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.redirect_url, DEFAULT_REDIRECT_URL);
        assert_eq!(config.data_dir, DEFAULT_DATA_DIR);
        assert!(config.client_id.is_empty());
        assert!(config.sources.is_empty());
        assert!(config.destinations.is_empty());
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
client_id: abc123
client_secret: shh
redirect_url: http://localhost:8888/callback
data_dir: /var/lib/playlist_sync
sources:
  home:
    username: alice
  old:
    username: alice_legacy
destinations:
  shared:
    username: family
"#;
        let config: SyncConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.client_id, "abc123");
        assert_eq!(config.redirect_url, "http://localhost:8888/callback");
        assert_eq!(config.sources.len(), 2);
        assert_eq!(config.sources["home"].username, "alice");
        assert_eq!(config.destinations["shared"].username, "family");
    }

    #[test]
    fn test_parse_partial_config_uses_defaults() {
        let yaml = "sources:\n  main:\n    username: alice\n";
        let config: SyncConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.redirect_url, DEFAULT_REDIRECT_URL);
        assert_eq!(config.data_dir, DEFAULT_DATA_DIR);
        assert_eq!(config.sources.len(), 1);
        assert!(config.destinations.is_empty());
    }

    #[test]
    fn test_from_file_empty_is_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file).unwrap();
        let config = SyncConfig::from_file(file.path()).unwrap();
        assert_eq!(config.data_dir, DEFAULT_DATA_DIR);
    }

    #[test]
    fn test_from_file_rejects_bad_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "sources: [not, a, mapping]").unwrap();
        let err = SyncConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_candidate_paths_explicit_first() {
        let explicit = PathBuf::from("/tmp/custom.yaml");
        let paths = SyncConfig::candidate_paths(Some(&explicit));
        assert_eq!(paths[0], explicit);
        assert_eq!(paths.last().unwrap(), &PathBuf::from("/etc/playlist_sync.yaml"));
        // Without an explicit path the chain starts at the home candidate.
        let default_paths = SyncConfig::candidate_paths(None);
        assert_eq!(paths.len(), default_paths.len() + 1);
    }

    #[test]
    fn test_retain_roles() {
        let yaml = "sources:\n  a:\n    username: alice\ndestinations:\n  b:\n    username: bob\n";
        let mut read_only: SyncConfig = serde_yaml::from_str(yaml).unwrap();
        read_only.retain_roles(true, false);
        assert_eq!(read_only.sources.len(), 1);
        assert!(read_only.destinations.is_empty());

        let mut write_only: SyncConfig = serde_yaml::from_str(yaml).unwrap();
        write_only.retain_roles(false, true);
        assert!(write_only.sources.is_empty());
        assert_eq!(write_only.destinations.len(), 1);
    }

    #[test]
    fn test_credentials_prefer_config_file() {
        let mut config = SyncConfig::default();
        config.client_id = "abc".to_string();
        config.client_secret = "xyz".to_string();
        let creds = config.credentials().unwrap();
        assert_eq!(creds.id, "abc");
        assert_eq!(creds.secret.as_deref(), Some("xyz"));
    }

    // Environment mutations live in one test so parallel test threads never
    // observe each other's changes.
    #[test]
    fn test_env_overrides() {
        let config = SyncConfig::default();

        env::set_var(DATA_DIR_ENV, "/tmp/ps-data-override");
        assert_eq!(config.data_dir(), PathBuf::from("/tmp/ps-data-override"));
        env::remove_var(DATA_DIR_ENV);

        // Without the override the default tilde path resolves under $HOME.
        let resolved = config.data_dir();
        assert_eq!(resolved, dirs::home_dir().unwrap().join(".playlist_sync"));

        // An empty config falls back to the RSPOTIFY_* variables, and errors
        // out when those are unset as well.
        env::remove_var("RSPOTIFY_CLIENT_ID");
        env::remove_var("RSPOTIFY_CLIENT_SECRET");
        assert!(matches!(
            config.credentials(),
            Err(ConfigError::MissingCredentials)
        ));

        env::set_var("RSPOTIFY_CLIENT_ID", "envid");
        env::set_var("RSPOTIFY_CLIENT_SECRET", "envsecret");
        let creds = config.credentials().unwrap();
        assert_eq!(creds.id, "envid");
        assert_eq!(creds.secret.as_deref(), Some("envsecret"));
        env::remove_var("RSPOTIFY_CLIENT_ID");
        env::remove_var("RSPOTIFY_CLIENT_SECRET");
    }
}
