//! JSON configuration file loading with defaults for every field.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserConfig {
    /// Debug runs keep the temporary working directory around.
    pub debug: bool,
    pub api: ApiConfig,
    pub repo: RepoConfig,
    pub logger: LoggerConfig,
    pub metadata: MetadataConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            username: "admin".to_string(),
            password: "admin".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RepoConfig {
    /// Remote git URL; the one setting without a usable default.
    pub url: Option<String>,
    pub branch: String,
    pub status_file_name: String,
    pub ssh: SshConfig,
    pub committer: CommitterConfig,
    pub keep_temporary: bool,
    pub hide_author: bool,
    pub ignore_history: bool,
    pub push_to_remote: bool,
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            url: None,
            branch: "master".to_string(),
            status_file_name: ".meta-repo.json".to_string(),
            ssh: SshConfig::default(),
            committer: CommitterConfig::default(),
            keep_temporary: false,
            hide_author: false,
            ignore_history: false,
            push_to_remote: true,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SshConfig {
    pub public_key: Option<PathBuf>,
    pub private_key: Option<PathBuf>,
    pub passphrase: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommitterConfig {
    pub name: String,
    pub email: String,
}

impl Default for CommitterConfig {
    fn default() -> Self {
        Self {
            name: "Metadata Mirror".to_string(),
            email: "mirror@localhost".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggerConfig {
    pub level: String,
    pub file_name: Option<String>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: "debug".to_string(),
            file_name: Some("debug.log".to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MetadataConfig {
    /// Collections to mirror; absent means everything the server lists.
    pub inclusions: Option<Vec<String>>,
    pub exclusions: Vec<String>,
    /// Collections mirrored to disk but exempt from history reconstruction
    /// and throttled with a fetch cooldown.
    pub special: Vec<String>,
}

impl UserConfig {
    /// Load configuration from a JSON file. A missing file yields the full
    /// default configuration; a malformed one is an error.
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents)
                .with_context(|| format!("Malformed configuration file {}", path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "Configuration file not found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e)
                .with_context(|| format!("Unable to read configuration file {}", path.display())),
        }
    }

    /// Whether the temporary working directory should survive the run.
    pub fn keep_working_dir(&self) -> bool {
        self.debug || self.repo.keep_temporary
    }
}
