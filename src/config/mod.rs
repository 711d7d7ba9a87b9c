use std::env;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq)]
pub struct ConfigFile {
    #[serde(alias = "url")]
    pub server: Option<String>,
    pub max_results: Option<u32>,
    pub timeout: Option<u64>,
    pub proxy: Option<String>,
    pub output_dir: Option<String>,
    pub report: Option<String>,
    pub no_color: Option<bool>,
    pub notification_seconds: Option<u64>,
}

fn home_dir() -> Option<PathBuf> {
    ["HOME", "USERPROFILE"]
        .into_iter()
        .filter_map(env::var_os)
        .find(|value| !value.is_empty())
        .map(PathBuf::from)
}

/// `~/.bizsearch/config.yml`, or `None` when no home directory is set.
pub fn default_config_path() -> Option<PathBuf> {
    Some(home_dir()?.join(".bizsearch").join("config.yml"))
}

/// Expands a leading `~` in `--config`, `--report` and `output_dir` values.
pub fn expand_tilde(path: &str) -> PathBuf {
    let rest = if path == "~" {
        Some("")
    } else {
        path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\"))
    };
    match rest.zip(home_dir()) {
        Some(("", home)) => home,
        Some((rest, home)) => home.join(rest),
        None => PathBuf::from(path),
    }
}

pub fn load_config(path: &Path, allow_missing: bool) -> Result<ConfigFile, String> {
    match std::fs::read_to_string(path) {
        Ok(contents) if contents.trim().is_empty() => Ok(ConfigFile::default()),
        Ok(contents) => serde_yaml::from_str::<ConfigFile>(&contents)
            .map_err(|e| format!("failed to parse config '{}': {e}", path.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && allow_missing => {
            Ok(ConfigFile::default())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(format!("config file not found '{}'", path.display()))
        }
        Err(e) => Err(format!("failed to read config '{}': {e}", path.display())),
    }
}

pub fn default_config_yaml() -> String {
    r#"# bizsearch config
#
# Location (default):
#   ~/.bizsearch/config.yml
#
# Every key is optional; command-line flags win over values set here.

# Backend
server: http://127.0.0.1:5000
# Seconds before a request is abandoned. Scrapes are slow.
timeout: 300
# proxy: http://127.0.0.1:8080

# Search
max_results: 50

# Export
# Where downloaded CSV files are saved.
output_dir: .
# Write an HTML report of every search (optional)
# report: ./bizsearch-report.html

# Terminal
no_color: false
notification_seconds: 5
"#
    .to_string()
}

/// Writes the default config at `path` unless a file is already there.
/// Returns whether a file was written.
pub fn ensure_default_config_file(path: &Path) -> Result<bool, String> {
    if path.exists() {
        return Ok(false);
    }
    let parent = path
        .parent()
        .ok_or_else(|| format!("invalid config path '{}'", path.display()))?;
    if !parent.as_os_str().is_empty() {
        std::fs::create_dir_all(parent).map_err(|e| {
            format!(
                "failed to create config directory '{}': {e}",
                parent.display()
            )
        })?;
    }
    std::fs::write(path, default_config_yaml())
        .map_err(|e| format!("failed to write config file '{}': {e}", path.display()))?;
    Ok(true)
}
