use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Per-repository config file names, in lookup order.
pub const REPO_CONFIG_FILES: [&str; 2] = [".0nepdd.yml", ".0pdd.yml"];

/// Per-repository settings read from `.0nepdd.yml` (or `.0pdd.yml`).
///
/// Parsing is permissive: anything malformed is dropped with a warning so a
/// bad config degrades ticket formatting instead of failing the pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoConfig {
    /// Title format directives, trimmed and lowercased.
    pub format: Vec<String>,
    /// Alert user names keyed by lowercased tracker name.
    pub alerts: BTreeMap<String, Vec<String>>,
}

impl RepoConfig {
    /// Load the first of [`REPO_CONFIG_FILES`] found in `source_dir`, or
    /// defaults when none exists or it cannot be read.
    #[must_use]
    pub fn load(source_dir: &Path) -> Self {
        let Some(path) = REPO_CONFIG_FILES
            .iter()
            .map(|name| source_dir.join(name))
            .find(|path| path.exists())
        else {
            return Self::default();
        };

        match std::fs::read_to_string(&path) {
            Ok(raw) => Self::from_yaml(&raw),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "ignoring unreadable repo config");
                Self::default()
            }
        }
    }

    #[must_use]
    pub fn from_yaml(raw: &str) -> Self {
        let value: Value = match serde_yaml::from_str(raw) {
            Ok(value) => value,
            Err(err) => {
                warn!(error = %err, "ignoring unparsable repo config");
                return Self::default();
            }
        };

        Self {
            format: parse_format(value.get("format")),
            alerts: parse_alerts(value.get("alerts")),
        }
    }
}

fn parse_format(value: Option<&Value>) -> Vec<String> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Sequence(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(|s| s.trim().to_lowercase())
            .collect(),
        Some(_) => {
            warn!("repo config `format` is not a list; ignoring it");
            Vec::new()
        }
    }
}

fn parse_alerts(value: Option<&Value>) -> BTreeMap<String, Vec<String>> {
    let Some(Value::Mapping(map)) = value else {
        return BTreeMap::new();
    };

    map.iter()
        .filter_map(|(tracker, names)| {
            let tracker = tracker.as_str()?.trim().to_lowercase();
            let Value::Sequence(names) = names else {
                warn!(tracker = %tracker, "repo config alerts entry is not a list; ignoring it");
                return None;
            };
            let names = names
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect();
            Some((tracker, names))
        })
        .collect()
}

/// Settings for the `pdd` service itself (storage, scanner, tracker access).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_storage_dir")]
    pub storage_dir: PathBuf,
    #[serde(default)]
    pub scanner: ScannerConfig,
    #[serde(default)]
    pub gitea: GiteaConfig,
    #[serde(default)]
    pub github: GithubConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            storage_dir: default_storage_dir(),
            scanner: ScannerConfig::default(),
            gitea: GiteaConfig::default(),
            github: GithubConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    #[serde(default = "default_scanner_command")]
    pub command: String,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            command: default_scanner_command(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GiteaConfig {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    #[serde(default = "default_github_api_url")]
    pub api_url: String,
    #[serde(default = "default_github_web_url")]
    pub web_url: String,
    #[serde(default)]
    pub token: Option<String>,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_url: default_github_api_url(),
            web_url: default_github_web_url(),
            token: None,
        }
    }
}

/// Default location of the service config: `<config dir>/pdd/config.toml`.
#[must_use]
pub fn default_service_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("pdd/config.toml"))
}

/// Read the service config at `path`; a missing file yields defaults.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or is not valid
/// TOML for [`ServiceConfig`].
pub fn load_service_config(path: &Path) -> Result<ServiceConfig> {
    if !path.exists() {
        return Ok(ServiceConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ServiceConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Load the service config and apply environment overrides.
///
/// `env` is the variable lookup (normally `std::env::var(..).ok()`), taken as
/// a parameter so resolution stays testable without touching the process env.
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be read or parsed.
pub fn resolve_service_config(
    explicit_path: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ServiceConfig> {
    let mut config = match explicit_path
        .map(Path::to_path_buf)
        .or_else(default_service_config_path)
    {
        Some(path) => load_service_config(&path)?,
        None => ServiceConfig::default(),
    };

    if let Some(dir) = env("PDD_STORAGE_DIR").filter(|v| !v.is_empty()) {
        config.storage_dir = PathBuf::from(dir);
    }
    if config.gitea.token.is_none() {
        config.gitea.token = env("GITEA_TOKEN").filter(|v| !v.is_empty());
    }
    if config.github.token.is_none() {
        config.github.token = env("GITHUB_TOKEN").filter(|v| !v.is_empty());
    }

    Ok(config)
}

fn default_storage_dir() -> PathBuf {
    dirs::data_dir().map_or_else(|| PathBuf::from(".pdd"), |dir| dir.join("pdd/ledgers"))
}

fn default_scanner_command() -> String {
    "gopdd -v".to_string()
}

fn default_github_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_github_web_url() -> String {
    "https://github.com".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_config_parses_format_and_alerts() {
        let cfg = RepoConfig::from_yaml(
            r"
format:
  - Short-Title
  - ' title-length=80 '
alerts:
  Gitea:
    - monomonedula
    - whoever-1234
",
        );

        assert_eq!(cfg.format, vec!["short-title", "title-length=80"]);
        assert_eq!(
            cfg.alerts.get("gitea"),
            Some(&vec![
                "monomonedula".to_string(),
                "whoever-1234".to_string(),
            ])
        );
    }

    #[test]
    fn repo_config_ignores_non_list_format() {
        let cfg = RepoConfig::from_yaml("format: short-title\n");
        assert!(cfg.format.is_empty());
    }

    #[test]
    fn repo_config_degrades_on_garbage() {
        let cfg = RepoConfig::from_yaml("format: [unclosed\n  - :");
        assert_eq!(cfg, RepoConfig::default());
    }

    #[test]
    fn repo_config_empty_document_is_default() {
        assert_eq!(RepoConfig::from_yaml(""), RepoConfig::default());
    }

    #[test]
    fn repo_config_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert_eq!(RepoConfig::load(dir.path()), RepoConfig::default());
    }

    #[test]
    fn repo_config_loads_0nepdd_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join(".0nepdd.yml"), "format: [short-title]\n")
            .expect("write config");

        let cfg = RepoConfig::load(dir.path());
        assert_eq!(cfg.format, vec!["short-title"]);
    }

    #[test]
    fn repo_config_falls_back_to_0pdd_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join(".0pdd.yml"), "format: [title-length=80]\n")
            .expect("write config");

        let cfg = RepoConfig::load(dir.path());
        assert_eq!(cfg.format, vec!["title-length=80"]);
    }

    #[test]
    fn repo_config_prefers_0nepdd_over_0pdd() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join(".0nepdd.yml"), "format: [short-title]\n")
            .expect("write config");
        std::fs::write(dir.path().join(".0pdd.yml"), "format: [title-length=80]\n")
            .expect("write config");

        let cfg = RepoConfig::load(dir.path());
        assert_eq!(cfg.format, vec!["short-title"]);
    }

    #[test]
    fn missing_service_config_uses_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = load_service_config(&dir.path().join("config.toml")).expect("load");
        assert_eq!(cfg.scanner.command, "gopdd -v");
        assert_eq!(cfg.github.api_url, "https://api.github.com");
        assert!(cfg.gitea.host.is_none());
    }

    #[test]
    fn service_config_parses_toml() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
storage_dir = "/var/lib/pdd"

[scanner]
command = "pdd-scan --json"

[gitea]
host = "https://gitea.example.com"
token = "secret"
"#,
        )
        .expect("write config");

        let cfg = load_service_config(&path).expect("load");
        assert_eq!(cfg.storage_dir, PathBuf::from("/var/lib/pdd"));
        assert_eq!(cfg.scanner.command, "pdd-scan --json");
        assert_eq!(cfg.gitea.host.as_deref(), Some("https://gitea.example.com"));
        assert_eq!(cfg.gitea.token.as_deref(), Some("secret"));
        assert_eq!(cfg.github.web_url, "https://github.com");
    }

    #[test]
    fn service_config_parse_error_has_context() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "storage_dir = [").expect("write config");

        let err = load_service_config(&path).expect_err("should fail");
        assert!(err.to_string().contains("Failed to parse"));
    }

    #[test]
    fn env_overrides_fill_tokens_and_storage() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[github]\ntoken = \"from-file\"\n").expect("write config");

        let cfg = resolve_service_config(Some(&path), |key| match key {
            "PDD_STORAGE_DIR" => Some("/tmp/ledgers".to_string()),
            "GITEA_TOKEN" => Some("gitea-env".to_string()),
            "GITHUB_TOKEN" => Some("github-env".to_string()),
            _ => None,
        })
        .expect("resolve");

        assert_eq!(cfg.storage_dir, PathBuf::from("/tmp/ledgers"));
        assert_eq!(cfg.gitea.token.as_deref(), Some("gitea-env"));
        assert_eq!(cfg.github.token.as_deref(), Some("from-file"));
    }
}
