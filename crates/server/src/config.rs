use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use generator::LlmConfig;
use github::GitHubConfig;
use orchestrator::AgentConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const SETTINGS_FILE: &str = "task-publisher.toml";
pub const DEFAULT_PORT: u16 = 8000;

const CONFIG_DIR_NAME: &str = "task-publisher";
const CONFIG_DIR_FILE: &str = "config.toml";

/// Written by `task-publisher init`.
pub const SETTINGS_TEMPLATE: &str = r##"# task-publisher settings.
# Environment variables override every value in this file.

# Shared secret every task submission must carry (env: SECRET_KEY)
# secret = "change-me"

[github]
# Personal access token with repo and pages scope (env: GITHUB_TOKEN)
# token = "ghp_..."
# Account that owns the created repositories (env: GITHUB_USERNAME)
# username = "octocat"
api_url = "https://api.github.com"
branch = "main"

[llm]
# OpenAI-compatible endpoint (env: OPENAI_BASE_URL)
base_url = "https://aipipe.org/openai/v1"
# Without a key every round publishes the built-in fallback files (env: OPENAI_API_KEY)
# api_key = "..."
model = "gpt-4o"

[server]
port = 8000
# Static frontend served for paths the API does not handle
# app_dir = "./frontend/dist"
"##;

/// Settings file contents. Every value is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSettings {
    pub secret: Option<String>,
    pub github: GitHubSection,
    pub llm: LlmSection,
    pub server: ServerSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubSection {
    pub token: Option<String>,
    pub username: Option<String>,
    pub api_url: Option<String>,
    pub branch: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub port: Option<u16>,
    pub app_dir: Option<PathBuf>,
}

impl FileSettings {
    pub fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        let settings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse settings file {}", path.display()))?;
        debug!(path = %path.display(), "Settings file loaded");
        Ok(settings)
    }
}

/// Fully resolved process settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub agent: AgentConfig,
    pub port: u16,
    pub app_dir: Option<PathBuf>,
}

impl Settings {
    /// Defaults, then the settings file, then the process environment.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        Self::load_with(explicit, |key| std::env::var(key).ok())
    }

    pub fn load_with<F>(explicit: Option<&Path>, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = match Self::locate_file(explicit) {
            Some(path) => FileSettings::read(&path)?,
            None => {
                debug!("No settings file found, using environment only");
                FileSettings::default()
            }
        };
        Self::resolve(file, env)
    }

    /// An explicit path must exist. Otherwise the working directory is
    /// searched first, then the user config directory.
    pub fn locate_file(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }

        let local = PathBuf::from(SETTINGS_FILE);
        if local.is_file() {
            return Some(local);
        }

        dirs::config_dir()
            .map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_DIR_FILE))
            .filter(|path| path.is_file())
    }

    pub fn resolve<F>(file: FileSettings, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let secret = env("SECRET_KEY")
            .or_else(|| env("SecretKey"))
            .or(file.secret)
            .filter(|v| !v.is_empty());
        let token = env("GITHUB_TOKEN")
            .or(file.github.token)
            .filter(|v| !v.is_empty());
        let owner = env("GITHUB_USERNAME")
            .or(file.github.username)
            .filter(|v| !v.is_empty());

        let Some(secret) = secret else {
            bail!("Missing required setting: SECRET_KEY");
        };
        let Some(token) = token else {
            bail!("Missing required setting: GITHUB_TOKEN");
        };
        let Some(owner) = owner else {
            bail!("Missing required setting: GITHUB_USERNAME");
        };

        let mut github = GitHubConfig::new(token, owner);
        if let Some(api_url) = env("GITHUB_API_URL").or(file.github.api_url) {
            github = github.with_api_url(api_url);
        }
        if let Some(branch) = env("GITHUB_BRANCH").or(file.github.branch) {
            github = github.with_default_branch(branch);
        }

        let defaults = LlmConfig::default();
        let llm = LlmConfig {
            base_url: env("OPENAI_BASE_URL")
                .or(file.llm.base_url)
                .unwrap_or(defaults.base_url),
            api_key: env("OPENAI_API_KEY")
                .or(file.llm.api_key)
                .filter(|v| !v.is_empty()),
            model: env("OPENAI_MODEL")
                .or(file.llm.model)
                .unwrap_or(defaults.model),
        };
        if llm.api_key.is_none() {
            warn!("OPENAI_API_KEY is not set, generation will use the fallback files");
        }

        let port = match env("PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("Invalid PORT value: {}", raw))?,
            None => file.server.port.unwrap_or(DEFAULT_PORT),
        };

        Ok(Self {
            agent: AgentConfig::new(secret, github, llm),
            port,
            app_dir: file.server.app_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn required_env() -> Vec<(&'static str, &'static str)> {
        vec![
            ("SECRET_KEY", "S"),
            ("GITHUB_TOKEN", "ghp_env"),
            ("GITHUB_USERNAME", "octo"),
        ]
    }

    fn settings_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_from_environment_only() {
        let settings = Settings::resolve(FileSettings::default(), env_of(&required_env())).unwrap();

        assert_eq!(settings.agent.shared_secret, "S");
        assert_eq!(settings.agent.github.owner, "octo");
        assert_eq!(settings.agent.github.api_url, "https://api.github.com");
        assert_eq!(settings.agent.github.default_branch, "main");
        assert_eq!(settings.agent.llm.base_url, "https://aipipe.org/openai/v1");
        assert_eq!(settings.agent.llm.model, "gpt-4o");
        assert!(settings.agent.llm.api_key.is_none());
        assert_eq!(settings.port, DEFAULT_PORT);
        assert!(settings.app_dir.is_none());
    }

    #[test]
    fn test_missing_required_setting_is_named() {
        let err = Settings::resolve(
            FileSettings::default(),
            env_of(&[("SECRET_KEY", "S"), ("GITHUB_USERNAME", "octo")]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("GITHUB_TOKEN"));

        let err = Settings::resolve(FileSettings::default(), env_of(&[])).unwrap_err();
        assert!(err.to_string().contains("SECRET_KEY"));
    }

    #[test]
    fn test_empty_values_count_as_missing() {
        let err = Settings::resolve(
            FileSettings::default(),
            env_of(&[("SECRET_KEY", "  "), ("GITHUB_TOKEN", "t"), ("GITHUB_USERNAME", "o")]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("SECRET_KEY"));
    }

    #[test]
    fn test_legacy_secret_name() {
        let settings = Settings::resolve(
            FileSettings::default(),
            env_of(&[("SecretKey", "legacy"), ("GITHUB_TOKEN", "t"), ("GITHUB_USERNAME", "o")]),
        )
        .unwrap();
        assert_eq!(settings.agent.shared_secret, "legacy");
    }

    #[test]
    fn test_file_values_and_env_override() {
        let file = settings_file(
            r#"
secret = "from-file"

[github]
token = "ghp_file"
username = "file-owner"
branch = "gh-pages"

[llm]
api_key = "sk-file"
model = "gpt-4o-mini"

[server]
port = 9000
app_dir = "/srv/app"
"#,
        );

        let settings = Settings::load_with(
            Some(file.path()),
            env_of(&[("GITHUB_USERNAME", "env-owner"), ("PORT", "8123")]),
        )
        .unwrap();

        assert_eq!(settings.agent.shared_secret, "from-file");
        assert_eq!(settings.agent.github.token, "ghp_file");
        assert_eq!(settings.agent.github.owner, "env-owner");
        assert_eq!(settings.agent.github.default_branch, "gh-pages");
        assert_eq!(settings.agent.llm.api_key.as_deref(), Some("sk-file"));
        assert_eq!(settings.agent.llm.model, "gpt-4o-mini");
        assert_eq!(settings.port, 8123);
        assert_eq!(settings.app_dir, Some(PathBuf::from("/srv/app")));
    }

    #[test]
    fn test_invalid_port() {
        let mut env = required_env();
        env.push(("PORT", "eighty"));
        let err = Settings::resolve(FileSettings::default(), env_of(&env)).unwrap_err();
        assert!(err.to_string().contains("Invalid PORT"));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = Settings::load_with(Some(&missing), env_of(&required_env())).unwrap_err();
        assert!(err.to_string().contains("Failed to read settings file"));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let file = settings_file("[github\ntoken = ");
        let err = Settings::load_with(Some(file.path()), env_of(&required_env())).unwrap_err();
        assert!(err.to_string().contains("Failed to parse settings file"));
    }

    #[test]
    fn test_template_parses_with_defaults() {
        let parsed: FileSettings = toml::from_str(SETTINGS_TEMPLATE).unwrap();
        assert!(parsed.secret.is_none());
        assert_eq!(parsed.github.branch.as_deref(), Some("main"));
        assert_eq!(parsed.llm.model.as_deref(), Some("gpt-4o"));
        assert_eq!(parsed.server.port, Some(DEFAULT_PORT));
    }
}
