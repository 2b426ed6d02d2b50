//! Application configuration for assigngen.
//!
//! User config lives at `~/.assigngen/assigngen.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AssignGenError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "assigngen.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".assigngen";

/// Browser identification sent with search and page requests.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

// ---------------------------------------------------------------------------
// Config structs (matching assigngen.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Search endpoint settings.
    #[serde(default)]
    pub search: SearchConfig,

    /// Page fetching settings.
    #[serde(default)]
    pub scrape: ScrapeConfig,

    /// Translation backend settings.
    #[serde(default)]
    pub translation: TranslationConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Directory the documents and `urls.txt` are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Maximum number of URLs taken from the search results.
    #[serde(default = "default_result_count")]
    pub result_count: usize,

    /// Rendered document format.
    #[serde(default)]
    pub format: OutputFormat,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            result_count: default_result_count(),
            format: OutputFormat::default(),
        }
    }
}

fn default_output_dir() -> String {
    "~/assigngen-output".into()
}
fn default_result_count() -> usize {
    10
}

/// Format the rendered documents are written in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Markdown,
    Html,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Markdown => f.write_str("markdown"),
            Self::Html => f.write_str("html"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = AssignGenError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "markdown" | "md" => Ok(Self::Markdown),
            "html" => Ok(Self::Html),
            other => Err(AssignGenError::config(format!(
                "unknown output format '{other}' (expected markdown or html)"
            ))),
        }
    }
}

/// `[search]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// HTML search endpoint receiving a form POST with field `q`.
    #[serde(default = "default_search_endpoint")]
    pub endpoint: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User-Agent header value.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: default_search_endpoint(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_search_endpoint() -> String {
    "https://html.duckduckgo.com/html/".into()
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_user_agent() -> String {
    BROWSER_USER_AGENT.into()
}

/// `[scrape]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeConfig {
    /// Per-page request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User-Agent header value.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Fetch pages on loopback/private addresses (off outside of tests).
    #[serde(default)]
    pub allow_private_hosts: bool,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            allow_private_hosts: false,
        }
    }
}

/// `[translation]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationConfig {
    /// Translation endpoint (Google `translate_a/single` compatible).
    #[serde(default = "default_translation_endpoint")]
    pub endpoint: String,

    /// Language code of the scraped content.
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Language code the second document is translated into.
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// File name marker for the source-language document.
    #[serde(default = "default_source_marker")]
    pub source_marker: String,

    /// File name marker for the translated document.
    #[serde(default = "default_target_marker")]
    pub target_marker: String,

    /// Per-call timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            endpoint: default_translation_endpoint(),
            source_language: default_source_language(),
            target_language: default_target_language(),
            source_marker: default_source_marker(),
            target_marker: default_target_marker(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_translation_endpoint() -> String {
    "https://translate.googleapis.com/translate_a/single".into()
}
fn default_source_language() -> String {
    "en".into()
}
fn default_target_language() -> String {
    "ur".into()
}
fn default_source_marker() -> String {
    "English".into()
}
fn default_target_marker() -> String {
    "Urdu".into()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.assigngen/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| AssignGenError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.assigngen/assigngen.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| AssignGenError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        AssignGenError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| AssignGenError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| AssignGenError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| AssignGenError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Expand a leading `~` against the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    let rest = match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') || rest.starts_with('\\') => rest,
        _ => return PathBuf::from(path),
    };

    match dirs::home_dir() {
        Some(home) => home.join(rest.trim_start_matches(['/', '\\'])),
        None => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("output_dir"));
        assert!(toml_str.contains("html.duckduckgo.com"));
        assert!(toml_str.contains("target_language = \"ur\""));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[defaults]
output_dir = "/tmp/assignments"
format = "html"

[translation]
target_language = "fr"
target_marker = "French"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.defaults.output_dir, "/tmp/assignments");
        assert_eq!(config.defaults.result_count, 10);
        assert_eq!(config.defaults.format, OutputFormat::Html);
        assert_eq!(config.translation.target_language, "fr");
        assert_eq!(config.translation.source_marker, "English");
        assert_eq!(config.search.timeout_secs, 10);
        assert!(!config.scrape.allow_private_hosts);
    }

    #[test]
    fn output_format_parsing() {
        assert_eq!("md".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);
        assert_eq!("HTML".parse::<OutputFormat>().unwrap(), OutputFormat::Html);
        assert!("docx".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn expand_home_only_touches_leading_tilde() {
        assert_eq!(expand_home("/var/out"), PathBuf::from("/var/out"));
        assert_eq!(expand_home("~user/out"), PathBuf::from("~user/out"));

        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/out"), home.join("out"));
            assert_eq!(expand_home("~"), home);
        }
    }
}
