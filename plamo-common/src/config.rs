//! Configuration loading and value resolution
//!
//! Values are resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback, where one exists)
//!
//! A missing or unreadable TOML file never terminates startup: a warning is
//! logged and compiled defaults are used instead.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable holding the Notion integration token
pub const ENV_NOTION_API_KEY: &str = "PLAMO_NOTION_API_KEY";
/// Environment variable holding the bag database id
pub const ENV_BAG_DATABASE_ID: &str = "PLAMO_BAG_DATABASE_ID";
/// Environment variable holding the box database id
pub const ENV_BOX_DATABASE_ID: &str = "PLAMO_BOX_DATABASE_ID";

/// Default Notion API root
pub const DEFAULT_NOTION_BASE_URL: &str = "https://api.notion.com/";

/// Contents of `config.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TomlConfig {
    /// Notion integration token (sent as a bearer token)
    pub notion_api_key: Option<String>,
    /// Database holding bag records
    pub bag_database_id: Option<String>,
    /// Database holding box records
    pub box_database_id: Option<String>,
    /// Override for the Notion API root (tests point this at a local stub)
    pub notion_base_url: Option<String>,
    /// Command used to open record URLs, e.g. `xdg-open` or `open`
    pub opener_command: Option<String>,
    pub logging: LoggingConfig,
    pub properties: PropertyNames,
    pub timing: TimingConfig,
    pub server: ServerConfig,
}

/// Logging section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter level when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Property names of the bag and box databases, plus default names for new records
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PropertyNames {
    /// Title property of a bag holding its scan identifier
    pub bag_key: String,
    /// Rich text property holding the bag's display name
    pub bag_name: String,
    /// Name given to a bag created by a scan
    pub bag_default_name: String,
    /// Title property of a box holding its scan identifier
    pub box_key: String,
    /// Rich text property holding the box's display name
    pub box_name: String,
    /// Name given to a box created by a scan
    pub box_default_name: String,
    /// Relation property on a bag pointing at its current box
    pub bag_box_relation: String,
}

impl Default for PropertyNames {
    fn default() -> Self {
        Self {
            bag_key: "Bag ID".to_string(),
            bag_name: "Product name".to_string(),
            bag_default_name: "New part".to_string(),
            box_key: "Box ID".to_string(),
            box_name: "Box name".to_string(),
            box_default_name: "New box".to_string(),
            bag_box_relation: "Current box".to_string(),
        }
    }
}

/// Scan timing section
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TimingConfig {
    /// Delay between accepting a scan and dispatching it
    pub scan_delay_ms: u64,
    /// Lock hold time after a handler finishes
    pub cooldown_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            scan_delay_ms: 100,
            cooldown_ms: 400,
        }
    }
}

/// HTTP control surface section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5740,
        }
    }
}

/// Default config file location: `<config dir>/plamo/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("plamo").join("config.toml"))
}

/// Parse a TOML config file, failing on unreadable or malformed content
pub fn read_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Load a TOML config file with graceful degradation
///
/// A missing file logs a warning and yields defaults. A malformed file is an
/// error, since silently ignoring a typo in a database id is worse than stopping.
pub fn load_toml_config(path: Option<&Path>) -> Result<TomlConfig> {
    let path = match path.map(Path::to_path_buf).or_else(default_config_path) {
        Some(p) => p,
        None => {
            warn!("Could not determine config directory, using defaults");
            return Ok(TomlConfig::default());
        }
    };

    if !path.exists() {
        warn!("Config file {} not found, using defaults", path.display());
        return Ok(TomlConfig::default());
    }

    let config = read_toml_config(&path)?;
    info!("Loaded config from {}", path.display());
    Ok(config)
}

/// Value is present (non-empty, non-whitespace)
pub fn is_present(value: &str) -> bool {
    !value.trim().is_empty()
}

/// Where a resolved value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSource {
    CommandLine,
    Environment,
    Toml,
}

impl std::fmt::Display for ValueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueSource::CommandLine => write!(f, "command line"),
            ValueSource::Environment => write!(f, "environment"),
            ValueSource::Toml => write!(f, "TOML"),
        }
    }
}

/// Resolve a value from CLI → ENV → TOML, ignoring blank values
///
/// Warns when the value is present in more than one source.
pub fn resolve_value(
    name: &str,
    cli_value: Option<&str>,
    env_var_name: &str,
    toml_value: Option<&str>,
) -> Option<(String, ValueSource)> {
    let env_value = std::env::var(env_var_name).ok();

    let candidates = [
        (cli_value.map(str::to_string), ValueSource::CommandLine),
        (env_value, ValueSource::Environment),
        (toml_value.map(str::to_string), ValueSource::Toml),
    ];

    let present: Vec<(String, ValueSource)> = candidates
        .into_iter()
        .filter_map(|(value, source)| value.filter(|v| is_present(v)).map(|v| (v, source)))
        .collect();

    if present.len() > 1 {
        let sources: Vec<String> = present.iter().map(|(_, s)| s.to_string()).collect();
        warn!(
            "{} found in multiple sources: {}. Using {} (highest priority).",
            name,
            sources.join(", "),
            present[0].1
        );
    }

    present.into_iter().next()
}

/// Resolve a value that has no compiled default
pub fn resolve_required(
    name: &str,
    cli_flag: &str,
    cli_value: Option<&str>,
    env_var_name: &str,
    toml_key: &str,
    toml_value: Option<&str>,
) -> Result<String> {
    match resolve_value(name, cli_value, env_var_name, toml_value) {
        Some((value, source)) => {
            info!("{} loaded from {}", name, source);
            Ok(value)
        }
        None => Err(Error::Config(format!(
            "{name} not configured. Please configure using one of:\n\
             1. Command line: {cli_flag} <value>\n\
             2. Environment: {env_var_name}=<value>\n\
             3. TOML config: {toml_key} = \"<value>\""
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TomlConfig::default();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.timing.scan_delay_ms, 100);
        assert_eq!(config.timing.cooldown_ms, 400);
        assert_eq!(config.server.port, 5740);
        assert_eq!(config.properties.bag_key, "Bag ID");
        assert_eq!(config.properties.bag_box_relation, "Current box");
        assert!(config.notion_api_key.is_none());
    }

    #[test]
    fn test_is_present() {
        assert!(is_present("secret_abc"));
        assert!(!is_present(""));
        assert!(!is_present("   \t"));
    }

    #[test]
    fn test_partial_toml_keeps_section_defaults() {
        let config: TomlConfig = toml::from_str(
            r#"
            bag_database_id = "bags"

            [properties]
            box_name = "Label"
            "#,
        )
        .unwrap();

        assert_eq!(config.bag_database_id.as_deref(), Some("bags"));
        assert_eq!(config.properties.box_name, "Label");
        assert_eq!(config.properties.box_key, "Box ID");
        assert_eq!(config.timing, TimingConfig::default());
    }
}
