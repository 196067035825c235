//! Configuration resolution for plamo-scanner
//!
//! The Notion API key and the two database ids are required and resolved with
//! CLI → ENV → TOML priority. Everything else comes from the TOML file or
//! compiled defaults.

use crate::scanner::{CollectionSchema, ScannerSettings};
use plamo_common::config::{
    resolve_required, PropertyNames, ServerConfig, TimingConfig, TomlConfig,
    DEFAULT_NOTION_BASE_URL, ENV_BAG_DATABASE_ID, ENV_BOX_DATABASE_ID, ENV_NOTION_API_KEY,
};
use plamo_common::Result;
use std::time::Duration;

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub notion_api_key: Option<String>,
    pub bag_database_id: Option<String>,
    pub box_database_id: Option<String>,
    pub opener_command: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Fully resolved runtime configuration
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub notion_api_key: String,
    pub bag_database_id: String,
    pub box_database_id: String,
    pub notion_base_url: String,
    /// None: open pages through SSE subscribers instead of a command
    pub opener_command: Option<String>,
    pub properties: PropertyNames,
    pub timing: TimingConfig,
    pub server: ServerConfig,
}

/// Resolve the runtime configuration
pub fn resolve_config(toml: &TomlConfig, overrides: &ConfigOverrides) -> Result<ResolvedConfig> {
    let notion_api_key = resolve_required(
        "Notion API key",
        "--notion-api-key",
        overrides.notion_api_key.as_deref(),
        ENV_NOTION_API_KEY,
        "notion_api_key",
        toml.notion_api_key.as_deref(),
    )?;

    let bag_database_id = resolve_required(
        "Bag database id",
        "--bag-database-id",
        overrides.bag_database_id.as_deref(),
        ENV_BAG_DATABASE_ID,
        "bag_database_id",
        toml.bag_database_id.as_deref(),
    )?;

    let box_database_id = resolve_required(
        "Box database id",
        "--box-database-id",
        overrides.box_database_id.as_deref(),
        ENV_BOX_DATABASE_ID,
        "box_database_id",
        toml.box_database_id.as_deref(),
    )?;

    let mut server = toml.server.clone();
    if let Some(host) = &overrides.host {
        server.host = host.clone();
    }
    if let Some(port) = overrides.port {
        server.port = port;
    }

    Ok(ResolvedConfig {
        notion_api_key,
        bag_database_id,
        box_database_id,
        notion_base_url: toml
            .notion_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_NOTION_BASE_URL.to_string()),
        opener_command: overrides
            .opener_command
            .clone()
            .or_else(|| toml.opener_command.clone())
            .filter(|c| plamo_common::config::is_present(c)),
        properties: toml.properties.clone(),
        timing: toml.timing,
        server,
    })
}

impl ResolvedConfig {
    /// Dispatcher settings derived from the database ids, property names and timing
    pub fn scanner_settings(&self) -> ScannerSettings {
        let p = &self.properties;
        ScannerSettings {
            bags: CollectionSchema {
                database_id: self.bag_database_id.clone(),
                key_property: p.bag_key.clone(),
                name_property: p.bag_name.clone(),
                default_name: p.bag_default_name.clone(),
            },
            boxes: CollectionSchema {
                database_id: self.box_database_id.clone(),
                key_property: p.box_key.clone(),
                name_property: p.box_name.clone(),
                default_name: p.box_default_name.clone(),
            },
            scan_delay: Duration::from_millis(self.timing.scan_delay_ms),
            cooldown: Duration::from_millis(self.timing.cooldown_ms),
        }
    }

    /// Address for the HTTP control surface
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
