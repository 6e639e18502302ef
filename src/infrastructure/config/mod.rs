//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use crate::application::errors::ConfigError;

/// Bot configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub bot: BotConfig,
    pub plugins: PluginsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct BotConfig {
    pub name: String,
    pub prefix: String,
}

/// Which plugins to register at startup
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct PluginsConfig {
    /// Default factory package for declarations that name none
    #[serde(default = "default_package")]
    pub package: String,

    /// Bot plugin declarations, registered in order
    #[serde(default)]
    pub bot: Vec<PluginDecl>,
}

fn default_package() -> String {
    "builtin".to_string()
}

/// One configured plugin
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct PluginDecl {
    pub name: String,

    /// Factory-table entry to construct from; defaults to `name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,

    /// Factory package to look in; defaults to the plugins-level package
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,

    /// Config fragment handed to the plugin's factory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<serde_json::Value>,
}

impl PluginDecl {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            module: None,
            package: None,
            config: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bot: BotConfig {
                name: "plugbot".to_string(),
                prefix: "/".to_string(),
            },
            plugins: PluginsConfig {
                package: default_package(),
                bot: vec![
                    PluginDecl::named("Echo"),
                    PluginDecl::named("Ping"),
                    PluginDecl {
                        name: "Monitor".to_string(),
                        module: None,
                        package: None,
                        config: Some(serde_json::json!({"watch": "Echo"})),
                    },
                ],
            },
        }
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read config: {}", e)))?;

        serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))
    }

    pub fn load_env() -> Self {
        let mut config = Config::default();

        if let Ok(name) = std::env::var("BOT_NAME") {
            config.bot.name = name;
        }
        if let Ok(prefix) = std::env::var("BOT_PREFIX") {
            config.bot.prefix = prefix;
        }

        config
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self)
            .map_err(|e| ConfigError::InvalidValue(format!("Failed to serialize config: {}", e)))
    }
}
