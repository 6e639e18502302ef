//! Echo plugin - repeats command arguments back to the chat

use serde::Deserialize;
use tracing::debug;

use crate::application::errors::{CommandError, RegistryError};
use crate::domain::entities::Command;
use crate::plugins::trait_def::Plugin;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
struct EchoConfig {
    reply_prefix: Option<String>,
}

/// Repeats whatever follows the echo command
pub struct Echo {
    reply_prefix: Option<String>,
}

impl Echo {
    pub fn from_config(config: &serde_json::Value) -> Result<Self, RegistryError> {
        let parsed: EchoConfig = serde_json::from_value(config.clone())
            .map_err(|e| RegistryError::Construct("Echo".to_string(), e.to_string()))?;
        Ok(Self { reply_prefix: parsed.reply_prefix })
    }
}

impl Plugin for Echo {
    fn name(&self) -> &str {
        "Echo"
    }

    fn description(&self) -> &str {
        "Repeats messages back"
    }

    fn on_register(&self) {
        debug!("Echo ready (prefix: {:?})", self.reply_prefix);
    }

    fn commands(&self) -> Vec<Command> {
        let prefix = self.reply_prefix.clone();
        vec![Command::new("echo")
            .with_description("Repeat the arguments back")
            .with_usage("/echo <text>")
            .with_aliases(vec!["say".to_string()])
            .with_handler(move |msg| {
                let text = msg.arg_text();
                if text.is_empty() {
                    return Err(CommandError::InvalidArgs("nothing to echo".to_string()));
                }
                Ok(match &prefix {
                    Some(p) => format!("{} {}", p, text),
                    None => text,
                })
            })]
    }
}
