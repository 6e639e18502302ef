//! Ping plugin - liveness and uptime commands

use chrono::{DateTime, Utc};

use crate::application::errors::RegistryError;
use crate::domain::entities::Command;
use crate::plugins::trait_def::Plugin;

/// Answers ping and reports how long the plugin has been up
///
/// The start time is set at construction, so a reload resets it.
pub struct Ping {
    started: DateTime<Utc>,
}

impl Ping {
    pub fn from_config(_config: &serde_json::Value) -> Result<Self, RegistryError> {
        Ok(Self { started: Utc::now() })
    }
}

impl Plugin for Ping {
    fn name(&self) -> &str {
        "Ping"
    }

    fn description(&self) -> &str {
        "Liveness check and uptime"
    }

    fn commands(&self) -> Vec<Command> {
        let started = self.started;
        vec![
            Command::new("ping")
                .with_description("Check the bot is alive")
                .with_handler(|_| Ok("pong".to_string())),
            Command::new("uptime")
                .with_description("Show time since the plugin registered")
                .with_handler(move |_| {
                    let elapsed = Utc::now().signed_duration_since(started);
                    let secs = elapsed.num_seconds().max(0);
                    Ok(format!("up {}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60))
                }),
        ]
    }
}
