//! Monitor plugin - tracks another plugin's lifecycle transitions

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use crate::application::errors::RegistryError;
use crate::domain::entities::Command;
use crate::plugins::trait_def::{Plugin, Watch};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct MonitorConfig {
    watch: String,
}

/// Counts register/unregister transitions of a watched plugin
#[derive(Debug)]
pub struct Monitor {
    target: String,
    registrations: Arc<AtomicUsize>,
    unregistrations: Arc<AtomicUsize>,
}

impl Monitor {
    pub fn from_config(config: &serde_json::Value) -> Result<Self, RegistryError> {
        let parsed: MonitorConfig = serde_json::from_value(config.clone())
            .map_err(|e| RegistryError::Construct("Monitor".to_string(), e.to_string()))?;
        Ok(Self {
            target: parsed.watch,
            registrations: Arc::new(AtomicUsize::new(0)),
            unregistrations: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub fn registrations(&self) -> usize {
        self.registrations.load(Ordering::SeqCst)
    }

    pub fn unregistrations(&self) -> usize {
        self.unregistrations.load(Ordering::SeqCst)
    }
}

impl Plugin for Monitor {
    fn name(&self) -> &str {
        "Monitor"
    }

    fn description(&self) -> &str {
        "Reports lifecycle transitions of a watched plugin"
    }

    fn watches(&self) -> Vec<Watch> {
        let registrations = self.registrations.clone();
        let unregistrations = self.unregistrations.clone();
        vec![
            Watch::on_register(self.target.clone(), move |plugin| {
                info!("Monitor: {} registered", plugin.name());
                registrations.fetch_add(1, Ordering::SeqCst);
            }),
            Watch::on_unregister(self.target.clone(), move |plugin| {
                info!("Monitor: {} unregistered", plugin.name());
                unregistrations.fetch_add(1, Ordering::SeqCst);
            }),
        ]
    }

    fn commands(&self) -> Vec<Command> {
        let target = self.target.clone();
        let registrations = self.registrations.clone();
        let unregistrations = self.unregistrations.clone();
        vec![Command::new("monitor")
            .with_description("Show watched plugin transition counts")
            .with_handler(move |_| {
                Ok(format!(
                    "{}: {} registration(s), {} unregistration(s)",
                    target,
                    registrations.load(Ordering::SeqCst),
                    unregistrations.load(Ordering::SeqCst),
                ))
            })]
    }
}
