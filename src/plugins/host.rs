//! PlugBot host - drives the plugin registry from configuration

use std::sync::Arc;
use tracing::{error, info};

use crate::application::errors::CommandError;
use crate::application::services::command_service::{CommandService, CORE_OWNER};
use crate::domain::entities::{Command, Content, Message};
use crate::infrastructure::config::Config;
use super::factory::FactoryTable;
use super::registry::PluginRegistry;

/// Base for bots that are pluggable
///
/// Owns one plugin registry and one command service, and drives
/// start/stop/reset from the loaded configuration. One bad plugin never
/// aborts startup of the others; failures are logged per plugin.
pub struct PlugBot {
    config: Config,
    registry: PluginRegistry,
    commands: Arc<CommandService>,
}

impl PlugBot {
    pub fn new(config: Config, factories: FactoryTable) -> Self {
        let commands = Arc::new(CommandService::new(&config.bot.prefix));
        commands.register_defaults();

        // help needs the service itself; a weak handle avoids the cycle
        let svc = Arc::downgrade(&commands);
        commands.register(CORE_OWNER, Command::new("help")
            .with_description("Show help message")
            .with_usage("/help [command]")
            .with_handler(move |msg| {
                let Some(service) = svc.upgrade() else {
                    return Err(CommandError::ExecutionFailed("Command service gone".to_string()));
                };
                let topic = match &msg.content {
                    Content::Command { args, .. } => args.first().cloned(),
                    _ => None,
                };
                Ok(service.get_help(topic.as_deref()))
            }));

        let mut registry = PluginRegistry::new(config.plugins.package.clone(), factories);
        registry.bind_sink(commands.clone());

        Self { config, registry, commands }
    }

    /// Register every plugin the configuration declares
    pub fn start(&mut self) {
        info!("Starting PlugBot");
        let declarations = self.config.plugins.bot.clone();
        for decl in declarations {
            let config = decl.config.clone().unwrap_or_else(|| serde_json::json!({}));
            let outcome = self.registry.register_with(
                &decl.name,
                config,
                decl.module.as_deref(),
                decl.package.as_deref(),
            );
            match outcome {
                Ok(true) => info!("Registering plugin {} OK", decl.name),
                Ok(false) => info!("Plugin {} already registered", decl.name),
                Err(e) => {
                    error!("Error while registering plugin {}: {}", decl.name, e);
                    info!("Registering plugin {} FAILED", decl.name);
                }
            }
        }
    }

    /// Unregister every active plugin
    pub fn stop(&mut self) {
        info!("Stopping PlugBot");
        for name in self.registry.names() {
            self.registry.unregister(&name);
        }
    }

    /// Full reload from configuration, discarding in-memory plugin state
    pub fn reset(&mut self) {
        self.stop();
        self.start();
    }

    /// Dispatch a parsed message through the command table
    pub fn handle(&self, message: &Message) -> Result<Option<String>, CommandError> {
        self.commands.handle(message)
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut PluginRegistry {
        &mut self.registry
    }

    pub fn commands(&self) -> &Arc<CommandService> {
        &self.commands
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::config::{Config, PluginDecl};
    use crate::plugins::builtin;
    use serde_json::json;

    fn test_config(plugins: Vec<PluginDecl>) -> Config {
        let mut config = Config::default();
        config.plugins.bot = plugins;
        config
    }

    #[test]
    fn test_start_registers_configured_plugins() {
        let config = test_config(vec![
            PluginDecl::named("Echo"),
            PluginDecl::named("Ping"),
        ]);
        let mut bot = PlugBot::new(config, builtin::factories());

        bot.start();
        assert!(bot.registry().contains("Echo"));
        assert!(bot.registry().contains("Ping"));
    }

    #[test]
    fn test_start_continues_past_bad_plugin() {
        let config = test_config(vec![
            PluginDecl::named("NoSuchPlugin"),
            PluginDecl::named("Echo"),
        ]);
        let mut bot = PlugBot::new(config, builtin::factories());

        bot.start();
        assert!(!bot.registry().contains("NoSuchPlugin"));
        assert!(bot.registry().contains("Echo"));
    }

    #[test]
    fn test_stop_drains_registry_and_commands() {
        let config = test_config(vec![PluginDecl::named("Echo")]);
        let mut bot = PlugBot::new(config, builtin::factories());
        bot.start();

        let core_commands = 2; // help + version
        assert_eq!(bot.commands().len(), core_commands + 1);

        bot.stop();
        assert!(bot.registry().is_empty());
        assert_eq!(bot.commands().len(), core_commands);
    }

    #[test]
    fn test_reset_discards_plugin_state() {
        let config = test_config(vec![PluginDecl {
            name: "Echo".to_string(),
            module: None,
            package: None,
            config: Some(json!({"reply-prefix": "said:"})),
        }]);
        let mut bot = PlugBot::new(config, builtin::factories());
        bot.start();
        let before = bot.registry().get("Echo").unwrap();

        bot.reset();
        let after = bot.registry().get("Echo").unwrap();
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(bot.registry().config_of("Echo"), Some(&json!({"reply-prefix": "said:"})));
    }

    #[test]
    fn test_handle_routes_plugin_command() {
        let config = test_config(vec![PluginDecl::named("Ping")]);
        let mut bot = PlugBot::new(config, builtin::factories());
        bot.start();

        let msg = Message::from_command("chat", "ping", vec![]);
        assert_eq!(bot.handle(&msg).unwrap(), Some("pong".to_string()));
    }

    #[test]
    fn test_help_lists_plugin_commands() {
        let config = test_config(vec![PluginDecl::named("Echo")]);
        let mut bot = PlugBot::new(config, builtin::factories());
        bot.start();

        let msg = Message::from_command("chat", "help", vec![]);
        let help = bot.handle(&msg).unwrap().unwrap();
        assert!(help.contains("/echo"));
        assert!(help.contains("/version"));
    }
}
