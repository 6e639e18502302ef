use std::sync::RwLock;

use crate::domain::entities::{Command, CommandRegistry, Message, Content};
use crate::application::errors::CommandError;
use crate::plugins::trait_def::CommandSink;

/// Service for managing and executing commands
///
/// Shared between the host and the plugin registry (as the command sink), so
/// the table sits behind a lock and all methods take `&self`.
pub struct CommandService {
    registry: RwLock<CommandRegistry>,
    prefix: String,
}

/// Owner key for commands the bot itself provides
pub const CORE_OWNER: &str = "core";

impl CommandService {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            registry: RwLock::new(CommandRegistry::new()),
            prefix: prefix.into(),
        }
    }

    pub fn register(&self, owner: &str, command: Command) {
        if let Ok(mut registry) = self.registry.write() {
            registry.register(owner, command);
        }
    }

    pub fn register_defaults(&self) {
        self.register(CORE_OWNER, Command::new("version")
            .with_description("Show bot version")
            .with_handler(|_| {
                Ok(format!("plugbot v{}", env!("CARGO_PKG_VERSION")))
            }));
    }

    pub fn handle(&self, message: &Message) -> Result<Option<String>, CommandError> {
        let Content::Command { name, args: _ } = &message.content else {
            return Ok(None);
        };

        let registry = self.registry.read()
            .map_err(|_| CommandError::ExecutionFailed("Lock poisoned".to_string()))?;

        let cmd = registry.find(name)
            .ok_or_else(|| CommandError::NotFound(name.clone()))?;

        if let Some(handler) = &cmd.handler {
            Ok(Some(handler(message.clone())?))
        } else {
            Ok(Some(format!("Command {} not implemented", cmd.name)))
        }
    }

    pub fn get_help(&self, command: Option<&str>) -> String {
        let Ok(registry) = self.registry.read() else {
            return "Commands unavailable".to_string();
        };

        if let Some(name) = command {
            if let Some(cmd) = registry.get(name) {
                let mut help = format!("{}{} - {}", self.prefix, cmd.name, cmd.description.as_deref().unwrap_or("No description"));
                if let Some(usage) = &cmd.usage {
                    help.push_str(&format!("\nUsage: {}", usage));
                }
                return help;
            }
            return format!("Command {}{} not found", self.prefix, name);
        }

        // List all visible commands
        let mut commands: Vec<&Command> = registry.all().filter(|c| !c.hidden).collect();
        commands.sort_by(|a, b| a.name.cmp(&b.name));
        let mut help = "Available commands:\n".to_string();
        for cmd in commands {
            help.push_str(&format!("  {}{} - {}\n", self.prefix, cmd.name, cmd.description.as_deref().unwrap_or("")));
        }
        help
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn len(&self) -> usize {
        self.registry.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CommandSink for CommandService {
    fn bind_commands(&self, owner: &str, commands: Vec<Command>) {
        tracing::debug!("Binding {} command(s) from {}", commands.len(), owner);
        for command in commands {
            self.register(owner, command);
        }
    }

    fn unbind_commands(&self, owner: &str) {
        if let Ok(mut registry) = self.registry.write() {
            let removed = registry.remove_owner(owner);
            if removed > 0 {
                tracing::debug!("Unbound {} command(s) from {}", removed, owner);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_dispatches_to_handler() {
        let service = CommandService::new("/");
        service.register("core", Command::new("greet")
            .with_handler(|msg| Ok(format!("hello {}", msg.arg_text()))));

        let msg = Message::from_command("chat", "greet", vec!["world".to_string()]);
        let reply = service.handle(&msg).unwrap();
        assert_eq!(reply, Some("hello world".to_string()));
    }

    #[test]
    fn test_handle_ignores_plain_text() {
        let service = CommandService::new("/");
        let msg = Message::from_text("chat", "just chatting");
        assert!(service.handle(&msg).unwrap().is_none());
    }

    #[test]
    fn test_handle_unknown_command() {
        let service = CommandService::new("/");
        let msg = Message::from_command("chat", "missing", vec![]);
        let err = service.handle(&msg).unwrap_err();
        assert!(matches!(err, CommandError::NotFound(_)));
    }

    #[test]
    fn test_sink_unbind_removes_owner_commands() {
        let service = CommandService::new("/");
        service.register_defaults();
        service.bind_commands("Echo", vec![Command::new("echo")]);
        assert_eq!(service.len(), 2);

        service.unbind_commands("Echo");
        assert_eq!(service.len(), 1);

        let msg = Message::from_command("chat", "echo", vec![]);
        assert!(service.handle(&msg).is_err());
    }

    #[test]
    fn test_get_help_lists_visible_commands() {
        let service = CommandService::new("/");
        service.register("core", Command::new("visible").with_description("Shown"));
        service.register("core", Command::new("secret").hidden());

        let help = service.get_help(None);
        assert!(help.contains("/visible"));
        assert!(!help.contains("/secret"));
    }
}
