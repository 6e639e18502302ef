//! Plugin trait definitions

use std::sync::Arc;
use crate::domain::entities::Command;

/// Core plugin trait that all plugins must implement
///
/// Hooks take `&self`; plugins that need mutable state use interior
/// mutability. Registration order for a freshly inserted plugin is: watches
/// adopted, commands bound, `on_register`, subscribers notified, entry made
/// visible in the registry.
pub trait Plugin: Send + Sync {
    /// Unique identifier for the plugin; must equal the registry key
    fn name(&self) -> &str;

    /// Human-readable description
    fn description(&self) -> &str {
        ""
    }

    /// Called while the plugin is being registered, before it becomes
    /// visible to other plugins
    fn on_register(&self) {}

    /// Called after the plugin has been removed from visibility
    fn on_unregister(&self) {}

    /// Bot commands this plugin contributes to the host command table
    fn commands(&self) -> Vec<Command> {
        Vec::new()
    }

    /// Cross-plugin subscriptions: callbacks to run when the named plugins
    /// register or unregister
    fn watches(&self) -> Vec<Watch> {
        Vec::new()
    }
}

impl std::fmt::Debug for dyn Plugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Plugin").field("name", &self.name()).finish()
    }
}

/// Transition a watch subscribes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookEvent {
    Register,
    Unregister,
}

/// Callback invoked with the plugin that just transitioned
pub type HookFn = Arc<dyn Fn(&dyn Plugin) + Send + Sync>;

/// A declared interest in another plugin's lifecycle
///
/// If the target is already registered when the watch is adopted, the
/// callback fires immediately as well.
#[derive(Clone)]
pub struct Watch {
    pub target: String,
    pub event: HookEvent,
    pub callback: HookFn,
}

impl Watch {
    pub fn on_register<F>(target: impl Into<String>, callback: F) -> Self
    where
        F: Fn(&dyn Plugin) + Send + Sync + 'static,
    {
        Self {
            target: target.into(),
            event: HookEvent::Register,
            callback: Arc::new(callback),
        }
    }

    pub fn on_unregister<F>(target: impl Into<String>, callback: F) -> Self
    where
        F: Fn(&dyn Plugin) + Send + Sync + 'static,
    {
        Self {
            target: target.into(),
            event: HookEvent::Unregister,
            callback: Arc::new(callback),
        }
    }
}

/// Host-side command table the registry binds plugin commands into
///
/// Implemented by the host's command service; the registry only calls these
/// two entry points and never dispatches messages itself.
pub trait CommandSink: Send + Sync {
    /// Add all commands contributed by `owner`
    fn bind_commands(&self, owner: &str, commands: Vec<Command>);

    /// Remove every command contributed by `owner`
    fn unbind_commands(&self, owner: &str);
}
