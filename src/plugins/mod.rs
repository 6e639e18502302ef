//! Plugin system for plugbot
//!
//! Plugins are units of optional bot behavior with a declared name, a config
//! fragment, and lifecycle hooks. The registry owns all live instances,
//! constructs them through factory tables resolved at startup, and couples
//! their lifecycle to the bot command table: a plugin's commands are bound
//! when it registers and unbound when it goes away, never partially.

pub mod trait_def;
pub mod factory;
pub mod registry;
pub mod host;
pub mod builtin;

pub use trait_def::{Plugin, Watch, HookEvent, CommandSink};
pub use factory::{FactoryTable, PluginFactory};
pub use registry::PluginRegistry;
pub use host::PlugBot;
