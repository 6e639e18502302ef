//! Plugins bundled with the bot

pub mod echo;
pub mod ping;
pub mod monitor;

pub use echo::Echo;
pub use ping::Ping;
pub use monitor::Monitor;

use super::factory::FactoryTable;
use super::trait_def::Plugin;

/// Stock factory table for the `builtin` package
pub fn factories() -> FactoryTable {
    FactoryTable::new()
        .with("Echo", |cfg| Ok(Box::new(Echo::from_config(cfg)?) as Box<dyn Plugin>))
        .with("Ping", |cfg| Ok(Box::new(Ping::from_config(cfg)?) as Box<dyn Plugin>))
        .with("Monitor", |cfg| Ok(Box::new(Monitor::from_config(cfg)?) as Box<dyn Plugin>))
}
