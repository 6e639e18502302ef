//! plugbot - a pluggable chat-bot core
//!
//! A dictionary-like plugin registry with explicit factory tables, lifecycle
//! hooks, cross-plugin lifecycle subscriptions, and command-table binding,
//! driven by a configurable host.

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod plugins;
