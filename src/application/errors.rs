//! Application layer errors

use thiserror::Error;

/// General bot errors
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Plugin registry errors
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Unknown package: {0}")]
    UnknownPackage(String),

    #[error("No factory for plugin '{module}' in package '{package}'")]
    UnknownPlugin { package: String, module: String },

    #[error("Plugin '{0}' failed to construct: {1}")]
    Construct(String, String),

    #[error("Plugin named '{actual}' cannot be stored under key '{expected}'")]
    NameMismatch { expected: String, actual: String },

    #[error("Plugin '{0}' already registered")]
    AlreadyRegistered(String),

    #[error("Plugin '{0}' is not registered")]
    NotRegistered(String),
}

/// Command execution errors
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Command not found: {0}")]
    NotFound(String),

    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Parse error: {0}")]
    Parse(String),
}
