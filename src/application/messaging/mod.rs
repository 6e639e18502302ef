//! Message handling

pub mod parser;

pub use parser::MessageParser;
