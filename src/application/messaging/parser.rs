//! Message parser - Parses raw text into structured messages

use crate::domain::entities::{Message, Content, MessageType, User};

/// Parses incoming text into structured Message objects
pub struct MessageParser {
    command_prefix: String,
}

impl MessageParser {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            command_prefix: prefix.into(),
        }
    }

    /// Parse a text message
    pub fn parse(&self, chat_id: impl Into<String>, text: impl Into<String>, sender: Option<User>) -> Message {
        let text = text.into();
        let chat_id = chat_id.into();

        if text.starts_with(&self.command_prefix) {
            return self.parse_command(chat_id, text, sender);
        }

        Message::new(chat_id, Content::Text(text))
            .with_message_type(MessageType::Text)
            .with_sender_opt(sender)
    }

    fn parse_command(&self, chat_id: String, text: String, sender: Option<User>) -> Message {
        let cmd_text = text.trim_start_matches(&self.command_prefix);

        let parts: Vec<&str> = cmd_text.split_whitespace().collect();
        let name = parts.first().unwrap_or(&"").to_string();
        let args = parts
            .get(1..)
            .map(|s| s.iter().map(|s| s.to_string()).collect())
            .unwrap_or_default();

        Message::new(chat_id, Content::Command { name, args })
            .with_message_type(MessageType::Command)
            .with_sender_opt(sender)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command_with_args() {
        let parser = MessageParser::new("/");
        let msg = parser.parse("chat", "/echo hello world", None);
        assert_eq!(msg.content, Content::Command {
            name: "echo".to_string(),
            args: vec!["hello".to_string(), "world".to_string()],
        });
        assert_eq!(msg.message_type, MessageType::Command);
    }

    #[test]
    fn test_parse_plain_text() {
        let parser = MessageParser::new("/");
        let msg = parser.parse("chat", "no command here", None);
        assert_eq!(msg.content, Content::Text("no command here".to_string()));
    }

    #[test]
    fn test_parse_custom_prefix() {
        let parser = MessageParser::new("!");
        let msg = parser.parse("chat", "!ping", None);
        assert!(msg.content.is_command());

        let msg = parser.parse("chat", "/ping", None);
        assert!(!msg.content.is_command());
    }
}
