//! Conversation state for the assistant window.

use serde::{Deserialize, Serialize};

/// First assistant message, shown before the user types anything. Never sent
/// to the relay.
pub const GREETING: &str = "Hi! 👋 I'm your Broto Complain Track assistant. I can help you:\n\n\
• Choose the right complaint category\n\
• Write better complaints\n\
• Answer questions about the app\n\
• Suggest complaint titles\n\n\
How can I assist you today?";

/// Suggested openers offered while the conversation is empty.
pub const QUICK_ACTIONS: [&str; 3] = [
    "Help me choose a category",
    "How do I track my complaint?",
    "Tips for writing a good complaint",
];

/// Assistant turn appended when a reply fails.
pub const ERROR_REPLY: &str = "Sorry, I encountered an error. Please try again later.";

/// Who wrote a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// The signed-in student.
    User,
    /// The chatbot.
    Assistant,
}

/// One turn, in the shape the relay expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Author of the turn.
    pub role: ChatRole,
    /// Text as shown in the window.
    pub content: String,
}

impl ChatMessage {
    /// A turn typed by the student.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    /// A turn written by the chatbot.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// The assistant window: message list plus the in-flight reply.
#[derive(Debug, Clone)]
pub struct ChatSession {
    messages: Vec<ChatMessage>,
    streaming: bool,
    reply: String,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    /// A fresh window holding only the greeting.
    #[must_use]
    pub fn new() -> Self {
        Self {
            messages: vec![ChatMessage::assistant(GREETING)],
            streaming: false,
            reply: String::new(),
        }
    }

    /// Every turn, greeting first.
    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Whether a reply is still arriving.
    #[must_use]
    pub const fn is_streaming(&self) -> bool {
        self.streaming
    }

    /// Quick actions, offered only while the greeting is the sole message.
    #[must_use]
    pub fn quick_actions(&self) -> &'static [&'static str] {
        if self.messages.len() == 1 {
            &QUICK_ACTIONS
        } else {
            &[]
        }
    }

    /// Record the user's message and return the history to send.
    ///
    /// Returns `None` for blank input or while a reply is still streaming.
    /// The greeting is left out of the returned history.
    pub fn begin(&mut self, text: &str) -> Option<Vec<ChatMessage>> {
        let text = text.trim();
        if text.is_empty() || self.streaming {
            return None;
        }

        self.messages.push(ChatMessage::user(text));
        self.streaming = true;
        self.reply.clear();
        Some(self.messages[1..].to_vec())
    }

    /// Append a fragment to the reply, updating the last assistant turn in
    /// place.
    pub fn apply(&mut self, fragment: &str) {
        self.reply.push_str(fragment);

        let in_place = self.messages.len() > 1
            && self
                .messages
                .last()
                .is_some_and(|m| m.role == ChatRole::Assistant);

        if in_place {
            if let Some(last) = self.messages.last_mut() {
                last.content.clone_from(&self.reply);
            }
        } else {
            self.messages.push(ChatMessage::assistant(self.reply.clone()));
        }
    }

    /// The reply finished. Returns its full text.
    pub fn finish(&mut self) -> String {
        self.streaming = false;
        std::mem::take(&mut self.reply)
    }

    /// The reply failed; show the apology turn.
    pub fn fail(&mut self) {
        self.messages.push(ChatMessage::assistant(ERROR_REPLY));
        self.streaming = false;
        self.reply.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_with_greeting_and_quick_actions() {
        let session = ChatSession::new();
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.messages()[0].content, GREETING);
        assert_eq!(session.quick_actions().len(), 3);
    }

    #[test]
    fn test_history_skips_greeting() {
        let mut session = ChatSession::new();
        let history = session.begin("  How do I track my complaint?  ").unwrap();
        assert_eq!(history, [ChatMessage::user("How do I track my complaint?")]);
        assert!(session.quick_actions().is_empty());
    }

    #[test]
    fn test_fragments_update_one_message_in_place() {
        let mut session = ChatSession::new();
        session.begin("hello").unwrap();

        session.apply("Hi");
        assert_eq!(session.messages().len(), 3);
        assert_eq!(session.messages()[2].content, "Hi");

        session.apply(" there");
        assert_eq!(session.messages().len(), 3);
        assert_eq!(session.messages()[2].content, "Hi there");

        assert_eq!(session.finish(), "Hi there");
        assert!(!session.is_streaming());
    }

    #[test]
    fn test_ignores_blank_input_and_input_while_streaming() {
        let mut session = ChatSession::new();
        assert!(session.begin("   ").is_none());
        session.begin("first").unwrap();
        assert!(session.begin("second").is_none());
        assert_eq!(session.messages().len(), 2);
    }

    #[test]
    fn test_failure_appends_apology() {
        let mut session = ChatSession::new();
        session.begin("hello").unwrap();
        session.fail();
        assert_eq!(session.messages().last().unwrap().content, ERROR_REPLY);
        assert!(!session.is_streaming());
    }

    #[test]
    fn test_second_reply_gets_its_own_message() {
        let mut session = ChatSession::new();
        session.begin("one").unwrap();
        session.apply("first answer");
        session.finish();

        session.begin("two").unwrap();
        session.apply("second");
        assert_eq!(session.messages().len(), 5);
        assert_eq!(session.messages()[2].content, "first answer");
        assert_eq!(session.messages()[4].content, "second");
    }

    #[test]
    fn test_roles_serialize_lowercase() {
        let json = serde_json::to_value(ChatMessage::user("hi")).unwrap();
        assert_eq!(json, serde_json::json!({"role": "user", "content": "hi"}));
    }
}
