//! Conversation state: the ordered message sequence sent to the chat API

use serde::Serialize;

/// System prompt establishing the roleplay partner persona
const SYSTEM_PROMPT: &str = "You are a friendly conversation partner. The user \
wants to practice an everyday spoken situation. Play the other person in that \
situation naturally. Keep replies short and conversational, one or two \
sentences, as they will be spoken aloud.";

/// Instruction that kicks off the roleplay once the situation is set
const START_INSTRUCTION: &str = "start";

/// Message role in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single chat message. Immutable once appended.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// The ordered, append-only message sequence for one practice session.
///
/// Each request to the chat API carries the full sequence, so the sequence
/// sent on turn N strictly extends the one sent on turn N-1 until `clear()`.
#[derive(Debug, Default)]
pub struct Conversation {
    messages: Vec<Message>,
    first_turn_done: bool,
    session: u64,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn is_first_turn(&self) -> bool {
        !self.first_turn_done
    }

    /// Identifies the current session; changes on every `clear()`, so a
    /// reply tagged with an older value belongs to a discarded conversation
    pub fn session(&self) -> u64 {
        self.session
    }

    /// Append a message to the sequence
    pub fn push(&mut self, role: Role, content: impl Into<String>) {
        self.messages.push(Message::new(role, content));
    }

    /// Empty the sequence and rearm the first-turn scaffold
    pub fn clear(&mut self) {
        self.messages.clear();
        self.first_turn_done = false;
        self.session += 1;
    }

    /// Record one user utterance.
    ///
    /// The first utterance of a session names the situation to practice, so
    /// it expands into the system prompt, a "Situation: ..." framing message,
    /// and the start instruction. Later utterances are appended as-is.
    pub fn begin_turn(&mut self, utterance: &str) {
        if self.first_turn_done {
            self.push(Role::User, utterance);
        } else {
            self.push(Role::System, SYSTEM_PROMPT);
            self.push(Role::User, format!("Situation: {utterance}"));
            self.push(Role::User, START_INSTRUCTION);
            self.first_turn_done = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_conversation_is_empty_first_turn() {
        let conv = Conversation::new();
        assert!(conv.is_empty());
        assert!(conv.is_first_turn());
    }

    #[test]
    fn test_push_appends_exactly_one() {
        let mut conv = Conversation::new();
        conv.push(Role::User, "hello");
        assert_eq!(conv.messages().len(), 1);
        conv.push(Role::Assistant, "hi there");
        assert_eq!(conv.messages().len(), 2);
        // Prior order preserved
        assert_eq!(conv.messages()[0].content, "hello");
        assert_eq!(conv.messages()[1].content, "hi there");
    }

    #[test]
    fn test_clear_resets_sequence_and_first_turn() {
        let mut conv = Conversation::new();
        conv.begin_turn("I am ordering coffee");
        conv.push(Role::Assistant, "Hi, what can I get you?");
        assert!(!conv.is_first_turn());

        conv.clear();
        assert!(conv.is_empty());
        assert!(conv.is_first_turn());
    }

    #[test]
    fn test_first_turn_scaffold() {
        let mut conv = Conversation::new();
        conv.begin_turn("I am ordering coffee");

        let messages = conv.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].role, Role::User);
        assert_eq!(messages[1].content, "Situation: I am ordering coffee");
        assert_eq!(messages[2].role, Role::User);
        assert_eq!(messages[2].content, "start");
    }

    #[test]
    fn test_later_turns_append_verbatim() {
        let mut conv = Conversation::new();
        conv.begin_turn("I am ordering coffee");
        conv.push(Role::Assistant, "Hi, what can I get you?");
        conv.begin_turn("A large oat milk latte, please");

        let messages = conv.messages();
        assert_eq!(messages.len(), 5);
        assert_eq!(messages[4].role, Role::User);
        assert_eq!(messages[4].content, "A large oat milk latte, please");
    }

    #[test]
    fn test_clear_then_new_situation_rebuilds_scaffold() {
        let mut conv = Conversation::new();
        conv.begin_turn("I am ordering coffee");
        conv.clear();
        conv.begin_turn("I am checking into a hotel");

        let messages = conv.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].content, "Situation: I am checking into a hotel");
    }

    #[test]
    fn test_clear_invalidates_session() {
        let mut conv = Conversation::new();
        conv.begin_turn("I am ordering coffee");
        let session = conv.session();

        // Appending stays within the session
        conv.push(Role::Assistant, "Hi, what can I get you?");
        assert_eq!(conv.session(), session);

        // Clearing starts a new one, so a late reply tagged with the old
        // session can be recognized and dropped
        conv.clear();
        assert_ne!(conv.session(), session);
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::System).unwrap(), "\"system\"");
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(
            serde_json::to_string(&Role::Assistant).unwrap(),
            "\"assistant\""
        );
    }
}
