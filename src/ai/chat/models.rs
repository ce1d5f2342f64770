//! The core models for managing a stateful chat with an LLM.
use crate::openai::{Message, Role};

/// Messages of one session in the order they happened. Only ever
/// grows and is never persisted.
#[derive(Default, Debug, Clone)]
pub struct Transcript(Vec<Message>);

impl Transcript {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn new_with_system_message(system_message: &str) -> Self {
        Self(vec![Message::new(Role::System, system_message)])
    }

    pub fn messages(&self) -> &[Message] {
        &self.0
    }

    pub fn push(&mut self, msg: Message) {
        self.0.push(msg)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.0.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.0.iter()
    }

    /// Copy of the transcript with `fact` inserted as a user message
    /// right after the system message. Leaves the transcript as is.
    pub fn with_context(&self, fact: &str) -> Vec<Message> {
        let mut messages = self.0.clone();
        let position = match messages.first() {
            Some(m) if m.role == Role::System => 1,
            _ => 0,
        };
        messages.insert(position, Message::new(Role::User, fact));
        messages
    }
}
