//! Append-only message log for one session.

use crate::state::{ChatRole, Message, MessageId};

/// Ordered log of every message exchanged in a session.
///
/// Appending is crate-private: the conversation state machine is the only
/// writer, front ends get read-only access through [`Transcript::all`].
#[derive(Debug, Default)]
pub struct Transcript {
    messages: Vec<Message>,
    next_id: u64,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a message to the end of the log and return it.
    pub(crate) fn append(&mut self, role: ChatRole, text: String, failed: bool) -> &Message {
        let id = MessageId(self.next_id);
        self.next_id += 1;

        self.messages.push(Message {
            id,
            role,
            text,
            failed,
        });
        &self.messages[self.messages.len() - 1]
    }

    /// All messages in display order.
    pub fn all(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }
}
