//! UI-agnostic conversation types
//!
//! These types are shared by every front end and don't depend on any
//! rendering framework.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a message within one session.
///
/// Ids are handed out by the transcript in append order, so comparing two
/// ids tells you which message was created first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MessageId(pub u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub role: ChatRole,
    pub text: String,
    /// Set on assistant messages that report a service error or a failed request
    pub failed: bool,
}

impl Message {
    pub fn is_user(&self) -> bool {
        self.role == ChatRole::User
    }

    pub fn is_assistant(&self) -> bool {
        self.role == ChatRole::Assistant
    }
}

/// The role of a message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn label(&self) -> &'static str {
        match self {
            ChatRole::User => "You",
            ChatRole::Assistant => "Tutor",
        }
    }
}
