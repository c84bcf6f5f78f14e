//! Conversation state machine
//!
//! A [`Conversation`] owns the transcript, the text the user is typing and
//! the single in-flight submission. Every change goes through one of two
//! transitions:
//!
//! - [`Conversation::submit`] echoes the question, clears the input and
//!   marks the session busy in one step.
//! - [`Conversation::resolve`] appends the assistant reply and clears busy.
//!
//! Nothing here performs I/O, so front ends and tests can drive it directly.

use crate::reply::Reply;
use crate::state::{ChatRole, Message, MessageId};
use crate::transcript::Transcript;

/// A question that has been accepted and is waiting for its reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// Sequence number; a reply is only accepted for the matching submission
    pub seq: u64,
    /// The question exactly as typed, captured at dispatch time
    pub question: String,
    /// Id of the echoed user message
    pub message_id: MessageId,
}

#[derive(Debug, Default)]
pub struct Conversation {
    transcript: Transcript,
    pending: String,
    in_flight: Option<Submission>,
    next_seq: u64,
}

/// Everything a renderer needs, derived from the conversation.
#[derive(Debug, Clone, Copy)]
pub struct View<'a> {
    pub messages: &'a [Message],
    pub pending: &'a str,
    pub busy: bool,
    pub submit_enabled: bool,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn messages(&self) -> &[Message] {
        self.transcript.all()
    }

    pub fn pending(&self) -> &str {
        &self.pending
    }

    /// Input text is editable at any time, including while busy.
    pub fn pending_mut(&mut self) -> &mut String {
        &mut self.pending
    }

    pub fn set_pending(&mut self, text: impl Into<String>) {
        self.pending = text.into();
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn in_flight(&self) -> Option<&Submission> {
        self.in_flight.as_ref()
    }

    pub fn can_submit(&self) -> bool {
        !self.is_busy() && !self.pending.trim().is_empty()
    }

    pub fn view(&self) -> View<'_> {
        View {
            messages: self.messages(),
            pending: &self.pending,
            busy: self.is_busy(),
            submit_enabled: self.can_submit(),
        }
    }

    /// Accept a question, or do nothing if it is blank or another one is in flight.
    ///
    /// On acceptance the user message is appended, the pending input is
    /// cleared and the session becomes busy before this returns.
    pub fn submit(&mut self, question: &str) -> Option<Submission> {
        if question.trim().is_empty() || self.is_busy() {
            return None;
        }

        let message_id = self
            .transcript
            .append(ChatRole::User, question.to_string(), false)
            .id;

        let submission = Submission {
            seq: self.next_seq,
            question: question.to_string(),
            message_id,
        };
        self.next_seq += 1;

        self.pending.clear();
        self.in_flight = Some(submission.clone());
        Some(submission)
    }

    /// Settle the in-flight submission `seq` with `reply`.
    ///
    /// Returns the appended assistant message, or `None` when `seq` is not
    /// the submission currently in flight (already settled or never issued).
    pub fn resolve(&mut self, seq: u64, reply: Reply) -> Option<&Message> {
        match &self.in_flight {
            Some(submission) if submission.seq == seq => {}
            _ => return None,
        }

        self.in_flight = None;
        Some(self.transcript.append(ChatRole::Assistant, reply.text, reply.failed))
    }

    /// The latest question and its answer, if that answer can be rated.
    ///
    /// Failed replies can't be rated, and nothing can while a question is in flight.
    pub fn feedback_target(&self) -> Option<(&str, &str)> {
        if self.is_busy() {
            return None;
        }

        let messages = self.messages();
        let answer = messages.last().filter(|m| m.is_assistant() && !m.failed)?;
        let question = messages[..messages.len() - 1]
            .iter()
            .rev()
            .find(|m| m.is_user())?;

        Some((question.text.as_str(), answer.text.as_str()))
    }
}
