use std::sync::Arc;

use tokio::sync::mpsc;

use crate::client::{FeedbackRequest, SolveRequest, SolveService};
use crate::conversation::Conversation;
use crate::error::ClientError;
use crate::reply::{Reply, SolveOutcome};
use crate::state::Message;

/// Sent back to the event loop when a request settles.
#[derive(Debug)]
pub struct Resolution {
    pub seq: u64,
    pub outcome: SolveOutcome,
}

/// Drives a [`Conversation`] against a solving service.
///
/// Requests run on spawned tasks; each one sends exactly one [`Resolution`]
/// (wrapped in the caller's event type `E`) into `events`. The owner of the
/// receiving end hands it back through [`SubmissionController::apply`].
pub struct SubmissionController<S: ?Sized, E> {
    conversation: Conversation,
    service: Arc<S>,
    user_id: String,
    events: mpsc::UnboundedSender<E>,
}

impl<S, E> SubmissionController<S, E>
where
    S: SolveService + ?Sized + 'static,
    E: From<Resolution> + Send + 'static,
{
    pub fn new(service: Arc<S>, user_id: &str, events: mpsc::UnboundedSender<E>) -> Self {
        Self {
            conversation: Conversation::new(),
            service,
            user_id: user_id.to_string(),
            events,
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn pending_mut(&mut self) -> &mut String {
        self.conversation.pending_mut()
    }

    pub fn is_busy(&self) -> bool {
        self.conversation.is_busy()
    }

    pub fn service(&self) -> Arc<S> {
        Arc::clone(&self.service)
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Submit `question`; returns whether a request was dispatched.
    ///
    /// Blank questions and questions asked while another is in flight are
    /// dropped without touching the transcript or the network.
    pub fn submit(&mut self, question: &str) -> bool {
        let Some(submission) = self.conversation.submit(question) else {
            tracing::debug!(busy = self.conversation.is_busy(), "submission ignored");
            return false;
        };

        tracing::info!(
            seq = submission.seq,
            chars = submission.question.chars().count(),
            "question submitted"
        );

        let request = SolveRequest {
            user_id: self.user_id.clone(),
            question: submission.question,
        };
        let service = Arc::clone(&self.service);
        let events = self.events.clone();
        let seq = submission.seq;

        // A panic inside the service must still settle the submission
        let request_task = tokio::spawn(async move { service.solve(request).await });
        tokio::spawn(async move {
            let outcome = match request_task.await {
                Ok(outcome) => outcome,
                Err(err) => {
                    tracing::error!(seq, error = %err, "request task failed");
                    Err(ClientError::from(err))
                }
            };
            if events.send(E::from(Resolution { seq, outcome })).is_err() {
                tracing::debug!(seq, "event loop gone before resolution");
            }
        });

        true
    }

    /// Submit whatever is in the input box.
    pub fn submit_pending(&mut self) -> bool {
        let question = self.conversation.pending().to_string();
        self.submit(&question)
    }

    /// Apply a settled request; returns the assistant message it produced.
    pub fn apply(&mut self, resolution: Resolution) -> Option<&Message> {
        let reply = Reply::from_outcome(&resolution.outcome);

        match &resolution.outcome {
            Ok(response) if reply.failed => {
                tracing::warn!(seq = resolution.seq, source = ?response.source, "service reported an error")
            }
            Ok(response) => tracing::info!(seq = resolution.seq, source = ?response.source, "answer received"),
            Err(err) => tracing::warn!(seq = resolution.seq, error = %err, "request failed"),
        }

        let seq = resolution.seq;
        let message = self.conversation.resolve(seq, reply);
        if message.is_none() {
            tracing::warn!(seq, "resolution for a submission that is not in flight");
        }
        message
    }

    /// Feedback payload for the latest answer, if it can be rated.
    pub fn feedback_request(&self, correct: bool) -> Option<FeedbackRequest> {
        let (question, answer) = self.conversation.feedback_target()?;
        Some(FeedbackRequest {
            user_id: self.user_id.clone(),
            question: question.to_string(),
            answer: answer.to_string(),
            correct,
        })
    }
}
