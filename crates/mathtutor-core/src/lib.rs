pub mod client;
pub mod config;
pub mod controller;
pub mod conversation;
pub mod error;
pub mod logging;
pub mod reply;
pub mod state;
pub mod transcript;

// Re-export main types for convenience
pub use client::{
    FeedbackRequest, FeedbackResponse, ServiceStatus, SolveRequest, SolveResponse, SolveService,
    SolverClient,
};
pub use config::Config;
pub use controller::{Resolution, SubmissionController};
pub use conversation::{Conversation, Submission, View};
pub use error::ClientError;
pub use reply::{Reply, SolveOutcome, FALLBACK_ANSWER};
pub use state::{ChatRole, Message, MessageId};
pub use transcript::Transcript;
