//! Turning a settled request into the text of an assistant message.

use std::error::Error as _;

use crate::client::SolveResponse;
use crate::error::ClientError;

/// Shown when the service answered but said nothing.
pub const FALLBACK_ANSWER: &str = "No answer provided.";

/// Marks an error the service reported about the question.
pub const ERROR_PREFIX: &str = "Error: ";

/// Marks a request that never produced a usable response.
pub const FAILURE_PREFIX: &str = "Request failed: ";

/// How a request settled.
pub type SolveOutcome = Result<SolveResponse, ClientError>;

/// Text and styling for one assistant message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub failed: bool,
}

impl Reply {
    pub fn from_outcome(outcome: &SolveOutcome) -> Self {
        match outcome {
            Ok(response) => Self::from_response(response),
            Err(err) => Self::from_failure(err),
        }
    }

    /// `error` wins over `answer`; empty strings count as absent.
    pub fn from_response(response: &SolveResponse) -> Self {
        let present = |field: &Option<String>| {
            field
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .map(str::to_string)
        };

        if let Some(error) = present(&response.error) {
            return Self {
                text: format!("{}{}", ERROR_PREFIX, error),
                failed: true,
            };
        }

        match present(&response.answer) {
            Some(answer) => Self {
                text: answer,
                failed: false,
            },
            None => Self {
                text: FALLBACK_ANSWER.to_string(),
                failed: false,
            },
        }
    }

    pub fn from_failure(err: &ClientError) -> Self {
        Self {
            text: format!("{}{}", FAILURE_PREFIX, describe(err)),
            failed: true,
        }
    }
}

/// Full cause chain, so "connection refused" isn't hidden behind a generic
/// "error sending request".
fn describe(err: &ClientError) -> String {
    let mut parts = vec![err.to_string()];
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !parts.iter().any(|p| p.contains(&text)) {
            parts.push(text);
        }
        source = cause.source();
    }

    let detail = parts
        .into_iter()
        .filter(|p| !p.trim().is_empty())
        .collect::<Vec<_>>()
        .join(": ");

    if detail.is_empty() {
        "unknown error".to_string()
    } else {
        detail
    }
}
