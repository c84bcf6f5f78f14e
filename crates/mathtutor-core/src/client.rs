use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ClientError;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolveRequest {
    pub user_id: String,
    pub question: String,
}

/// Body of a `/solve` reply. Both fields are optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SolveResponse {
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    /// Which backend path produced the answer (knowledge base, search, fallback)
    #[serde(default)]
    pub source: Option<String>,
}

impl SolveResponse {
    pub fn answer(text: &str) -> Self {
        Self {
            answer: Some(text.to_string()),
            ..Self::default()
        }
    }

    pub fn error(text: &str) -> Self {
        Self {
            error: Some(text.to_string()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedbackRequest {
    pub user_id: String,
    pub question: String,
    pub answer: String,
    pub correct: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FeedbackResponse {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceStatus {
    pub status: String,
}

impl ServiceStatus {
    /// The full service says `healthy`, the minimal one says `ok`.
    pub fn is_healthy(&self) -> bool {
        matches!(self.status.as_str(), "healthy" | "ok")
    }
}

/// Error bodies the service sends alongside a non-2xx status.
///
/// `detail` is what the service framework emits for rejected requests; it is
/// a string for explicit rejections and a list of objects for schema errors.
#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

impl ErrorBody {
    /// A blank message explains nothing, so it counts as absent.
    fn message(self) -> Option<String> {
        let usable = |s: &String| !s.trim().is_empty();

        if let Some(error) = self.error.filter(usable) {
            return Some(error);
        }
        match self.detail? {
            serde_json::Value::String(s) => Some(s).filter(usable),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

/// The remote service that answers questions.
#[async_trait]
pub trait SolveService: Send + Sync {
    async fn solve(&self, request: SolveRequest) -> Result<SolveResponse, ClientError>;

    async fn send_feedback(&self, request: FeedbackRequest) -> Result<FeedbackResponse, ClientError>;

    async fn status(&self) -> Result<ServiceStatus, ClientError>;
}

#[derive(Clone)]
pub struct SolverClient {
    client: Client,
    base_url: String,
}

impl SolverClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[async_trait]
impl SolveService for SolverClient {
    async fn solve(&self, request: SolveRequest) -> Result<SolveResponse, ClientError> {
        let response = self
            .client
            .post(self.url("solve"))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let solved: SolveResponse = read_json(response).await?;
            tracing::debug!(source = ?solved.source, "solve response received");
            return Ok(solved);
        }

        // A rejection that still explains itself is the service talking, not the network
        let body = response.text().await?;
        match serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(ErrorBody::message)
        {
            Some(message) => {
                tracing::debug!(status = status.as_u16(), "solve rejected by service");
                Ok(SolveResponse {
                    error: Some(message),
                    ..SolveResponse::default()
                })
            }
            None => Err(ClientError::Status {
                status: status.as_u16(),
                body,
            }),
        }
    }

    async fn send_feedback(&self, request: FeedbackRequest) -> Result<FeedbackResponse, ClientError> {
        let response = self
            .client
            .post(self.url("feedback"))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        read_json(response).await
    }

    async fn status(&self) -> Result<ServiceStatus, ClientError> {
        let response = self.client.get(self.url("status")).send().await?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        read_json(response).await
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let body = response.text().await?;
    Ok(serde_json::from_str(&body)?)
}

async fn status_error(response: Response) -> ClientError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    ClientError::Status { status, body }
}
