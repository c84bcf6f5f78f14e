#![allow(dead_code)]

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use mathtutor_core::{
    ClientError, FeedbackRequest, FeedbackResponse, ServiceStatus, SolveRequest, SolveResponse,
    SolveService,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Notify, Semaphore};

/// A request as the stub server saw it.
#[derive(Debug)]
pub struct CapturedRequest {
    pub head: String,
    pub body: String,
}

impl CapturedRequest {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

/// Serve exactly one HTTP response, then close.
pub async fn serve_once(
    status: u16,
    body: &str,
) -> (String, oneshot::Receiver<CapturedRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();
    let body = body.to_string();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let captured = read_request(&mut socket).await;
        let _ = tx.send(captured);

        let response = format!(
            "HTTP/1.1 {} STUB\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
    });

    (format!("http://{}", addr), rx)
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> CapturedRequest {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];

    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf);
        if let Some(end) = text.find("\r\n\r\n") {
            let head = text[..end].to_string();
            let content_length = head
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);

            if buf.len() >= end + 4 + content_length {
                let body = String::from_utf8_lossy(&buf[end + 4..end + 4 + content_length]).to_string();
                return CapturedRequest { head, body };
            }
        }
    }

    CapturedRequest {
        head: String::from_utf8_lossy(&buf).to_string(),
        body: String::new(),
    }
}

/// An address nothing listens on.
pub async fn refused_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// Solving service that replays canned responses.
///
/// With `gated`, each call waits for a permit from `release` before
/// answering, so a test can observe the in-flight state.
pub struct ScriptedService {
    responses: Mutex<VecDeque<SolveResponse>>,
    requests: Mutex<Vec<SolveRequest>>,
    calls: AtomicUsize,
    gate: Option<Semaphore>,
    pub started: Notify,
}

impl ScriptedService {
    pub fn new(responses: Vec<SolveResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            gate: None,
            started: Notify::new(),
        }
    }

    pub fn gated(responses: Vec<SolveResponse>) -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::new(responses)
        }
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<SolveRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl SolveService for ScriptedService {
    async fn solve(&self, request: SolveRequest) -> Result<SolveResponse, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request);
        self.started.notify_one();

        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }

        Ok(self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default())
    }

    async fn send_feedback(&self, _request: FeedbackRequest) -> Result<FeedbackResponse, ClientError> {
        Ok(FeedbackResponse {
            status: "logged".to_string(),
            message: None,
        })
    }

    async fn status(&self) -> Result<ServiceStatus, ClientError> {
        Ok(ServiceStatus {
            status: "healthy".to_string(),
        })
    }
}

/// Solving service whose `solve` panics, standing in for a buggy backend.
pub struct PanickingService;

#[async_trait]
impl SolveService for PanickingService {
    async fn solve(&self, _request: SolveRequest) -> Result<SolveResponse, ClientError> {
        panic!("solver blew up");
    }

    async fn send_feedback(&self, _request: FeedbackRequest) -> Result<FeedbackResponse, ClientError> {
        Err(ClientError::Status {
            status: 500,
            body: String::new(),
        })
    }

    async fn status(&self) -> Result<ServiceStatus, ClientError> {
        Err(ClientError::Status {
            status: 500,
            body: String::new(),
        })
    }
}
