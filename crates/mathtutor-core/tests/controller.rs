mod common;

use std::sync::Arc;

use common::{refused_url, PanickingService, ScriptedService};
use mathtutor_core::reply::{ERROR_PREFIX, FAILURE_PREFIX};
use mathtutor_core::{
    ChatRole, Resolution, SolveResponse, SolverClient, SubmissionController, FALLBACK_ANSWER,
};
use tokio::sync::mpsc;

fn controller_with(
    service: Arc<ScriptedService>,
) -> (
    SubmissionController<ScriptedService, Resolution>,
    mpsc::UnboundedReceiver<Resolution>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    (SubmissionController::new(service, "default_user", tx), rx)
}

async fn settle<S>(
    controller: &mut SubmissionController<S, Resolution>,
    rx: &mut mpsc::UnboundedReceiver<Resolution>,
) where
    S: mathtutor_core::SolveService + ?Sized + 'static,
{
    let resolution = rx.recv().await.expect("resolution event");
    controller.apply(resolution).expect("assistant message appended");
}

#[tokio::test]
async fn test_answer_round_trip() {
    let service = Arc::new(ScriptedService::new(vec![SolveResponse::answer("42")]));
    let (mut controller, mut rx) = controller_with(service.clone());

    controller.pending_mut().push_str("6*7");
    assert!(controller.submit_pending());
    assert!(controller.is_busy());
    assert_eq!(controller.conversation().pending(), "");

    settle(&mut controller, &mut rx).await;

    let messages = controller.conversation().messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, ChatRole::User);
    assert_eq!(messages[0].text, "6*7");
    assert_eq!(messages[1].role, ChatRole::Assistant);
    assert_eq!(messages[1].text, "42");
    assert!(!messages[1].failed);
    assert!(!controller.is_busy());

    let requests = service.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].user_id, "default_user");
    assert_eq!(requests[0].question, "6*7");
}

#[tokio::test]
async fn test_service_error_is_distinguishable() {
    let service = Arc::new(ScriptedService::new(vec![SolveResponse::error("bad input")]));
    let (mut controller, mut rx) = controller_with(service);

    assert!(controller.submit("solve x"));
    settle(&mut controller, &mut rx).await;

    let reply = controller.conversation().transcript().last().unwrap();
    assert!(reply.text.contains("bad input"));
    assert!(reply.text.starts_with(ERROR_PREFIX));
    assert!(reply.failed);
    assert!(!controller.is_busy());
}

#[tokio::test]
async fn test_empty_response_uses_fallback() {
    let service = Arc::new(ScriptedService::new(vec![SolveResponse::default()]));
    let (mut controller, mut rx) = controller_with(service);

    assert!(controller.submit("anything"));
    settle(&mut controller, &mut rx).await;

    let reply = controller.conversation().transcript().last().unwrap();
    assert_eq!(reply.text, FALLBACK_ANSWER);
}

#[tokio::test]
async fn test_blank_submission_never_dispatches() {
    let service = Arc::new(ScriptedService::new(vec![]));
    let (mut controller, mut rx) = controller_with(service.clone());

    assert!(!controller.submit(""));
    assert!(!controller.submit("   \n\t"));
    controller.pending_mut().push_str("  ");
    assert!(!controller.submit_pending());

    tokio::task::yield_now().await;
    assert!(controller.conversation().messages().is_empty());
    assert!(!controller.is_busy());
    assert_eq!(service.calls(), 0);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_submit_while_busy_is_ignored() {
    let service = Arc::new(ScriptedService::gated(vec![SolveResponse::answer("first answer")]));
    let (mut controller, mut rx) = controller_with(service.clone());

    assert!(controller.submit("first"));
    service.started.notified().await;

    assert!(!controller.submit("second"));
    assert_eq!(controller.conversation().messages().len(), 1);
    assert_eq!(service.calls(), 1);
    assert!(rx.try_recv().is_err());

    service.release();
    settle(&mut controller, &mut rx).await;

    assert_eq!(service.calls(), 1);
    let texts: Vec<&str> = controller
        .conversation()
        .messages()
        .iter()
        .map(|m| m.text.as_str())
        .collect();
    assert_eq!(texts, vec!["first", "first answer"]);
}

#[tokio::test]
async fn test_request_captures_text_at_dispatch() {
    let service = Arc::new(ScriptedService::gated(vec![SolveResponse::answer("ok")]));
    let (mut controller, mut rx) = controller_with(service.clone());

    controller.pending_mut().push_str("2+2");
    assert!(controller.submit_pending());
    controller.pending_mut().push_str("edited while waiting");

    service.started.notified().await;
    service.release();
    settle(&mut controller, &mut rx).await;

    assert_eq!(service.requests()[0].question, "2+2");
    assert_eq!(controller.conversation().pending(), "edited while waiting");
}

#[tokio::test]
async fn test_rounds_grow_transcript_by_two() {
    let questions = ["1+1", "2*3", "10/2", "1+1"];
    let responses = questions.iter().map(|_| SolveResponse::answer("n")).collect();
    let service = Arc::new(ScriptedService::new(responses));
    let (mut controller, mut rx) = controller_with(service.clone());

    for (round, question) in questions.iter().enumerate() {
        assert!(controller.submit(question));
        settle(&mut controller, &mut rx).await;

        let messages = controller.conversation().messages();
        assert_eq!(messages.len(), (round + 1) * 2);
        assert_eq!(messages[round * 2].text, *question);
        assert!(messages[round * 2].is_user());
        assert!(messages[round * 2 + 1].is_assistant());
    }

    let ids: Vec<_> = controller.conversation().messages().iter().map(|m| m.id).collect();
    assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
    assert_eq!(service.calls(), questions.len());
}

#[tokio::test]
async fn test_stale_resolution_is_ignored() {
    let service = Arc::new(ScriptedService::new(vec![SolveResponse::answer("a")]));
    let (mut controller, mut rx) = controller_with(service);

    assert!(controller.submit("q"));
    let resolution = rx.recv().await.unwrap();
    let seq = resolution.seq;
    assert!(controller.apply(resolution).is_some());

    let duplicate = Resolution {
        seq,
        outcome: Ok(SolveResponse::answer("duplicate")),
    };
    assert!(controller.apply(duplicate).is_none());
    assert_eq!(controller.conversation().messages().len(), 2);
}

#[tokio::test]
async fn test_connection_refused_becomes_message() {
    let client = Arc::new(SolverClient::new(&refused_url().await));
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut controller: SubmissionController<SolverClient, Resolution> =
        SubmissionController::new(client, "default_user", tx);

    assert!(controller.submit("6*7"));
    settle(&mut controller, &mut rx).await;

    let reply = controller.conversation().transcript().last().unwrap();
    assert!(reply.failed);
    assert!(reply.text.starts_with(FAILURE_PREFIX));
    assert!(reply.text.len() > FAILURE_PREFIX.len());
    assert!(!controller.is_busy());

    // The session stays usable after a failure
    assert!(controller.submit("6*7"));
    assert!(controller.is_busy());
}

#[tokio::test]
async fn test_panicking_request_still_settles() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut controller: SubmissionController<PanickingService, Resolution> =
        SubmissionController::new(Arc::new(PanickingService), "default_user", tx);

    assert!(controller.submit("6*7"));
    settle(&mut controller, &mut rx).await;

    let reply = controller.conversation().transcript().last().unwrap();
    assert!(reply.failed);
    assert!(reply.text.starts_with(FAILURE_PREFIX));
    assert!(reply.text.contains("request task failed"));
    assert!(!controller.is_busy());
    assert!(controller.feedback_request(true).is_none());

    assert!(controller.submit("6*7"));
    assert!(controller.is_busy());
}

#[tokio::test]
async fn test_feedback_request_targets_latest_answer() {
    let service = Arc::new(ScriptedService::new(vec![SolveResponse::answer("42")]));
    let (mut controller, mut rx) = controller_with(service);

    assert!(controller.feedback_request(true).is_none());
    assert!(controller.submit("6*7"));
    settle(&mut controller, &mut rx).await;

    let request = controller.feedback_request(false).unwrap();
    assert_eq!(request.user_id, "default_user");
    assert_eq!(request.question, "6*7");
    assert_eq!(request.answer, "42");
    assert!(!request.correct);
}
