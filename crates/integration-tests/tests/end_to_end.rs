//! End-to-end: signed webhook → in-memory queue → worker → callbacks.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::StatusCode;
use slash_relay_core::{CommandInvocation, Job, JobId, JobStatus};
use slash_relay_integration_tests::{
    CaptureServer, command_form, signed_command_request, test_config,
};
use slash_relay_server::queue::{JobQueue, MemoryQueue};
use slash_relay_server::routes::slack::JOB_ID_HEADER;
use slash_relay_server::services::Notifier;
use slash_relay_server::slack::{FIRST_REPLY, SECOND_REPLY, SlackClient};
use slash_relay_server::state::AppState;
use slash_relay_server::worker::WorkerPool;
use tower::ServiceExt;

const DELAY: Duration = Duration::from_millis(100);

async fn wait_for_terminal(queue: &MemoryQueue, job_id: JobId) -> JobStatus {
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        let status = queue
            .report(job_id)
            .await
            .expect("report lookup")
            .map(|r| r.status)
            .unwrap_or_default();
        if status.is_terminal() || Instant::now() >= deadline {
            return status;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

fn job_id_of(response: &axum::response::Response) -> JobId {
    response
        .headers()
        .get(JOB_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .expect("job id header")
}

#[tokio::test]
async fn test_command_is_answered_twice_through_response_url() {
    let server = CaptureServer::start().await;
    let queue = Arc::new(MemoryQueue::new());
    let notifier = Notifier::new(
        SlackClient::new(Duration::from_secs(5)).expect("client"),
        DELAY,
    );
    let pool = WorkerPool::spawn(queue.clone(), notifier, 2);
    let app = slash_relay_server::app(AppState::new(&test_config(), queue.clone()));

    let response = app
        .oneshot(signed_command_request(&command_form(
            "",
            &server.callback_url(),
        )))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);

    let job_id = job_id_of(&response);

    assert_eq!(wait_for_terminal(&queue, job_id).await, JobStatus::Succeeded);

    let requests = server.wait_for(2, Duration::from_secs(5)).await;
    let texts: Vec<_> = requests.iter().map(|r| r.body["text"].clone()).collect();
    assert_eq!(texts, [FIRST_REPLY, SECOND_REPLY]);

    let report = queue
        .report(job_id)
        .await
        .expect("report lookup")
        .expect("report exists");
    assert_eq!(report.deliveries_attempted, 2);
    assert_eq!(report.deliveries_failed, 0);

    pool.shutdown_and_join().await;
}

#[tokio::test]
async fn test_failing_callback_still_completes_job() {
    let server = CaptureServer::with_responses([
        StatusCode::INTERNAL_SERVER_ERROR,
        StatusCode::INTERNAL_SERVER_ERROR,
    ])
    .await;
    let queue = Arc::new(MemoryQueue::new());
    let notifier = Notifier::new(
        SlackClient::new(Duration::from_secs(5)).expect("client"),
        DELAY,
    );
    let pool = WorkerPool::spawn(queue.clone(), notifier, 1);
    let app = slash_relay_server::app(AppState::new(&test_config(), queue.clone()));

    let response = app
        .oneshot(signed_command_request(&command_form(
            "",
            &server.callback_url(),
        )))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let job_id = job_id_of(&response);

    assert_eq!(wait_for_terminal(&queue, job_id).await, JobStatus::Succeeded);
    let report = queue
        .report(job_id)
        .await
        .expect("report lookup")
        .expect("report exists");
    assert_eq!(report.deliveries_failed, 2);

    pool.shutdown_and_join().await;
}

#[tokio::test]
async fn test_shutdown_finishes_job_in_hand() {
    let server = CaptureServer::start().await;
    let queue = Arc::new(MemoryQueue::new());
    let delay = Duration::from_secs(1);
    let notifier = Notifier::new(
        SlackClient::new(Duration::from_secs(5)).expect("client"),
        delay,
    );
    let job = Job::new(CommandInvocation::new(
        "/insights",
        "",
        "C1",
        server.callback_url(),
    ));
    queue.enqueue(&job).await.expect("enqueue");

    let pool = WorkerPool::spawn(queue.clone(), notifier, 1);

    // First reply sent, worker now sleeping before the second
    assert_eq!(server.wait_for(1, Duration::from_secs(5)).await.len(), 1);
    let stopping = Instant::now();
    pool.shutdown_and_join().await;

    assert!(stopping.elapsed() < delay + Duration::from_secs(5));
    let texts: Vec<_> = server
        .requests()
        .iter()
        .map(|r| r.body["text"].clone())
        .collect();
    assert_eq!(texts, [FIRST_REPLY, SECOND_REPLY]);

    let report = queue
        .report(job.id)
        .await
        .expect("report lookup")
        .expect("report exists");
    assert_eq!(report.status, JobStatus::Succeeded);
    assert_eq!(report.deliveries_attempted, 2);
}
