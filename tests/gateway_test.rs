//! End-to-end tests for the HTTP gateway.
//!
//! Each test binds the router to an ephemeral port and talks to it with
//! reqwest, the way an external client would.

use std::net::SocketAddr;
use std::num::NonZeroUsize;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use keyed_task_queue::core::{Scheduler, SleepExecutor, StatusSnapshot};
use keyed_task_queue::gateway::serve;
use keyed_task_queue::runtime::TokioSpawner;

struct TestServer {
    base: String,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestServer {
    async fn start(max: usize) -> Self {
        let scheduler = Scheduler::new(
            NonZeroUsize::new(max).unwrap(),
            SleepExecutor,
            TokioSpawner::current(),
        );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr: SocketAddr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            serve(listener, scheduler, async {
                let _ = rx.await;
            })
            .await
            .unwrap();
        });
        Self {
            base: format!("http://{addr}"),
            shutdown: Some(tx),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    async fn status(&self, client: &Client) -> StatusSnapshot {
        client
            .get(self.url("/queue/status"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

fn keys(snapshot: &StatusSnapshot, running: bool) -> Vec<String> {
    let list = if running { &snapshot.running } else { &snapshot.pending };
    list.iter().map(|v| v.key.to_string()).collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_submit_then_status() {
    let server = TestServer::start(2).await;
    let client = Client::new();

    let resp = client
        .post(server.url("/queue/tasks"))
        .body(r#"{"A": 500, "B": 500, "C": 500}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "ok");

    let status = server.status(&client).await;
    assert_eq!(keys(&status, true), vec!["A", "B"]);
    assert_eq!(keys(&status, false), vec!["C"]);
    assert_eq!(status.pending[0].duration, Duration::from_millis(500));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_status_wire_shape() {
    let server = TestServer::start(1).await;
    let client = Client::new();

    client
        .post(server.url("/queue/tasks"))
        .body(r#"[{"key": "x", "duration": 400}, {"key": "x", "duration": 300}]"#)
        .send()
        .await
        .unwrap();

    let body: serde_json::Value = client
        .get(server.url("/queue/status"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        body,
        serde_json::json!({
            "pending": [{ "key": "x", "duration": 300 }],
            "running": [{ "key": "x", "duration": 400 }],
        })
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_fractional_duration_round_trips_through_status() {
    let server = TestServer::start(1).await;
    let client = Client::new();

    let resp = client
        .post(server.url("/queue/tasks"))
        .body(r#"{"slow": 5000, "a": 1.5}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body: serde_json::Value = client
        .get(server.url("/queue/status"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        body,
        serde_json::json!({
            "pending": [{ "key": "a", "duration": 1.5 }],
            "running": [{ "key": "slow", "duration": 5000 }],
        })
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_tasks_drain_after_completion() {
    let server = TestServer::start(1).await;
    let client = Client::new();

    client
        .post(server.url("/queue/tasks"))
        .body(r#"{"a": 20, "b": 20, "a2": 20}"#)
        .send()
        .await
        .unwrap();

    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if server.status(&client).await == StatusSnapshot::default() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("queue drained");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_malformed_batch_is_rejected_whole() {
    let server = TestServer::start(2).await;
    let client = Client::new();

    for body in ["not json", r#"{"a": 10, "b": -1}"#, r#"{"a": "soon"}"#, "[1, 2]"] {
        let resp = client
            .post(server.url("/queue/tasks"))
            .body(body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "body {body}");
        assert!(resp.text().await.unwrap().starts_with("nok"));
    }

    assert_eq!(server.status(&client).await, StatusSnapshot::default());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_health_and_unknown_route() {
    let server = TestServer::start(1).await;
    let client = Client::new();

    let health: serde_json::Value = client
        .get(server.url("/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health, serde_json::json!({ "ok": true }));

    let resp = client.get(server.url("/nope")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
