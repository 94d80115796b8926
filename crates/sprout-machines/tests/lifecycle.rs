//! Sandbox lifecycle against a scripted Machines API.
//!
//! Every test runs on tokio's paused clock, so backoff delays are observed
//! exactly without costing wall time.

use async_trait::async_trait;
use sprout_machines::{
    ApiRequest, ApiResponse, CommandExecutor, MachinesApi, MachinesError, MachinesTransport,
    Method, RetryPolicy, SandboxProvisioner, SandboxSpec, TransportErrorKind,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// Replays canned replies in order and records every request.
#[derive(Default)]
struct ScriptedTransport {
    replies: Mutex<VecDeque<sprout_machines::Result<ApiResponse>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn reply(&self, status: u16, body: &str) -> &Self {
        self.replies.lock().unwrap().push_back(Ok(ApiResponse {
            status,
            body: body.to_string(),
        }));
        self
    }

    fn fail(&self, kind: TransportErrorKind) -> &Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(Err(MachinesError::Transport {
                kind,
                message: "scripted".into(),
            }));
        self
    }

    fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl MachinesTransport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> sprout_machines::Result<ApiResponse> {
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected extra request")
    }
}

const MACHINE: &str = r#"{
    "id": "148ed193b95948",
    "name": "session-s1",
    "state": "created",
    "region": "iad",
    "private_ip": "fdaa:0:1::3",
    "created_at": "2024-05-01T12:00:00Z"
}"#;

fn harness(transport: &Arc<ScriptedTransport>) -> (SandboxProvisioner, CommandExecutor) {
    let api = MachinesApi::new(transport.clone(), "sprout-sandboxes");
    let retry = RetryPolicy::default();
    (
        SandboxProvisioner::new(api.clone(), retry),
        CommandExecutor::new(api, retry),
    )
}

fn spec() -> SandboxSpec {
    SandboxSpec::builder("s1")
        .region("iad")
        .image("registry.fly.io/sprout-sandbox:latest")
        .cpus(1)
        .memory_mb(1024)
        .env("PORT", "3000")
        .build()
        .expect("valid spec")
}

fn cmd(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}

#[tokio::test(start_paused = true)]
async fn test_create_accepts_sparse_machine() {
    let transport = ScriptedTransport::new();
    transport.reply(200, r#"{"id": "m-sparse", "state": "created", "private_ip": null}"#);
    let (provisioner, _) = harness(&transport);

    let sandbox = provisioner.create(&spec()).await.expect("create succeeds");

    assert_eq!(sandbox.id, "m-sparse");
    assert_eq!(sandbox.state, "created");
    assert_eq!(sandbox.private_ip, "");
    assert_eq!(sandbox.created_at, None);
    assert_eq!(transport.requests().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_create_sends_payload_and_maps_sandbox() {
    let transport = ScriptedTransport::new();
    transport.reply(200, MACHINE);
    let (provisioner, _) = harness(&transport);

    let sandbox = provisioner.create(&spec()).await.expect("create succeeds");

    assert_eq!(sandbox.id, "148ed193b95948");
    assert_eq!(sandbox.name, "session-s1");
    assert_eq!(sandbox.state, "created");
    assert_eq!(sandbox.region, "iad");
    assert_eq!(sandbox.private_ip, "fdaa:0:1::3");

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, Method::Post);
    assert_eq!(requests[0].path, "/apps/sprout-sandboxes/machines");
    let body = requests[0].body.as_ref().expect("create has a body");
    assert_eq!(body["name"], "session-s1");
    assert_eq!(body["region"], "iad");
    assert_eq!(body["config"]["guest"]["cpu_kind"], "shared");
    assert_eq!(body["config"]["guest"]["cpus"], 1);
    assert_eq!(body["config"]["guest"]["memory_mb"], 1024);
    assert_eq!(body["config"]["env"]["SESSION_ID"], "s1");
    assert_eq!(body["config"]["env"]["PORT"], "3000");
    assert_eq!(body["config"]["auto_destroy"], true);
}

#[tokio::test(start_paused = true)]
async fn test_create_retries_once_after_server_error() {
    let transport = ScriptedTransport::new();
    transport.reply(500, "internal").reply(200, MACHINE);
    let (provisioner, _) = harness(&transport);

    let start = Instant::now();
    let sandbox = provisioner.create(&spec()).await.expect("second attempt succeeds");
    let elapsed = start.elapsed();

    assert_eq!(sandbox.id, "148ed193b95948");
    assert_eq!(transport.requests().len(), 2);
    assert!(elapsed >= Duration::from_millis(1000), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_millis(1100), "elapsed {elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn test_create_gives_up_after_three_server_errors() {
    let transport = ScriptedTransport::new();
    transport
        .reply(500, "one")
        .reply(500, "two")
        .reply(500, "three");
    let (provisioner, _) = harness(&transport);

    let err = provisioner.create(&spec()).await.expect_err("all attempts fail");

    match err {
        MachinesError::Http { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "three");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(transport.requests().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_create_rejects_invalid_spec_without_request() {
    let transport = ScriptedTransport::new();
    let (provisioner, _) = harness(&transport);

    let mut bad = spec();
    bad.image.clear();

    let err = provisioner.create(&bad).await.expect_err("spec is invalid");
    assert!(matches!(err, MachinesError::Config(_)));
    assert!(transport.requests().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_create_retries_timeouts_and_aborts() {
    let transport = ScriptedTransport::new();
    transport
        .fail(TransportErrorKind::TimedOut)
        .fail(TransportErrorKind::Aborted)
        .reply(201, MACHINE);
    let (provisioner, _) = harness(&transport);

    let start = Instant::now();
    provisioner.create(&spec()).await.expect("third attempt succeeds");

    assert_eq!(transport.requests().len(), 3);
    assert!(start.elapsed() >= Duration::from_millis(3000));
}

#[tokio::test(start_paused = true)]
async fn test_exec_client_error_is_not_retried() {
    let transport = ScriptedTransport::new();
    transport.reply(400, r#"{"error":"bad cmd"}"#);
    let (_, executor) = harness(&transport);

    let start = Instant::now();
    let err = executor
        .exec("148ed193b95948", &cmd(&["ls"]))
        .await
        .expect_err("400 fails");

    assert_eq!(err.status(), Some(400));
    assert_eq!(transport.requests().len(), 1);
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_exec_maps_output() {
    let transport = ScriptedTransport::new();
    transport.reply(
        200,
        r#"{"exit_code": 2, "stdout": "building\n", "stderr": "error: missing dep\n"}"#,
    );
    let (_, executor) = harness(&transport);

    let result = executor
        .exec("148ed193b95948", &cmd(&["npm", "run", "build"]))
        .await
        .expect("exec succeeds");

    assert_eq!(result.exit_code, 2);
    assert!(!result.success());
    assert_eq!(result.stdout, "building\n");
    assert_eq!(result.stderr, "error: missing dep\n");

    let requests = transport.requests();
    assert_eq!(requests[0].method, Method::Post);
    assert_eq!(
        requests[0].path,
        "/apps/sprout-sandboxes/machines/148ed193b95948/exec"
    );
    assert_eq!(
        requests[0].body,
        Some(serde_json::json!({ "cmd": ["npm", "run", "build"] }))
    );
}

#[tokio::test(start_paused = true)]
async fn test_exec_defaults_missing_fields() {
    let transport = ScriptedTransport::new();
    transport.reply(200, "{}");
    let (_, executor) = harness(&transport);

    let result = executor
        .exec("148ed193b95948", &cmd(&["true"]))
        .await
        .expect("exec succeeds");

    assert_eq!(result.exit_code, 0);
    assert_eq!(result.stdout, "");
    assert_eq!(result.stderr, "");
}

#[tokio::test(start_paused = true)]
async fn test_exec_retries_server_error() {
    let transport = ScriptedTransport::new();
    transport
        .reply(503, "unavailable")
        .reply(200, r#"{"exit_code":0,"stdout":"ok","stderr":""}"#);
    let (_, executor) = harness(&transport);

    let result = executor
        .exec("148ed193b95948", &cmd(&["echo", "ok"]))
        .await
        .expect("retry succeeds");

    assert_eq!(result.stdout, "ok");
    assert_eq!(transport.requests().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_get_returns_sandbox() {
    let transport = ScriptedTransport::new();
    transport.reply(200, MACHINE);
    let (provisioner, _) = harness(&transport);

    let sandbox = provisioner
        .get("148ed193b95948")
        .await
        .expect("get succeeds")
        .expect("sandbox exists");

    assert_eq!(sandbox.name, "session-s1");
    let requests = transport.requests();
    assert_eq!(requests[0].method, Method::Get);
    assert_eq!(
        requests[0].path,
        "/apps/sprout-sandboxes/machines/148ed193b95948"
    );
}

#[tokio::test(start_paused = true)]
async fn test_get_missing_is_none() {
    let transport = ScriptedTransport::new();
    transport.reply(404, r#"{"error":"machine not found"}"#);
    let (provisioner, _) = harness(&transport);

    let sandbox = provisioner.get("nope").await.expect("404 is not an error");

    assert!(sandbox.is_none());
    assert_eq!(transport.requests().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_get_does_not_retry() {
    let transport = ScriptedTransport::new();
    transport.reply(500, "internal");
    let (provisioner, _) = harness(&transport);

    let err = provisioner
        .get("148ed193b95948")
        .await
        .expect_err("500 surfaces immediately");

    assert_eq!(err.status(), Some(500));
    assert_eq!(transport.requests().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_destroy_forces_delete() {
    let transport = ScriptedTransport::new();
    transport.reply(200, "");
    let (provisioner, _) = harness(&transport);

    provisioner
        .destroy("148ed193b95948")
        .await
        .expect("destroy succeeds");

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, Method::Delete);
    assert_eq!(
        requests[0].path,
        "/apps/sprout-sandboxes/machines/148ed193b95948"
    );
    assert_eq!(
        requests[0].query,
        vec![("force".to_string(), "true".to_string())]
    );
    assert!(requests[0].body.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_destroy_missing_fails_on_first_attempt() {
    let transport = ScriptedTransport::new();
    transport.reply(404, r#"{"error":"machine not found"}"#);
    let (provisioner, _) = harness(&transport);

    let err = provisioner
        .destroy("nope")
        .await
        .expect_err("404 is an error for destroy");

    assert!(err.is_not_found());
    assert_eq!(transport.requests().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_destroy_retries_transient_failure() {
    let transport = ScriptedTransport::new();
    transport
        .fail(TransportErrorKind::TimedOut)
        .reply(200, "");
    let (provisioner, _) = harness(&transport);

    provisioner
        .destroy("148ed193b95948")
        .await
        .expect("retry succeeds");

    assert_eq!(transport.requests().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_invalid_machine_id_never_reaches_transport() {
    let transport = ScriptedTransport::new();
    let (provisioner, executor) = harness(&transport);

    assert!(matches!(
        provisioner.get("../apps").await,
        Err(MachinesError::Config(_))
    ));
    assert!(matches!(
        provisioner.destroy("a/b").await,
        Err(MachinesError::Config(_))
    ));
    assert!(matches!(
        executor.exec("", &cmd(&["ls"])).await,
        Err(MachinesError::Config(_))
    ));
    assert!(transport.requests().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_unparseable_response_is_not_retried() {
    let transport = ScriptedTransport::new();
    transport.reply(200, "<html>gateway</html>");
    let (provisioner, _) = harness(&transport);

    let err = provisioner.create(&spec()).await.expect_err("bad JSON");

    assert!(matches!(err, MachinesError::Json(_)));
    assert_eq!(transport.requests().len(), 1);
}
