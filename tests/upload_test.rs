mod common;

use common::{documents_response, harness};
use docs_bot_lib::config::UploadConfig;
use docs_bot_lib::documents::DocumentList;
use docs_bot_lib::gateway::Gateway;
use docs_bot_lib::models::{Role, Session};
use docs_bot_lib::upload::{UploadController, UploadPhase};
use docs_bot_lib::ClientError;
use serde_json::json;
use std::time::Duration;
use tokio::sync::watch;
use wiremock::matchers::{any, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn status(value: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "status": value }))
}

async fn mount_upload(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(header("authorization", "Bearer admin-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "task_id": "task_1",
            "message": "Document processing started",
            "filename": "report.pdf",
        })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_processing_twice_then_completed() {
    let mut h = harness().await;
    h.login_as("admin").await;
    mount_upload(&h.server).await;
    Mock::given(method("GET"))
        .and(path("/status/task_1"))
        .respond_with(status("processing"))
        .up_to_n_times(2)
        .expect(2)
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/status/task_1"))
        .respond_with(status("completed"))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/documents"))
        .respond_with(documents_response(&["report.pdf"]))
        .expect(1)
        .mount(&h.server)
        .await;

    let file = h.write_file("report.pdf", b"%PDF-1.4 test");
    let outcome = h.app.upload(&file).await.unwrap();

    assert_eq!(outcome.polls, 3);
    assert_eq!(outcome.task_id, "task_1");
    assert!(!h.app.uploads().is_loading());
    assert_eq!(
        h.app.uploads().phase(),
        UploadPhase::Done {
            task_id: "task_1".into()
        }
    );
    assert_eq!(h.filenames(), vec!["report.pdf"]);
    assert_eq!(h.app.banner(), None);
    h.server.verify().await;
}

#[tokio::test]
async fn test_failed_processing_skips_refresh() {
    let mut h = harness().await;
    h.login_as("admin").await;
    mount_upload(&h.server).await;
    Mock::given(method("GET"))
        .and(path("/status/task_1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "status": "failed", "error": "unreadable pdf" })),
        )
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/documents"))
        .respond_with(documents_response(&[]))
        .expect(0)
        .mount(&h.server)
        .await;

    let file = h.write_file("report.pdf", b"%PDF-1.4 broken");
    let err = h.app.upload(&file).await.unwrap_err();

    match err {
        ClientError::Processing { task_id, reason } => {
            assert_eq!(task_id, "task_1");
            assert_eq!(reason, "unreadable pdf");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!h.app.uploads().is_loading());
    assert_eq!(h.app.banner(), Some("Document processing failed"));
}

#[tokio::test]
async fn test_unknown_status_is_failure() {
    let mut h = harness().await;
    h.login_as("admin").await;
    mount_upload(&h.server).await;
    Mock::given(method("GET"))
        .and(path("/status/task_1"))
        .respond_with(status("not_found"))
        .mount(&h.server)
        .await;

    let file = h.write_file("report.pdf", b"%PDF");
    let err = h.app.upload(&file).await.unwrap_err();
    assert!(matches!(err, ClientError::Processing { .. }));
}

#[tokio::test]
async fn test_status_check_error_fails_upload() {
    let mut h = harness().await;
    h.login_as("admin").await;
    mount_upload(&h.server).await;
    Mock::given(method("GET"))
        .and(path("/status/task_1"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&h.server)
        .await;

    let file = h.write_file("report.pdf", b"%PDF");
    let err = h.app.upload(&file).await.unwrap_err();

    assert!(matches!(err, ClientError::Fetch { .. }));
    assert!(!h.app.uploads().is_loading());
    assert_eq!(h.app.banner(), Some("Failed to check upload status"));
}

#[tokio::test]
async fn test_submit_error_fails_upload() {
    let mut h = harness().await;
    h.login_as("admin").await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "detail": "File size exceeds 10MB limit" })))
        .mount(&h.server)
        .await;

    let file = h.write_file("report.pdf", b"%PDF");
    let err = h.app.upload(&file).await.unwrap_err();

    assert!(matches!(err, ClientError::Fetch { .. }));
    assert_eq!(h.app.banner(), Some("Failed to upload document"));
    assert!(matches!(
        h.app.uploads().phase(),
        UploadPhase::Failed { .. }
    ));
}

#[tokio::test]
async fn test_endless_processing_times_out() {
    let mut h = harness().await;
    h.login_as("admin").await;
    mount_upload(&h.server).await;
    Mock::given(method("GET"))
        .and(path("/status/task_1"))
        .respond_with(status("processing"))
        .expect(5)
        .mount(&h.server)
        .await;

    let file = h.write_file("report.pdf", b"%PDF");
    let err = h.app.upload(&file).await.unwrap_err();

    match err {
        ClientError::Timeout { task_id, attempts } => {
            assert_eq!(task_id, "task_1");
            assert_eq!(attempts, 5);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!h.app.uploads().is_loading());
    assert_eq!(h.app.banner(), Some("Document processing timed out"));
}

#[tokio::test]
async fn test_non_admin_and_bad_files_are_refused_locally() {
    let mut h = harness().await;
    h.login_as("admin").await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&h.server)
        .await;

    let zip = h.write_file("archive.zip", b"PK");
    let err = h.app.upload(&zip).await.unwrap_err();
    assert!(matches!(err, ClientError::UnsupportedFile(ext) if ext == "zip"));
    assert_eq!(h.app.banner(), Some("Unsupported file type"));

    let big = h.write_file("big.txt", &vec![b'a'; 11 * 1024 * 1024]);
    let err = h.app.upload(&big).await.unwrap_err();
    assert!(matches!(err, ClientError::FileTooLarge { .. }));

    h.app.logout().unwrap();
    let err = h.app.upload(&zip).await.unwrap_err();
    assert!(matches!(err, ClientError::NotAuthenticated));

    h.server.verify().await;
}

#[tokio::test]
async fn test_user_role_cannot_upload() {
    let mut h = harness().await;
    h.login_as("user").await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&h.server)
        .await;

    let file = h.write_file("report.pdf", b"%PDF");
    let err = h.app.upload(&file).await.unwrap_err();

    assert!(matches!(err, ClientError::Authorization { .. }));
    assert_eq!(
        h.app.banner(),
        Some("Only administrators can upload documents")
    );
}

fn controller_for(server: &MockServer) -> (watch::Sender<Option<Session>>, UploadController) {
    let (tx, rx) = watch::channel(Some(Session {
        token: "admin-token".into(),
        role: Role::Admin,
    }));
    let backend = docs_bot_lib::config::BackendConfig {
        base_url: server.uri(),
        request_timeout_secs: 5,
    };
    let gateway = Gateway::new(&backend, rx).unwrap();
    let upload = UploadConfig {
        poll_interval_ms: 20,
        max_poll_attempts: 1000,
        max_file_bytes: 1024,
    };
    (tx, UploadController::new(gateway, &upload))
}

#[tokio::test]
async fn test_cancel_stops_polling() {
    let h = harness().await;
    mount_upload(&h.server).await;
    Mock::given(method("GET"))
        .and(path("/status/task_1"))
        .respond_with(status("processing"))
        .mount(&h.server)
        .await;

    let (_session, controller) = controller_for(&h.server);
    let mut documents = DocumentList::new();
    let file = h.write_file("notes.md", b"# notes");

    let (result, _) = tokio::join!(controller.upload(&file, &mut documents), async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        controller.cancel();
    });

    assert!(matches!(result, Err(ClientError::Cancelled)));
    assert!(!controller.is_loading());

    let polls = h
        .server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == "/status/task_1")
        .count();
    tokio::time::sleep(Duration::from_millis(100)).await;
    let polls_later = h
        .server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == "/status/task_1")
        .count();
    assert_eq!(polls, polls_later);
}

#[tokio::test]
async fn test_dropping_upload_future_leaves_controller_idle() {
    let h = harness().await;
    mount_upload(&h.server).await;
    Mock::given(method("GET"))
        .and(path("/status/task_1"))
        .respond_with(status("processing"))
        .mount(&h.server)
        .await;

    let (_session, controller) = controller_for(&h.server);
    let mut documents = DocumentList::new();
    let file = h.write_file("notes.md", b"# notes");

    let elapsed = tokio::time::timeout(
        Duration::from_millis(100),
        controller.upload(&file, &mut documents),
    )
    .await;

    assert!(elapsed.is_err());
    assert!(!controller.is_loading());
    assert!(matches!(controller.phase(), UploadPhase::Failed { .. }));
}

async fn mount_named_upload(server: &MockServer, filename: &str, task_id: &str) {
    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(body_string_contains(format!("filename=\"{}\"", filename)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "task_id": task_id,
            "message": "Document processing started",
            "filename": filename,
        })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_second_upload_supersedes_first() {
    let h = harness().await;
    mount_named_upload(&h.server, "a.md", "task_a").await;
    mount_named_upload(&h.server, "b.md", "task_b").await;
    Mock::given(method("GET"))
        .and(path("/status/task_a"))
        .respond_with(status("processing"))
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/status/task_b"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "status": "processing", "processed_chunks": 1, "total_chunks": 4 })),
        )
        .up_to_n_times(5)
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/status/task_b"))
        .respond_with(status("completed"))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/documents"))
        .respond_with(documents_response(&["b.md"]))
        .expect(1)
        .mount(&h.server)
        .await;

    let (_session, controller) = controller_for(&h.server);
    let mut first_docs = DocumentList::new();
    let mut second_docs = DocumentList::new();
    let a = h.write_file("a.md", b"# a");
    let b = h.write_file("b.md", b"# b");

    let ((first, loading_after_first), second) = tokio::join!(
        async {
            let result = controller.upload(&a, &mut first_docs).await;
            (result, controller.is_loading())
        },
        async {
            tokio::time::sleep(Duration::from_millis(60)).await;
            controller.upload(&b, &mut second_docs).await
        }
    );

    assert!(matches!(first, Err(ClientError::Cancelled)));
    assert!(loading_after_first);
    let outcome = second.unwrap();
    assert_eq!(outcome.task_id, "task_b");
    assert_eq!(outcome.polls, 6);
    assert!(!controller.is_loading());
    assert_eq!(
        controller.phase(),
        UploadPhase::Done {
            task_id: "task_b".into()
        }
    );
    assert_eq!(second_docs.documents().len(), 1);
    assert!(first_docs.documents().is_empty());
    h.server.verify().await;
}

#[tokio::test]
async fn test_chunk_counts_reach_polling_phase() {
    let h = harness().await;
    mount_named_upload(&h.server, "c.md", "task_c").await;
    Mock::given(method("GET"))
        .and(path("/status/task_c"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "processing",
            "progress": 50.0,
            "processed_chunks": 2,
            "total_chunks": 4,
        })))
        .mount(&h.server)
        .await;

    let (_session, controller) = controller_for(&h.server);
    let mut phases = controller.subscribe();
    let mut documents = DocumentList::new();
    let file = h.write_file("c.md", b"# c");

    let watcher = async {
        loop {
            phases.changed().await.unwrap();
            if let UploadPhase::Polling {
                chunks: Some(chunks),
                progress,
                ..
            } = phases.borrow_and_update().clone()
            {
                return (chunks, progress);
            }
        }
    };
    let (chunks, progress) = tokio::select! {
        seen = watcher => seen,
        _ = controller.upload(&file, &mut documents) => panic!("upload ended before reporting chunks"),
    };

    assert_eq!(chunks, (2, 4));
    assert_eq!(progress, Some(50.0));
}
