#![allow(dead_code)]

use docs_bot_lib::{App, AppConfig, Database};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub struct Harness {
    pub server: MockServer,
    pub app: App,
    pub config: AppConfig,
    pub dir: TempDir,
}

pub fn config_for(server: &MockServer, dir: &TempDir) -> AppConfig {
    let mut config = AppConfig::default();
    config.backend.base_url = server.uri();
    config.backend.request_timeout_secs = 5;
    config.upload.poll_interval_ms = 10;
    config.upload.max_poll_attempts = 5;
    config.data.data_dir = Some(dir.path().join("data"));
    config
}

pub async fn harness() -> Harness {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(&server, &dir);
    let app = open_app(&config);
    Harness {
        server,
        app,
        config,
        dir,
    }
}

pub fn open_app(config: &AppConfig) -> App {
    let db = Arc::new(Database::new(&config.data_dir()).unwrap());
    App::new(config, db).unwrap()
}

pub fn login_response(role: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "access_token": format!("{role}-token"),
        "token_type": "bearer",
        "role": role,
    }))
}

pub fn documents_response(names: &[&str]) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "documents": names }))
}

impl Harness {
    /// Logs in with the given role, then forgets every mock and recorded
    /// request so the test starts from a clean backend.
    pub async fn login_as(&mut self, role: &str) {
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(login_response(role))
            .mount(&self.server)
            .await;
        Mock::given(method("GET"))
            .and(path("/documents"))
            .respond_with(documents_response(&[]))
            .mount(&self.server)
            .await;
        self.app.login(role, "password").await.unwrap();
        self.server.reset().await;
    }

    pub fn write_file(&self, name: &str, contents: &[u8]) -> PathBuf {
        let file = self.dir.path().join(name);
        std::fs::write(&file, contents).unwrap();
        file
    }

    pub fn filenames(&self) -> Vec<String> {
        self.app
            .documents()
            .iter()
            .map(|d| d.filename.clone())
            .collect()
    }
}
