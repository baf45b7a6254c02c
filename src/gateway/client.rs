use super::{
    DocumentsResponse, GatewayError, LoginResponse, QueryRequest, QueryResponse, StatusResponse,
    UploadResponse,
};
use crate::config::BackendConfig;
use crate::models::Session;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::sync::watch;

const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// HTTP client for the document QA backend.
///
/// Holds no state of its own: the bearer token is read from the session
/// subscription on every authenticated request, so logout takes effect
/// immediately.
#[derive(Clone)]
pub struct Gateway {
    client: Client,
    base_url: String,
    session: watch::Receiver<Option<Session>>,
}

impl Gateway {
    pub fn new(
        config: &BackendConfig,
        session: watch::Receiver<Option<Session>>,
    ) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        match self.session.borrow().as_ref() {
            Some(session) => req.header("Authorization", format!("Bearer {}", session.token)),
            None => req,
        }
    }

    /// `POST /login`. Never carries a bearer token.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, GatewayError> {
        let req = self
            .client
            .post(self.url("/login"))
            .form(&[("username", username), ("password", password)]);
        send_json(req).await
    }

    /// `POST /upload` with the file as the multipart field `file`.
    pub async fn upload(&self, filename: &str, bytes: Vec<u8>) -> Result<UploadResponse, GatewayError> {
        let total = bytes.len() as u64;
        let mime = mime_guess::from_path(filename).first_or_octet_stream();
        let body = Body::wrap_stream(progress_stream(filename.to_string(), bytes));
        let part = Part::stream_with_length(body, total)
            .file_name(filename.to_string())
            .mime_str(mime.as_ref())?;
        let form = Form::new().part("file", part);

        let req = self.authorized(self.client.post(self.url("/upload")).multipart(form));
        send_json(req).await
    }

    pub async fn status(&self, task_id: &str) -> Result<StatusResponse, GatewayError> {
        let path = format!("/status/{}", urlencoding::encode(task_id));
        let req = self.authorized(self.client.get(self.url(&path)));
        send_json(req).await
    }

    pub async fn list_documents(&self) -> Result<DocumentsResponse, GatewayError> {
        let req = self.authorized(self.client.get(self.url("/documents")));
        send_json(req).await
    }

    /// `DELETE /documents/{filename}`. The ack body has no agreed shape and is discarded.
    pub async fn delete_document(&self, filename: &str) -> Result<(), GatewayError> {
        let path = format!("/documents/{}", urlencoding::encode(filename));
        let req = self.authorized(self.client.delete(self.url(&path)));
        check(req.send().await?).await?;
        Ok(())
    }

    pub async fn query(&self, question: &str) -> Result<QueryResponse, GatewayError> {
        let req = self.authorized(
            self.client
                .post(self.url("/query"))
                .json(&QueryRequest { question }),
        );
        send_json(req).await
    }
}

async fn check(resp: Response) -> Result<Response, GatewayError> {
    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let text = resp.text().await.unwrap_or_default();
        return Err(GatewayError::Api {
            status,
            message: text,
        });
    }
    Ok(resp)
}

async fn send_json<T: DeserializeOwned>(req: RequestBuilder) -> Result<T, GatewayError> {
    let resp = check(req.send().await?).await?;
    Ok(resp.json().await?)
}

/// Splits the file into chunks and logs how much has been handed to the
/// transport as the body is pulled.
fn progress_stream(
    filename: String,
    bytes: Vec<u8>,
) -> impl futures::Stream<Item = Result<Vec<u8>, std::io::Error>> + Send + Sync + 'static {
    let total = bytes.len().max(1);
    let mut sent = 0usize;
    let chunks: Vec<Vec<u8>> = bytes.chunks(UPLOAD_CHUNK_SIZE).map(<[u8]>::to_vec).collect();
    futures::stream::iter(chunks.into_iter().map(move |chunk| {
        sent += chunk.len();
        log::info!("Upload progress for {}: {}%", filename, sent * 100 / total);
        Ok::<_, std::io::Error>(chunk)
    }))
}
