use crate::config::AppConfig;
use crate::db::Database;
use crate::documents::DocumentList;
use crate::error::ClientError;
use crate::gateway::Gateway;
use crate::models::{ChatMessage, Document, Session};
use crate::report::{Action, Notice, Reporter};
use crate::session::SessionManager;
use crate::transcript::{Transcript, FALLBACK_ANSWER};
use crate::upload::{UploadController, UploadOutcome};
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Login,
    Main,
}

/// Root controller: owns every component and decides what the current
/// session may do. Failures are reported here, once per user action.
pub struct App {
    session: SessionManager,
    gateway: Gateway,
    documents: DocumentList,
    uploads: UploadController,
    transcript: Transcript,
    reporter: Reporter,
}

impl App {
    pub fn new(config: &AppConfig, db: Arc<Database>) -> Result<Self, ClientError> {
        let session = SessionManager::new(db);
        let gateway =
            Gateway::new(&config.backend, session.subscribe()).map_err(ClientError::Setup)?;
        let uploads = UploadController::new(gateway.clone(), &config.upload);
        Ok(Self {
            session,
            gateway,
            documents: DocumentList::new(),
            uploads,
            transcript: Transcript::new(),
            reporter: Reporter::new(),
        })
    }

    /// Restores the persisted session and, if there is one, loads the list.
    pub async fn start(&mut self) -> Result<View, ClientError> {
        if self.session.restore()?.is_some() {
            // A stale list is not worth refusing to start over.
            let _ = self.refresh_documents().await;
        }
        Ok(self.view())
    }

    pub fn view(&self) -> View {
        if self.session.current().is_some() {
            View::Main
        } else {
            View::Login
        }
    }

    pub fn session(&self) -> Option<Session> {
        self.session.current()
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.session
    }

    /// Upload and delete are offered only to administrators.
    pub fn can_mutate(&self) -> bool {
        self.session.is_admin()
    }

    pub fn documents(&self) -> &[Document] {
        self.documents.documents()
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        self.transcript.messages()
    }

    pub fn uploads(&self) -> &UploadController {
        &self.uploads
    }

    pub fn banner(&self) -> Option<&str> {
        self.reporter.banner()
    }

    /// Hands over the latest notice for display; each notice is shown once.
    pub fn take_notice(&mut self) -> Option<Notice> {
        self.reporter.take_last()
    }

    fn fail<T>(&mut self, action: Action, err: ClientError) -> Result<T, ClientError> {
        self.reporter.report(action, &err);
        Err(err)
    }

    fn require_session(&self) -> Result<Session, ClientError> {
        self.session.current().ok_or(ClientError::NotAuthenticated)
    }

    pub async fn login(&mut self, username: &str, password: &str) -> Result<Session, ClientError> {
        self.reporter.clear();
        match self.session.login(&self.gateway, username, password).await {
            Ok(session) => {
                let _ = self.refresh_documents().await;
                Ok(session)
            }
            Err(e) => self.fail(Action::Login, e),
        }
    }

    pub fn logout(&mut self) -> Result<(), ClientError> {
        self.reporter.clear();
        self.session.logout()
    }

    pub async fn refresh_documents(&mut self) -> Result<&[Document], ClientError> {
        if let Err(e) = self.require_session() {
            return self.fail(Action::LoadDocuments, e);
        }
        let result = self.documents.refresh(&self.gateway).await.map(|_| ());
        match result {
            Ok(()) => Ok(self.documents.documents()),
            Err(e) => self.fail(Action::LoadDocuments, e),
        }
    }

    pub async fn upload(&mut self, path: &Path) -> Result<UploadOutcome, ClientError> {
        self.reporter.clear();
        match self.require_session() {
            Ok(session) if !session.is_admin() => {
                return self.fail(
                    Action::Upload,
                    ClientError::Authorization {
                        action: "upload documents",
                    },
                );
            }
            Ok(_) => {}
            Err(e) => return self.fail(Action::Upload, e),
        }

        let result = self.uploads.upload(path, &mut self.documents).await;
        match result {
            Ok(outcome) => Ok(outcome),
            Err(e) => self.fail(Action::Upload, e),
        }
    }

    pub async fn delete_document(&mut self, filename: &str) -> Result<(), ClientError> {
        self.reporter.clear();
        let session = match self.require_session() {
            Ok(session) => session,
            Err(e) => return self.fail(Action::Delete, e),
        };
        let result = self
            .documents
            .delete(&self.gateway, Some(&session), filename)
            .await;
        match result {
            Ok(()) => Ok(()),
            Err(e) => self.fail(Action::Delete, e),
        }
    }

    /// Sends a question and returns the bot's reply. A failed query still
    /// yields the fallback reply; its notice is reported inline.
    pub async fn ask(&mut self, question: &str) -> Result<String, ClientError> {
        if question.trim().is_empty() {
            return Err(ClientError::EmptyQuestion);
        }
        if let Err(e) = self.require_session() {
            return self.fail(Action::Query, e);
        }
        self.reporter.clear();
        match self.transcript.ask(&self.gateway, question).await {
            Ok(answer) => Ok(answer),
            Err(e) => {
                self.reporter.report(Action::Query, &e);
                Ok(FALLBACK_ANSWER.to_string())
            }
        }
    }
}
