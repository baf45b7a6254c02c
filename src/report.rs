use crate::error::{ClientError, Operation};
use crate::transcript::FALLBACK_ANSWER;

/// User action a failure is reported against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Login,
    LoadDocuments,
    Upload,
    Delete,
    Query,
}

/// Where a notice is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    /// Shared error line above the main view.
    Banner,
    /// Next to the control that triggered the action, e.g. as a chat bubble.
    Inline,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub action: Action,
    pub surface: Surface,
    pub message: String,
}

impl Action {
    pub fn surface(self) -> Surface {
        match self {
            Action::Query => Surface::Inline,
            _ => Surface::Banner,
        }
    }
}

/// Single place errors become user-visible text. Detail stays in the logs.
#[derive(Debug, Default)]
pub struct Reporter {
    banner: Option<String>,
    last: Option<Notice>,
}

impl Reporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    /// Most recent notice of either surface, if nobody has shown it yet.
    pub fn take_last(&mut self) -> Option<Notice> {
        self.last.take()
    }

    pub fn clear(&mut self) {
        self.banner = None;
    }

    pub fn report(&mut self, action: Action, err: &ClientError) -> Notice {
        let notice = Notice {
            action,
            surface: action.surface(),
            message: user_message(action, err).to_string(),
        };
        if notice.surface == Surface::Banner {
            self.banner = Some(notice.message.clone());
        }
        self.last = Some(notice.clone());
        notice
    }
}

fn user_message(action: Action, err: &ClientError) -> &'static str {
    match (action, err) {
        (_, ClientError::NotAuthenticated) => "Please log in first",
        (Action::Query, _) => FALLBACK_ANSWER,
        (_, ClientError::Auth(_)) => "Login failed",
        (Action::Upload, ClientError::Authorization { .. }) => {
            "Only administrators can upload documents"
        }
        (_, ClientError::Authorization { .. }) => "Only administrators can delete documents",
        (_, ClientError::Processing { .. }) => "Document processing failed",
        (_, ClientError::Timeout { .. }) => "Document processing timed out",
        (_, ClientError::Cancelled) => "Upload cancelled",
        (_, ClientError::UnsupportedFile(_)) => "Unsupported file type",
        (_, ClientError::FileTooLarge { .. }) => "File exceeds the upload size limit",
        (_, ClientError::Fetch { operation, .. }) => match operation {
            Operation::Login => "Login failed",
            Operation::ListDocuments => "Failed to load documents",
            Operation::Upload => "Failed to upload document",
            Operation::UploadStatus => "Failed to check upload status",
            Operation::DeleteDocument => "Failed to delete document",
            Operation::Query => FALLBACK_ANSWER,
        },
        (Action::Login, _) => "Login failed",
        (Action::LoadDocuments, _) => "Failed to load documents",
        (Action::Upload, _) => "Failed to upload document",
        (Action::Delete, _) => "Failed to delete document",
    }
}
