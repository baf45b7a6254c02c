use crate::gateway::GatewayError;
use std::fmt;

/// Backend call a `ClientError::Fetch` came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Login,
    ListDocuments,
    Upload,
    UploadStatus,
    DeleteDocument,
    Query,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Login => "login",
            Operation::ListDocuments => "document listing",
            Operation::Upload => "upload",
            Operation::UploadStatus => "upload status check",
            Operation::DeleteDocument => "document delete",
            Operation::Query => "query",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("credentials rejected: {0}")]
    Auth(#[source] GatewayError),

    #[error("only administrators can {action}")]
    Authorization { action: &'static str },

    #[error("{operation} failed: {source}")]
    Fetch {
        operation: Operation,
        #[source]
        source: GatewayError,
    },

    #[error("processing of task {task_id} failed: {reason}")]
    Processing { task_id: String, reason: String },

    #[error("task {task_id} still processing after {attempts} status checks")]
    Timeout { task_id: String, attempts: u32 },

    #[error("upload cancelled")]
    Cancelled,

    #[error("unsupported file type: .{0}")]
    UnsupportedFile(String),

    #[error("file is {size} bytes, limit is {limit}")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("not logged in")]
    NotAuthenticated,

    #[error("question is empty")]
    EmptyQuestion,

    #[error("HTTP client setup failed: {0}")]
    Setup(#[source] GatewayError),

    #[error("session storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
