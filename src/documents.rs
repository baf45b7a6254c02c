use crate::error::{ClientError, Operation};
use crate::gateway::Gateway;
use crate::models::{Document, Session};
use log::info;

/// Last known document listing. The backend is the only source of truth;
/// entries are never added or removed locally.
#[derive(Debug, Default)]
pub struct DocumentList {
    documents: Vec<Document>,
}

impl DocumentList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Replaces the held list with the backend listing, in the backend's order.
    /// On failure the previous list stays in place.
    pub async fn refresh(&mut self, gateway: &Gateway) -> Result<&[Document], ClientError> {
        let listing = gateway.list_documents().await.map_err(|e| {
            log::error!("Failed to list documents: {}", e);
            ClientError::Fetch {
                operation: Operation::ListDocuments,
                source: e,
            }
        })?;

        self.documents = listing
            .documents
            .into_iter()
            .map(|filename| Document { filename })
            .collect();
        info!("Loaded {} documents", self.documents.len());
        Ok(&self.documents)
    }

    /// Deletes on the backend, then refetches. Non-admin sessions are refused
    /// before any request is made.
    pub async fn delete(
        &mut self,
        gateway: &Gateway,
        session: Option<&Session>,
        filename: &str,
    ) -> Result<(), ClientError> {
        if !session.is_some_and(Session::is_admin) {
            return Err(ClientError::Authorization {
                action: "delete documents",
            });
        }

        gateway.delete_document(filename).await.map_err(|e| {
            log::error!("Failed to delete {}: {}", filename, e);
            ClientError::Fetch {
                operation: Operation::DeleteDocument,
                source: e,
            }
        })?;
        info!("Deleted {}", filename);

        self.refresh(gateway).await?;
        Ok(())
    }
}
