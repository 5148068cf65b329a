//! Remote document store abstraction and the Drive-backed implementation.

use async_trait::async_trait;
use drive_client::{DriveClient, DriveError, FOLDER_MIME_TYPE};

use crate::error::StoreError;

/// Kind of a node in the remote namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Folder,
    Document,
}

/// A node observed during traversal. Ephemeral: it exists only for the
/// duration of a locate operation.
#[derive(Debug, Clone)]
pub struct RemoteNode {
    pub id: String,
    pub name: String,
    pub kind: NodeKind,
    /// Media type reported by the store, when it reports one.
    pub media_type: Option<String>,
}

/// A located document ready for fetching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRef {
    pub id: String,
    pub name: String,
}

/// Read-only access to a hierarchical remote store (trait seam to allow
/// mocking).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// List the immediate children of a folder node.
    async fn list_children(&self, folder_id: &str) -> Result<Vec<RemoteNode>, StoreError>;

    /// Fetch a document's raw content.
    async fn fetch(&self, document_id: &str) -> Result<Vec<u8>, StoreError>;
}

impl From<DriveError> for StoreError {
    fn from(e: DriveError) -> Self {
        match e {
            DriveError::Api { status, message } => StoreError::Api { status, message },
            DriveError::Request(e) => StoreError::Transport(Box::new(e)),
        }
    }
}

/// `DocumentStore` adapter over the pure Drive client.
pub struct DriveStore {
    client: DriveClient,
}

impl DriveStore {
    pub fn new(client: DriveClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DocumentStore for DriveStore {
    async fn list_children(&self, folder_id: &str) -> Result<Vec<RemoteNode>, StoreError> {
        let files = self.client.list_children(folder_id).await?;
        Ok(files
            .into_iter()
            .map(|f| {
                let kind = if f.mime_type == FOLDER_MIME_TYPE {
                    NodeKind::Folder
                } else {
                    NodeKind::Document
                };
                RemoteNode {
                    id: f.id,
                    name: f.name,
                    kind,
                    media_type: Some(f.mime_type),
                }
            })
            .collect())
    }

    async fn fetch(&self, document_id: &str) -> Result<Vec<u8>, StoreError> {
        Ok(self.client.download(document_id).await?)
    }
}
