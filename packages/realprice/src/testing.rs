//! Mock implementations for tests.
//!
//! Canned responses live behind shared handles, so a clone of a mock keeps
//! observing the calls made through the original.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::error::{GeocodeError, StoreError};
use crate::geocode::Geocoder;
use crate::records::Coordinates;
use crate::store::{DocumentStore, NodeKind, RemoteNode};

/// In-memory document store with canned folders, documents and injectable
/// failures.
#[derive(Default)]
pub struct MockDocumentStore {
    children: Arc<RwLock<HashMap<String, Vec<RemoteNode>>>>,
    contents: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    failing_folders: Arc<RwLock<HashSet<String>>>,
    failing_documents: Arc<RwLock<HashSet<String>>>,
    list_calls: Arc<RwLock<Vec<String>>>,
}

impl MockDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a folder node under a parent.
    pub fn add_folder(&self, parent_id: &str, id: &str, name: &str) {
        self.children
            .write()
            .unwrap()
            .entry(parent_id.to_string())
            .or_default()
            .push(RemoteNode {
                id: id.to_string(),
                name: name.to_string(),
                kind: NodeKind::Folder,
                media_type: Some("application/vnd.google-apps.folder".to_string()),
            });
    }

    /// Register a document node under a parent, with its content.
    pub fn add_document(&self, parent_id: &str, id: &str, name: &str, content: &str) {
        self.children
            .write()
            .unwrap()
            .entry(parent_id.to_string())
            .or_default()
            .push(RemoteNode {
                id: id.to_string(),
                name: name.to_string(),
                kind: NodeKind::Document,
                media_type: Some("text/csv".to_string()),
            });
        self.contents
            .write()
            .unwrap()
            .insert(id.to_string(), content.as_bytes().to_vec());
    }

    /// Make listing a folder fail.
    pub fn fail_folder(&self, id: &str) {
        self.failing_folders.write().unwrap().insert(id.to_string());
    }

    /// Make fetching a document fail.
    pub fn fail_document(&self, id: &str) {
        self.failing_documents
            .write()
            .unwrap()
            .insert(id.to_string());
    }

    /// Folder ids whose listing was requested, in request order.
    pub fn list_calls(&self) -> Vec<String> {
        self.list_calls.read().unwrap().clone()
    }

    pub fn list_call_count(&self) -> usize {
        self.list_calls.read().unwrap().len()
    }
}

impl Clone for MockDocumentStore {
    fn clone(&self) -> Self {
        Self {
            children: Arc::clone(&self.children),
            contents: Arc::clone(&self.contents),
            failing_folders: Arc::clone(&self.failing_folders),
            failing_documents: Arc::clone(&self.failing_documents),
            list_calls: Arc::clone(&self.list_calls),
        }
    }
}

#[async_trait]
impl DocumentStore for MockDocumentStore {
    async fn list_children(&self, folder_id: &str) -> Result<Vec<RemoteNode>, StoreError> {
        self.list_calls.write().unwrap().push(folder_id.to_string());
        if self.failing_folders.read().unwrap().contains(folder_id) {
            return Err(StoreError::Api {
                status: 500,
                message: "injected listing failure".into(),
            });
        }
        Ok(self
            .children
            .read()
            .unwrap()
            .get(folder_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch(&self, document_id: &str) -> Result<Vec<u8>, StoreError> {
        if self.failing_documents.read().unwrap().contains(document_id) {
            return Err(StoreError::Api {
                status: 500,
                message: "injected fetch failure".into(),
            });
        }
        self.contents
            .read()
            .unwrap()
            .get(document_id)
            .cloned()
            .ok_or_else(|| StoreError::Api {
                status: 404,
                message: format!("no such document: {document_id}"),
            })
    }
}

/// Geocoder with canned answers and call recording.
#[derive(Default)]
pub struct MockGeocoder {
    answers: Arc<RwLock<HashMap<String, Coordinates>>>,
    failing: Arc<RwLock<HashSet<String>>>,
    calls: Arc<RwLock<Vec<String>>>,
}

impl MockGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the coordinates an address resolves to.
    pub fn add_answer(&self, address: &str, coordinates: Coordinates) {
        self.answers
            .write()
            .unwrap()
            .insert(address.to_string(), coordinates);
    }

    /// Builder form of [`add_answer`](Self::add_answer).
    pub fn with_answer(self, address: &str, coordinates: Coordinates) -> Self {
        self.add_answer(address, coordinates);
        self
    }

    /// Make lookups for an address fail with a service error.
    pub fn fail_address(&self, address: &str) {
        self.failing.write().unwrap().insert(address.to_string());
    }

    /// Addresses that were looked up, in request order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.read().unwrap().len()
    }
}

impl Clone for MockGeocoder {
    fn clone(&self) -> Self {
        Self {
            answers: Arc::clone(&self.answers),
            failing: Arc::clone(&self.failing),
            calls: Arc::clone(&self.calls),
        }
    }
}

#[async_trait]
impl Geocoder for MockGeocoder {
    async fn geocode(&self, address: &str) -> Result<Option<Coordinates>, GeocodeError> {
        self.calls.write().unwrap().push(address.to_string());
        if self.failing.read().unwrap().contains(address) {
            return Err(GeocodeError::Api { status: 503 });
        }
        Ok(self.answers.read().unwrap().get(address).copied())
    }
}
