//! Pure Google Drive v3 REST API client.
//!
//! A minimal client for the Drive API. Supports listing the children of a
//! folder (following page tokens) and downloading file contents.
//!
//! # Example
//!
//! ```rust,ignore
//! use drive_client::DriveClient;
//!
//! let client = DriveClient::new("access-token".into());
//!
//! let children = client.list_children("folder-id").await?;
//! for file in &children {
//!     println!("{} ({})", file.name, file.mime_type);
//! }
//! ```

pub mod error;
pub mod types;

pub use error::{DriveError, Result};
pub use types::{DriveFile, FileList};

const BASE_URL: &str = "https://www.googleapis.com/drive/v3";

/// MIME type Drive assigns to folder nodes.
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

pub struct DriveClient {
    client: reqwest::Client,
    token: String,
    base_url: String,
}

impl DriveClient {
    pub fn new(token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            token,
            base_url: BASE_URL.to_string(),
        }
    }

    /// Point the client at a different API base URL (tests use this).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// List the immediate children of a folder, following `nextPageToken`
    /// until the listing is exhausted.
    pub async fn list_children(&self, folder_id: &str) -> Result<Vec<DriveFile>> {
        let query = format!("'{}' in parents and trashed = false", folder_id);
        let mut files = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = format!(
                "{}/files?q={}&fields={}&pageSize=1000",
                self.base_url,
                urlencoding::encode(&query),
                urlencoding::encode("nextPageToken, files(id, name, mimeType)"),
            );
            if let Some(ref token) = page_token {
                url.push_str("&pageToken=");
                url.push_str(&urlencoding::encode(token));
            }

            let resp = self
                .client
                .get(&url)
                .bearer_auth(&self.token)
                .send()
                .await?;

            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                return Err(DriveError::Api {
                    status: status.as_u16(),
                    message: body,
                });
            }

            let page: FileList = resp.json().await?;
            files.extend(page.files);

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        tracing::debug!(folder_id, count = files.len(), "Listed folder children");
        Ok(files)
    }

    /// Download a file's content verbatim.
    pub async fn download(&self, file_id: &str) -> Result<Vec<u8>> {
        let url = format!("{}/files/{}?alt=media", self.base_url, file_id);
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(DriveError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let bytes = resp.bytes().await?;
        tracing::debug!(file_id, bytes = bytes.len(), "Downloaded file");
        Ok(bytes.to_vec())
    }
}
