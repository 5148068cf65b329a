use serde::Deserialize;

/// A file or folder node as returned by the `files.list` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct DriveFile {
    pub id: String,
    pub name: String,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
}

/// One page of a folder listing.
#[derive(Debug, Clone, Deserialize)]
pub struct FileList {
    #[serde(rename = "nextPageToken")]
    pub next_page_token: Option<String>,
    #[serde(default)]
    pub files: Vec<DriveFile>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_listing_page() {
        let json = r#"{
            "nextPageToken": "token-2",
            "files": [
                {"id": "f1", "name": "2023", "mimeType": "application/vnd.google-apps.folder"},
                {"id": "d1", "name": "a_lvr_land_a.csv", "mimeType": "text/csv"}
            ]
        }"#;

        let page: FileList = serde_json::from_str(json).unwrap();
        assert_eq!(page.next_page_token.as_deref(), Some("token-2"));
        assert_eq!(page.files.len(), 2);
        assert_eq!(page.files[0].mime_type, "application/vnd.google-apps.folder");
        assert_eq!(page.files[1].name, "a_lvr_land_a.csv");
    }

    #[test]
    fn deserializes_final_page_without_token() {
        let json = r#"{"files": []}"#;
        let page: FileList = serde_json::from_str(json).unwrap();
        assert!(page.next_page_token.is_none());
        assert!(page.files.is_empty());
    }
}
