use std::sync::Mutex;

use serde_json::json;

use super::{extract_uuid, Source, UploadApi, UploadRequest};
use crate::error::UploadcareResult;
use crate::signature::Expire;
use crate::types::{FileInfo, GroupInfo, UploadResult};

/// In-memory `UploadApi` that records calls and answers with canned data
pub struct MockUploadApi {
    cdn_url: String,
    uuid: String,
    uploads: Mutex<Vec<String>>,
}

impl MockUploadApi {
    /// Creates a mock that assigns `uuid` to every upload
    #[must_use]
    pub fn new(uuid: impl Into<String>) -> Self {
        Self {
            cdn_url: crate::config::DEFAULT_CDN_URL.to_string(),
            uuid: uuid.into(),
            uploads: Mutex::new(Vec::new()),
        }
    }

    /// Sources passed to `upload`, in call order
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned
    #[must_use]
    pub fn uploads(&self) -> Vec<String> {
        self.uploads.lock().expect("mock lock poisoned").clone()
    }
}

#[async_trait::async_trait]
impl UploadApi for MockUploadApi {
    async fn upload(&self, request: UploadRequest) -> UploadcareResult<UploadResult> {
        let filename = match Source::identify(request.source()).await? {
            Source::File(path) => super::file_name(&path),
            Source::Url(url) => url
                .path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
                .unwrap_or_default(),
        };
        self.uploads
            .lock()
            .expect("mock lock poisoned")
            .push(request.source().to_string());

        Ok(UploadResult::new(&self.cdn_url, self.uuid.clone(), filename))
    }

    async fn info(&self, file: &str) -> UploadcareResult<FileInfo> {
        let uuid = extract_uuid(file)?;
        Ok(serde_json::from_value(json!({
            "uuid": uuid,
            "is_ready": true,
            "is_stored": true,
            "size": 1024,
            "mime_type": "image/png",
        }))?)
    }

    async fn create_group(
        &self,
        files: Vec<String>,
        _expire: Option<Expire>,
    ) -> UploadcareResult<GroupInfo> {
        Ok(serde_json::from_value(json!({
            "id": format!("{}~{}", self.uuid, files.len()),
            "files_count": files.len(),
        }))?)
    }

    async fn group_info(&self, group_id: &str) -> UploadcareResult<GroupInfo> {
        Ok(serde_json::from_value(json!({
            "id": group_id,
            "files_count": 0,
        }))?)
    }
}
