//! Request options and response payloads of the Upload API

use std::fmt;
use std::ops::Deref;

use serde::{Deserialize, Serialize};
use serde_json::{ser::PrettyFormatter, Map, Serializer, Value};
use strum::{Display, EnumString};
use url::Url;

use crate::error::{UploadcareError, UploadcareResult};

/// JSON object returned by the Upload API.
///
/// The client does not validate its shape: whatever keys the service returns
/// are passed through unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiObject(Map<String, Value>);

/// File metadata returned by `info/` and `multipart/complete/`
pub type FileInfo = ApiObject;

/// Group metadata returned by `group/` and `group/info/`
pub type GroupInfo = ApiObject;

impl ApiObject {
    /// Wraps a JSON map
    #[must_use]
    pub const fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Consumes the wrapper, returning the underlying JSON map
    #[must_use]
    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }

    /// Renders the object as JSON indented with four spaces
    ///
    /// # Errors
    ///
    /// Returns `UploadcareError::InvalidResponse` if serialization fails
    pub fn to_pretty_string(&self) -> UploadcareResult<String> {
        let mut buffer = Vec::new();
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut serializer = Serializer::with_formatter(&mut buffer, formatter);
        self.0.serialize(&mut serializer)?;
        String::from_utf8(buffer).map_err(|e| UploadcareError::InvalidResponse(e.to_string()))
    }
}

impl Deref for ApiObject {
    type Target = Map<String, Value>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Map<String, Value>> for ApiObject {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Storage behaviour requested for an upload (`UPLOADCARE_STORE`)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
pub enum Store {
    /// Follow the project's auto-store setting
    #[default]
    #[strum(to_string = "auto")]
    Auto,
    /// Store the file permanently
    #[strum(to_string = "1", serialize = "true", serialize = "stored")]
    Stored,
    /// Keep the file for 24 hours only
    #[strum(to_string = "0", serialize = "false", serialize = "temporary")]
    Temporary,
}

/// Outcome of a successful upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResult {
    /// Service-assigned file UUID
    pub uuid: String,
    /// Original file name as recorded by the service
    pub filename: String,
    /// CDN URL of the uploaded file
    pub url: String,
}

impl UploadResult {
    /// Builds the CDN URL `<cdn_url>/<uuid>/<filename>` for an uploaded file.
    ///
    /// The UUID and file name are percent-encoded as path segments.
    #[must_use]
    pub fn new(cdn_url: &str, uuid: String, filename: String) -> Self {
        let url = cdn_file_url(cdn_url, &uuid, &filename);
        Self {
            uuid,
            filename,
            url,
        }
    }
}

fn cdn_file_url(cdn_url: &str, uuid: &str, filename: &str) -> String {
    let Ok(mut url) = Url::parse(cdn_url) else {
        return format!("{cdn_url}/{uuid}/{filename}");
    };
    {
        let Ok(mut segments) = url.path_segments_mut() else {
            return format!("{cdn_url}/{uuid}/{filename}");
        };
        segments.pop_if_empty().push(uuid).push(filename);
    }
    url.into()
}

impl fmt::Display for UploadResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

/// Multipart upload session returned by `multipart/start/`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MultipartUpload {
    /// UUID of the file being assembled
    pub uuid: String,
    /// Presigned URLs, one per part, in upload order
    pub parts: Vec<String>,
}

/// State of an asynchronous upload from URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum UploadStatus {
    /// Queued, not started yet
    Waiting,
    /// Being fetched
    Progress,
    /// Fetched and stored
    Success,
    /// Fetch failed
    Error,
    /// Token is not known to the service
    Unknown,
}

/// Response of `base/`, keyed by the multipart field name
#[derive(Debug, Deserialize)]
pub(crate) struct BaseUploadResponse {
    pub file: String,
}

/// Response of `from_url/`: either a token to poll, or the stored file
#[derive(Debug, Deserialize)]
pub(crate) struct FromUrlResponse {
    pub token: Option<String>,
    pub uuid: Option<String>,
    pub filename: Option<String>,
}

/// Response of `from_url/status/`
#[derive(Debug, Deserialize)]
pub(crate) struct FromUrlStatusResponse {
    pub status: UploadStatus,
    pub uuid: Option<String>,
    pub filename: Option<String>,
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::str::FromStr;

    #[test]
    fn test_pretty_string_uses_four_space_indent() {
        let info: ApiObject = serde_json::from_value(json!({
            "uuid": "3e0f2a2e-3c8b-4d8f-9b1a-5c6d7e8f9a0b",
            "is_ready": true,
        }))
        .unwrap();

        let pretty = info.to_pretty_string().unwrap();
        assert!(pretty.contains("\n    \"uuid\""));

        // Pretty printing does not change semantics
        let reparsed: ApiObject = serde_json::from_str(&pretty).unwrap();
        assert_eq!(reparsed, info);
    }

    #[test]
    fn test_store_form_values() {
        assert_eq!(Store::Auto.to_string(), "auto");
        assert_eq!(Store::Stored.to_string(), "1");
        assert_eq!(Store::Temporary.to_string(), "0");

        assert_eq!(Store::from_str("auto").unwrap(), Store::Auto);
        assert_eq!(Store::from_str("1").unwrap(), Store::Stored);
        assert_eq!(Store::from_str("false").unwrap(), Store::Temporary);
        assert!(Store::from_str("sometimes").is_err());
    }

    #[test]
    fn test_upload_result_url() {
        let result = UploadResult::new(
            "https://ucarecdn.com",
            "3e0f2a2e-3c8b-4d8f-9b1a-5c6d7e8f9a0b".to_string(),
            "cat.png".to_string(),
        );
        assert_eq!(
            result.to_string(),
            "https://ucarecdn.com/3e0f2a2e-3c8b-4d8f-9b1a-5c6d7e8f9a0b/cat.png"
        );
    }

    #[test]
    fn test_upload_result_url_encodes_filename() {
        let result = UploadResult::new(
            "https://ucarecdn.com",
            "3e0f2a2e-3c8b-4d8f-9b1a-5c6d7e8f9a0b".to_string(),
            "cat #1 ?x.png".to_string(),
        );
        assert_eq!(
            result.url,
            "https://ucarecdn.com/3e0f2a2e-3c8b-4d8f-9b1a-5c6d7e8f9a0b/cat%20%231%20%3Fx.png"
        );
        assert_eq!(result.filename, "cat #1 ?x.png");

        let parsed = Url::parse(&result.url).unwrap();
        assert_eq!(parsed.fragment(), None);
        assert_eq!(parsed.query(), None);
        assert_eq!(parsed.path_segments().unwrap().count(), 2);
    }

    #[test]
    fn test_upload_result_keeps_cdn_path_prefix() {
        let result = UploadResult::new(
            "https://cdn.example.com/assets",
            "3e0f2a2e-3c8b-4d8f-9b1a-5c6d7e8f9a0b".to_string(),
            "cat.png".to_string(),
        );
        assert_eq!(
            result.url,
            "https://cdn.example.com/assets/3e0f2a2e-3c8b-4d8f-9b1a-5c6d7e8f9a0b/cat.png"
        );
    }

    #[test]
    fn test_upload_status_parsing() {
        let status: FromUrlStatusResponse =
            serde_json::from_value(json!({"status": "progress", "done": 10, "total": 100}))
                .unwrap();
        assert_eq!(status.status, UploadStatus::Progress);
        assert_eq!(UploadStatus::Success.to_string(), "success");
    }
}
