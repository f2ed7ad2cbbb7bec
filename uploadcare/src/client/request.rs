use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use url::Url;

use super::has_http_scheme;
use crate::error::{UploadcareError, UploadcareResult};
use crate::signature::Expire;
use crate::types::Store;

/// Options for a single upload call.
///
/// ```
/// use uploadcare::{Store, UploadRequest};
///
/// let request = UploadRequest::new("https://example.com/cat.png")
///     .expire("in 30 minutes")
///     .store(Store::Stored)
///     .metadata("subsystem", "avatars");
/// assert_eq!(request.source(), "https://example.com/cat.png");
/// ```
#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    pub(crate) source: String,
    pub(crate) expire: Option<Expire>,
    pub(crate) signature: Option<String>,
    pub(crate) store: Store,
    pub(crate) metadata: BTreeMap<String, String>,
    pub(crate) fields: Vec<(String, String)>,
}

impl UploadRequest {
    /// Creates a request for a local file path or a remote `http(s)` URL
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Self::default()
        }
    }

    /// The local path or URL being uploaded
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Sets the signature expiration
    #[must_use]
    pub fn expire(mut self, expire: impl Into<Expire>) -> Self {
        self.expire = Some(expire.into());
        self
    }

    /// Sends a precomputed signature instead of signing with the configured secret key
    #[must_use]
    pub fn signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    /// Sets the storage behaviour
    #[must_use]
    pub const fn store(mut self, store: Store) -> Self {
        self.store = store;
        self
    }

    /// Attaches a metadata entry, sent as `metadata[<key>]`
    #[must_use]
    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Adds an arbitrary form field
    #[must_use]
    pub fn field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((key.into(), value.into()));
        self
    }

    /// Metadata entries and extra fields as form pairs
    pub(crate) fn extra_fields(&self) -> Vec<(String, String)> {
        self.metadata
            .iter()
            .map(|(key, value)| (format!("metadata[{key}]"), value.clone()))
            .chain(self.fields.iter().cloned())
            .collect()
    }
}

impl From<&str> for UploadRequest {
    fn from(source: &str) -> Self {
        Self::new(source)
    }
}

impl From<String> for UploadRequest {
    fn from(source: String) -> Self {
        Self::new(source)
    }
}

impl From<&Path> for UploadRequest {
    fn from(path: &Path) -> Self {
        Self::new(path.to_string_lossy())
    }
}

/// Where the bytes of an upload come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Existing local file, sent to `base/`
    File(PathBuf),
    /// Remote URL fetched by the service through `from_url/`
    Url(Url),
}

impl Source {
    /// Classifies an upload source.
    ///
    /// An existing path wins over URL parsing, so a local file named like a URL is still
    /// uploaded from disk.
    ///
    /// # Errors
    ///
    /// Returns `UploadcareError::InvalidSource` if the input is a directory, or neither an
    /// existing path nor a well-formed `http(s)` URL
    pub async fn identify(input: &str) -> UploadcareResult<Self> {
        let path = Path::new(input);
        if let Ok(metadata) = tokio::fs::metadata(path).await {
            if metadata.is_file() {
                return Ok(Self::File(path.to_path_buf()));
            }
            return Err(UploadcareError::InvalidSource(format!(
                "{input} is not a regular file"
            )));
        }

        if has_http_scheme(input) {
            let url = Url::parse(input)
                .map_err(|e| UploadcareError::InvalidSource(format!("{input}: {e}")))?;
            if matches!(url.scheme(), "http" | "https")
                && url.host_str().is_some_and(|host| !host.is_empty())
            {
                return Ok(Self::Url(url));
            }
        }

        Err(UploadcareError::InvalidSource(format!(
            "{input} is neither an existing file nor a valid URL"
        )))
    }
}
