//! HTTP client for the Upload API
mod request;

/// In-memory `UploadApi` for tests
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

use std::path::Path;

use chrono::Utc;
use mime::Mime;
use reqwest::{
    header,
    multipart::{Form, Part},
    Client, Response, StatusCode,
};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_tracing::TracingMiddleware;
use serde::de::DeserializeOwned;
use tokio::io::AsyncReadExt;
use url::Url;
use uuid::Uuid;

pub use request::{Source, UploadRequest};

use crate::config::ClientConfig;
use crate::error::{UploadcareError, UploadcareResult};
use crate::signature::{generate_secure_signature, Expire, SecureSignature};
use crate::types::{
    BaseUploadResponse, FileInfo, FromUrlResponse, FromUrlStatusResponse, GroupInfo,
    MultipartUpload, UploadResult, UploadStatus,
};

/// Maximum number of idle connections to maintain per host
const MAX_IDLE_CONNECTIONS_PER_HOST: usize = 10;

/// Size of every multipart chunk except the last one
pub const MULTIPART_CHUNK_SIZE: usize = 5 * 1024 * 1024;

/// Marker the service puts in its reply when an unsigned request needs a signature
const SIGNATURE_REQUIRED_MARKER: &str = "`signature` is required";

/// Core Upload API operations
#[async_trait::async_trait]
pub trait UploadApi: Send + Sync {
    /// Uploads a local file or a remote URL, returning the CDN URL of the stored file
    async fn upload(&self, request: UploadRequest) -> UploadcareResult<UploadResult>;

    /// Fetches metadata of a file given its CDN URL or raw UUID
    async fn info(&self, file: &str) -> UploadcareResult<FileInfo>;

    /// Groups previously uploaded files
    async fn create_group(
        &self,
        files: Vec<String>,
        expire: Option<Expire>,
    ) -> UploadcareResult<GroupInfo>;

    /// Fetches metadata of a file group
    async fn group_info(&self, group_id: &str) -> UploadcareResult<GroupInfo>;

    /// Fetches file metadata rendered as indented JSON
    async fn info_pretty(&self, file: &str) -> UploadcareResult<String> {
        self.info(file).await?.to_pretty_string()
    }
}

/// Extracts the file UUID from a CDN URL, or returns a raw identifier unchanged
///
/// # Errors
///
/// Returns `UploadcareError::InvalidSource` if the input is empty, or a URL without a
/// UUID path segment
pub fn extract_uuid(file: &str) -> UploadcareResult<String> {
    let file = file.trim();
    if file.is_empty() {
        return Err(UploadcareError::InvalidSource(
            "file id must not be empty".to_string(),
        ));
    }
    if !has_http_scheme(file) {
        return Ok(file.to_string());
    }

    let url =
        Url::parse(file).map_err(|e| UploadcareError::InvalidSource(format!("{file}: {e}")))?;
    url.path_segments()
        .into_iter()
        .flatten()
        .find(|segment| Uuid::parse_str(segment).is_ok())
        .map(str::to_string)
        .ok_or_else(|| UploadcareError::InvalidSource(format!("no file UUID in {file}")))
}

/// Whether `input` starts with an `http` or `https` scheme, in any letter case
pub(crate) fn has_http_scheme(input: &str) -> bool {
    input
        .split_once("://")
        .is_some_and(|(scheme, _)| {
            scheme.eq_ignore_ascii_case("http") || scheme.eq_ignore_ascii_case("https")
        })
}

/// Upload API client.
///
/// Holds the immutable configuration and a pooled HTTP client; safe to share behind `Arc`.
pub struct UploadcareClient {
    config: ClientConfig,
    http_client: ClientWithMiddleware,
}

impl UploadcareClient {
    /// Creates a new Upload API client
    ///
    /// # Errors
    ///
    /// Returns `UploadcareError::Network` if the HTTP client cannot be built
    pub fn new(config: ClientConfig) -> UploadcareResult<Self> {
        let reqwest_client = Client::builder()
            .timeout(config.request_timeout)
            .pool_max_idle_per_host(MAX_IDLE_CONNECTIONS_PER_HOST)
            .user_agent(format!("uploadcare-rs/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        let http_client = ClientBuilder::new(reqwest_client)
            .with(TracingMiddleware::default())
            .build();

        Ok(Self {
            config,
            http_client,
        })
    }

    /// The configuration this client was built with
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Polls `from_url/status/` until the upload behind `token` settles.
    ///
    /// Returns `(filename, uuid)` of the stored file.
    ///
    /// # Errors
    ///
    /// Returns `UploadcareError::Upload` if the service reports `error` or `unknown`,
    /// `UploadcareError::StatusTimeout` once `max_status_polls` is exhausted
    pub async fn check_status(&self, token: &str) -> UploadcareResult<(String, String)> {
        let endpoint = self.config.endpoint("from_url/status/");

        for attempt in 1..=self.config.max_status_polls {
            let response = self
                .http_client
                .post(&endpoint)
                .form(&[("token", token)])
                .send()
                .await?;
            let http_status = response.status();
            let status: FromUrlStatusResponse = self.parse_response(response).await?;

            match status.status {
                UploadStatus::Success => {
                    let uuid = status.uuid.ok_or_else(|| missing_field("uuid"))?;
                    return Ok((status.filename.unwrap_or_default(), uuid));
                }
                UploadStatus::Error | UploadStatus::Unknown => {
                    let message = status
                        .error
                        .unwrap_or_else(|| format!("upload status: {}", status.status));
                    tracing::warn!(token, "Upload from URL failed: {message}");
                    return Err(UploadcareError::Upload {
                        status: http_status.as_u16(),
                        message,
                    });
                }
                UploadStatus::Waiting | UploadStatus::Progress => {
                    tracing::debug!(token, attempt, status = %status.status, "Upload pending");
                    if attempt < self.config.max_status_polls {
                        tokio::time::sleep(self.config.poll_interval).await;
                    }
                }
            }
        }

        Err(UploadcareError::StatusTimeout {
            token: token.to_string(),
            polls: self.config.max_status_polls,
        })
    }

    /// Opens a multipart upload session for a file of `size` bytes
    ///
    /// # Errors
    ///
    /// Returns `UploadcareError::MissingExpire` / `MissingSecretKey` / `InvalidExpiration`
    /// for bad signing input, `UploadcareError::Upload` if the service rejects the request
    pub async fn start_multipart(
        &self,
        filename: &str,
        size: u64,
        content_type: &Mime,
        expire: Option<Expire>,
    ) -> UploadcareResult<MultipartUpload> {
        let secure = self.secure_signature(expire.as_ref(), None)?;

        let mut fields = vec![
            (
                "UPLOADCARE_PUB_KEY".to_string(),
                self.config.credentials.public_key().to_string(),
            ),
            ("filename".to_string(), filename.to_string()),
            ("size".to_string(), size.to_string()),
            ("content_type".to_string(), content_type.to_string()),
        ];
        push_secure_fields(&mut fields, secure.as_ref());

        tracing::debug!(filename, size, "Starting multipart upload");
        let response = self
            .http_client
            .post(self.config.endpoint("multipart/start/"))
            .form(&fields)
            .send()
            .await?;
        self.parse_response(response).await
    }

    /// Uploads one chunk to a presigned part URL returned by [`Self::start_multipart`]
    ///
    /// # Errors
    ///
    /// Returns `UploadcareError::Upload` if the storage backend rejects the chunk
    pub async fn upload_part(
        &self,
        presigned_url: &str,
        content_type: &Mime,
        chunk: Vec<u8>,
    ) -> UploadcareResult<()> {
        let response = self
            .http_client
            .put(presigned_url)
            .header(header::CONTENT_TYPE, content_type.to_string())
            .body(chunk)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        tracing::warn!(status = status.as_u16(), "Part upload rejected: {message}");
        Err(UploadcareError::Upload {
            status: status.as_u16(),
            message,
        })
    }

    /// Finishes a multipart upload once every part has been sent
    ///
    /// # Errors
    ///
    /// Returns `UploadcareError::Upload` if the service rejects the request
    pub async fn complete_multipart(&self, uuid: &str) -> UploadcareResult<FileInfo> {
        let fields = [
            ("UPLOADCARE_PUB_KEY", self.config.credentials.public_key()),
            ("uuid", uuid),
        ];
        let response = self
            .http_client
            .post(self.config.endpoint("multipart/complete/"))
            .form(&fields)
            .send()
            .await?;
        self.parse_response(response).await
    }

    /// Uploads a local file through the multipart flow, one chunk per presigned part.
    ///
    /// # Errors
    ///
    /// Returns `UploadcareError::InvalidSource` if the file cannot be read,
    /// `UploadcareError::InvalidResponse` if the service hands out too few parts, and any
    /// error of the individual multipart steps
    pub async fn upload_multipart(
        &self,
        path: impl AsRef<Path> + Send,
        expire: Option<Expire>,
    ) -> UploadcareResult<UploadResult> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| unreadable(path, &e))?;
        if !metadata.is_file() {
            return Err(UploadcareError::InvalidSource(format!(
                "{} is not a regular file",
                path.display()
            )));
        }

        let filename = file_name(path);
        let content_type = mime_guess::from_path(path).first_or_octet_stream();
        let session = self
            .start_multipart(&filename, metadata.len(), &content_type, expire)
            .await?;

        let mut file = tokio::fs::File::open(path)
            .await
            .map_err(|e| unreadable(path, &e))?;
        let mut parts = session.parts.iter();
        loop {
            let mut chunk = Vec::with_capacity(MULTIPART_CHUNK_SIZE);
            (&mut file)
                .take(MULTIPART_CHUNK_SIZE as u64)
                .read_to_end(&mut chunk)
                .await
                .map_err(|e| unreadable(path, &e))?;
            if chunk.is_empty() {
                break;
            }
            let part_url = parts.next().ok_or_else(|| {
                UploadcareError::InvalidResponse(format!(
                    "service returned {} parts, not enough for {} bytes",
                    session.parts.len(),
                    metadata.len()
                ))
            })?;
            self.upload_part(part_url, &content_type, chunk).await?;
        }

        self.complete_multipart(&session.uuid).await?;

        let result = UploadResult::new(&self.config.cdn_url, session.uuid, filename);
        tracing::info!(uuid = %result.uuid, "Multipart upload complete");
        Ok(result)
    }

    /// Resolves the `expire`/`signature` pair sent with a write request.
    ///
    /// Returns `None` in public-key-only mode.
    fn secure_signature(
        &self,
        expire: Option<&Expire>,
        signature: Option<&str>,
    ) -> UploadcareResult<Option<SecureSignature>> {
        let secret_key = self.config.credentials.secret_key();

        let Some(expire) = expire else {
            if secret_key.is_some() || signature.is_some() {
                return Err(UploadcareError::MissingExpire);
            }
            return Ok(None);
        };

        let now = Utc::now();
        let expire = expire.resolve_at(now)?;
        if expire < now.timestamp() {
            return Err(UploadcareError::InvalidExpiration(format!(
                "expire timestamp {expire} is in the past"
            )));
        }

        let signature = match (signature, secret_key) {
            (Some(signature), _) => signature.to_string(),
            (None, Some(secret_key)) => generate_secure_signature(secret_key, expire),
            (None, None) => return Err(UploadcareError::MissingSecretKey),
        };

        Ok(Some(SecureSignature { signature, expire }))
    }

    async fn upload_file(
        &self,
        path: &Path,
        request: &UploadRequest,
        secure: Option<&SecureSignature>,
    ) -> UploadcareResult<UploadResult> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| unreadable(path, &e))?;
        let filename = file_name(path);
        let content_type = mime_guess::from_path(path).first_or_octet_stream();

        let mut fields = vec![
            (
                "UPLOADCARE_PUB_KEY".to_string(),
                self.config.credentials.public_key().to_string(),
            ),
            ("UPLOADCARE_STORE".to_string(), request.store.to_string()),
        ];
        fields.extend(request.extra_fields());
        push_secure_fields(&mut fields, secure);

        let part = Part::bytes(bytes)
            .file_name(filename.clone())
            .mime_str(content_type.as_ref())?;
        let form = fields
            .into_iter()
            .fold(Form::new(), |form, (key, value)| form.text(key, value))
            .part("file", part);

        tracing::debug!(path = %path.display(), "Uploading local file");
        let response = self
            .http_client
            .post(self.config.endpoint("base/"))
            .multipart(form)
            .send()
            .await?;
        let body: BaseUploadResponse = self.parse_response(response).await?;

        Ok(UploadResult::new(&self.config.cdn_url, body.file, filename))
    }

    async fn upload_from_url(
        &self,
        url: &Url,
        request: &UploadRequest,
        secure: Option<&SecureSignature>,
    ) -> UploadcareResult<UploadResult> {
        let mut fields = vec![
            (
                "pub_key".to_string(),
                self.config.credentials.public_key().to_string(),
            ),
            ("UPLOADCARE_STORE".to_string(), request.store.to_string()),
            ("source_url".to_string(), url.to_string()),
        ];
        fields.extend(request.extra_fields());
        push_secure_fields(&mut fields, secure);

        tracing::debug!(%url, "Uploading from URL");
        let response = self
            .http_client
            .post(self.config.endpoint("from_url/"))
            .form(&fields)
            .send()
            .await?;
        let body: FromUrlResponse = self.parse_response(response).await?;

        let (filename, uuid) = match body.token {
            Some(token) => self.check_status(&token).await?,
            None => (
                body.filename.unwrap_or_default(),
                body.uuid.ok_or_else(|| missing_field("uuid"))?,
            ),
        };

        Ok(UploadResult::new(&self.config.cdn_url, uuid, filename))
    }

    /// Decodes a successful JSON response, or maps the failure to an error
    async fn parse_response<T: DeserializeOwned>(
        &self,
        response: Response,
    ) -> UploadcareResult<T> {
        let status = response.status();
        if status.is_success() {
            let body = response.text().await?;
            return serde_json::from_str(&body).map_err(Into::into);
        }

        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        tracing::warn!(status = status.as_u16(), "Upload API rejected request: {message}");

        if message.contains(SIGNATURE_REQUIRED_MARKER)
            && self.config.credentials.secret_key().is_none()
        {
            return Err(UploadcareError::MissingSecretKey);
        }

        Err(UploadcareError::Upload {
            status: status.as_u16(),
            message,
        })
    }

    /// Like [`Self::parse_response`], reporting 404 as `NotFound`
    async fn parse_lookup<T: DeserializeOwned>(
        &self,
        response: Response,
        id: &str,
    ) -> UploadcareResult<T> {
        if response.status() == StatusCode::NOT_FOUND {
            let message = response.text().await.unwrap_or_default();
            tracing::debug!(id, "Lookup returned 404: {message}");
            return Err(UploadcareError::NotFound(id.to_string()));
        }
        self.parse_response(response).await
    }
}

#[async_trait::async_trait]
impl UploadApi for UploadcareClient {
    async fn upload(&self, request: UploadRequest) -> UploadcareResult<UploadResult> {
        let secure = self.secure_signature(request.expire.as_ref(), request.signature.as_deref())?;

        let result = match Source::identify(&request.source).await? {
            Source::File(path) => self.upload_file(&path, &request, secure.as_ref()).await?,
            Source::Url(url) => self.upload_from_url(&url, &request, secure.as_ref()).await?,
        };

        tracing::info!(uuid = %result.uuid, signed = secure.is_some(), "Upload complete");
        Ok(result)
    }

    async fn info(&self, file: &str) -> UploadcareResult<FileInfo> {
        let uuid = extract_uuid(file)?;
        let params = [
            ("file_id", uuid.as_str()),
            ("pub_key", self.config.credentials.public_key()),
        ];

        tracing::debug!(uuid = %uuid, "Fetching file info");
        let response = self
            .http_client
            .get(self.config.endpoint("info/"))
            .query(&params)
            .send()
            .await?;
        self.parse_lookup(response, &uuid).await
    }

    async fn create_group(
        &self,
        files: Vec<String>,
        expire: Option<Expire>,
    ) -> UploadcareResult<GroupInfo> {
        let secure = self.secure_signature(expire.as_ref(), None)?;

        let file_count = files.len();
        let mut fields = vec![(
            "pub_key".to_string(),
            self.config.credentials.public_key().to_string(),
        )];
        fields.extend(
            files
                .into_iter()
                .enumerate()
                .map(|(n, file)| (format!("files[{n}]"), file)),
        );
        push_secure_fields(&mut fields, secure.as_ref());

        tracing::debug!(files = file_count, "Creating file group");
        let response = self
            .http_client
            .post(self.config.endpoint("group/"))
            .form(&fields)
            .send()
            .await?;
        self.parse_response(response).await
    }

    async fn group_info(&self, group_id: &str) -> UploadcareResult<GroupInfo> {
        let params = [
            ("pub_key", self.config.credentials.public_key()),
            ("group_id", group_id),
        ];

        tracing::debug!(group_id, "Fetching group info");
        let response = self
            .http_client
            .get(self.config.endpoint("group/info/"))
            .query(&params)
            .send()
            .await?;
        self.parse_lookup(response, group_id).await
    }
}

fn push_secure_fields(fields: &mut Vec<(String, String)>, secure: Option<&SecureSignature>) {
    if let Some(secure) = secure {
        fields.push(("expire".to_string(), secure.expire.to_string()));
        fields.push(("signature".to_string(), secure.signature.clone()));
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn unreadable(path: &Path, error: &std::io::Error) -> UploadcareError {
    UploadcareError::InvalidSource(format!("{}: {error}", path.display()))
}

fn missing_field(field: &str) -> UploadcareError {
    UploadcareError::InvalidResponse(format!("response is missing `{field}`"))
}
