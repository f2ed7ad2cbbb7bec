//! Client for the Uploadcare Upload API.
//!
//! Uploads local files or remote URLs, fetches file and group metadata, and signs
//! secure uploads with the project secret key.
//!
//! ```no_run
//! use uploadcare::{ClientConfig, Credentials, UploadApi, UploadRequest, UploadcareClient};
//!
//! # async fn run() -> uploadcare::UploadcareResult<()> {
//! let config = ClientConfig::new(Credentials::with_secret("public", "secret"));
//! let client = UploadcareClient::new(config)?;
//!
//! let uploaded = client
//!     .upload(UploadRequest::new("cat.png").expire("in 30 minutes"))
//!     .await?;
//! let info = client.info(&uploaded.url).await?;
//! println!("{}", info.to_pretty_string()?);
//! # Ok(())
//! # }
//! ```

#![deny(clippy::all, clippy::pedantic, clippy::nursery, missing_docs)]
#![allow(clippy::module_name_repetitions)]

/// Upload API client
pub mod client;

/// Client configuration
pub mod config;

/// Error types
pub mod error;

/// Secure upload signatures
pub mod signature;

/// Request options and response payloads
pub mod types;

pub use client::{extract_uuid, Source, UploadApi, UploadRequest, UploadcareClient};
pub use config::{ClientConfig, Credentials};
pub use error::{UploadcareError, UploadcareResult};
pub use signature::{generate_secure_signature, sign, sign_at, Expire, SecureSignature};
pub use types::{ApiObject, FileInfo, GroupInfo, MultipartUpload, Store, UploadResult, UploadStatus};
