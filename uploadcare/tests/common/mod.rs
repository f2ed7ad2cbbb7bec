// Not every helper is used in every test, so we allow dead code
#![allow(dead_code)]

use std::io::Write;
use std::time::Duration;

use tempfile::NamedTempFile;
use uploadcare::{ClientConfig, Credentials, UploadcareClient};
use wiremock::{MockServer, Request};

pub const PUBLIC_KEY: &str = "demopublickey";
pub const SECRET_KEY: &str = "demosecretkey";
pub const CDN_URL: &str = "https://cdn.uploadcare.test";
pub const FILE_UUID: &str = "3e0f2a2e-3c8b-4d8f-9b1a-5c6d7e8f9a0b";

/// Initialize tracing for tests
pub fn setup_test_env() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .try_init()
        .ok();
}

/// Mock Upload API server and a client pointed at it
pub struct TestContext {
    pub server: MockServer,
    pub client: UploadcareClient,
}

impl TestContext {
    pub async fn new(secret_key: Option<&str>) -> Self {
        setup_test_env();

        let server = MockServer::start().await;
        let credentials = secret_key.map_or_else(
            || Credentials::new(PUBLIC_KEY),
            |secret| Credentials::with_secret(PUBLIC_KEY, secret),
        );
        let config = ClientConfig::new(credentials)
            .with_api_url(server.uri())
            .with_cdn_url(CDN_URL)
            .with_polling(Duration::from_millis(10), 5);
        let client = UploadcareClient::new(config).expect("Failed to create client");

        Self { server, client }
    }

    /// Requests received by the mock server so far
    pub async fn requests(&self) -> Vec<Request> {
        self.server
            .received_requests()
            .await
            .expect("request recording is enabled")
    }
}

/// Creates a temporary file with the given extension and contents
pub fn temp_file(suffix: &str, contents: &[u8]) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("Failed to create temp file");
    file.write_all(contents).expect("Failed to write temp file");
    file.flush().expect("Failed to flush temp file");
    file
}

/// File name component of a temporary file
pub fn file_name(file: &NamedTempFile) -> String {
    file.path()
        .file_name()
        .unwrap()
        .to_string_lossy()
        .into_owned()
}

/// Extracts a text field value from a `multipart/form-data` body
pub fn multipart_field(body: &[u8], name: &str) -> Option<String> {
    let body = String::from_utf8_lossy(body);
    let marker = format!("name=\"{name}\"");
    let start = body.find(&marker)? + marker.len();
    let rest = &body[start..];
    let value_start = rest.find("\r\n\r\n")? + 4;
    let value = &rest[value_start..];
    let value_end = value.find("\r\n")?;
    Some(value[..value_end].to_string())
}

/// Checks whether `needle` occurs in `haystack`
pub fn contains_bytes(haystack: &[u8], needle: &[u8]) -> bool {
    haystack
        .windows(needle.len())
        .any(|window| window == needle)
}
