mod common;

use common::*;

use serde_json::json;
use uploadcare::client::MULTIPART_CHUNK_SIZE;
use uploadcare::UploadcareError;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, ResponseTemplate};

async fn mount_start(ctx: &TestContext, parts: usize) {
    let part_urls: Vec<String> = (0..parts)
        .map(|n| format!("{}/parts/{n}", ctx.server.uri()))
        .collect();

    Mock::given(method("POST"))
        .and(path("/multipart/start/"))
        .and(body_string_contains("UPLOADCARE_PUB_KEY=demopublickey"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "uuid": FILE_UUID,
            "parts": part_urls,
        })))
        .expect(1)
        .mount(&ctx.server)
        .await;
}

#[tokio::test]
async fn test_multipart_upload_sends_one_chunk_per_part() {
    let ctx = TestContext::new(None).await;
    let contents: Vec<u8> = (0..MULTIPART_CHUNK_SIZE + 1024)
        .map(|n| (n % 251) as u8)
        .collect();
    let file = temp_file(".bin", &contents);

    mount_start(&ctx, 2).await;

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&ctx.server)
        .await;

    Mock::given(method("POST"))
        .and(path("/multipart/complete/"))
        .and(body_string_contains(&format!("uuid={FILE_UUID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "uuid": FILE_UUID,
            "is_ready": false,
        })))
        .expect(1)
        .mount(&ctx.server)
        .await;

    let result = ctx
        .client
        .upload_multipart(file.path(), None)
        .await
        .expect("Multipart upload should succeed");

    assert_eq!(result.uuid, FILE_UUID);
    assert_eq!(result.url, format!("{CDN_URL}/{FILE_UUID}/{}", file_name(&file)));

    let requests = ctx.requests().await;
    let start = requests
        .iter()
        .find(|request| request.url.path() == "/multipart/start/")
        .expect("start request was sent");
    let start_body = String::from_utf8_lossy(&start.body);
    assert!(start_body.contains(&format!("size={}", contents.len())));
    assert!(start_body.contains("content_type=application%2Foctet-stream"));

    let chunks: Vec<_> = requests
        .iter()
        .filter(|request| request.method.as_str() == "PUT")
        .collect();
    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].url.path(), "/parts/0");
    assert_eq!(chunks[0].body, contents[..MULTIPART_CHUNK_SIZE]);
    assert_eq!(chunks[1].url.path(), "/parts/1");
    assert_eq!(chunks[1].body, contents[MULTIPART_CHUNK_SIZE..]);
}

#[tokio::test]
async fn test_multipart_upload_with_too_few_parts() {
    let ctx = TestContext::new(None).await;
    let contents = vec![7u8; MULTIPART_CHUNK_SIZE + 1];
    let file = temp_file(".bin", &contents);

    mount_start(&ctx, 1).await;

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&ctx.server)
        .await;

    let result = ctx.client.upload_multipart(file.path(), None).await;

    assert!(matches!(result, Err(UploadcareError::InvalidResponse(_))));
}

#[tokio::test]
async fn test_rejected_part_is_upload_error() {
    let ctx = TestContext::new(None).await;
    let file = temp_file(".bin", b"small");

    mount_start(&ctx, 1).await;

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(403).set_body_string("SignatureDoesNotMatch"))
        .mount(&ctx.server)
        .await;

    let result = ctx.client.upload_multipart(file.path(), None).await;

    match result {
        Err(UploadcareError::Upload { status, message }) => {
            assert_eq!(status, 403);
            assert_eq!(message, "SignatureDoesNotMatch");
        }
        other => panic!("Expected Upload error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_multipart_requires_expire_with_secret_key() {
    let ctx = TestContext::new(Some(SECRET_KEY)).await;
    let file = temp_file(".bin", b"small");

    let result = ctx.client.upload_multipart(file.path(), None).await;

    assert!(matches!(result, Err(UploadcareError::MissingExpire)));
    assert!(ctx.requests().await.is_empty());
}
