use bytes::Bytes;
use chatcore::media::encode_object_path;
use log::debug;
use serde::Deserialize;

use crate::client::Client;
use crate::error::ClientError;
use crate::http::HttpRequest;

const STORAGE_PATH: &str = "storage/v1/object";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bucket: String,
    /// Path inside the bucket.
    pub path: String,
    /// Full object key as reported by the service (`bucket/path`).
    pub key: String,
}

#[derive(Deserialize)]
struct RawUploadResponse {
    #[serde(rename = "Key")]
    key: Option<String>,
}

impl Client {
    /// Uploads a blob under `bucket/path`.
    pub async fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<StoredObject, ClientError> {
        let session = self.require_session().await?;
        let url = self.config.endpoint(&format!(
            "{STORAGE_PATH}/{}/{}",
            urlencoding::encode(bucket),
            encode_object_path(path)
        ));

        debug!("upload: {} bytes to {bucket}/{path}", data.len());
        let request = HttpRequest::post(url)
            .with_header("Content-Type", content_type)
            .with_header("x-upsert", "false")
            .with_body(data.to_vec());
        let response = self.send(self.authorize(request, Some(&session))).await?;

        let raw: RawUploadResponse = response.json()?;
        Ok(StoredObject {
            bucket: bucket.to_string(),
            path: path.to_string(),
            key: raw.key.unwrap_or_else(|| format!("{bucket}/{path}")),
        })
    }

    /// Public retrieval URL for a stored object, or `None` for an empty path.
    pub fn public_url(&self, bucket: &str, path: &str) -> Option<String> {
        let path = path.trim_matches('/');
        if bucket.is_empty() || path.is_empty() {
            return None;
        }
        Some(self.config.endpoint(&format!(
            "{STORAGE_PATH}/public/{}/{}",
            urlencoding::encode(bucket),
            encode_object_path(path)
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realtime::LocalFeed;
    use crate::test_utils::{MockHttpClient, signed_in_client, test_client};

    #[tokio::test]
    async fn upload_posts_raw_bytes_under_bucket_path() {
        let http = MockHttpClient::new();
        http.respond(
            "POST",
            "/storage/v1/object/media/",
            200,
            r#"{"Key":"media/u-1/clip.webm","Id":"obj-1"}"#,
        );
        let client = signed_in_client(&http, &LocalFeed::new(), "u-1").await;

        let stored = client
            .upload("media", "u-1/clip.webm", Bytes::from_static(b"OggS"), "audio/webm")
            .await
            .expect("upload succeeds");
        assert_eq!(stored.key, "media/u-1/clip.webm");
        assert_eq!(stored.path, "u-1/clip.webm");

        let sent = &http.requests()[0];
        assert_eq!(sent.url, "https://backend.test/storage/v1/object/media/u-1/clip.webm");
        assert_eq!(sent.header("Content-Type"), Some("audio/webm"));
        assert_eq!(sent.body.as_deref(), Some(b"OggS".as_slice()));
    }

    #[tokio::test]
    async fn public_url_points_at_public_route() {
        let client = test_client(&MockHttpClient::new());
        assert_eq!(
            client.public_url("media", "u-1/clip.webm").as_deref(),
            Some("https://backend.test/storage/v1/object/public/media/u-1/clip.webm")
        );
        assert_eq!(client.public_url("media", ""), None);
    }
}
