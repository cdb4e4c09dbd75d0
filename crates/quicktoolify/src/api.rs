//! HTTP client for the image conversion and compression endpoints.

use std::path::Path;
use std::time::Instant;

use quicktoolify_core::images::{
    clamp_quality, decode_compressed, decode_converted, parse_target_format, CompressResponse,
    CompressedFile, ConvertResponse, ConvertedFile, FileOutcome, ImageFormat, SelectedFile,
};

use crate::prelude::*;

/// A file ready to be sent as one `files` multipart part.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub async fn from_path(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(eyre!("File not found: {}", path.display()));
        }

        let name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| eyre!("Failed to read {}: {e}", path.display()))?;

        Ok(Self {
            content_type: mime_from_extension(&name).to_string(),
            name,
            bytes,
        })
    }

    /// The view the workflow validates against.
    pub fn selected(&self) -> SelectedFile {
        SelectedFile::new(&self.name, self.bytes.len() as u64, &self.content_type)
    }

    fn part(&self) -> Result<reqwest::multipart::Part, Error> {
        reqwest::multipart::Part::bytes(self.bytes.clone())
            .file_name(self.name.clone())
            .mime_str(&self.content_type)
            .map_err(|e| Error::Generic(format!("Invalid MIME type: {e}")))
    }
}

/// Infer MIME type from file extension.
pub fn mime_from_extension(filename: &str) -> &'static str {
    match ImageFormat::from_file_name(filename) {
        Some(format) => format.mime_type(),
        None => match filename.rsplit('.').next().unwrap_or("").to_lowercase().as_str() {
            "gif" => "image/gif",
            "bmp" => "image/bmp",
            "svg" => "image/svg+xml",
            "tif" | "tiff" => "image/tiff",
            _ => "application/octet-stream",
        },
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Convert `files` to `format` in one request. An empty format means webp.
    pub async fn convert_images(
        &self,
        files: &[UploadFile],
        format: &str,
    ) -> Result<Vec<FileOutcome<ConvertedFile>>, Error> {
        let target = parse_target_format(format).map_err(|e| Error::Generic(e.to_string()))?;

        let mut form = reqwest::multipart::Form::new().text("format", target.token());
        for file in files {
            form = form.part("files", file.part()?);
        }

        let body: ConvertResponse = self.post_form("/convert/images", form, files).await?;
        Ok(body
            .files
            .into_iter()
            .map(|wire| decode_converted(wire, target))
            .collect())
    }

    /// Compress `files` in one request. Quality outside `1..=100` becomes 60.
    pub async fn compress_images(
        &self,
        files: &[UploadFile],
        quality: i64,
    ) -> Result<Vec<FileOutcome<CompressedFile>>, Error> {
        let quality = clamp_quality(quality);

        let mut form = reqwest::multipart::Form::new().text("quality", quality.to_string());
        for file in files {
            form = form.part("files", file.part()?);
        }

        let body: CompressResponse = self.post_form("/compress/images", form, files).await?;
        Ok(body.files.into_iter().map(decode_compressed).collect())
    }

    async fn post_form<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
        files: &[UploadFile],
    ) -> Result<T, Error> {
        for file in files {
            log::info!(
                "Queued {} ({:.2} KiB, {})",
                file.name,
                file.bytes.len() as f64 / 1024.0,
                file.content_type
            );
        }

        let url = format!("{}{path}", self.base_url);
        log::debug!("POST {url}");
        let started = Instant::now();

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;

        log::info!(
            "{url} answered {} in {} ms",
            response.status(),
            started.elapsed().as_millis()
        );

        let response = check_response(response).await?;

        response
            .json::<T>()
            .await
            .map_err(|e| Error::Decode(e.to_string()))
    }
}

/// Check that an HTTP response was successful, returning a descriptive error otherwise.
async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, Error> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(Error::Api { status, body })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Multipart;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    /// Echo the multipart fields back so tests can assert on what was sent.
    async fn collect_fields(mut multipart: Multipart) -> Vec<(String, Option<String>, String)> {
        let mut fields = Vec::new();
        while let Some(field) = multipart.next_field().await.unwrap() {
            let name = field.name().unwrap_or_default().to_string();
            let file_name = field.file_name().map(str::to_string);
            let text = String::from_utf8_lossy(&field.bytes().await.unwrap()).to_string();
            fields.push((name, file_name, text));
        }
        fields
    }

    async fn convert_handler(multipart: Multipart) -> Json<Value> {
        let fields = collect_fields(multipart).await;
        let format = fields
            .iter()
            .find(|(name, _, _)| name == "format")
            .map(|(_, _, value)| value.clone())
            .unwrap_or_default();

        let files: Vec<Value> = fields
            .iter()
            .filter(|(name, _, _)| name == "files")
            .map(|(_, file_name, body)| {
                let original = file_name.clone().unwrap_or_default();
                if body == "broken" {
                    json!({ "original_name": original, "name": "", "url": "error:cannot decode", "size": 0 })
                } else {
                    json!({
                        "original_name": original,
                        "name": format!("out.{format}"),
                        "url": "data:image/webp;base64,aGk=",
                        "size": 2
                    })
                }
            })
            .collect();

        Json(json!({ "files": files }))
    }

    async fn compress_handler(multipart: Multipart) -> Json<Value> {
        let fields = collect_fields(multipart).await;
        let quality = fields
            .iter()
            .find(|(name, _, _)| name == "quality")
            .map(|(_, _, value)| value.clone())
            .unwrap_or_default();
        let files: Vec<Value> = fields
            .iter()
            .filter(|(name, _, _)| name == "files")
            .map(|(_, file_name, _)| {
                json!({
                    "originalName": file_name.clone().unwrap_or_default(),
                    "name": format!("q{quality}.png"),
                    "url": "data:image/png;base64,aGk=",
                    "originalSize": 100,
                    "compressedSize": 40,
                    "compressionRatio": 60.0
                })
            })
            .collect();

        Json(json!({ "files": files }))
    }

    async fn spawn(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/")
    }

    fn upload(name: &str, body: &str) -> UploadFile {
        UploadFile {
            name: name.to_string(),
            content_type: mime_from_extension(name).to_string(),
            bytes: body.as_bytes().to_vec(),
        }
    }

    // ============================================================================
    // Conversion
    // ============================================================================

    #[tokio::test]
    async fn test_convert_sends_format_and_decodes_outcomes() {
        let base = spawn(Router::new().route("/convert/images", post(convert_handler))).await;
        let client = ApiClient::new(&base);

        let outcomes = client
            .convert_images(&[upload("a.png", "ok"), upload("b.png", "broken")], "WEBP")
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 2);
        match &outcomes[0] {
            FileOutcome::Succeeded(file) => {
                assert_eq!(file.original_name, "a.png");
                assert_eq!(file.name, "out.webp");
                assert_eq!(file.converted_format, ImageFormat::Webp);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(
            outcomes[1],
            FileOutcome::Failed {
                original_name: "b.png".to_string(),
                reason: "cannot decode".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_convert_defaults_empty_format_to_webp() {
        let base = spawn(Router::new().route("/convert/images", post(convert_handler))).await;
        let outcomes = ApiClient::new(&base)
            .convert_images(&[upload("a.png", "ok")], "")
            .await
            .unwrap();

        match &outcomes[0] {
            FileOutcome::Succeeded(file) => assert_eq!(file.name, "out.webp"),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_convert_rejects_unknown_target_before_sending() {
        let client = ApiClient::new("http://127.0.0.1:9");
        let err = client
            .convert_images(&[upload("a.png", "ok")], "bmp")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Generic(_)));
    }

    // ============================================================================
    // Compression
    // ============================================================================

    #[tokio::test]
    async fn test_compress_batches_files_and_clamps_quality() {
        let base = spawn(Router::new().route("/compress/images", post(compress_handler))).await;
        let client = ApiClient::new(&base);

        let outcomes = client
            .compress_images(&[upload("a.png", "1"), upload("b.jpg", "2")], 0)
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 2);
        for outcome in &outcomes {
            match outcome {
                FileOutcome::Succeeded(file) => {
                    assert_eq!(file.name, "q60.png");
                    assert_eq!(file.compressed_size, 40);
                    assert_eq!(file.compression_ratio, 60.0);
                }
                other => panic!("unexpected outcome: {other:?}"),
            }
        }
    }

    // ============================================================================
    // Failures
    // ============================================================================

    #[tokio::test]
    async fn test_http_error_is_classified() {
        let router = Router::new().route(
            "/compress/images",
            post(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }),
        );
        let base = spawn(router).await;

        let err = ApiClient::new(&base)
            .compress_images(&[upload("a.png", "1")], 80)
            .await
            .unwrap_err();

        match err {
            Error::Api { status, body } => {
                assert_eq!(status, 502);
                assert_eq!(body, "upstream down");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let router = Router::new().route("/compress/images", post(|| async { "not json" }));
        let base = spawn(router).await;

        let err = ApiClient::new(&base)
            .compress_images(&[upload("a.png", "1")], 80)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = ApiClient::new(&format!("http://{addr}"))
            .compress_images(&[upload("a.png", "1")], 80)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }

    // ============================================================================
    // Upload files
    // ============================================================================

    #[tokio::test]
    async fn test_upload_file_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.JPG");
        std::fs::write(&path, b"abc").unwrap();

        let file = UploadFile::from_path(&path).await.unwrap();
        assert_eq!(file.name, "photo.JPG");
        assert_eq!(file.content_type, "image/jpeg");
        assert_eq!(file.selected().size, 3);

        assert!(UploadFile::from_path(&dir.path().join("missing.png")).await.is_err());
    }

    #[test]
    fn test_mime_from_extension() {
        assert_eq!(mime_from_extension("a.heic"), "image/heic");
        assert_eq!(mime_from_extension("a.gif"), "image/gif");
        assert_eq!(mime_from_extension("README"), "application/octet-stream");
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        assert_eq!(ApiClient::new("http://x:1//").base_url(), "http://x:1");
    }
}
