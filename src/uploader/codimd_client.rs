use reqwest::{multipart, Body, Client};
use serde::Deserialize;
use thiserror::Error;

use super::spool::SpooledFile;

/// Endpoint appended to the configured base URL
pub const UPLOAD_PATH: &str = "uploadimage";

/// Name of the multipart part carrying the image
pub const IMAGE_FIELD: &str = "image";

#[derive(Debug, Clone, Deserialize)]
pub struct UploadImageResponse {
    pub link: String,
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("could not read spool file: {0}")]
    Spool(#[from] std::io::Error),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected status code {status}")]
    BadStatus { status: u16 },

    #[error("unexpected upload response (status {status}): {reason}")]
    Malformed { status: u16, reason: String },
}

/// Thin client for a CodiMD-compatible image upload endpoint.
///
/// Cloning is cheap and shares the connection pool.
#[derive(Debug, Clone, Default)]
pub struct CodimdClient {
    client: Client,
}

impl CodimdClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    pub fn upload_url(base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), UPLOAD_PATH)
    }

    pub async fn build_form(
        spooled: &SpooledFile,
        mime_type: &str,
    ) -> Result<multipart::Form, ClientError> {
        let file = tokio::fs::File::open(spooled.path()).await?;
        let length = file.metadata().await?.len();

        let part = multipart::Part::stream_with_length(Body::from(file), length)
            .file_name(spooled.file_name())
            .mime_str(mime_type)?;

        Ok(multipart::Form::new().part(IMAGE_FIELD, part))
    }

    /// Single attempt, no retries.
    pub async fn upload_image(
        &self,
        base_url: &str,
        spooled: &SpooledFile,
        mime_type: &str,
    ) -> Result<UploadImageResponse, ClientError> {
        let url = Self::upload_url(base_url);
        log::debug!("Upload URL: {}", url);

        let form = Self::build_form(spooled, mime_type).await?;
        let response = self.client.post(&url).multipart(form).send().await?;

        let status = response.status();

        // A non-2xx status is final; the body is only read for the log
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            log::error!(
                "Upload failed, unexpected status {} from {}: {}",
                status,
                url,
                &error_text[..floor_char_boundary(&error_text, 300)]
            );
            return Err(ClientError::BadStatus {
                status: status.as_u16(),
            });
        }

        let response_text = response.text().await?;

        parse_upload_response(&response_text).map_err(|reason| ClientError::Malformed {
            status: status.as_u16(),
            reason,
        })
    }
}

/// Decode `{"link": "..."}`; any other shape is rejected.
pub fn parse_upload_response(response_data: &str) -> Result<UploadImageResponse, String> {
    match serde_json::from_str::<UploadImageResponse>(response_data) {
        Ok(response) if response.link.trim().is_empty() => {
            Err("response contained an empty link".to_string())
        }
        Ok(response) => Ok(response),
        Err(e) => {
            log::debug!(
                "Raw response that failed to parse: {}",
                &response_data[..floor_char_boundary(response_data, 300)]
            );
            Err(e.to_string())
        }
    }
}

fn floor_char_boundary(s: &str, max: usize) -> usize {
    if s.len() <= max {
        return s.len();
    }
    (0..=max).rev().find(|&i| s.is_char_boundary(i)).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_url() {
        assert_eq!(
            CodimdClient::upload_url("https://example.org"),
            "https://example.org/uploadimage"
        );
        assert_eq!(
            CodimdClient::upload_url("https://example.org/pad/"),
            "https://example.org/pad/uploadimage"
        );
    }

    #[test]
    fn test_parse_valid_response() {
        let response =
            parse_upload_response(r#"{"link":"https://example.org/uploads/abc.png"}"#).unwrap();
        assert_eq!(response.link, "https://example.org/uploads/abc.png");
    }

    #[test]
    fn test_parse_ignores_extra_fields() {
        let response =
            parse_upload_response(r#"{"link":"https://example.org/u/x.png","size":12}"#).unwrap();
        assert_eq!(response.link, "https://example.org/u/x.png");
    }

    #[test]
    fn test_parse_rejects_bad_bodies() {
        assert!(parse_upload_response("not json").is_err());
        assert!(parse_upload_response("{}").is_err());
        assert!(parse_upload_response(r#"{"link":42}"#).is_err());
        assert!(parse_upload_response(r#"{"link":""}"#).is_err());
    }

    #[test]
    fn test_floor_char_boundary() {
        assert_eq!(floor_char_boundary("abc", 300), 3);
        // 'é' is two bytes, cutting at 1 must back off to 0
        assert_eq!(floor_char_boundary("é", 1), 0);
    }
}
