use std::time::Duration;

use reqwest::header::CONTENT_TYPE;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Invalid image URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Download failed: {0}")]
    Download(String),
    #[error("Downloaded data is not a decodable image: {0}")]
    Decode(String),
}

pub struct FetchedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// Downloads and decode-checks images referenced by URL. Every detection
/// strategy goes through this, so fetch failures look the same to callers
/// regardless of the active backend.
#[derive(Clone)]
pub struct ImageFetcher {
    client: reqwest::Client,
}

impl ImageFetcher {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    pub async fn fetch(&self, image_url: &str) -> Result<FetchedImage, FetchError> {
        let parsed = url::Url::parse(image_url)?;

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| FetchError::Download(e.to_string()))?
            .error_for_status()
            .map_err(|e| FetchError::Download(e.to_string()))?;

        let mime_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.split(';').next().unwrap_or(value).trim().to_string())
            .filter(|value| value.starts_with("image/"))
            .unwrap_or_else(|| "image/jpeg".to_string());

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::Download(e.to_string()))?
            .to_vec();

        image::load_from_memory(&bytes).map_err(|e| FetchError::Decode(e.to_string()))?;

        Ok(FetchedImage { bytes, mime_type })
    }
}
