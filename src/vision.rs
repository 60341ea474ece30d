use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Response, StatusCode};
use tracing::{debug, info};
use url::Url;

use crate::config::Settings;
use crate::models::{AnalysisResult, ApiErrorBody, ImageUrlRequest};

// ── Constants ────────────────────────────────────────────────────────────────

const USER_AGENT: &str = "vision-lens/0.1";
const API_PATH: &str = "vision/v3.2";
const KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";
const INSECURE_ENV: &str = "VISION_LENS_INSECURE_SSL";

/// Feature set requested on every analyze call.
pub const VISUAL_FEATURES: &[&str] = &[
    "Categories",
    "Tags",
    "Description",
    "Brands",
    "Adult",
    "Color",
    "Objects",
];

// ── Error type ───────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum VisionError {
    #[error("failed to build HTTP client: {0}")]
    Client(String),
    #[error("{0}")]
    Request(String),
    #[error("access denied by the vision service: {0}")]
    Unauthorized(String),
    #[error("{message} (HTTP {status})")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },
    #[error("malformed response from the vision service: {0}")]
    Malformed(String),
    #[error("image download returned HTTP {0}")]
    Download(u16),
}

impl From<reqwest::Error> for VisionError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            VisionError::Request(format!("TimeoutError: {}", e))
        } else if e.is_connect() {
            VisionError::Request(format!("ConnectError: {}", e))
        } else {
            VisionError::Request(format!("RequestError: {}", e))
        }
    }
}

// ── Thumbnail parameters ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbnailSpec {
    pub width: u32,
    pub height: u32,
    pub smart_cropping: bool,
}

impl Default for ThumbnailSpec {
    fn default() -> Self {
        Self {
            width: 100,
            height: 100,
            smart_cropping: true,
        }
    }
}

// ── Service seam ─────────────────────────────────────────────────────────────

/// The remote calls one session iteration needs.
#[async_trait]
pub trait VisionApi: Send + Sync {
    async fn analyze(&self, image_url: &str) -> Result<AnalysisResult, VisionError>;

    async fn thumbnail(&self, image_url: &str, spec: ThumbnailSpec)
        -> Result<Vec<u8>, VisionError>;

    /// Download the source image itself, for drawing the overlay.
    async fn fetch_image(&self, image_url: &str) -> Result<Vec<u8>, VisionError>;
}

// ── HTTP client ──────────────────────────────────────────────────────────────

/// Handle to the vision service. Built once at startup and shared by reference.
pub struct VisionClient {
    http: reqwest::Client,
    base: Url,
    key: String,
}

impl VisionClient {
    pub fn new(settings: &Settings) -> Result<Self, VisionError> {
        let insecure = std::env::var(INSECURE_ENV).as_deref() == Ok("1");

        let mut builder = reqwest::ClientBuilder::new()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(10))
            .user_agent(USER_AGENT);

        if insecure {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let http = builder
            .build()
            .map_err(|e| VisionError::Client(e.to_string()))?;

        // A trailing slash makes `join` append instead of replacing the last segment.
        let mut base = settings.endpoint.clone();
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }
        info!("vision client configured: endpoint={}", base);

        Ok(Self {
            http,
            base,
            key: settings.key.clone(),
        })
    }

    fn operation_url(&self, operation: &str) -> Result<Url, VisionError> {
        self.base
            .join(&format!("{}/{}", API_PATH, operation))
            .map_err(|e| VisionError::Client(e.to_string()))
    }

    async fn post_url(&self, url: Url, image_url: &str) -> Result<Response, VisionError> {
        debug!("POST {}", url);
        let response = self
            .http
            .post(url)
            .header(KEY_HEADER, &self.key)
            .json(&ImageUrlRequest { url: image_url })
            .send()
            .await?;
        check_status(response).await
    }
}

#[async_trait]
impl VisionApi for VisionClient {
    async fn analyze(&self, image_url: &str) -> Result<AnalysisResult, VisionError> {
        let mut url = self.operation_url("analyze")?;
        url.query_pairs_mut()
            .append_pair("visualFeatures", &VISUAL_FEATURES.join(","));

        let response = self.post_url(url, image_url).await?;
        let body = response.bytes().await?;
        let result: AnalysisResult =
            serde_json::from_slice(&body).map_err(|e| VisionError::Malformed(e.to_string()))?;

        debug!(
            request_id = result.request_id.as_deref().unwrap_or("-"),
            model = result.model_version.as_deref().unwrap_or("-"),
            objects = result.objects.len(),
            "analysis received"
        );
        if let Some(meta) = &result.metadata {
            debug!(
                "source image {}x{} {}",
                meta.width,
                meta.height,
                meta.format.as_deref().unwrap_or("?")
            );
        }
        Ok(result)
    }

    async fn thumbnail(
        &self,
        image_url: &str,
        spec: ThumbnailSpec,
    ) -> Result<Vec<u8>, VisionError> {
        let mut url = self.operation_url("generateThumbnail")?;
        url.query_pairs_mut()
            .append_pair("width", &spec.width.to_string())
            .append_pair("height", &spec.height.to_string())
            .append_pair("smartCropping", if spec.smart_cropping { "true" } else { "false" });

        let response = self.post_url(url, image_url).await?;
        let bytes = response.bytes().await?;
        debug!("thumbnail received: {} bytes", bytes.len());
        Ok(bytes.to_vec())
    }

    async fn fetch_image(&self, image_url: &str) -> Result<Vec<u8>, VisionError> {
        debug!("GET {}", image_url);
        let response = self
            .http
            .get(image_url)
            .header(header::ACCEPT, "image/*")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(VisionError::Download(response.status().as_u16()));
        }

        let bytes = response.bytes().await?;
        debug!("image downloaded: {} bytes", bytes.len());
        Ok(bytes.to_vec())
    }
}

// ── Response helpers ─────────────────────────────────────────────────────────

async fn check_status(response: Response) -> Result<Response, VisionError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(error_from_body(status, &body))
}

fn error_from_body(status: StatusCode, body: &str) -> VisionError {
    let (code, message) = match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => (parsed.error.code, parsed.error.message),
        Err(_) if body.trim().is_empty() => (
            None,
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string(),
        ),
        Err(_) => (None, body.trim().to_string()),
    };

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return VisionError::Unauthorized(message);
    }
    VisionError::Api {
        status: status.as_u16(),
        code,
        message,
    }
}
