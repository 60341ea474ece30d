use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use ab_glyph::FontArc;
use clap::Parser;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::overlay::bundled_font;
use crate::vision::ThumbnailSpec;

pub const DEFAULT_SETTINGS_FILE: &str = "appsettings.json";
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const THUMBNAIL_SIDE: RangeInclusive<u64> = 1..=1024;
const TIMEOUT_SECS: RangeInclusive<u64> = 1..=600;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("missing setting: {0}")]
    Missing(&'static str),
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("{setting} must be in {min}..={max}, got {value}")]
    OutOfRange {
        setting: &'static str,
        value: u64,
        min: u64,
        max: u64,
    },
    #[error("failed to load font {path}: {reason}")]
    Font { path: PathBuf, reason: String },
}

/// Interactive image analysis against a Computer Vision endpoint.
#[derive(Debug, Default, Parser)]
#[command(name = "vision-lens", version, about)]
pub struct Cli {
    /// Settings file holding the endpoint and key
    #[arg(long, default_value = DEFAULT_SETTINGS_FILE)]
    pub settings: PathBuf,

    /// Service endpoint, overrides the settings file
    #[arg(long, env = "VISION_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Subscription key, overrides the settings file
    #[arg(long, env = "VISION_KEY", hide_env_values = true)]
    pub key: Option<String>,

    /// TrueType/OpenType font used for object labels
    #[arg(long, env = "VISION_FONT")]
    pub font: Option<PathBuf>,

    /// Directory receiving objects.jpg and thumbnail.png
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
}

/// Raw shape of `appsettings.json`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct SettingsFile {
    cognitive_services_endpoint: Option<String>,
    cognitive_service_key: Option<String>,
    font_path: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    thumbnail_width: Option<u32>,
    thumbnail_height: Option<u32>,
    smart_cropping: Option<bool>,
    request_timeout_secs: Option<u64>,
}

/// Validated startup configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    pub endpoint: Url,
    pub key: String,
    pub font_path: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub thumbnail: ThumbnailSpec,
    pub request_timeout_secs: u64,
}

impl Settings {
    /// Merge the settings file with flags and environment. The file may be
    /// absent when both endpoint and key come from the command line.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let file = match read_settings_file(&cli.settings) {
            Ok(file) => file,
            Err(ConfigError::Read { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound
                    && cli.endpoint.is_some()
                    && cli.key.is_some() =>
            {
                debug!("{} not found, using command line values", cli.settings.display());
                SettingsFile::default()
            }
            Err(e) => return Err(e),
        };
        Self::merge(file, cli)
    }

    fn merge(file: SettingsFile, cli: &Cli) -> Result<Self, ConfigError> {
        let endpoint = cli
            .endpoint
            .clone()
            .or(file.cognitive_services_endpoint)
            .ok_or(ConfigError::Missing("CognitiveServicesEndpoint"))?;
        let key = cli
            .key
            .clone()
            .or(file.cognitive_service_key)
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::Missing("CognitiveServiceKey"))?;

        let defaults = ThumbnailSpec::default();
        let width = file.thumbnail_width.unwrap_or(defaults.width);
        let height = file.thumbnail_height.unwrap_or(defaults.height);
        let timeout = file.request_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        check_range("ThumbnailWidth", width as u64, THUMBNAIL_SIDE)?;
        check_range("ThumbnailHeight", height as u64, THUMBNAIL_SIDE)?;
        check_range("RequestTimeoutSecs", timeout, TIMEOUT_SECS)?;

        Ok(Self {
            endpoint: validate_endpoint(&endpoint)?,
            key,
            font_path: cli.font.clone().or(file.font_path),
            output_dir: cli
                .output_dir
                .clone()
                .or(file.output_dir)
                .unwrap_or_else(|| PathBuf::from(".")),
            thumbnail: ThumbnailSpec {
                width,
                height,
                smart_cropping: file.smart_cropping.unwrap_or(defaults.smart_cropping),
            },
            request_timeout_secs: timeout,
        })
    }

    /// The configured label font, or the bundled one when none is set.
    pub fn label_font(&self) -> Result<FontArc, ConfigError> {
        match &self.font_path {
            Some(path) => load_font(path),
            None => Ok(bundled_font()),
        }
    }
}

pub fn load_font(path: &Path) -> Result<FontArc, ConfigError> {
    let data = std::fs::read(path).map_err(|e| ConfigError::Font {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let font = FontArc::try_from_vec(data).map_err(|e| ConfigError::Font {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    debug!("using label font {}", path.display());
    Ok(font)
}

fn check_range(setting: &'static str, value: u64, range: RangeInclusive<u64>) -> Result<(), ConfigError> {
    if range.contains(&value) {
        return Ok(());
    }
    Err(ConfigError::OutOfRange {
        setting,
        value,
        min: *range.start(),
        max: *range.end(),
    })
}

fn read_settings_file(path: &Path) -> Result<SettingsFile, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn validate_endpoint(endpoint: &str) -> Result<Url, ConfigError> {
    let parsed = Url::parse(endpoint.trim())
        .map_err(|e| ConfigError::InvalidEndpoint(format!("{}: {}", endpoint, e)))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(ConfigError::InvalidEndpoint(format!(
            "unsupported scheme '{}'",
            other
        ))),
    }
}
