use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::capture::{CAPTURE_BUFFER_CAPACITY, DEFAULT_COOLDOWN_MS};
use crate::catalog::Catalog;
use crate::detection_loop::{LoopSettings, DEFAULT_MIN_SCORE, DEFAULT_TARGET_CLASS};
use crate::frame::{DEFAULT_FRAME_HEIGHT, DEFAULT_FRAME_WIDTH, DEFAULT_STILL_SIZE};

const DEFAULT_SOURCE_URL: &str = "stub://pasture";
const DEFAULT_SOURCE_FPS: u32 = 10;

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct HerdwatchConfigFile {
    source: Option<SourceConfigFile>,
    detection: Option<DetectionConfigFile>,
    capture: Option<CaptureConfigFile>,
    classifier: Option<ClassifierConfigFile>,
    catalog: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Default)]
struct SourceConfigFile {
    url: Option<String>,
    target_fps: Option<u32>,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct DetectionConfigFile {
    target_class: Option<String>,
    min_score: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
struct CaptureConfigFile {
    cooldown_ms: Option<u64>,
    buffer_capacity: Option<usize>,
    target_size: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct ClassifierConfigFile {
    primary_model: Option<PathBuf>,
    primary_labels: Option<PathBuf>,
    fallback_model: Option<PathBuf>,
    fallback_labels: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct HerdwatchConfig {
    pub source: SourceSettings,
    pub detection: DetectionSettings,
    pub capture: CaptureSettings,
    pub classifier: ClassifierSettings,
    pub catalog: Catalog,
}

#[derive(Debug, Clone)]
pub struct SourceSettings {
    pub url: String,
    pub target_fps: u32,
    pub width: u32,
    pub height: u32,
}

impl SourceSettings {
    /// Sleep between ticks; zero when `target_fps` is 0 (run flat out).
    pub fn frame_interval(&self) -> Duration {
        if self.target_fps == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(1000 / u64::from(self.target_fps))
        }
    }
}

#[derive(Debug, Clone)]
pub struct DetectionSettings {
    pub target_class: String,
    pub min_score: f32,
}

impl DetectionSettings {
    pub fn loop_settings(&self) -> LoopSettings {
        LoopSettings {
            target_class: self.target_class.clone(),
            min_score: self.min_score,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CaptureSettings {
    pub cooldown: Duration,
    pub buffer_capacity: usize,
    pub target_size: u32,
}

/// Optional model files. A model without labels (or vice versa) is ignored.
#[derive(Debug, Clone, Default)]
pub struct ClassifierSettings {
    pub primary_model: Option<PathBuf>,
    pub primary_labels: Option<PathBuf>,
    pub fallback_model: Option<PathBuf>,
    pub fallback_labels: Option<PathBuf>,
}

impl ClassifierSettings {
    pub fn primary(&self) -> Option<(&Path, &Path)> {
        self.primary_model
            .as_deref()
            .zip(self.primary_labels.as_deref())
    }

    pub fn fallback(&self) -> Option<(&Path, &Path)> {
        self.fallback_model
            .as_deref()
            .zip(self.fallback_labels.as_deref())
    }
}

impl HerdwatchConfig {
    /// Load from `HERDWATCH_CONFIG` (if set), then apply environment overrides.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("HERDWATCH_CONFIG").ok();
        Self::load_from(config_path.as_deref().map(Path::new))
    }

    /// Load from an explicit file (if any), then apply environment overrides.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let file_cfg = match path {
            Some(path) => Some(read_config_file(path)?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default())?;
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: HerdwatchConfigFile) -> Result<Self> {
        let source = file.source.unwrap_or_default();
        let detection = file.detection.unwrap_or_default();
        let capture = file.capture.unwrap_or_default();
        let classifier = file.classifier.unwrap_or_default();
        let catalog = match file.catalog {
            Some(names) => Catalog::new(names)?,
            None => Catalog::cattle_breeds(),
        };
        Ok(Self {
            source: SourceSettings {
                url: source
                    .url
                    .unwrap_or_else(|| DEFAULT_SOURCE_URL.to_string()),
                target_fps: source.target_fps.unwrap_or(DEFAULT_SOURCE_FPS),
                width: source.width.unwrap_or(DEFAULT_FRAME_WIDTH),
                height: source.height.unwrap_or(DEFAULT_FRAME_HEIGHT),
            },
            detection: DetectionSettings {
                target_class: detection
                    .target_class
                    .unwrap_or_else(|| DEFAULT_TARGET_CLASS.to_string()),
                min_score: detection.min_score.unwrap_or(DEFAULT_MIN_SCORE),
            },
            capture: CaptureSettings {
                cooldown: Duration::from_millis(
                    capture.cooldown_ms.unwrap_or(DEFAULT_COOLDOWN_MS),
                ),
                buffer_capacity: capture.buffer_capacity.unwrap_or(CAPTURE_BUFFER_CAPACITY),
                target_size: capture.target_size.unwrap_or(DEFAULT_STILL_SIZE),
            },
            classifier: ClassifierSettings {
                primary_model: classifier.primary_model,
                primary_labels: classifier.primary_labels,
                fallback_model: classifier.fallback_model,
                fallback_labels: classifier.fallback_labels,
            },
            catalog,
        })
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var("HERDWATCH_SOURCE_URL") {
            if !url.trim().is_empty() {
                self.source.url = url;
            }
        }
        if let Ok(class) = std::env::var("HERDWATCH_TARGET_CLASS") {
            if !class.trim().is_empty() {
                self.detection.target_class = class.trim().to_string();
            }
        }
        if let Ok(score) = std::env::var("HERDWATCH_MIN_SCORE") {
            self.detection.min_score = score
                .trim()
                .parse()
                .map_err(|_| anyhow!("HERDWATCH_MIN_SCORE must be a number between 0 and 1"))?;
        }
        if let Ok(cooldown) = std::env::var("HERDWATCH_COOLDOWN_MS") {
            let ms: u64 = cooldown.trim().parse().map_err(|_| {
                anyhow!("HERDWATCH_COOLDOWN_MS must be an integer number of milliseconds")
            })?;
            self.capture.cooldown = Duration::from_millis(ms);
        }
        if let Ok(capacity) = std::env::var("HERDWATCH_BUFFER_CAPACITY") {
            self.capture.buffer_capacity = capacity
                .trim()
                .parse()
                .map_err(|_| anyhow!("HERDWATCH_BUFFER_CAPACITY must be a positive integer"))?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.detection.min_score) {
            return Err(anyhow!(
                "min_score must be within [0, 1], got {}",
                self.detection.min_score
            ));
        }
        if self.detection.target_class.is_empty() {
            return Err(anyhow!("target_class must not be empty"));
        }
        if self.capture.buffer_capacity == 0 {
            return Err(anyhow!("buffer_capacity must be greater than zero"));
        }
        if self.capture.target_size == 0 {
            return Err(anyhow!("target_size must be greater than zero"));
        }
        if self.source.width == 0 || self.source.height == 0 {
            return Err(anyhow!("source width and height must be greater than zero"));
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<HerdwatchConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let is_toml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    let cfg = if is_toml {
        toml::from_str(&raw).map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    } else {
        serde_json::from_str(&raw)
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    };
    Ok(cfg)
}
