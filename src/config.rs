use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::aggregate::DEFAULT_CONFIDENCE_THRESHOLD;
use crate::preprocess::{
    Rotation, DEFAULT_INPUT_HEIGHT, DEFAULT_INPUT_WIDTH, DEFAULT_NORMALIZE_MEAN,
    DEFAULT_NORMALIZE_STD,
};
use crate::segment::{SegmenterConfig, DEFAULT_MIN_SEGMENT_FRAMES, DEFAULT_MOTION_THRESHOLD};
use crate::sequence::DEFAULT_SEQUENCE_LENGTH;

const DEFAULT_CLASSIFIER_BACKEND: &str = "stub";

#[derive(Debug, Deserialize, Default)]
struct DetectorConfigFile {
    motion_threshold: Option<f32>,
    min_segment_frames: Option<usize>,
    sequence_length: Option<usize>,
    confidence_threshold: Option<f32>,
    rotation: Option<Rotation>,
    input_width: Option<u32>,
    input_height: Option<u32>,
    normalize_mean: Option<f32>,
    normalize_std: Option<f32>,
    parallel_segments: Option<bool>,
    classifier: Option<ClassifierConfigFile>,
    labels_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
struct ClassifierConfigFile {
    backend: Option<String>,
    model_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetectorConfig {
    pub segmenter: SegmenterConfig,
    pub sequence_length: usize,
    pub confidence_threshold: f32,
    pub preprocess: PreprocessSettings,
    pub parallel_segments: bool,
    pub classifier: ClassifierSettings,
    pub labels_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreprocessSettings {
    pub rotation: Rotation,
    pub input_width: u32,
    pub input_height: u32,
    pub normalize_mean: f32,
    pub normalize_std: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierSettings {
    pub backend: String,
    pub model_path: Option<PathBuf>,
}

impl DetectorConfig {
    /// Defaults, then the file named by `SIGN_DETECT_CONFIG`, then `SIGN_*`
    /// environment overrides.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("SIGN_DETECT_CONFIG").ok();
        Self::load_from(config_path.as_deref().map(Path::new))
    }

    /// Like [`DetectorConfig::load`] with an explicit file in place of
    /// `SIGN_DETECT_CONFIG`.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let file_cfg = match path {
            Some(path) => read_config_file(path)?,
            None => DetectorConfigFile::default(),
        };
        let mut cfg = Self::from_file(file_cfg);
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: DetectorConfigFile) -> Self {
        let segmenter = SegmenterConfig {
            motion_threshold: file.motion_threshold.unwrap_or(DEFAULT_MOTION_THRESHOLD),
            min_segment_frames: file
                .min_segment_frames
                .unwrap_or(DEFAULT_MIN_SEGMENT_FRAMES),
        };
        let preprocess = PreprocessSettings {
            rotation: file.rotation.unwrap_or_default(),
            input_width: file.input_width.unwrap_or(DEFAULT_INPUT_WIDTH),
            input_height: file.input_height.unwrap_or(DEFAULT_INPUT_HEIGHT),
            normalize_mean: file.normalize_mean.unwrap_or(DEFAULT_NORMALIZE_MEAN),
            normalize_std: file.normalize_std.unwrap_or(DEFAULT_NORMALIZE_STD),
        };
        let classifier = ClassifierSettings {
            backend: file
                .classifier
                .as_ref()
                .and_then(|classifier| classifier.backend.clone())
                .unwrap_or_else(|| DEFAULT_CLASSIFIER_BACKEND.to_string()),
            model_path: file.classifier.and_then(|classifier| classifier.model_path),
        };
        Self {
            segmenter,
            sequence_length: file.sequence_length.unwrap_or(DEFAULT_SEQUENCE_LENGTH),
            confidence_threshold: file
                .confidence_threshold
                .unwrap_or(DEFAULT_CONFIDENCE_THRESHOLD),
            preprocess,
            parallel_segments: file.parallel_segments.unwrap_or(false),
            classifier,
            labels_path: file.labels_path,
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Some(threshold) = env_parse("SIGN_MOTION_THRESHOLD")? {
            self.segmenter.motion_threshold = threshold;
        }
        if let Some(frames) = env_parse("SIGN_MIN_SEGMENT_FRAMES")? {
            self.segmenter.min_segment_frames = frames;
        }
        if let Some(length) = env_parse("SIGN_SEQUENCE_LENGTH")? {
            self.sequence_length = length;
        }
        if let Some(threshold) = env_parse("SIGN_CONFIDENCE_THRESHOLD")? {
            self.confidence_threshold = threshold;
        }
        if let Some(parallel) = env_parse("SIGN_PARALLEL_SEGMENTS")? {
            self.parallel_segments = parallel;
        }
        if let Ok(backend) = std::env::var("SIGN_CLASSIFIER_BACKEND") {
            if !backend.trim().is_empty() {
                self.classifier.backend = backend.trim().to_string();
            }
        }
        if let Ok(path) = std::env::var("SIGN_MODEL_PATH") {
            if !path.trim().is_empty() {
                self.classifier.model_path = Some(PathBuf::from(path));
            }
        }
        if let Ok(path) = std::env::var("SIGN_LABELS_PATH") {
            if !path.trim().is_empty() {
                self.labels_path = Some(PathBuf::from(path));
            }
        }
        Ok(())
    }

    /// Check invariants. Call again after applying command-line overrides.
    pub fn validate(&self) -> Result<()> {
        let motion = self.segmenter.motion_threshold;
        if !motion.is_finite() || motion < 0.0 {
            return Err(anyhow!(
                "motion_threshold must be a non-negative number, got {}",
                motion
            ));
        }
        if self.sequence_length == 0 {
            return Err(anyhow!("sequence_length must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(anyhow!(
                "confidence_threshold must be within [0, 1], got {}",
                self.confidence_threshold
            ));
        }
        if self.preprocess.input_width == 0 || self.preprocess.input_height == 0 {
            return Err(anyhow!("input size must be non-zero"));
        }
        let std = self.preprocess.normalize_std;
        if !std.is_finite() || std <= 0.0 {
            return Err(anyhow!("normalize_std must be positive, got {}", std));
        }
        if self.classifier.backend.trim().is_empty() {
            return Err(anyhow!("classifier backend must not be empty"));
        }
        Ok(())
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self::from_file(DetectorConfigFile::default())
    }
}

fn read_config_file(path: &Path) -> Result<DetectorConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let is_toml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    let cfg = if is_toml {
        toml::from_str(&raw)
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    } else {
        serde_json::from_str(&raw)
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    };
    Ok(cfg)
}

fn env_parse<T: FromStr>(key: &str) -> Result<Option<T>> {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| anyhow!("{} has an invalid value: {:?}", key, value)),
        _ => Ok(None),
    }
}
