use crate::condition::mapper::{default_rules, KeywordRule, LabelMapper};
use crate::condition::{ConditionLabel, DEFAULT_FALLBACK_WEIGHTS, DEFAULT_TOP_K};
use crate::route::DEFAULT_NARRATIVE_MIN_SHARE;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use velociroute_inference::engine::inference_engine::ExecutionProvider;
use velociroute_inference::utils::extractor::Normalization;
use velociroute_inference::ClassifierConfig;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub model: ModelConfig,
    pub mapping: MappingConfig,
    pub fetch: FetchConfig,
    pub route: RouteConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub workers: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8000".to_string(),
            workers: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub path: PathBuf,
    pub labels: PathBuf,
    pub input_width: u32,
    pub input_height: u32,
    pub scale: f32,
    pub mean: Vec<f32>,
    pub std: Vec<f32>,
    pub apply_softmax: bool,
    pub execution_provider: String,
    pub device_id: i32,
    pub intra_threads: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        let normalization = Normalization::default();
        Self {
            path: PathBuf::from("./data/model/classifier.onnx"),
            labels: PathBuf::from("./data/model/labels.txt"),
            input_width: 224,
            input_height: 224,
            scale: normalization.scale,
            mean: normalization.mean.to_vec(),
            std: normalization.std.to_vec(),
            apply_softmax: true,
            execution_provider: "cpu".to_string(),
            device_id: 0,
            intra_threads: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingConfig {
    pub top_k: usize,
    pub fallback: BTreeMap<ConditionLabel, f64>,
    /// Replaces the built-in keyword table when present.
    pub rules: Option<Vec<KeywordRule>>,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            fallback: ConditionLabel::ALL
                .into_iter()
                .zip(DEFAULT_FALLBACK_WEIGHTS)
                .collect(),
            rules: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Largest image body accepted, in bytes.
    pub max_image_bytes: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: concat!("velociroute/", env!("CARGO_PKG_VERSION")).to_string(),
            max_image_bytes: 20 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteConfig {
    pub timeout_secs: Option<u64>,
    pub narrative_min_share: f64,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            timeout_secs: None,
            narrative_min_share: DEFAULT_NARRATIVE_MIN_SHARE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "velociroute=info,velociroute_inference=info,actix_web=info,ort=warn"
                .to_string(),
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_yaml(&contents)
            .with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.model.input_width == 0 || self.model.input_height == 0 {
            bail!("model input size must be non-zero");
        }
        if self.model.mean.len() != 3 || self.model.std.len() != 3 {
            bail!("model mean and std need exactly 3 channels");
        }
        if self.model.scale == 0.0 || self.model.std.contains(&0.0) {
            bail!("model scale and std must be non-zero");
        }
        ExecutionProvider::from_name(&self.model.execution_provider, self.model.device_id)?;

        let weights = self.mapping.fallback_weights();
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            bail!("fallback weights must be finite and non-negative");
        }
        if weights.iter().sum::<f64>() <= 0.0 {
            bail!("fallback weights must not all be zero");
        }
        if !(0.0..=1.0).contains(&self.route.narrative_min_share) {
            bail!("route narrative_min_share must be within [0, 1]");
        }
        if self.fetch.timeout_secs == 0 {
            bail!("fetch timeout_secs must be positive");
        }
        if self.fetch.max_image_bytes == 0 {
            bail!("fetch max_image_bytes must be positive");
        }

        Ok(())
    }
}

impl ModelConfig {
    pub fn classifier_config(&self) -> Result<ClassifierConfig> {
        Ok(ClassifierConfig {
            input_size: (self.input_width, self.input_height),
            normalization: Normalization {
                scale: self.scale,
                mean: channels(&self.mean, "mean")?,
                std: channels(&self.std, "std")?,
            },
            apply_softmax: self.apply_softmax,
            executor: ExecutionProvider::from_name(&self.execution_provider, self.device_id)?,
            intra_threads: self.intra_threads,
        })
    }
}

fn channels(values: &[f32], name: &str) -> Result<[f32; 3]> {
    values
        .try_into()
        .map_err(|_| anyhow::anyhow!("model {} needs exactly 3 channels", name))
}

impl MappingConfig {
    /// Weights in taxonomy order. Conditions missing from the map keep their default weight.
    pub fn fallback_weights(&self) -> [f64; 4] {
        let mut weights = DEFAULT_FALLBACK_WEIGHTS;
        for (label, weight) in &self.fallback {
            weights[label.index()] = *weight;
        }
        weights
    }

    pub fn label_mapper(&self) -> LabelMapper {
        let rules = self.rules.clone().unwrap_or_else(default_rules);
        LabelMapper::new(rules, self.top_k, self.fallback_weights())
    }
}

impl RouteConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}
