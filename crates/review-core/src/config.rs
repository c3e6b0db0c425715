//! Configuration loader and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars
//! (`__` separates nested keys, e.g. `APP_SERVER__PORT=9001`). Every setting
//! has a default, so the service starts without any file present.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

pub struct Config {
    figment: Figment,
    env_name: String,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment, env_name };
        config.validate_for_env(&config.env_name)?;
        Ok(config)
    }

    pub fn from_figment(figment: Figment, env_name: &str) -> anyhow::Result<Self> {
        let config = Self { figment, env_name: env_name.to_string() };
        config.validate_for_env(env_name)?;
        Ok(config)
    }

    pub fn env_name(&self) -> &str { &self.env_name }

    pub fn settings(&self) -> anyhow::Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate_for_env(&self, env: &str) -> anyhow::Result<()> {
        let settings = self.settings()?;
        match env {
            "prod" | "production" => {
                if settings.embedding.backend == EmbeddingBackend::Hash {
                    anyhow::bail!("embedding.backend = \"hash\" is for development only; configure \"bge-m3\" in production");
                }
            }
            "dev" | "development" => {}
            "test" | "testing" => {}
            _ => {}
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub generation: GenerationSettings,
    pub pipeline: PipelineSettings,
    pub splitter: SplitterSettings,
    pub index: IndexSettings,
    pub embedding: EmbeddingSettings,
}

impl Settings {
    fn validate(&self) -> anyhow::Result<()> {
        if self.pipeline.synthesis_concurrency == 0 { anyhow::bail!("pipeline.synthesis_concurrency must be at least 1"); }
        if self.generation.timeout_secs == 0 { anyhow::bail!("generation.timeout_secs must be positive"); }
        if self.splitter.reviewer_max_chars == 0 || self.splitter.reviewee_max_chars == 0 {
            anyhow::bail!("splitter max_chars values must be positive");
        }
        if self.server.max_upload_mb == 0 { anyhow::bail!("server.max_upload_mb must be positive"); }
        if self.embedding.dim == 0 { anyhow::bail!("embedding.dim must be positive"); }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub upload_dir: String,
    /// Request body limit for document uploads, in MiB.
    pub max_upload_mb: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { host: "0.0.0.0".to_string(), port: 9001, upload_dir: "uploads".to_string(), max_upload_mb: 64 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub endpoint: String,
    pub question_model: String,
    pub comment_model: String,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434/api/generate".to_string(),
            question_model: "llama3.1".to_string(),
            comment_model: "llama3.1".to_string(),
            timeout_secs: 120,
            connect_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub synthesis_concurrency: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self { Self { synthesis_concurrency: 4 } }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitterSettings {
    pub reviewer_max_chars: usize,
    pub reviewee_max_chars: usize,
}

impl Default for SplitterSettings {
    fn default() -> Self { Self { reviewer_max_chars: 1500, reviewee_max_chars: 500 } }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IndexBackend {
    Hybrid,
    Vector,
    Text,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    pub backend: IndexBackend,
    pub data_dir: String,
}

impl Default for IndexSettings {
    fn default() -> Self { Self { backend: IndexBackend::Hybrid, data_dir: "data/indexes".to_string() } }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EmbeddingBackend {
    #[serde(rename = "hash")]
    Hash,
    #[serde(rename = "bge-m3")]
    BgeM3,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub backend: EmbeddingBackend,
    pub dim: usize,
    pub max_len: usize,
    pub model_dir: Option<String>,
}

impl Default for EmbeddingSettings {
    fn default() -> Self { Self { backend: EmbeddingBackend::Hash, dim: 1024, max_len: 256, model_dir: None } }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
