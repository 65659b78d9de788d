use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub crawl: CrawlConfig,
    #[serde(default)]
    pub cleaning: CleaningConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IndexConfig {
    /// Root directory holding one self-contained index per bot id.
    pub root: PathBuf,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./data/index"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CrawlConfig {
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,
    #[serde(default = "default_crawl_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_pages: default_max_pages(),
            timeout_secs: default_crawl_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_max_pages() -> usize {
    10
}
fn default_crawl_timeout() -> u64 {
    30
}
fn default_user_agent() -> String {
    concat!("sitebot/", env!("CARGO_PKG_VERSION")).to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct CleaningConfig {
    /// Lines shorter than this (in characters) are dropped as junk.
    #[serde(default = "default_min_line_len")]
    pub min_line_len: usize,
    /// Case-insensitive regex patterns stripped from page text before
    /// chunking. Defaults cover common navigation/footer boilerplate.
    #[serde(default = "default_boilerplate_patterns")]
    pub boilerplate_patterns: Vec<String>,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            min_line_len: default_min_line_len(),
            boilerplate_patterns: default_boilerplate_patterns(),
        }
    }
}

fn default_min_line_len() -> usize {
    25
}

fn default_boilerplate_patterns() -> Vec<String> {
    [
        r"home about us work contact us career",
        r"© \d{4}",
        r"newsletter",
        r"follow us",
        r"privacy policy",
        r"terms and conditions",
        r"copyright",
        r"all rights reserved",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    /// Maximum words per passage. A single sentence longer than this is
    /// kept whole in its own passage rather than truncated.
    #[serde(default = "default_max_words")]
    pub max_words: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_words: default_max_words(),
        }
    }
}

fn default_max_words() -> usize {
    700
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

fn default_top_k() -> usize {
    3
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            dims: None,
            api_base: default_api_base(),
            batch_size: default_batch_size(),
            timeout_secs: default_provider_timeout(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct GenerationConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            api_base: default_api_base(),
            timeout_secs: default_generation_timeout(),
        }
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_api_base() -> String {
    "https://api.openai.com".to_string()
}
fn default_batch_size() -> usize {
    64
}
fn default_provider_timeout() -> u64 {
    30
}
fn default_generation_timeout() -> u64 {
    60
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

impl GenerationConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.chunking.max_words == 0 {
        anyhow::bail!("chunking.max_words must be > 0");
    }

    if config.retrieval.top_k < 1 {
        anyhow::bail!("retrieval.top_k must be >= 1");
    }

    if config.crawl.max_pages < 1 {
        anyhow::bail!("crawl.max_pages must be >= 1");
    }

    for pattern in &config.cleaning.boilerplate_patterns {
        regex::Regex::new(pattern)
            .with_context(|| format!("cleaning.boilerplate_patterns: invalid pattern '{pattern}'"))?;
    }

    if config.embedding.is_enabled() {
        if config.embedding.dims.is_none() || config.embedding.dims == Some(0) {
            anyhow::bail!(
                "embedding.dims must be > 0 when provider is '{}'",
                config.embedding.provider
            );
        }
        if config.embedding.model.is_none() {
            anyhow::bail!(
                "embedding.model must be specified when provider is '{}'",
                config.embedding.provider
            );
        }
    }

    if config.generation.is_enabled() && config.generation.model.is_none() {
        anyhow::bail!(
            "generation.model must be specified when provider is '{}'",
            config.generation.provider
        );
    }

    match config.embedding.provider.as_str() {
        "disabled" | "openai" => {}
        other => anyhow::bail!(
            "Unknown embedding provider: '{}'. Must be disabled or openai.",
            other
        ),
    }

    match config.generation.provider.as_str() {
        "disabled" | "openai" => {}
        other => anyhow::bail!(
            "Unknown generation provider: '{}'. Must be disabled or openai.",
            other
        ),
    }

    Ok(config)
}
