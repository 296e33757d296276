use anyhow::{Context, Result, anyhow};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub const DEFAULT_INFERENCE_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai/";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_ARXIV_URL: &str = "http://export.arxiv.org/api/query";

/// Settings shared by every stage of a run. Built once, then only borrowed.
#[derive(Debug, Clone)]
pub struct ReviewConfig {
    pub inference_base_url: String,
    pub inference_api_key: Option<String>,
    pub model: String,
    pub subtopic_temperature: f32,
    pub report_temperature: f32,
    pub arxiv_base_url: String,
    pub request_timeout: Duration,
    /// Raw results requested per sub-topic search, before year filtering.
    pub raw_search_limit: usize,
    /// Normalized levenshtein similarity at which two titles count as the same paper.
    pub duplicate_title_similarity: f64,
    pub subtopic_attempts: u32,
    /// Agent rounds per under-filled sub-topic. Zero disables backfill.
    pub backfill_attempts: u32,
    pub database_dir: PathBuf,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            inference_base_url: DEFAULT_INFERENCE_BASE_URL.to_string(),
            inference_api_key: None,
            model: DEFAULT_MODEL.to_string(),
            subtopic_temperature: 0.8,
            report_temperature: 0.7,
            arxiv_base_url: DEFAULT_ARXIV_URL.to_string(),
            request_timeout: Duration::from_secs(300),
            raw_search_limit: 100,
            duplicate_title_similarity: 0.95,
            subtopic_attempts: 2,
            backfill_attempts: 0,
            database_dir: PathBuf::from("database"),
        }
    }
}

impl ReviewConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        config.inference_api_key = env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty());
        if let Ok(base_url) = env::var("OPENAI_BASE_URL") {
            if !base_url.is_empty() {
                config.inference_base_url = base_url;
            }
        }
        if let Ok(model) = env::var("LITREVIEW_MODEL") {
            config.model = model;
        }
        if let Ok(dir) = env::var("LITREVIEW_DATABASE_DIR") {
            config.database_dir = PathBuf::from(dir);
        }
        if let Ok(secs) = env::var("LITREVIEW_TIMEOUT_SECS") {
            let secs: u64 = secs
                .parse()
                .with_context(|| format!("LITREVIEW_TIMEOUT_SECS must be a whole number of seconds, got '{}'", secs))?;
            config.request_timeout = Duration::from_secs(secs);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.inference_base_url)
            .with_context(|| format!("Invalid inference base URL: {}", self.inference_base_url))?;
        Url::parse(&self.arxiv_base_url)
            .with_context(|| format!("Invalid arXiv base URL: {}", self.arxiv_base_url))?;
        if self.raw_search_limit == 0 {
            return Err(anyhow!("raw_search_limit must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.duplicate_title_similarity) {
            return Err(anyhow!(
                "duplicate_title_similarity must lie in [0, 1], got {}",
                self.duplicate_title_similarity
            ));
        }
        Ok(())
    }

    pub fn corpus_path(&self) -> PathBuf {
        self.database_dir.join("literature_data.json")
    }

    pub fn report_path(&self) -> PathBuf {
        self.database_dir.join("literature_review_report.md")
    }

    pub fn novel_approach_path(&self) -> PathBuf {
        self.database_dir.join("novel_approach.md")
    }
}
