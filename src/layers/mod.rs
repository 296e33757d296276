use chrono::Local;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Literal written to `metadata.source` of every corpus collected from arXiv.
pub const SOURCE_ARXIV: &str = "arXiv";

/// A validated paper. Every field is populated; see [`PaperRecord::from_raw`].
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PaperRecord {
    pub title: String,
    #[serde(rename = "arxiv_id")]
    pub identifier: String,
    pub published: String,
    pub summary: String,
    pub link: String,
}

/// A search result as the provider returned it. Any field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawPaper {
    pub entry_id: Option<String>,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub published: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub query: String,
    pub start_year: Option<i32>,
    pub end_year: Option<i32>,
    pub max_results: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct CorpusMetadata {
    pub research_topic: String,
    pub generated_at: String,
    pub source: String,
}

/// One literature-review run: metadata plus the papers kept for each sub-topic,
/// in the order the sub-topics were processed.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Corpus {
    pub metadata: CorpusMetadata,
    pub sub_topics: IndexMap<String, Vec<PaperRecord>>,
}

impl Corpus {
    pub fn new(research_topic: &str) -> Self {
        Self {
            metadata: CorpusMetadata {
                research_topic: research_topic.to_string(),
                generated_at: Local::now()
                    .naive_local()
                    .format("%Y-%m-%dT%H:%M:%S%.6f")
                    .to_string(),
                source: SOURCE_ARXIV.to_string(),
            },
            sub_topics: IndexMap::new(),
        }
    }

    pub fn papers(&self) -> impl Iterator<Item = &PaperRecord> {
        self.sub_topics.values().flatten()
    }

    pub fn paper_count(&self) -> usize {
        self.sub_topics.values().map(Vec::len).sum()
    }
}

pub mod agent;
pub mod allocation;
pub mod backfill;
pub mod collection;
pub mod discovery;
pub mod inference;
pub mod novel;
pub mod parser;
pub mod report;
pub mod resolution;
pub mod review;
pub mod search;
pub mod store;
pub mod subtopics;

#[cfg(test)]
pub(crate) mod testing;
