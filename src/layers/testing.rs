//! In-process stand-ins for the inference service and the search provider.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use crate::layers::discovery::PaperSource;
use crate::layers::inference::{InferenceClient, InferenceRequest};
use crate::layers::{RawPaper, SearchQuery};

/// Replies with scripted responses in order, then with empty strings.
pub struct FakeInference {
    responses: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<InferenceRequest>>,
}

impl FakeInference {
    pub fn new(responses: Vec<&str>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(String::from).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<InferenceRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl InferenceClient for FakeInference {
    async fn complete(&self, request: &InferenceRequest) -> String {
        self.requests.lock().unwrap().push(request.clone());
        self.responses.lock().unwrap().pop_front().unwrap_or_default()
    }
}

#[derive(Default)]
pub struct FakeSource {
    results: HashMap<String, Vec<RawPaper>>,
    failing: HashSet<String>,
    by_id: HashMap<String, RawPaper>,
    queries: Mutex<Vec<SearchQuery>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_results(mut self, query: &str, papers: Vec<RawPaper>) -> Self {
        self.results.insert(query.to_string(), papers);
        self
    }

    pub fn failing(mut self, query: &str) -> Self {
        self.failing.insert(query.to_string());
        self
    }

    pub fn with_paper(mut self, id: &str, paper: RawPaper) -> Self {
        self.by_id.insert(id.to_string(), paper);
        self
    }

    pub fn queries(&self) -> Vec<SearchQuery> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaperSource for FakeSource {
    fn name(&self) -> &str {
        "fake"
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<RawPaper>> {
        self.queries.lock().unwrap().push(query.clone());
        if self.failing.contains(&query.query) {
            return Err(anyhow!("connection reset"));
        }
        let mut papers = self.results.get(&query.query).cloned().unwrap_or_default();
        papers.truncate(query.max_results);
        Ok(papers)
    }

    async fn fetch_by_id(&self, id: &str) -> Result<Option<RawPaper>> {
        Ok(self.by_id.get(id).cloned())
    }
}

/// A complete arXiv-style result.
pub fn raw_paper(id: &str, title: &str, year: i32) -> RawPaper {
    RawPaper {
        entry_id: Some(format!("http://arxiv.org/abs/{}v1", id)),
        title: Some(title.to_string()),
        summary: Some(format!("Abstract of {}.", title)),
        published: Some(format!("{}-03-01T12:00:00Z", year)),
    }
}

/// Words distinct enough that titles built from them never look like duplicates.
pub const TITLE_WORDS: [&str; 8] = ["Alpha", "Bravo", "Charlie", "Delta", "Echo", "Foxtrot", "Golf", "Hotel"];
