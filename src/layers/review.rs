use anyhow::Result;
use std::sync::Arc;
use thiserror::Error;
use crate::config::ReviewConfig;
use crate::layers::agent::RetryPolicy;
use crate::layers::allocation::AllocationPlan;
use crate::layers::backfill::{BackfillAgent, BackfillError};
use crate::layers::collection::CollectionOrchestrator;
use crate::layers::discovery::{ArxivClient, PaperSource};
use crate::layers::inference::{InferenceClient, OpenAiCompatClient};
use crate::layers::store::CorpusStore;
use crate::layers::subtopics::{SubTopicGenerator, merge_sub_topics};
use crate::layers::Corpus;

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("no sub-topics identified for '{0}'")]
    NoSubTopics(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewRequest {
    pub topic: String,
    pub start_year: Option<i32>,
    pub end_year: Option<i32>,
    pub max_count: usize,
    pub user_sub_topics: Vec<String>,
}

/// One configured pipeline: sub-topics, allocation, collection, backfill, persistence.
pub struct LiteratureReview {
    config: ReviewConfig,
    inference: Arc<dyn InferenceClient>,
    source: Arc<dyn PaperSource>,
}

impl LiteratureReview {
    pub fn new(config: ReviewConfig, inference: Arc<dyn InferenceClient>, source: Arc<dyn PaperSource>) -> Self {
        Self { config, inference, source }
    }

    /// Wires the arXiv and OpenAI-compatible clients.
    pub fn from_config(config: ReviewConfig) -> Result<Self> {
        config.validate()?;
        let inference = Arc::new(OpenAiCompatClient::new(&config)?);
        let source = Arc::new(ArxivClient::new(&config)?);
        Ok(Self::new(config, inference, source))
    }

    pub fn config(&self) -> &ReviewConfig {
        &self.config
    }

    pub fn inference(&self) -> Arc<dyn InferenceClient> {
        Arc::clone(&self.inference)
    }

    /// Fails only when there is no sub-topic to search. A corpus that cannot
    /// be persisted is still returned. Backfill, when enabled, is the only
    /// edit made to the corpus after collection.
    pub async fn run(&self, request: &ReviewRequest) -> Result<Corpus, ReviewError> {
        tracing::info!("=== Starting Literature Review: {} ===", request.topic);
        tracing::info!(
            "Date range: {:?}-{:?}, max total papers: {}",
            request.start_year,
            request.end_year,
            request.max_count
        );

        let generator = SubTopicGenerator::new(
            Arc::clone(&self.inference),
            self.config.subtopic_temperature,
            RetryPolicy::new(self.config.subtopic_attempts.max(1)),
        );
        let generated = generator.generate(&request.topic).await;
        let sub_topics = merge_sub_topics(generated, &request.user_sub_topics);
        if sub_topics.is_empty() {
            tracing::error!("No sub-topics identified for '{}'; exiting", request.topic);
            return Err(ReviewError::NoSubTopics(request.topic.clone()));
        }
        tracing::info!("Identified sub-topics:\n  {}", sub_topics.join("\n  "));

        let plan = AllocationPlan::new(&sub_topics, request.max_count);
        tracing::info!(
            "We have {} sub-topics. Each sub-topic will collect up to {} papers.",
            sub_topics.len(),
            plan.per_sub_topic()
        );

        let orchestrator = CollectionOrchestrator::new(Arc::clone(&self.source), &self.config);
        let mut corpus = orchestrator
            .collect(&request.topic, &sub_topics, request.start_year, request.end_year, &plan)
            .await;

        if self.config.backfill_attempts > 0 {
            self.backfill(&mut corpus, request, &plan).await;
        }

        let store = CorpusStore::new(self.config.corpus_path());
        match store.save(&corpus).await {
            Ok(()) => tracing::info!("=== Data collection completed successfully ==="),
            Err(e) => tracing::error!("Failed to save results: {}", e),
        }

        Ok(corpus)
    }

    async fn backfill(&self, corpus: &mut Corpus, request: &ReviewRequest, plan: &AllocationPlan) {
        let agent = BackfillAgent::new(Arc::clone(&self.inference), Arc::clone(&self.source), &self.config);

        for (sub_topic, papers) in corpus.sub_topics.iter_mut() {
            let quota = plan.quota_for(sub_topic);
            if papers.len() >= quota {
                continue;
            }
            tracing::info!("Backfilling '{}': {} of {} papers", sub_topic, papers.len(), quota);
            let outcome = agent
                .fill(&request.topic, sub_topic, papers.as_slice(), quota, request.start_year, request.end_year)
                .await;
            match outcome {
                Ok(added) => papers.extend(added),
                Err(e) => {
                    tracing::warn!("Backfill for '{}' {}", sub_topic, e);
                    let BackfillError::Exhausted { added, .. } = e;
                    papers.extend(added);
                }
            }
        }
    }
}

/// Library entry point. `None` means the run had nothing to search and no
/// corpus was written.
pub async fn perform_literature_review(
    review: &LiteratureReview,
    topic: &str,
    start_year: Option<i32>,
    end_year: Option<i32>,
    max_count: usize,
    user_sub_topics: Option<&[String]>,
) -> Option<Corpus> {
    let request = ReviewRequest {
        topic: topic.to_string(),
        start_year,
        end_year,
        max_count,
        user_sub_topics: user_sub_topics.map(<[String]>::to_vec).unwrap_or_default(),
    };
    match review.run(&request).await {
        Ok(corpus) => Some(corpus),
        Err(e) => {
            tracing::error!("Literature review failed: {}", e);
            None
        }
    }
}
