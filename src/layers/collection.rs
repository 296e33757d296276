use std::sync::Arc;
use crate::config::ReviewConfig;
use crate::layers::allocation::AllocationPlan;
use crate::layers::discovery::PaperSource;
use crate::layers::resolution::Resolver;
use crate::layers::search::SearchAdapter;
use crate::layers::{Corpus, PaperRecord};

/// Fills a fresh [`Corpus`] one sub-topic at a time.
pub struct CollectionOrchestrator {
    search: SearchAdapter,
    raw_limit: usize,
    title_similarity: f64,
}

impl CollectionOrchestrator {
    pub fn new(source: Arc<dyn PaperSource>, config: &ReviewConfig) -> Self {
        Self {
            search: SearchAdapter::new(source),
            raw_limit: config.raw_search_limit,
            title_similarity: config.duplicate_title_similarity,
        }
    }

    /// Sub-topics are searched sequentially, in order. A sub-topic whose
    /// search fails ends up with an empty list; the others are unaffected.
    pub async fn collect(
        &self,
        topic: &str,
        sub_topics: &[String],
        start_year: Option<i32>,
        end_year: Option<i32>,
        plan: &AllocationPlan,
    ) -> Corpus {
        let mut corpus = Corpus::new(topic);
        let total = sub_topics.len();

        for (idx, sub_topic) in sub_topics.iter().enumerate() {
            tracing::info!("Processing sub-topic {}/{}: {}", idx + 1, total, sub_topic);
            let papers = self
                .collect_sub_topic(topic, sub_topic, start_year, end_year, plan.quota_for(sub_topic))
                .await;
            corpus.sub_topics.insert(sub_topic.clone(), papers);
        }

        tracing::info!("Collected {} papers across {} sub-topics", corpus.paper_count(), total);
        corpus
    }

    pub async fn collect_sub_topic(
        &self,
        topic: &str,
        sub_topic: &str,
        start_year: Option<i32>,
        end_year: Option<i32>,
        quota: usize,
    ) -> Vec<PaperRecord> {
        let query = format!("{} {}", topic, sub_topic);
        let results = self.search.search(&query, start_year, end_year, self.raw_limit).await;

        let parsed: Vec<PaperRecord> = results.iter().filter_map(PaperRecord::from_raw).collect();
        if parsed.len() < results.len() {
            tracing::warn!(
                "Skipped {} malformed results for sub-topic '{}'",
                results.len() - parsed.len(),
                sub_topic
            );
        }

        let mut papers = Resolver::dedup(parsed, self.title_similarity);
        papers.truncate(quota);

        for (n, paper) in papers.iter().enumerate() {
            tracing::info!("    Added paper {}: {}", n + 1, paper.title);
        }
        if papers.is_empty() {
            tracing::warn!("No papers collected for sub-topic '{}'", sub_topic);
        }
        papers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::testing::{FakeSource, TITLE_WORDS, raw_paper};

    fn sub_topics() -> Vec<String> {
        vec!["decoders".to_string(), "qubits".to_string(), "thresholds".to_string()]
    }

    fn papers_for(prefix: &str, n: usize) -> Vec<crate::layers::RawPaper> {
        (0..n)
            .map(|i| raw_paper(&format!("{}.{:05}", prefix, i), &format!("{} methods, series {}", TITLE_WORDS[i], prefix), 2022))
            .collect()
    }

    #[tokio::test]
    async fn test_collect_truncates_to_quota_in_provider_order() {
        let source = FakeSource::new()
            .with_results("qec decoders", papers_for("2201", 6))
            .with_results("qec qubits", papers_for("2202", 2))
            .with_results("qec thresholds", papers_for("2203", 4));
        let orchestrator = CollectionOrchestrator::new(Arc::new(source), &ReviewConfig::default());
        let plan = AllocationPlan::new(&sub_topics(), 9);

        let corpus = orchestrator.collect("qec", &sub_topics(), None, None, &plan).await;

        let keys: Vec<_> = corpus.sub_topics.keys().cloned().collect();
        assert_eq!(keys, sub_topics());
        let decoders = &corpus.sub_topics["decoders"];
        assert_eq!(decoders.len(), 3);
        assert_eq!(decoders[0].identifier, "2201.00000v1");
        assert_eq!(decoders[2].identifier, "2201.00002v1");
        assert_eq!(corpus.sub_topics["qubits"].len(), 2);
        assert_eq!(corpus.sub_topics["thresholds"].len(), 3);
    }

    #[tokio::test]
    async fn test_failed_sub_topic_is_left_empty() {
        let source = FakeSource::new()
            .with_results("qec decoders", papers_for("2201", 3))
            .failing("qec qubits")
            .with_results("qec thresholds", papers_for("2203", 3));
        let orchestrator = CollectionOrchestrator::new(Arc::new(source), &ReviewConfig::default());
        let plan = AllocationPlan::new(&sub_topics(), 9);

        let corpus = orchestrator.collect("qec", &sub_topics(), None, None, &plan).await;
        assert_eq!(corpus.sub_topics.len(), 3);
        assert!(corpus.sub_topics["qubits"].is_empty());
        assert_eq!(corpus.paper_count(), 6);
    }

    #[tokio::test]
    async fn test_requests_generous_raw_limit_and_year_bounds() {
        let source = Arc::new(FakeSource::new());
        let orchestrator = CollectionOrchestrator::new(source.clone(), &ReviewConfig::default());

        orchestrator.collect_sub_topic("qec", "decoders", Some(2020), Some(2024), 2).await;

        let queries = source.queries();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].query, "qec decoders");
        assert_eq!(queries[0].max_results, 100);
        assert_eq!(queries[0].end_year, Some(2024));
    }

    #[tokio::test]
    async fn test_companion_papers_both_fill_quota() {
        let results = vec![
            raw_paper("2101.00001", "Quantum error correction with surface codes: Part I", 2021),
            raw_paper("2102.00002", "Quantum error correction with surface codes: Part II", 2021),
        ];
        let source = FakeSource::new().with_results("qec decoders", results);
        let orchestrator = CollectionOrchestrator::new(Arc::new(source), &ReviewConfig::default());

        let papers = orchestrator.collect_sub_topic("qec", "decoders", None, None, 2).await;
        let ids: Vec<_> = papers.iter().map(|p| p.identifier.as_str()).collect();
        assert_eq!(ids, vec!["2101.00001v1", "2102.00002v1"]);
    }

    #[tokio::test]
    async fn test_duplicates_do_not_consume_quota() {
        let mut results = papers_for("2201", 3);
        results.insert(1, raw_paper("2201.00000", "Alpha methods, series 2201", 2022));
        let source = FakeSource::new().with_results("qec decoders", results);
        let orchestrator = CollectionOrchestrator::new(Arc::new(source), &ReviewConfig::default());

        let papers = orchestrator.collect_sub_topic("qec", "decoders", None, None, 3).await;
        let ids: Vec<_> = papers.iter().map(|p| p.identifier.as_str()).collect();
        assert_eq!(ids, vec!["2201.00000v1", "2201.00001v1", "2201.00002v1"]);
    }
}
