use std::sync::Arc;
use thiserror::Error;
use crate::config::ReviewConfig;
use crate::layers::agent::{AgentAction, RetryPolicy};
use crate::layers::discovery::PaperSource;
use crate::layers::inference::{InferenceClient, InferenceRequest};
use crate::layers::parser::parse_block;
use crate::layers::resolution::Resolver;
use crate::layers::search::SearchAdapter;
use crate::layers::PaperRecord;

pub const BACKFILL_SYSTEM_PROMPT: &str = "You are a PhD student completing a literature review on arXiv. \
Issue exactly one command per reply, inside a fenced block:\n\
```SUMMARY\n<search query>\n``` to search arXiv abstracts,\n\
```FULL_TEXT\n<arXiv ID>\n``` to read one paper's details,\n\
```ADD_PAPER\nTitle: <title>\nID: <arXiv ID>\nPublished: <YYYY-MM-DD>\nSummary: <abstract>\nLink: <URL>\n``` \
to add a paper you have seen in search results. Only add papers relevant to the sub-topic.";

#[derive(Debug, Error)]
pub enum BackfillError {
    #[error("gave up after {attempts} attempts with {} of {needed} papers added", added.len())]
    Exhausted {
        attempts: u32,
        needed: usize,
        added: Vec<PaperRecord>,
    },
}

/// Tops up a sub-topic that collection left below its quota, by letting the
/// inference service drive searches through [`AgentAction`] commands.
pub struct BackfillAgent {
    inference: Arc<dyn InferenceClient>,
    search: SearchAdapter,
    policy: RetryPolicy,
    temperature: f32,
    raw_limit: usize,
    title_similarity: f64,
}

impl BackfillAgent {
    pub fn new(inference: Arc<dyn InferenceClient>, source: Arc<dyn PaperSource>, config: &ReviewConfig) -> Self {
        Self {
            inference,
            search: SearchAdapter::new(source),
            policy: RetryPolicy::new(config.backfill_attempts),
            temperature: config.subtopic_temperature,
            raw_limit: config.raw_search_limit,
            title_similarity: config.duplicate_title_similarity,
        }
    }

    /// Returns only the newly added papers, never more than `quota - existing.len()`.
    pub async fn fill(
        &self,
        topic: &str,
        sub_topic: &str,
        existing: &[PaperRecord],
        quota: usize,
        start_year: Option<i32>,
        end_year: Option<i32>,
    ) -> Result<Vec<PaperRecord>, BackfillError> {
        let needed = quota.saturating_sub(existing.len());
        let mut added: Vec<PaperRecord> = Vec::new();
        if needed == 0 {
            return Ok(added);
        }

        let mut feedback = String::new();
        for attempt in self.policy.attempts() {
            let request = InferenceRequest {
                system_prompt: BACKFILL_SYSTEM_PROMPT.to_string(),
                user_prompt: self.prompt(topic, sub_topic, needed - added.len(), start_year, end_year, &feedback),
                temperature: self.temperature,
            };
            let action = AgentAction::parse(&self.inference.complete(&request).await);
            tracing::debug!("Backfill '{}' attempt {}: {:?}", sub_topic, attempt, action);

            feedback = match action {
                AgentAction::Summary(query) => {
                    let blocks = self
                        .search
                        .search_blocks(&query, start_year, end_year, self.raw_limit)
                        .await;
                    if blocks.is_empty() {
                        format!("Your search for '{}' returned no papers in the date range.", query)
                    } else {
                        format!(
                            "You requested arXiv papers related to the query {}, here was the response\n{}",
                            query,
                            blocks.join("\n\n")
                        )
                    }
                }
                AgentAction::FullText(id) => match self.search.lookup(&id).await {
                    Some(paper) => paper.to_block(),
                    None => format!("No arXiv entry found for {}.", id),
                },
                AgentAction::AddPaper(block) => match parse_block(&block) {
                    Some(record) if Resolver::is_duplicate(&record, existing.iter().chain(&added), self.title_similarity) => {
                        format!("{} is already part of the review.", record.identifier)
                    }
                    Some(record) => {
                        let message = format!("Successfully added paper {}.", record.identifier);
                        tracing::info!("    Backfilled paper for '{}': {}", sub_topic, record.title);
                        added.push(record);
                        message
                    }
                    None => "That paper could not be parsed. Use the five-line Title/ID/Published/Summary/Link format.".to_string(),
                },
                AgentAction::PlainText(_) => {
                    "No command found. Reply with a SUMMARY, FULL_TEXT or ADD_PAPER block.".to_string()
                }
            };

            if added.len() >= needed {
                return Ok(added);
            }
        }

        Err(BackfillError::Exhausted {
            attempts: self.policy.max_attempts(),
            needed,
            added,
        })
    }

    fn prompt(
        &self,
        topic: &str,
        sub_topic: &str,
        missing: usize,
        start_year: Option<i32>,
        end_year: Option<i32>,
        feedback: &str,
    ) -> String {
        let mut prompt = format!(
            "Research topic: {}\nSub-topic: {}\nPapers still needed: {}\n",
            topic, sub_topic, missing
        );
        match (start_year, end_year) {
            (Some(start), Some(end)) => prompt.push_str(&format!("Only papers published {}-{} count.\n", start, end)),
            (Some(start), None) => prompt.push_str(&format!("Only papers published from {} count.\n", start)),
            (None, Some(end)) => prompt.push_str(&format!("Only papers published up to {} count.\n", end)),
            (None, None) => {}
        }
        if !feedback.is_empty() {
            prompt.push_str("\nFeedback from your previous command:\n");
            prompt.push_str(feedback);
            prompt.push('\n');
        }
        prompt
    }
}
