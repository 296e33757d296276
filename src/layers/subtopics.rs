use regex::Regex;
use std::sync::{Arc, LazyLock};
use crate::layers::agent::RetryPolicy;
use crate::layers::inference::{InferenceClient, InferenceRequest};

pub const SUBTOPIC_SYSTEM_PROMPT: &str = "Generate 5-7 specific research sub-topics for a literature review. \
Format: Numbered list of concise phrases (3-5 words).\n\
Example:\n\
1. Neural radiance fields in 3D reconstruction\n\
2. Diffusion models for medical imaging";

// Bullets, headings, quotes and bold markers may precede the number
static NUMBERED_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t*#>\-]*\d+\.[ \t]+(.*)$").expect("valid regex"));

/// Items of a numbered list, in order, with Markdown emphasis removed.
/// Items of three characters or fewer are noise.
pub fn extract_sub_topics(text: &str) -> Vec<String> {
    NUMBERED_LINE_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().replace("**", "").trim().to_string())
        .filter(|item| item.chars().count() > 3)
        .collect()
}

/// Merges generated and user-supplied sub-topics. Entries are compared
/// trimmed and case-folded; the first spelling wins and blanks are dropped.
pub fn merge_sub_topics(generated: Vec<String>, supplied: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    generated
        .into_iter()
        .chain(supplied.iter().cloned())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .filter(|s| {
            let fresh = seen.insert(s.to_lowercase());
            if !fresh {
                tracing::debug!("Dropping duplicate sub-topic '{}'", s);
            }
            fresh
        })
        .collect()
}

pub struct SubTopicGenerator {
    inference: Arc<dyn InferenceClient>,
    temperature: f32,
    policy: RetryPolicy,
}

impl SubTopicGenerator {
    pub fn new(inference: Arc<dyn InferenceClient>, temperature: f32, policy: RetryPolicy) -> Self {
        Self { inference, temperature, policy }
    }

    /// Empty when no attempt produced a usable list. Never fails.
    pub async fn generate(&self, topic: &str) -> Vec<String> {
        let request = InferenceRequest {
            system_prompt: SUBTOPIC_SYSTEM_PROMPT.to_string(),
            user_prompt: topic.to_string(),
            temperature: self.temperature,
        };

        for attempt in self.policy.attempts() {
            let response = self.inference.complete(&request).await;
            let sub_topics = extract_sub_topics(&response);
            if !sub_topics.is_empty() {
                tracing::info!("Identified {} sub-topics for '{}'", sub_topics.len(), topic);
                return sub_topics;
            }
            tracing::warn!(
                "Sub-topic attempt {}/{} for '{}' produced no usable list",
                attempt,
                self.policy.max_attempts(),
                topic
            );
        }
        Vec::new()
    }
}
