use anyhow::{Context, Result};
use std::path::PathBuf;
use crate::config::ReviewConfig;
use crate::layers::inference::{InferenceClient, InferenceRequest};
use crate::layers::store::CorpusStore;
use crate::layers::Corpus;

pub const INNOVATION_SYSTEM_PROMPT: &str = "You are an 'innovation consultant' for academic research. You specialize in:\n\
1. Identifying knowledge gaps.\n\
2. Proposing novel or creative research designs.\n\
3. Suggesting how to leverage or extend existing studies in new ways.\n\n\
When given the user's existing literature review and context, your task is:\n\
- Synthesize a new research direction or experimental approach.\n\
- Explain how it builds on existing findings.\n\
- Highlight its potential significance or impact.\n\
- Maintain a formal, yet forward-thinking, academic style.\n\n\
Do NOT simply repeat known findings; focus on creative, fresh directions, and justify why the approach is \
worth investigating by pointing to the relevant gaps in the literature.";

pub fn novel_approach_prompt(corpus: &Corpus) -> String {
    let sub_topics: Vec<&str> = corpus.sub_topics.keys().map(String::as_str).collect();
    format!(
        "Below is the literature review data.\n\n\
         Research Topic: {}\n\
         Sub-topics found: {:?}\n\n\
         Based on these findings, please propose a novel research approach that:\n\
         - Addresses existing gaps or limitations\n\
         - Builds on current methodologies\n\
         - Introduces an innovative angle or extension of the studies\n\
         Provide a concise but thorough academic rationale.\n",
        corpus.metadata.research_topic, sub_topics
    )
}

pub async fn propose_novel_approach(config: &ReviewConfig, inference: &dyn InferenceClient) -> Result<PathBuf> {
    let corpus = CorpusStore::new(config.corpus_path())
        .load()
        .await
        .context("Cannot propose a novel approach")?;

    let approach = inference
        .complete(&InferenceRequest {
            system_prompt: INNOVATION_SYSTEM_PROMPT.to_string(),
            user_prompt: novel_approach_prompt(&corpus),
            temperature: config.report_temperature,
        })
        .await;
    if approach.is_empty() {
        tracing::warn!("Novel approach generation returned nothing");
    }

    let markdown = format!(
        "# Novel Research Approach\n\n**Topic**: {}\n\n**Proposed Approach**:\n\n{}\n",
        corpus.metadata.research_topic, approach
    );

    let path = config.novel_approach_path();
    if let Some(dir) = path.parent() {
        tokio::fs::create_dir_all(dir).await?;
    }
    tokio::fs::write(&path, markdown)
        .await
        .with_context(|| format!("Failed to save novel approach to {:?}", path))?;
    tracing::info!("Novel approach saved to {:?}", path);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::testing::FakeInference;

    #[test]
    fn test_prompt_lists_sub_topics() {
        let mut corpus = Corpus::new("qec");
        corpus.sub_topics.insert("Decoders".to_string(), Vec::new());
        corpus.sub_topics.insert("Qubits".to_string(), Vec::new());

        let prompt = novel_approach_prompt(&corpus);
        assert!(prompt.contains("Research Topic: qec\n"));
        assert!(prompt.contains("Sub-topics found: [\"Decoders\", \"Qubits\"]"));
    }

    #[tokio::test]
    async fn test_propose_writes_markdown() {
        let dir = tempfile::tempdir().unwrap();
        let config = ReviewConfig { database_dir: dir.path().to_path_buf(), ..ReviewConfig::default() };
        CorpusStore::new(config.corpus_path()).save(&Corpus::new("qec")).await.unwrap();
        let inference = FakeInference::new(vec!["Combine decoders with hardware."]);

        let path = propose_novel_approach(&config, &inference).await.unwrap();

        let md = std::fs::read_to_string(path).unwrap();
        assert_eq!(
            md,
            "# Novel Research Approach\n\n**Topic**: qec\n\n**Proposed Approach**:\n\nCombine decoders with hardware.\n"
        );
        assert_eq!(inference.requests()[0].system_prompt, INNOVATION_SYSTEM_PROMPT);
    }

    #[tokio::test]
    async fn test_malformed_corpus_fails_stage() {
        let dir = tempfile::tempdir().unwrap();
        let config = ReviewConfig { database_dir: dir.path().to_path_buf(), ..ReviewConfig::default() };
        std::fs::write(config.corpus_path(), "not json").unwrap();

        let err = propose_novel_approach(&config, &FakeInference::new(vec![])).await.unwrap_err();
        assert!(format!("{:#}", err).contains("not well-formed"));
    }
}
