use anyhow::{Context, Result};
use chrono::Local;
use std::collections::BTreeSet;
use std::path::PathBuf;
use crate::config::ReviewConfig;
use crate::layers::inference::{InferenceClient, InferenceRequest};
use crate::layers::store::CorpusStore;
use crate::layers::Corpus;

pub const REVIEWER_SYSTEM_PROMPT: &str = "You are a senior researcher with extensive experience in conducting \
systematic literature reviews. You excel at writing a SINGLE, cohesive academic report without dividing the \
text by sub-topic headings.\n\n\
You must:\n\
1. Provide a holistic, unified analysis of the provided sub-topics and papers.\n\
2. Critically assess methodologies, major findings, limitations, and relationships.\n\
3. Discuss potential research directions and future prospects.\n\
4. Maintain a formal academic writing style.\n\n\
Key instructions:\n\
- DO NOT produce multiple separate sections named after each sub-topic.\n\
- Weave the sub-topics organically into a single integrated narrative.\n\
- When referring to sub-topics, label them in-line (e.g., '[Theme X]: ...'), but do not isolate them into standalone headings.\n\
- Identify future directions or gaps that emerge from the synergy of these studies.\n\
- Keep the tone formal, precise, and academically rigorous.";

/// Heading, then the instruction placed before and after the papers.
const ANALYSIS_SECTIONS: [(&str, &str, &str); 7] = [
    (
        "Sub-topics",
        "You are a senior researcher discussing sub-topics as they appear in the following papers:",
        "Discuss how these sub-topics arise collectively across the studies in an integrated manner. \
         Do NOT create separate headings for each sub-topic. Write in a formal academic style.",
    ),
    (
        "Key methodologies",
        "Analyze the key methodologies used across all of these papers:",
        "Discuss them in a unified manner (no separate sub-topic headings). Focus on experimental setups, \
         data handling and analysis techniques, in formal academic style.",
    ),
    (
        "Major findings",
        "Analyze the major findings from the following papers:",
        "Synthesize the findings into one cohesive discussion. Highlight common themes or unique results. \
         Write in formal academic style.",
    ),
    (
        "Limitations",
        "Discuss the limitations identified across the following papers:",
        "Unify them into a single discussion, referencing typical constraints, possible biases, and other \
         weaknesses. Write in a formal academic style.",
    ),
    (
        "Relationships to other studies",
        "Discuss how these papers relate to each other and to broader research in the field:",
        "Highlight interconnections, differences, or complementary findings. Formal academic style.",
    ),
    (
        "Future prospects",
        "Based on the combined insights from these papers:",
        "Discuss future prospects for this field of research. What are upcoming developments, broader \
         impacts, or next steps? Formal academic style.",
    ),
    (
        "Potential research directions",
        "Based on the insights from these papers:",
        "Propose potential research directions for future investigations. Stay cohesive and formal in style.",
    ),
];

/// Generated prose for one report. Sections whose generation failed are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportSections {
    pub abstract_text: String,
    pub analysis: Vec<(String, String)>,
}

/// Loads the corpus, asks for the abstract and each analysis section, and
/// writes the Markdown report. A missing or broken corpus fails this stage.
pub async fn generate_report(config: &ReviewConfig, inference: &dyn InferenceClient) -> Result<PathBuf> {
    let corpus = CorpusStore::new(config.corpus_path())
        .load()
        .await
        .context("Cannot generate report")?;

    let sections = write_sections(&corpus, inference, config.report_temperature).await?;
    let markdown = render_report(&corpus, &sections, &Local::now().format("%Y-%m-%d").to_string());

    let path = config.report_path();
    if let Some(dir) = path.parent() {
        tokio::fs::create_dir_all(dir).await?;
    }
    tokio::fs::write(&path, markdown)
        .await
        .with_context(|| format!("Failed to save report to {:?}", path))?;
    tracing::info!("=== Integrated report with {} analysis sections saved to {:?} ===", sections.analysis.len(), path);
    Ok(path)
}

pub async fn write_sections(corpus: &Corpus, inference: &dyn InferenceClient, temperature: f32) -> Result<ReportSections> {
    let papers: Vec<_> = corpus.papers().collect();
    let papers_json = serde_json::to_string_pretty(&papers)?;
    let topic = &corpus.metadata.research_topic;

    let ask = |user_prompt: String| InferenceRequest {
        system_prompt: REVIEWER_SYSTEM_PROMPT.to_string(),
        user_prompt,
        temperature,
    };

    tracing::info!("Generating abstract");
    let abstract_text = inference
        .complete(&ask(format!(
            "Generate an abstract for a single, cohesive literature review on: {}.\n\
             Avoid dividing the abstract by sub-topics, just provide a general overview.\n\
             Write in a formal academic style.",
            topic
        )))
        .await;

    let mut analysis = Vec::with_capacity(ANALYSIS_SECTIONS.len());
    for (heading, lead, tail) in ANALYSIS_SECTIONS {
        tracing::info!("Generating section: {}", heading);
        let text = inference
            .complete(&ask(format!("{}\n\n{}\n\n{}", lead, papers_json, tail)))
            .await;
        if text.is_empty() {
            tracing::warn!("Section '{}' generation returned nothing", heading);
        }
        analysis.push((heading.to_string(), text));
    }

    Ok(ReportSections { abstract_text, analysis })
}

pub fn render_report(corpus: &Corpus, sections: &ReportSections, generated_on: &str) -> String {
    let sub_topic_list = if corpus.sub_topics.is_empty() {
        "No sub-topics found.".to_string()
    } else {
        corpus
            .sub_topics
            .keys()
            .enumerate()
            .map(|(i, st)| format!("{}. {}", i + 1, st))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let mut md = format!(
        "# Systematic Literature Review: {}\n*Generated on {}*\n\n## Abstract\n{}\n\n## Sub-topics (Numbered List)\n{}\n\n## Literature Analysis\n",
        corpus.metadata.research_topic, generated_on, sections.abstract_text, sub_topic_list
    );
    for (i, (heading, text)) in sections.analysis.iter().enumerate() {
        md.push_str(&format!("### {}. {}\n{}\n\n", i + 1, heading, text));
    }

    md.push_str("## References\n");
    md.push_str(&references(corpus).into_iter().collect::<Vec<_>>().join("\n"));
    md
}

/// One line per distinct paper, sorted.
pub fn references(corpus: &Corpus) -> BTreeSet<String> {
    corpus
        .papers()
        .map(|p| format!("- {} ({}). {}", p.title, p.published, p.link))
        .collect()
}
