use anyhow::{Result, anyhow};
use clap::Parser;
use dotenvy::dotenv;
use litreview::layers::novel::propose_novel_approach;
use litreview::layers::report::generate_report;
use litreview::{LiteratureReview, ReviewConfig, perform_literature_review};
use tracing_subscriber::EnvFilter;

/// Collect an arXiv literature corpus for a research topic.
#[derive(Parser, Debug)]
#[command(name = "litreview", version)]
struct Cli {
    /// Research topic, e.g. "LLM for high quality code generation"
    topic: String,

    #[arg(long, requires = "end_year")]
    start_year: Option<i32>,

    #[arg(long, requires = "start_year")]
    end_year: Option<i32>,

    /// Maximum number of papers across all sub-topics
    #[arg(long, default_value_t = 20)]
    max_count: usize,

    /// Extra sub-topic to search alongside the generated ones (repeatable)
    #[arg(long = "subtopic")]
    sub_topics: Vec<String>,

    /// Write the integrated literature report after collection
    #[arg(long)]
    report: bool,

    /// Propose a novel research approach after collection
    #[arg(long)]
    novel_approach: bool,

    /// Agent rounds for topping up under-filled sub-topics
    #[arg(long)]
    backfill: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // 0. Load Configuration
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    if cli.topic.trim().is_empty() {
        return Err(anyhow!("Research topic must not be empty"));
    }
    if let (Some(start), Some(end)) = (cli.start_year, cli.end_year) {
        if start > end {
            return Err(anyhow!("--start-year {} is after --end-year {}", start, end));
        }
    }

    let mut config = ReviewConfig::from_env()?;
    if let Some(rounds) = cli.backfill {
        config.backfill_attempts = rounds;
    }

    // 1. Literature review
    let review = LiteratureReview::from_config(config)?;
    let user_sub_topics = (!cli.sub_topics.is_empty()).then_some(cli.sub_topics.as_slice());
    let corpus = perform_literature_review(
        &review,
        cli.topic.trim(),
        cli.start_year,
        cli.end_year,
        cli.max_count,
        user_sub_topics,
    )
    .await
    .ok_or_else(|| anyhow!("Literature review failed; no corpus was produced"))?;
    println!(
        "Collected {} papers across {} sub-topics into {:?}",
        corpus.paper_count(),
        corpus.sub_topics.len(),
        review.config().corpus_path()
    );

    // 2. Downstream stages
    let inference = review.inference();
    if cli.report {
        match generate_report(review.config(), inference.as_ref()).await {
            Ok(path) => println!("Report written to {:?}", path),
            Err(e) => eprintln!("Report generation failed: {:#}", e),
        }
    }
    if cli.novel_approach {
        match propose_novel_approach(review.config(), inference.as_ref()).await {
            Ok(path) => println!("Novel approach written to {:?}", path),
            Err(e) => eprintln!("Novel approach generation failed: {:#}", e),
        }
    }

    Ok(())
}
