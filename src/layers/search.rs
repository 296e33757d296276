use chrono::Datelike;
use std::sync::Arc;
use crate::layers::discovery::PaperSource;
use crate::layers::parser::parse_date;
use crate::layers::{RawPaper, SearchQuery};

/// Wraps a [`PaperSource`] with year filtering and fail-open error handling.
#[derive(Clone)]
pub struct SearchAdapter {
    source: Arc<dyn PaperSource>,
}

impl SearchAdapter {
    pub fn new(source: Arc<dyn PaperSource>) -> Self {
        Self { source }
    }

    /// Provider-ranked results published within `[start_year, end_year]`.
    /// A provider failure is logged and yields no results.
    pub async fn search(
        &self,
        query: &str,
        start_year: Option<i32>,
        end_year: Option<i32>,
        limit: usize,
    ) -> Vec<RawPaper> {
        let request = SearchQuery {
            query: query.to_string(),
            start_year,
            end_year,
            max_results: limit,
        };

        match self.source.search(&request).await {
            Ok(results) => {
                let fetched = results.len();
                let kept = filter_by_year(results, start_year, end_year);
                tracing::debug!(
                    "{} returned {} results for '{}', {} within the year range",
                    self.source.name(),
                    fetched,
                    query,
                    kept.len()
                );
                kept
            }
            Err(e) => {
                tracing::warn!("{} search failed for '{}': {}", self.source.name(), query, e);
                Vec::new()
            }
        }
    }

    /// Same results rendered as canonical text blocks.
    pub async fn search_blocks(
        &self,
        query: &str,
        start_year: Option<i32>,
        end_year: Option<i32>,
        limit: usize,
    ) -> Vec<String> {
        self.search(query, start_year, end_year, limit)
            .await
            .iter()
            .map(RawPaper::to_block)
            .collect()
    }

    pub async fn lookup(&self, id: &str) -> Option<RawPaper> {
        match self.source.fetch_by_id(id).await {
            Ok(paper) => paper,
            Err(e) => {
                tracing::warn!("{} lookup failed for '{}': {}", self.source.name(), id, e);
                None
            }
        }
    }
}

/// Keeps results whose publication year lies within the inclusive bounds.
/// Without bounds nothing is filtered; with bounds, an unreadable date is excluded.
pub fn filter_by_year(results: Vec<RawPaper>, start_year: Option<i32>, end_year: Option<i32>) -> Vec<RawPaper> {
    if start_year.is_none() && end_year.is_none() {
        return results;
    }
    results
        .into_iter()
        .filter(|paper| {
            let Some(year) = paper.published.as_deref().and_then(parse_date).map(|d| d.year()) else {
                tracing::debug!("Excluding {:?}: unreadable publication date", paper.entry_id);
                return false;
            };
            start_year.map_or(true, |start| year >= start) && end_year.map_or(true, |end| year <= end)
        })
        .collect()
}
