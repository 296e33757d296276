use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use crate::config::ReviewConfig;
use crate::layers::{RawPaper, SearchQuery};

/// A bibliographic search provider.
#[async_trait]
pub trait PaperSource: Send + Sync {
    fn name(&self) -> &str;

    /// Relevance-ranked search. Results come back in provider order.
    async fn search(&self, query: &SearchQuery) -> Result<Vec<RawPaper>>;

    async fn fetch_by_id(&self, id: &str) -> Result<Option<RawPaper>>;
}

use governor::{Quota, RateLimiter};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, direct::NotKeyed};
use nonzero_ext::nonzero;
use std::sync::Arc;
use std::time::Duration;

pub struct ArxivClient {
    client: Client,
    base_url: String,
    limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl ArxivClient {
    pub fn new(config: &ReviewConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        // arXiv asks API users for at most one request every three seconds
        let quota = Quota::with_period(Duration::from_secs(3))
            .ok_or_else(|| anyhow!("Invalid arXiv rate limit period"))?
            .allow_burst(nonzero!(1u32));

        Ok(Self {
            client,
            base_url: config.arxiv_base_url.clone(),
            limiter: Arc::new(RateLimiter::direct(quota)),
        })
    }

    fn search_url(&self, query: &SearchQuery) -> String {
        let search_query = format!("abs:{}", query.query.trim());
        format!(
            "{}?search_query={}&start=0&max_results={}&sortBy=relevance&sortOrder=descending",
            self.base_url,
            urlencoding::encode(&search_query),
            query.max_results
        )
    }

    async fn fetch_feed(&self, url: &str) -> Result<Vec<RawPaper>> {
        // Wait for permission
        self.limiter.until_ready().await;

        tracing::info!("Querying arXiv: {}", url);
        match self.client.get(url).send().await {
            Ok(resp) => {
                if !resp.status().is_success() {
                    return Err(anyhow!("arXiv API error: {}", resp.status()));
                }
                let text = resp.text().await?;
                tracing::debug!("arXiv response: {} bytes", text.len());

                let papers = parse_feed(&text);
                if let Some(message) = api_error(&papers) {
                    return Err(anyhow!("arXiv API error: {}", message));
                }
                Ok(papers)
            }
            Err(e) => Err(anyhow!("Request failed: {}", e)),
        }
    }
}

#[async_trait]
impl PaperSource for ArxivClient {
    fn name(&self) -> &str {
        "arXiv"
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<RawPaper>> {
        let url = self.search_url(query);
        self.fetch_feed(&url).await
    }

    async fn fetch_by_id(&self, id: &str) -> Result<Option<RawPaper>> {
        let url = format!(
            "{}?id_list={}&max_results=1",
            self.base_url,
            urlencoding::encode(id.trim())
        );
        Ok(self.fetch_feed(&url).await?.into_iter().next())
    }
}

/// arXiv reports bad queries as a feed with a single "Error" entry.
fn api_error(papers: &[RawPaper]) -> Option<String> {
    match papers {
        [only] if only.entry_id.as_deref().is_some_and(|id| id.contains("/api/errors")) => {
            Some(only.summary.clone().unwrap_or_else(|| "unknown error".to_string()))
        }
        _ => None,
    }
}

use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::Event;
use quick_xml::reader::Reader;

/// Extracts entries from an arXiv Atom feed. Parsing stops at the first
/// malformed event; entries completed before it are kept.
pub fn parse_feed(xml: &str) -> Vec<RawPaper> {
    let mut reader = Reader::from_str(xml);

    let mut papers = Vec::new();
    let mut buf = Vec::new();

    let mut entry: Option<RawPaper> = None;
    let mut text = String::new();

    #[derive(PartialEq, Clone, Copy)]
    enum TagState { None, Title, Summary, Published, Id }
    let mut state = TagState::None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                match e.name().as_ref() {
                    b"entry" => {
                        entry = Some(RawPaper::default());
                        state = TagState::None;
                    }
                    b"title" if entry.is_some() => state = TagState::Title,
                    b"summary" if entry.is_some() => state = TagState::Summary,
                    b"published" if entry.is_some() => state = TagState::Published,
                    b"id" if entry.is_some() => state = TagState::Id,
                    _ => state = TagState::None,
                }
                text.clear();
            }
            Ok(Event::Text(e)) => {
                if state != TagState::None {
                    text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if state != TagState::None {
                    let name = String::from_utf8_lossy(&e.into_inner()).into_owned();
                    match resolve_reference(&name) {
                        Some(resolved) => text.push_str(&resolved),
                        None => {
                            text.push('&');
                            text.push_str(&name);
                            text.push(';');
                        }
                    }
                }
            }
            Ok(Event::End(e)) => {
                match e.name().as_ref() {
                    b"entry" => {
                        if let Some(paper) = entry.take() {
                            tracing::debug!("Parsed arXiv entry: Title='{:?}', ID='{:?}'", paper.title, paper.entry_id);
                            papers.push(paper);
                        }
                    }
                    _ => {
                        if let Some(paper) = entry.as_mut() {
                            let value = std::mem::take(&mut text).trim().to_string();
                            match state {
                                TagState::Title => paper.title = Some(value),
                                TagState::Summary => paper.summary = Some(value),
                                TagState::Published => paper.published = Some(value),
                                TagState::Id => paper.entry_id = Some(value),
                                TagState::None => {}
                            }
                        }
                    }
                }
                state = TagState::None;
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                tracing::warn!("XML parsing error at position {}: {:?}", reader.buffer_position(), e);
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    papers
}

fn resolve_reference(name: &str) -> Option<String> {
    if let Some(code) = name.strip_prefix('#') {
        let value = match code.strip_prefix('x').or_else(|| code.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => code.parse().ok()?,
        };
        return char::from_u32(value).map(String::from);
    }
    resolve_predefined_entity(name).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title type="html">ArXiv Query: search_query=abs:surface codes</title>
  <id>http://arxiv.org/api/abc</id>
  <entry>
    <id>http://arxiv.org/abs/2301.07041v2</id>
    <published>2023-01-17T18:58:32Z</published>
    <title>Surface Codes &amp; Lattice
  Surgery</title>
    <summary>  We study decoders for surface codes.
    </summary>
    <author><name>Ada Lovelace</name></author>
    <link href="http://arxiv.org/abs/2301.07041v2" rel="alternate" type="text/html"/>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/math/0601001v1</id>
    <published>2006-01-01T00:00:00Z</published>
    <title>Old Style &#x3B1; Identifiers</title>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_feed_extracts_entries() {
        let papers = parse_feed(FEED);
        assert_eq!(papers.len(), 2);

        let first = &papers[0];
        assert_eq!(first.entry_id.as_deref(), Some("http://arxiv.org/abs/2301.07041v2"));
        assert_eq!(first.published.as_deref(), Some("2023-01-17T18:58:32Z"));
        assert_eq!(first.title.as_deref(), Some("Surface Codes & Lattice\n  Surgery"));
        assert_eq!(first.summary.as_deref(), Some("We study decoders for surface codes."));
    }

    #[test]
    fn test_parse_feed_keeps_missing_fields_empty() {
        let papers = parse_feed(FEED);
        let second = &papers[1];
        assert_eq!(second.title.as_deref(), Some("Old Style \u{3b1} Identifiers"));
        assert!(second.summary.is_none());
    }

    #[test]
    fn test_feed_title_outside_entry_ignored() {
        let papers = parse_feed(FEED);
        assert!(papers.iter().all(|p| p.title.as_deref() != Some("ArXiv Query: search_query=abs:surface codes")));
    }

    #[test]
    fn test_api_error_entry_detected() {
        let papers = vec![RawPaper {
            entry_id: Some("http://arxiv.org/api/errors#incorrect_id_format".to_string()),
            title: Some("Error".to_string()),
            summary: Some("incorrect id format".to_string()),
            published: None,
        }];
        assert_eq!(api_error(&papers).as_deref(), Some("incorrect id format"));
        assert!(api_error(&parse_feed(FEED)).is_none());
    }

    #[test]
    fn test_search_url_encodes_abstract_query() {
        let client = ArxivClient::new(&ReviewConfig::default()).unwrap();
        let url = client.search_url(&SearchQuery {
            query: "quantum error correction".to_string(),
            start_year: None,
            end_year: None,
            max_results: 100,
        });
        assert!(url.starts_with("http://export.arxiv.org/api/query?search_query=abs%3Aquantum%20error%20correction"));
        assert!(url.contains("max_results=100"));
        assert!(url.contains("sortBy=relevance"));
    }
}
