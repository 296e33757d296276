//! Validation of provider results into [`PaperRecord`]s, plus the five-line
//! canonical text block used wherever papers are exchanged as text.
//!
//! ```text
//! Title: <title>
//! ID: <short identifier>
//! Published: <YYYY-MM-DD>
//! Summary: <abstract>
//! Link: <entry URL>
//! ```

use chrono::{DateTime, NaiveDate};
use regex::Regex;
use std::sync::LazyLock;
use crate::layers::{PaperRecord, RawPaper};

static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^Title: (.*)$").expect("valid regex"));
static ID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^ID: (.*)$").expect("valid regex"));
static PUBLISHED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^Published: (.*)$").expect("valid regex"));
static SUMMARY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?ms)^Summary: (.*?)(?:\n[A-Z][A-Za-z]*: |\z)").expect("valid regex"));
static LINK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^Link: (.*)$").expect("valid regex"));
static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"v\d+$").expect("valid regex"));

impl PaperRecord {
    /// Returns `None` unless all five fields can be populated.
    pub fn from_raw(raw: &RawPaper) -> Option<Self> {
        match Self::try_from_raw(raw) {
            Ok(record) => Some(record),
            Err(field) => {
                tracing::debug!("Rejected search result {:?}: missing or invalid {}", raw.entry_id, field);
                None
            }
        }
    }

    fn try_from_raw(raw: &RawPaper) -> Result<Self, &'static str> {
        let entry_id = present(raw.entry_id.as_deref()).ok_or("entry id")?;
        let title = present(raw.title.as_deref()).ok_or("title")?;
        let summary = present(raw.summary.as_deref()).ok_or("summary")?;
        let published = raw
            .published
            .as_deref()
            .and_then(parse_date)
            .ok_or("publication date")?;

        Ok(Self {
            title: collapse_whitespace(title),
            identifier: short_id(entry_id),
            published: published.format("%Y-%m-%d").to_string(),
            // Single line, so a rendered block always re-parses
            summary: collapse_whitespace(summary),
            link: entry_id.to_string(),
        })
    }
}

impl RawPaper {
    /// Renders the fields that are present; absent ones are left out, so the
    /// block fails [`parse_block`] exactly when [`PaperRecord::from_raw`] would.
    pub fn to_block(&self) -> String {
        let mut lines = Vec::new();
        if let Some(title) = present(self.title.as_deref()) {
            lines.push(format!("Title: {}", collapse_whitespace(title)));
        }
        if let Some(entry_id) = present(self.entry_id.as_deref()) {
            lines.push(format!("ID: {}", short_id(entry_id)));
        }
        if let Some(date) = self.published.as_deref().and_then(parse_date) {
            lines.push(format!("Published: {}", date.format("%Y-%m-%d")));
        }
        if let Some(summary) = present(self.summary.as_deref()) {
            lines.push(format!("Summary: {}", collapse_whitespace(summary)));
        }
        if let Some(entry_id) = present(self.entry_id.as_deref()) {
            lines.push(format!("Link: {}", entry_id));
        }
        lines.join("\n")
    }
}

pub fn render_block(record: &PaperRecord) -> String {
    format!(
        "Title: {}\nID: {}\nPublished: {}\nSummary: {}\nLink: {}",
        record.title, record.identifier, record.published, record.summary, record.link
    )
}

/// Parses one canonical block. Never panics; a block missing any field yields `None`.
pub fn parse_block(block: &str) -> Option<PaperRecord> {
    let field = |re: &Regex, name: &str| {
        let value = re
            .captures(block)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|v| !v.is_empty());
        if value.is_none() {
            tracing::debug!("Failed to parse paper block: no {} line", name);
        }
        value
    };

    Some(PaperRecord {
        title: field(&*TITLE_RE, "Title")?,
        identifier: field(&*ID_RE, "ID")?,
        published: field(&*PUBLISHED_RE, "Published")?,
        summary: field(&*SUMMARY_RE, "Summary")?,
        link: field(&*LINK_RE, "Link")?,
    })
}

/// Accepts RFC 3339 timestamps as arXiv sends them, or plain dates.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.date_naive());
    }
    value
        .get(..10)
        .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
}

/// `http://arxiv.org/abs/2301.07041v2` -> `2301.07041v2`
pub fn short_id(entry_id: &str) -> String {
    let entry_id = entry_id.trim();
    match entry_id.split_once("/abs/") {
        Some((_, id)) => id.to_string(),
        None => entry_id.rsplit('/').next().unwrap_or(entry_id).to_string(),
    }
}

/// Identifier without its `vN` version suffix.
pub fn base_id(identifier: &str) -> &str {
    match VERSION_RE.find(identifier) {
        Some(m) => &identifier[..m.start()],
        None => identifier,
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}
