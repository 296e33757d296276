use regex::Regex;
use std::sync::LazyLock;

static COMMAND_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(SUMMARY|FULL_TEXT|ADD_PAPER)(.*?)```").expect("valid regex"));

/// What an agent response asks for next. The first fenced command in the
/// response wins; a response without one is plain text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentAction {
    Summary(String),
    FullText(String),
    AddPaper(String),
    PlainText(String),
}

impl AgentAction {
    pub fn parse(response: &str) -> Self {
        let Some(caps) = COMMAND_RE.captures(response) else {
            return Self::PlainText(response.trim().to_string());
        };
        let body = caps.get(2).map(|m| m.as_str().trim()).unwrap_or_default();
        if body.is_empty() {
            return Self::PlainText(response.trim().to_string());
        }

        match caps.get(1).map(|m| m.as_str()) {
            Some("SUMMARY") => Self::Summary(body.replace(['"', '\''], "").trim().to_string()),
            Some("FULL_TEXT") => Self::FullText(body.to_string()),
            Some("ADD_PAPER") => Self::AddPaper(body.to_string()),
            _ => Self::PlainText(response.trim().to_string()),
        }
    }
}

/// A fixed ceiling on attempts. Zero attempts means the step never runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self { max_attempts }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Attempt numbers, starting at 1.
    pub fn attempts(&self) -> impl Iterator<Item = u32> {
        1..=self.max_attempts
    }
}
