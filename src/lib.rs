//! Sub-topic driven literature collection over arXiv.
//!
//! A research topic is split into sub-topics by a text-generation service,
//! the paper budget is divided evenly between them, each sub-topic is searched
//! on arXiv, and the validated results are persisted as one JSON corpus that
//! the report and novel-approach stages read back.

pub mod config;
pub mod layers;

pub use config::ReviewConfig;
pub use layers::review::{LiteratureReview, ReviewError, ReviewRequest, perform_literature_review};
pub use layers::{Corpus, CorpusMetadata, PaperRecord};
