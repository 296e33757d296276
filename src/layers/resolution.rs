use strsim::normalized_levenshtein;
use crate::layers::PaperRecord;
use crate::layers::parser::base_id;

pub struct Resolver;

impl Resolver {
    /// True when `candidate` is another version of a kept paper. Titles are
    /// only compared when one side has no identifier to go by.
    pub fn is_duplicate<'a>(
        candidate: &PaperRecord,
        kept: impl IntoIterator<Item = &'a PaperRecord>,
        title_similarity: f64,
    ) -> bool {
        let candidate_id = base_id(candidate.identifier.trim());
        let title = normalize_title(&candidate.title);
        kept.into_iter().any(|p| {
            let kept_id = base_id(p.identifier.trim());
            if !candidate_id.is_empty() && !kept_id.is_empty() {
                return candidate_id == kept_id;
            }
            let similarity = normalized_levenshtein(&title, &normalize_title(&p.title));
            tracing::debug!("Candidate: {} vs {} (similarity: {:.3})", candidate.title, p.title, similarity);
            similarity >= title_similarity
        })
    }

    /// Drops later duplicates; the first occurrence keeps its position.
    pub fn dedup(records: Vec<PaperRecord>, title_similarity: f64) -> Vec<PaperRecord> {
        let mut kept: Vec<PaperRecord> = Vec::with_capacity(records.len());
        for record in records {
            if Self::is_duplicate(&record, &kept, title_similarity) {
                tracing::debug!("Dropping duplicate paper {} ({})", record.identifier, record.title);
                continue;
            }
            kept.push(record);
        }
        kept
    }
}

fn normalize_title(title: &str) -> String {
    title.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_paper(id: &str, title: &str) -> PaperRecord {
        PaperRecord {
            title: title.to_string(),
            identifier: id.to_string(),
            published: "2022-01-01".to_string(),
            summary: "Summary".to_string(),
            link: format!("http://arxiv.org/abs/{}", id),
        }
    }

    #[test]
    fn test_dedup_drops_other_versions() {
        let papers = vec![
            create_paper("2201.00001v1", "Decoding surface codes"),
            create_paper("2201.00001v2", "Decoding surface codes, revisited"),
            create_paper("2201.00002v1", "Magic state distillation"),
        ];
        let kept = Resolver::dedup(papers, 0.95);
        let ids: Vec<_> = kept.iter().map(|p| p.identifier.as_str()).collect();
        assert_eq!(ids, vec!["2201.00001v1", "2201.00002v1"]);
    }

    #[test]
    fn test_distinct_ids_survive_similar_titles() {
        let papers = vec![
            create_paper("2101.00001v1", "Quantum error correction with surface codes: Part I"),
            create_paper("2102.00002v1", "Quantum error correction with surface codes: Part II"),
        ];
        let kept = Resolver::dedup(papers, 0.95);
        let ids: Vec<_> = kept.iter().map(|p| p.identifier.as_str()).collect();
        assert_eq!(ids, vec!["2101.00001v1", "2102.00002v1"]);
    }

    #[test]
    fn test_titles_decide_when_an_id_is_missing() {
        let papers = vec![
            create_paper("1", "Attention Is All You Need"),
            create_paper("", "attention is all you  need."),
            create_paper(" ", "Attention Is Not All You Need"),
        ];
        let kept = Resolver::dedup(papers, 0.95);
        let titles: Vec<_> = kept.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Attention Is All You Need", "Attention Is Not All You Need"]);
    }

    #[test]
    fn test_distinct_short_titles_survive() {
        let papers = vec![create_paper("1", "GANs"), create_paper("2", "VAEs"), create_paper("3", "Paper 1")];
        assert_eq!(Resolver::dedup(papers, 0.95).len(), 3);
    }
}
