use indexmap::IndexMap;

/// Per-sub-topic paper quotas for one run: an equal split of the budget with a
/// floor of one. Remainders are not redistributed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationPlan {
    per_sub_topic: usize,
    quotas: IndexMap<String, usize>,
}

impl AllocationPlan {
    pub fn new(sub_topics: &[String], budget: usize) -> Self {
        let per_sub_topic = budget.checked_div(sub_topics.len()).unwrap_or(budget).max(1);
        let quotas = sub_topics
            .iter()
            .map(|st| (st.clone(), per_sub_topic))
            .collect();
        Self { per_sub_topic, quotas }
    }

    pub fn per_sub_topic(&self) -> usize {
        self.per_sub_topic
    }

    /// Zero for sub-topics outside the plan.
    pub fn quota_for(&self, sub_topic: &str) -> usize {
        self.quotas.get(sub_topic).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.quotas.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.quotas.iter().map(|(st, q)| (st.as_str(), *q))
    }
}
