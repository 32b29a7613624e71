use super::ScoredCandidate;

/// Keyword bonuses, matched as substrings of the lowercased snippet.
pub const KEYWORD_WEIGHTS: &[(&str, u32)] = &[
    ("contract", 10),
    ("mint", 10),
    ("nft", 5),
    ("address", 3),
    ("etherscan", 8),
];

pub fn score_snippet(snippet: &str) -> u32 {
    let lower = snippet.to_lowercase();
    KEYWORD_WEIGHTS
        .iter()
        .filter(|(kw, _)| lower.contains(kw))
        .map(|(_, w)| *w)
        .sum()
}

/// Sum of snippet scores; repeated co-occurrence compounds.
/// `None` on overflow.
pub fn score_all<'a, I>(snippets: I) -> Option<u32>
where
    I: IntoIterator<Item = &'a str>,
{
    snippets
        .into_iter()
        .try_fold(0u32, |acc, s| acc.checked_add(score_snippet(s)))
}

/// Highest score first. `sort_by` is stable, so equal scores keep discovery order.
pub fn rank(mut candidates: Vec<ScoredCandidate>, limit: usize) -> Vec<ScoredCandidate> {
    candidates.sort_by(|a, b| b.score.cmp(&a.score));
    candidates.truncate(limit);
    candidates
}
