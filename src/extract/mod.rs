pub mod context;
pub mod denylist;
pub mod patterns;
pub mod score;

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::error::ExtractError;
use crate::settings::Settings;
use denylist::Denylist;
use patterns::PatternTable;

pub const DEFAULT_MAX_RESULTS: usize = 5;
pub const DEFAULT_MAX_CONTEXTS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextSnippet {
    pub address: String,
    pub context: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoredCandidate {
    pub address: String,
    pub score: u32,
    pub contexts: Vec<ContextSnippet>,
}

/// Successful extraction result. An empty `addresses` list is still a success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Extraction {
    pub success: bool,
    pub addresses: Vec<ScoredCandidate>,
    pub best_guess: Option<String>,
}

/// Pattern table, denylist and output limits. Immutable once built, so a
/// single instance can be shared by any number of concurrent callers.
#[derive(Debug, Clone)]
pub struct Extractor {
    patterns: PatternTable,
    denylist: Denylist,
    max_results: usize,
    max_contexts: usize,
}

impl Default for Extractor {
    fn default() -> Self {
        Extractor::new(PatternTable::default(), Denylist::default())
    }
}

impl Extractor {
    pub fn new(patterns: PatternTable, denylist: Denylist) -> Self {
        Extractor {
            patterns,
            denylist,
            max_results: DEFAULT_MAX_RESULTS,
            max_contexts: DEFAULT_MAX_CONTEXTS,
        }
    }

    pub fn with_limits(mut self, max_results: usize, max_contexts: usize) -> Self {
        self.max_results = max_results;
        self.max_contexts = max_contexts;
        self
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, ExtractError> {
        let patterns = PatternTable::with_keywords(&settings.extra_keywords)?;
        let mut denylist = match &settings.denylist {
            Some(entries) => Denylist::new(entries),
            None => Denylist::default(),
        };
        denylist.extend(&settings.extra_denylist);
        Ok(Extractor::new(patterns, denylist).with_limits(settings.max_results, settings.max_contexts))
    }

    pub fn patterns(&self) -> &PatternTable {
        &self.patterns
    }

    pub fn denylist(&self) -> &Denylist {
        &self.denylist
    }

    /// scan → normalize → filter → score → sort → truncate.
    pub fn extract(&self, html: &str) -> Result<Extraction, ExtractError> {
        let (order, mut log) = self.scan(html);

        let mut candidates = Vec::with_capacity(order.len());
        for address in order {
            if self.denylist.contains(&address) {
                debug!(%address, "denylisted");
                continue;
            }
            let snippets = log.remove(&address).unwrap_or_default();
            let score = score::score_all(snippets.iter().map(String::as_str)).ok_or_else(|| {
                ExtractError::ExtractionFailed(format!("score overflow for {}", address))
            })?;
            let contexts = snippets
                .into_iter()
                .take(self.max_contexts)
                .map(|context| ContextSnippet {
                    address: address.clone(),
                    context,
                })
                .collect();
            candidates.push(ScoredCandidate {
                address,
                score,
                contexts,
            });
        }

        let addresses = score::rank(candidates, self.max_results);
        let best_guess = addresses.first().map(|c| c.address.clone());
        debug!(count = addresses.len(), best = ?best_guess, "ranked candidates");

        Ok(Extraction {
            success: true,
            addresses,
            best_guess,
        })
    }

    /// Runs every rule in table order. Returns addresses in first-discovered
    /// order plus every context snippet captured for each of them.
    fn scan(&self, html: &str) -> (Vec<String>, HashMap<String, Vec<String>>) {
        let mut order = Vec::new();
        let mut log: HashMap<String, Vec<String>> = HashMap::new();

        for rule in self.patterns.rules() {
            for (start, value) in rule.matches(html) {
                let address = value.to_ascii_lowercase();
                if !is_valid_address(&address) {
                    debug!(rule = %rule.name, value, "dropping malformed capture");
                    continue;
                }
                let snippet = context::window(html, start);
                match log.entry(address) {
                    Entry::Occupied(mut e) => e.get_mut().push(snippet),
                    Entry::Vacant(e) => {
                        order.push(e.key().clone());
                        e.insert(vec![snippet]);
                    }
                }
            }
        }

        (order, log)
    }
}

/// `0x` followed by exactly 40 lowercase hex digits.
pub fn is_valid_address(s: &str) -> bool {
    s.len() == 42
        && s.starts_with("0x")
        && s[2..]
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

// ── Tests ──
