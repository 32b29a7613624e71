use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::ExtractError;

/// Capture for a `0x`-prefixed 20-byte hex value. Rules run case-insensitive.
const HEX_ADDRESS: &str = "0x[a-f0-9]{40}";

/// Keywords that usually sit right in front of the contract address in page
/// markup or embedded JSON (`"contractAddress": "0x..."`).
pub const KEYWORDS: &[&str] = &[
    "contract",
    "address",
    "contractAddress",
    "nftContract",
    "mintContract",
];

/// Explorer and marketplace paths whose next segment is the address.
pub const LINK_PATHS: &[(&str, &str)] = &[
    ("etherscan", r"etherscan\.io/address/"),
    ("basescan", r"basescan\.org/address/"),
    ("arbiscan", r"arbiscan\.io/address/"),
    ("optimistic-etherscan", r"optimistic\.etherscan\.io/address/"),
    ("polygonscan", r"polygonscan\.com/address/"),
    ("opensea-ethereum", r"opensea\.io/assets/ethereum/"),
    ("opensea-base", r"opensea\.io/assets/base/"),
];

static BUILTIN: LazyLock<PatternTable> =
    LazyLock::new(|| PatternTable::with_keywords(&[]).unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    Keyed,
    Link,
    Generic,
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RuleKind::Keyed => "keyed",
            RuleKind::Link => "link",
            RuleKind::Generic => "generic",
        };
        f.pad(s)
    }
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub name: String,
    pub kind: RuleKind,
    regex: Regex,
}

impl Rule {
    fn new(name: impl Into<String>, kind: RuleKind, pattern: &str) -> Result<Self, ExtractError> {
        let name = name.into();
        let regex = Regex::new(pattern).map_err(|e| {
            ExtractError::ExtractionFailed(format!("rule '{}' does not compile: {}", name, e))
        })?;
        if regex.captures_len() < 2 {
            return Err(ExtractError::ExtractionFailed(format!(
                "rule '{}' has no capture group",
                name
            )));
        }
        Ok(Rule { name, kind, regex })
    }

    fn keyed(keyword: &str) -> Result<Self, ExtractError> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(ExtractError::ExtractionFailed(
                "keyed rule needs a non-empty keyword".into(),
            ));
        }
        let pattern = format!(
            r#"(?i){}["\s:=]+["']?({})["']?"#,
            regex::escape(keyword),
            HEX_ADDRESS
        );
        Rule::new(keyword, RuleKind::Keyed, &pattern)
    }

    fn link(name: &str, path: &str) -> Result<Self, ExtractError> {
        Rule::new(name, RuleKind::Link, &format!("(?i){}({})", path, HEX_ADDRESS))
    }

    fn generic() -> Result<Self, ExtractError> {
        Rule::new("generic", RuleKind::Generic, &format!("(?i)({})", HEX_ADDRESS))
    }

    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    /// All non-overlapping matches as `(match_start, captured_value)`.
    /// `match_start` is where the whole match begins, keyword included.
    pub fn matches<'h>(&'h self, html: &'h str) -> impl Iterator<Item = (usize, &'h str)> + 'h {
        self.regex.captures_iter(html).filter_map(|caps| {
            let whole = caps.get(0)?;
            let value = caps.get(1).unwrap_or(whole);
            Some((whole.start(), value.as_str()))
        })
    }
}

/// Ordered recognition rules: keyed, then links, then the generic fallback.
#[derive(Debug, Clone)]
pub struct PatternTable {
    rules: Vec<Rule>,
}

impl PatternTable {
    pub fn builtin() -> &'static PatternTable {
        &BUILTIN
    }

    /// Built-in table with `extra` keywords appended after the built-in keyed rules.
    pub fn with_keywords(extra: &[String]) -> Result<Self, ExtractError> {
        let mut rules = Vec::with_capacity(KEYWORDS.len() + extra.len() + LINK_PATHS.len() + 1);
        for kw in KEYWORDS {
            rules.push(Rule::keyed(kw)?);
        }
        for kw in extra {
            if KEYWORDS.iter().any(|k| k.eq_ignore_ascii_case(kw.trim())) {
                continue;
            }
            rules.push(Rule::keyed(kw)?);
        }
        for (name, path) in LINK_PATHS {
            rules.push(Rule::link(name, path)?);
        }
        rules.push(Rule::generic()?);
        Ok(PatternTable { rules })
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }
}

impl Default for PatternTable {
    fn default() -> Self {
        PatternTable::builtin().clone()
    }
}
