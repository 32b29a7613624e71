use std::collections::HashSet;

/// Null/burn addresses and common tokens that show up on mint pages without
/// being the mint contract.
pub const DEFAULT_DENYLIST: &[&str] = &[
    "0x0000000000000000000000000000000000000000",
    "0x000000000000000000000000000000000000dead",
    "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2", // WETH
    "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48", // USDC
    "0xdac17f958d2ee523a2206206994597c13d831ec7", // USDT
];

/// Addresses never reported, whatever their score. Stored lowercase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denylist {
    entries: HashSet<String>,
}

impl Denylist {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = Denylist {
            entries: HashSet::new(),
        };
        list.extend(entries);
        list
    }

    pub fn extend<I, S>(&mut self, entries: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.entries.extend(
            entries
                .into_iter()
                .map(|e| e.as_ref().trim().to_ascii_lowercase())
                .filter(|e| !e.is_empty()),
        );
    }

    pub fn contains(&self, address: &str) -> bool {
        self.entries.contains(&address.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in sorted order, for display.
    pub fn sorted(&self) -> Vec<&str> {
        let mut v: Vec<&str> = self.entries.iter().map(String::as_str).collect();
        v.sort_unstable();
        v
    }
}

impl Default for Denylist {
    fn default() -> Self {
        Denylist::new(DEFAULT_DENYLIST)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_entries() {
        let d = Denylist::default();
        assert_eq!(d.len(), 5);
        assert!(d.contains("0x000000000000000000000000000000000000dEaD"));
        assert!(d.contains("0xC02AAA39B223FE8D0A0E5C4F27EAD9083C756CC2"));
        assert!(!d.contains("0x1111111111111111111111111111111111111111"));
    }

    #[test]
    fn custom_entries_normalized() {
        let mut d = Denylist::new(["  0xABCDEF0000000000000000000000000000000000 ", ""]);
        d.extend(vec!["0x1111111111111111111111111111111111111111".to_string()]);
        assert_eq!(d.len(), 2);
        assert!(d.contains("0xabcdef0000000000000000000000000000000000"));
    }

    #[test]
    fn empty_list_blocks_nothing() {
        let d = Denylist::new(Vec::<String>::new());
        assert!(d.is_empty());
        assert!(!d.contains("0x0000000000000000000000000000000000000000"));
    }
}
