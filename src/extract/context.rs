/// Characters kept in front of a match.
pub const BEFORE_CHARS: usize = 50;
/// Characters kept from the match start onward.
pub const AFTER_CHARS: usize = 100;
/// Final snippet length cap, applied after whitespace collapsing.
pub const MAX_SNIPPET_CHARS: usize = 100;

/// Text window around byte offset `start` (must be a char boundary),
/// whitespace-collapsed and capped at `MAX_SNIPPET_CHARS`.
pub fn window(html: &str, start: usize) -> String {
    let from = html[..start]
        .char_indices()
        .rev()
        .take(BEFORE_CHARS)
        .last()
        .map(|(i, _)| i)
        .unwrap_or(start);
    let to = html[start..]
        .char_indices()
        .nth(AFTER_CHARS)
        .map(|(i, _)| start + i)
        .unwrap_or(html.len());

    truncate_chars(&collapse_whitespace(&html[from..to]), MAX_SNIPPET_CHARS)
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((i, _)) => s[..i].to_string(),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounded_by_document_edges() {
        assert_eq!(window("contract: 0xabc", 0), "contract: 0xabc");
        assert_eq!(window("", 0), "");
    }

    #[test]
    fn keeps_fifty_before_and_caps_at_hundred() {
        let html = format!("{}MATCH{}", "a".repeat(80), "b".repeat(200));
        let w = window(&html, 80);
        assert_eq!(w.chars().count(), 100);
        assert!(w.starts_with(&"a".repeat(50)));
        assert!(w[50..].starts_with("MATCH"));
    }

    #[test]
    fn collapses_and_trims_whitespace() {
        let html = "  <div>\n\n   contract:\t\t0x1  </div>   ";
        let start = html.find("contract").unwrap();
        assert_eq!(window(html, start), "<div> contract: 0x1 </div>");
    }

    #[test]
    fn multibyte_text_is_not_split() {
        let html = format!("{}contract{}", "é".repeat(60), "ü".repeat(120));
        let start = html.find("contract").unwrap();
        let w = window(&html, start);
        assert_eq!(w.chars().count(), 100);
        assert!(w.starts_with(&"é".repeat(50)));
    }
}
