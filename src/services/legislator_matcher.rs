// src/services/legislator_matcher.rs
//! Resolves names printed by the feeds to stored legislators.
//!
//! Feeds add honorifics, pad names with (full-width) spaces, or print
//! Indigenous names in mixed Han/Latin script, so matching goes in three
//! tiers: exact, stored-contains-raw, raw-contains-stored.

use crate::models::legislator::Legislator;

pub struct LegislatorMatcher {
    entries: Vec<Entry>,
}

struct Entry {
    compact: String,
    legislator: Legislator,
}

impl LegislatorMatcher {
    pub fn new(legislators: Vec<Legislator>) -> Self {
        let entries = legislators
            .into_iter()
            .map(|legislator| Entry {
                compact: strip_whitespace(&legislator.name_ch),
                legislator,
            })
            .collect();
        LegislatorMatcher { entries }
    }

    /// First hit wins; `None` means the caller should record a warning.
    pub fn match_name(&self, raw: &str) -> Option<&Legislator> {
        if let Some(entry) = self.entries.iter().find(|e| e.legislator.name_ch == raw) {
            return Some(&entry.legislator);
        }

        let compact = strip_whitespace(raw);
        if compact.is_empty() {
            return None;
        }

        if let Some(entry) = self
            .entries
            .iter()
            .find(|e| e.legislator.name_ch.contains(compact.as_str()))
        {
            return Some(&entry.legislator);
        }

        self.entries
            .iter()
            .find(|e| !e.compact.is_empty() && compact.contains(e.compact.as_str()))
            .map(|e| &e.legislator)
    }
}

pub fn strip_whitespace(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Han ideographs only, for endpoints that choke on Latin fragments in
/// Indigenous legislators' names.
pub fn han_only(name: &str) -> String {
    name.chars().filter(|c| is_han(*c)).collect()
}

pub fn is_han(c: char) -> bool {
    matches!(c as u32,
        0x3400..=0x4DBF      // Extension A
        | 0x4E00..=0x9FFF    // Unified Ideographs
        | 0xF900..=0xFAFF    // Compatibility Ideographs
        | 0x20000..=0x2A6DF  // Extension B
        | 0x2A700..=0x2EBEF  // Extensions C-F
        | 0x30000..=0x3134F  // Extension G
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher() -> LegislatorMatcher {
        LegislatorMatcher::new(vec![
            Legislator::new("王小明", "民主進步黨"),
            Legislator::new("伍麗華Saidhai‧Tahovecahe", "民主進步黨"),
            Legislator::new("李大華", "中國國民黨"),
        ])
    }

    #[test]
    fn exact_name_wins() {
        let m = matcher();
        assert_eq!(m.match_name("王小明").unwrap().name_ch, "王小明");
    }

    #[test]
    fn whitespace_and_partial_names_resolve() {
        let m = matcher();
        assert_eq!(m.match_name("王 小明").unwrap().name_ch, "王小明");
        assert_eq!(m.match_name("王\u{3000}小明").unwrap().name_ch, "王小明");
        assert_eq!(
            m.match_name("伍麗華").unwrap().name_ch,
            "伍麗華Saidhai‧Tahovecahe"
        );
    }

    #[test]
    fn raw_with_honorific_contains_stored_name() {
        let m = matcher();
        assert_eq!(m.match_name("委員李大華").unwrap().name_ch, "李大華");
    }

    #[test]
    fn unknown_and_blank_names_do_not_resolve() {
        let m = matcher();
        assert!(m.match_name("陳某某").is_none());
        assert!(m.match_name("   ").is_none());
    }

    #[test]
    fn han_only_drops_latin_fragments() {
        assert_eq!(han_only("伍麗華Saidhai‧Tahovecahe"), "伍麗華");
        assert_eq!(han_only("王小明"), "王小明");
    }
}
