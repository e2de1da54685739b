use std::collections::{HashMap, HashSet};

use super::normalize::{loose_form, normalize, NormalizedLine};
use super::CleanConfig;

/// Lines shorter than this never enter the index; they are too uninformative
/// to match meaningfully across pages.
const MIN_INDEX_CHARS: usize = 3;

/// Corpus-wide frequency index: canonical line → set of page indices that
/// contain it. Scratch state, rebuilt per run and discarded after cleaning.
pub struct LineIndex {
    by_line: HashMap<String, HashSet<usize>>,
    total_pages: usize,
}

impl LineIndex {
    /// Build the index over every page's raw text. Lines are deduplicated
    /// within a page first, so a line repeated on one spammy page still
    /// counts once toward its corpus frequency.
    pub fn build<'a>(raw_texts: impl IntoIterator<Item = &'a str>) -> Self {
        let mut by_line: HashMap<String, HashSet<usize>> = HashMap::new();
        let mut total_pages = 0;
        for (page_idx, text) in raw_texts.into_iter().enumerate() {
            total_pages = page_idx + 1;
            let mut seen_on_page: HashSet<String> = HashSet::new();
            for line in text.lines() {
                let canonical = normalize(line).canonical;
                if canonical.chars().count() < MIN_INDEX_CHARS {
                    continue;
                }
                if seen_on_page.insert(canonical.clone()) {
                    by_line.entry(canonical).or_default().insert(page_idx);
                }
            }
        }
        Self { by_line, total_pages }
    }

    pub fn total_pages(&self) -> usize {
        self.total_pages
    }

    /// Number of distinct pages containing this canonical line.
    pub fn pages_containing(&self, canonical: &str) -> usize {
        self.by_line.get(canonical).map_or(0, HashSet::len)
    }

    /// Threshold the index into the boilerplate set. A line qualifies on the
    /// absolute clause (`min_pages`) or on the ratio clause; the ratio clause
    /// additionally requires `ratio_min_hits` distinct pages so that tiny
    /// corpora do not promote every single-occurrence line (see DESIGN.md).
    pub fn boilerplate(&self, cfg: &CleanConfig) -> BoilerplateSet {
        let mut lines = HashSet::new();
        let mut loose = HashSet::new();
        for (line, on_pages) in &self.by_line {
            let k = on_pages.len();
            let absolute = k >= cfg.min_pages;
            let relative = k >= cfg.ratio_min_hits
                && self.total_pages > 0
                && k as f64 / self.total_pages as f64 >= cfg.ratio;
            if !absolute && !relative {
                continue;
            }
            let lf = loose_form(line);
            if !lf.is_empty() && lf != line.to_lowercase() {
                loose.insert(lf);
            }
            lines.insert(line.clone());
        }
        BoilerplateSet { lines, loose }
    }
}

/// The classified boilerplate lines plus the widened loose forms. Immutable
/// once built; shared read-only by the cleaning sweep.
pub struct BoilerplateSet {
    lines: HashSet<String>,
    loose: HashSet<String>,
}

impl BoilerplateSet {
    pub fn matches(&self, n: &NormalizedLine) -> bool {
        self.lines.contains(&n.canonical)
            || self.lines.contains(&n.canonical.to_lowercase())
            || (!n.loose.is_empty() && self.loose.contains(&n.loose))
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> CleanConfig {
        CleanConfig::default()
    }

    #[test]
    fn counts_distinct_pages() {
        let index = LineIndex::build([
            "Designed by Example Co.\nUnique alpha",
            "Designed by Example Co.\nUnique beta",
            "Unique gamma",
        ]);
        assert_eq!(index.total_pages(), 3);
        assert_eq!(index.pages_containing("Designed by Example Co."), 2);
        assert_eq!(index.pages_containing("Unique alpha"), 1);
        assert_eq!(index.pages_containing("never seen"), 0);
    }

    #[test]
    fn repeats_within_a_page_count_once() {
        let spammy = "Buy cheap widgets\n".repeat(50);
        let index = LineIndex::build([spammy.as_str(), "Something else entirely"]);
        assert_eq!(index.pages_containing("Buy cheap widgets"), 1);
    }

    #[test]
    fn whitespace_variants_collapse_to_one_entry() {
        let index = LineIndex::build(["Designed  by   Example Co.", "Designed by Example Co."]);
        assert_eq!(index.pages_containing("Designed by Example Co."), 2);
    }

    #[test]
    fn very_short_lines_are_not_indexed() {
        let index = LineIndex::build(["ok\nab\na proper line of text"]);
        assert_eq!(index.pages_containing("ok"), 0);
        assert_eq!(index.pages_containing("ab"), 0);
        assert_eq!(index.pages_containing("a proper line of text"), 1);
    }

    #[test]
    fn absolute_clause_triggers_at_min_pages() {
        // 3 of 20 pages: ratio 0.15 not the trigger (exactly at it, actually),
        // absolute clause is.
        let mut texts: Vec<String> = (0..20).map(|i| format!("unique line number {i} content")).collect();
        for t in texts.iter_mut().take(3) {
            t.push_str("\nShared footer line");
        }
        let index = LineIndex::build(texts.iter().map(String::as_str));
        let set = index.boilerplate(&cfg());
        assert!(set.matches(&normalize("Shared footer line")));
        assert!(!set.matches(&normalize("unique line number 5 content")));
    }

    #[test]
    fn ratio_clause_triggers_below_min_pages() {
        // 2 of 10 pages is below min_pages=3 but 0.20 >= 0.15 with 2 hits.
        let mut texts: Vec<String> = (0..10).map(|i| format!("unique line number {i} content")).collect();
        for t in texts.iter_mut().take(2) {
            t.push_str("\nShared footer line");
        }
        let index = LineIndex::build(texts.iter().map(String::as_str));
        let set = index.boilerplate(&cfg());
        assert!(set.matches(&normalize("Shared footer line")));
    }

    #[test]
    fn single_occurrence_never_boilerplate_under_default_guard() {
        let index = LineIndex::build(["every line is unique here"]);
        let set = index.boilerplate(&cfg());
        assert!(set.is_empty());
    }

    #[test]
    fn guard_disabled_restores_degenerate_single_page_behavior() {
        let c = CleanConfig { ratio_min_hits: 1, ..CleanConfig::default() };
        let index = LineIndex::build(["every line is unique here"]);
        let set = index.boilerplate(&c);
        assert!(set.matches(&normalize("every line is unique here")));
    }

    #[test]
    fn loose_form_widens_punctuation_variants() {
        let texts = [
            "Designed by Example Co.",
            "Designed by Example Co.",
            "Designed by Example Co.",
        ];
        let index = LineIndex::build(texts);
        let set = index.boilerplate(&cfg());
        // Same footer rendered with a stray trailing symbol elsewhere.
        assert!(set.matches(&normalize("Designed by Example Co…")));
    }

    #[test]
    fn lowercased_canonical_still_matches() {
        let texts = ["Shared Footer Line over here"; 3];
        let index = LineIndex::build(texts);
        let set = index.boilerplate(&cfg());
        assert!(set.matches(&normalize("Shared Footer Line over here")));
    }
}
