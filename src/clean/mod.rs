pub mod frequency;
pub mod junk;
pub mod normalize;

use rayon::prelude::*;
use tracing::debug;

use frequency::{BoilerplateSet, LineIndex};
use normalize::normalize;

/// Thresholds for the boilerplate and junk classifiers. All CLI-overridable;
/// defaults match the production heuristic.
#[derive(Debug, Clone)]
pub struct CleanConfig {
    /// Absolute page count at which a line becomes boilerplate.
    pub min_pages: usize,
    /// Share of the corpus at which a line becomes boilerplate.
    pub ratio: f64,
    /// Minimum distinct pages for the ratio clause to apply at all.
    pub ratio_min_hits: usize,
    /// Lines shorter than this are junk.
    pub min_line_chars: usize,
    /// Lines with fewer words than this are junk.
    pub min_words: usize,
    /// Below this many cleaned characters the boilerplate filter is assumed
    /// to have over-deleted and the junk-only result is used instead.
    pub clean_floor: usize,
}

impl Default for CleanConfig {
    fn default() -> Self {
        Self {
            min_pages: 3,
            ratio: 0.15,
            ratio_min_hits: 2,
            min_line_chars: 20,
            min_words: 3,
            clean_floor: 100,
        }
    }
}

/// One archived snapshot flowing through the pipeline. `raw_text` is the
/// extraction-cascade output and is never modified after extraction;
/// `clean_text` is derived from it plus the batch-wide boilerplate set.
#[derive(Debug, Clone)]
pub struct PageRecord {
    pub timestamp: String,
    pub original_url: String,
    pub archive_url: String,
    pub title: String,
    pub raw_text: String,
    pub clean_text: String,
}

/// Clean a whole batch in place: build the frequency index over every page's
/// raw text, threshold it into the boilerplate set, then sweep each page
/// against that (now immutable) set. The index is scratch state scoped to
/// this call; the batch passed in is the corpus.
pub fn clean_pages(pages: &mut [PageRecord], cfg: &CleanConfig) {
    let index = LineIndex::build(pages.iter().map(|p| p.raw_text.as_str()));
    let boiler = index.boilerplate(cfg);
    debug!(
        pages = pages.len(),
        boilerplate_lines = boiler.len(),
        "corpus boilerplate set built"
    );

    pages.par_iter_mut().for_each(|page| {
        page.clean_text = clean_page(&page.raw_text, &boiler, cfg);
    });
}

/// Clean one page's raw text against the corpus boilerplate set, falling back
/// to junk-only filtering when the result lands under the floor. Legitimately
/// short pages would otherwise be scrubbed down to nothing whenever their few
/// lines also appear elsewhere in the corpus.
pub fn clean_page(raw_text: &str, boiler: &BoilerplateSet, cfg: &CleanConfig) -> String {
    let mut kept = Vec::new();
    for line in raw_text.lines() {
        let n = normalize(line);
        if n.canonical.is_empty() {
            continue;
        }
        if boiler.matches(&n) || junk::is_junk(&n.canonical, cfg) {
            continue;
        }
        kept.push(n.canonical);
    }
    let candidate = kept.join("\n");
    if candidate.chars().count() >= cfg.clean_floor {
        candidate
    } else {
        junk_filtered(raw_text, cfg)
    }
}

fn junk_filtered(raw_text: &str, cfg: &CleanConfig) -> String {
    raw_text
        .lines()
        .filter_map(|line| {
            let canonical = normalize(line).canonical;
            if canonical.is_empty() || junk::is_junk(&canonical, cfg) {
                None
            } else {
                Some(canonical)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Tests ──
