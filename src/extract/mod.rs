mod dom;
mod readability;

use tracing::debug;

/// Best-effort extraction result for one page.
pub struct Extracted {
    pub title: String,
    pub text: String,
}

/// What a single strategy produced. An empty body with a usable title is
/// still worth keeping for title resolution.
pub(crate) struct Candidate {
    pub title: Option<String>,
    pub body: String,
}

type Strategy = fn(&str) -> Option<Candidate>;

/// Readability first, then the main-content heuristic, then the
/// whole-document dump.
const STRATEGIES: &[(&str, Strategy)] = &[
    ("readability", readability::extract),
    ("main-region", dom::main_region),
    ("full-text", dom::full_text),
];

/// Ordered extraction cascade. The first non-empty body wins and is never
/// replaced; the first non-empty title wins independently, so a later
/// strategy can still supply the title for an earlier strategy's body.
/// Returns `None` when no strategy yields any body text; such pages are
/// dropped from the corpus without surfacing an error.
pub fn extract_page(html: &str) -> Option<Extracted> {
    run_cascade(html, STRATEGIES)
}

fn run_cascade(html: &str, strategies: &[(&str, Strategy)]) -> Option<Extracted> {
    let mut title: Option<String> = None;
    let mut body: Option<String> = None;
    for (name, strategy) in strategies {
        let Some(candidate) = strategy(html) else {
            debug!(strategy = *name, "strategy yielded nothing");
            continue;
        };
        if title.is_none() {
            title = candidate.title.filter(|t| !t.trim().is_empty());
        }
        if body.is_none() && !candidate.body.trim().is_empty() {
            body = Some(candidate.body);
        }
        if title.is_some() && body.is_some() {
            break;
        }
    }

    Some(Extracted {
        title: title.unwrap_or_default(),
        text: body?,
    })
}

/// Reduce free-form extractor output to trimmed, non-empty lines.
pub(crate) fn squash_lines(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Tests ──
