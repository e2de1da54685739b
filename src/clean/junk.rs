use std::sync::LazyLock;

use regex::Regex;

use super::CleanConfig;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap());
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\+?\(?\d[\d\s().\-]{5,}\d").unwrap());
static CONTACT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(copyright|tel|fax|τηλ|φαξ|επικοινωνία)\b").unwrap());
static DMY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,2}[/.\-]\d{1,2}[/.\-]\d{2,4}$").unwrap());
static YMD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}[/.\-]\d{1,2}[/.\-]\d{1,2}$").unwrap());

const NAV_WORDS: &[&str] = &[
    "more",
    "read more",
    "home",
    "back",
    "next",
    "previous",
    "περισσότερα",
    "διαβάστε περισσότερα",
    "αρχική",
    "πίσω",
    "επόμενο",
    "προηγούμενο",
];

/// Per-line junk predicate, independent of corpus statistics. Predicates are
/// OR'd; order is irrelevant.
pub fn is_junk(line: &str, cfg: &CleanConfig) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return true;
    }
    if EMAIL_RE.is_match(trimmed) || has_phone_token(trimmed) {
        return true;
    }
    if trimmed.contains('©') || CONTACT_RE.is_match(trimmed) {
        return true;
    }
    if is_nav_token(trimmed) {
        return true;
    }
    if DMY_RE.is_match(trimmed) || YMD_RE.is_match(trimmed) {
        return true;
    }
    trimmed.chars().count() < cfg.min_line_chars
        || trimmed.split_whitespace().count() < cfg.min_words
}

/// Phone-shaped token: a digit run with separators, at least 8 digits total.
/// The digit floor keeps years and small figures out.
fn has_phone_token(line: &str) -> bool {
    PHONE_RE
        .find_iter(line)
        .any(|m| m.as_str().chars().filter(|c| c.is_ascii_digit()).count() >= 8)
}

/// True when the line is nothing but a navigation token: arrow/ellipsis
/// symbols, or a known nav word optionally wrapped in them.
fn is_nav_token(line: &str) -> bool {
    let lower = line.to_lowercase();
    if lower
        .chars()
        .all(|c| matches!(c, '«' | '»' | '‹' | '›' | '→' | '←' | '<' | '>' | '.' | '…' | '|' | '-' | ' '))
    {
        return true;
    }
    let stripped = lower
        .trim_matches(|c: char| matches!(c, '«' | '»' | '‹' | '›' | '→' | '←' | '<' | '>' | '.' | '…' | ' '));
    NAV_WORDS.contains(&stripped)
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> CleanConfig {
        CleanConfig::default()
    }

    #[test]
    fn blank_is_junk() {
        assert!(is_junk("   ", &cfg()));
    }

    #[test]
    fn email_is_junk() {
        assert!(is_junk("For inquiries write to info@example.com any time", &cfg()));
    }

    #[test]
    fn phone_is_junk() {
        assert!(is_junk("Call our office at +30 2310 555 123 during business hours", &cfg()));
        assert!(is_junk("Reach the newsroom on 210-555-0188 for corrections today", &cfg()));
    }

    #[test]
    fn years_are_not_phone_shaped() {
        assert!(!is_junk("The festival ran from 2003 until it ended years later", &cfg()));
    }

    #[test]
    fn copyright_markers_are_junk() {
        assert!(is_junk("© 2009 Example Co. All rights reserved on this site", &cfg()));
        assert!(is_junk("Copyright Example Co. and all of its subsidiaries worldwide", &cfg()));
        assert!(is_junk("Τηλ 2310 000000 Φαξ 2310 000001 email hidden here", &cfg()));
    }

    #[test]
    fn tel_does_not_match_inside_words() {
        assert!(!is_junk("The hotel association announced renovated telescope exhibits", &cfg()));
    }

    #[test]
    fn bare_nav_tokens_are_junk() {
        for line in ["»", "...", "…", "more", "Read More", "read more »", "Περισσότερα", "διαβάστε περισσότερα"] {
            assert!(is_junk(line, &cfg()), "expected junk: {line:?}");
        }
    }

    #[test]
    fn date_only_lines_are_junk() {
        assert!(is_junk("12/05/2013", &cfg()));
        assert!(is_junk("2013-05-12", &cfg()));
        assert!(is_junk("1.1.99", &cfg()));
    }

    #[test]
    fn date_inside_sentence_is_not_date_junk() {
        assert!(!is_junk("The council met on 12/05 to debate the harbour works plan", &cfg()));
    }

    #[test]
    fn short_or_few_words_is_junk() {
        assert!(is_junk("Tiny line here", &cfg())); // under 20 chars
        assert!(is_junk("Extraordinarily uninformative", &cfg())); // under 3 words
    }

    #[test]
    fn ordinary_sentence_survives() {
        assert!(!is_junk("The municipal orchestra performed three new works last night", &cfg()));
    }

    #[test]
    fn junk_filtering_is_idempotent() {
        let lines = [
            "The municipal orchestra performed three new works last night",
            "© 2009 Example Co. All rights reserved on this site",
            "12/05/2013",
            "A second long sentence that clearly carries editorial content",
        ];
        let c = cfg();
        let pass1: Vec<&str> = lines.iter().copied().filter(|l| !is_junk(l, &c)).collect();
        let pass2: Vec<&str> = pass1.iter().copied().filter(|l| !is_junk(l, &c)).collect();
        assert_eq!(pass1, pass2);
    }
}
