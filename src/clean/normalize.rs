/// A raw text line reduced to its two comparable forms.
///
/// `canonical` is what survives into output; `loose` exists only to widen
/// boilerplate matches across punctuation-only render differences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedLine {
    pub canonical: String,
    pub loose: String,
}

/// Collapse internal whitespace to single spaces and trim, then derive the
/// loose form: lowercased, with every non-word non-space character removed.
pub fn normalize(line: &str) -> NormalizedLine {
    let canonical = line.split_whitespace().collect::<Vec<_>>().join(" ");
    let loose = loose_form(&canonical);
    NormalizedLine { canonical, loose }
}

/// Loose form of an already-canonical line.
pub fn loose_form(canonical: &str) -> String {
    canonical
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == ' ')
        .collect::<String>()
        .trim()
        .to_string()
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_whitespace() {
        let n = normalize("  Designed \t by   Example  Co.  ");
        assert_eq!(n.canonical, "Designed by Example Co.");
    }

    #[test]
    fn loose_strips_punctuation_and_case() {
        let n = normalize("Designed by Example Co.");
        assert_eq!(n.loose, "designed by example co");
    }

    #[test]
    fn loose_keeps_digits_and_underscores() {
        let n = normalize("page_2 of 10!");
        assert_eq!(n.loose, "page_2 of 10");
    }

    #[test]
    fn empty_line() {
        let n = normalize("   \t ");
        assert_eq!(n.canonical, "");
        assert_eq!(n.loose, "");
    }

    #[test]
    fn punctuation_only_line_has_empty_loose() {
        let n = normalize("»»»");
        assert_eq!(n.canonical, "»»»");
        assert_eq!(n.loose, "");
    }

    #[test]
    fn greek_text_survives_loose() {
        let n = normalize("Διαβάστε περισσότερα...");
        assert_eq!(n.loose, "διαβάστε περισσότερα");
    }
}
