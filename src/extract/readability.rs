use dom_smoothie::{Config, Readability};

use super::{squash_lines, Candidate};

/// Primary strategy: dom_smoothie's readability port. Yields the article
/// title when one is detectable. Any parse failure is treated as "nothing
/// extracted" and the cascade falls through.
pub(crate) fn extract(html: &str) -> Option<Candidate> {
    let cfg = Config {
        max_elements_to_parse: 9000,
        ..Default::default()
    };
    let mut readability = Readability::new(html, None, Some(cfg)).ok()?;
    let article = readability.parse().ok()?;

    let title = article.title.trim().to_string();
    Some(Candidate {
        title: (!title.is_empty()).then_some(title),
        body: squash_lines(&article.text_content.to_string()),
    })
}
