use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use super::Candidate;

static CONTAINER_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("article, main, section, div").unwrap());
static TITLE_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("title").unwrap());
static BODY_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("body").unwrap());
static LINK_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").unwrap());

/// Class/id fragments that mark pure page chrome. Structural UI words only,
/// nothing site-specific.
const CHROME_WORDS: &[&str] = &[
    "nav", "navbar", "menu", "sidebar", "footer", "header", "banner", "cookie", "consent",
    "ads", "advert", "promo", "subscribe", "newsletter",
];

/// Secondary strategy: pick the densest content container, penalizing link
/// text so navigation widgets and tag clouds lose to article bodies. Yields
/// no title.
pub(crate) fn main_region(html: &str) -> Option<Candidate> {
    let doc = Html::parse_document(html);

    let mut best_score: i64 = 0;
    let mut best: Option<ElementRef> = None;
    for el in doc.select(&CONTAINER_SEL) {
        if is_chrome_container(&el) {
            continue;
        }
        let text_len = text_chars(&el);
        if text_len < 20 {
            continue;
        }
        let link_len = link_text_chars(&el);
        let mut score = text_len as i64 - 2 * link_len as i64;
        match el.value().name() {
            "article" => score += 500,
            "main" => score += 300,
            _ => {}
        }
        if link_len > text_len / 2 {
            score -= 500;
        }
        if score > best_score {
            best_score = score;
            best = Some(el);
        }
    }

    let mut lines = Vec::new();
    push_text_lines(best?, &mut lines);
    Some(Candidate {
        title: None,
        body: lines.join("\n"),
    })
}

/// Tertiary strategy: the whole-document dump. Drops script/style/noscript
/// subtrees, emits every remaining text node as trimmed lines, and takes the
/// title from `<title>`. Always available, never pretty.
pub(crate) fn full_text(html: &str) -> Option<Candidate> {
    let doc = Html::parse_document(html);

    let title = doc
        .select(&TITLE_SEL)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty());

    let root = doc.select(&BODY_SEL).next().unwrap_or_else(|| doc.root_element());
    let mut lines = Vec::new();
    push_text_lines(root, &mut lines);

    Some(Candidate {
        title,
        body: lines.join("\n"),
    })
}

fn is_chrome_container(el: &ElementRef) -> bool {
    let mut names = String::new();
    if let Some(c) = el.value().attr("class") {
        names.push_str(c);
        names.push(' ');
    }
    if let Some(i) = el.value().attr("id") {
        names.push_str(i);
    }
    let names = names.to_ascii_lowercase();
    !names.is_empty() && CHROME_WORDS.iter().any(|w| names.contains(w))
}

fn text_chars(el: &ElementRef) -> usize {
    el.text().map(|t| t.chars().count()).sum()
}

fn link_text_chars(el: &ElementRef) -> usize {
    el.select(&LINK_SEL)
        .map(|a| a.text().map(|t| t.chars().count()).sum::<usize>())
        .sum()
}

/// Collect trimmed, non-empty text lines under `root`, skipping anything
/// inside script/style/noscript.
fn push_text_lines(root: ElementRef, lines: &mut Vec<String>) {
    for node in root.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let skipped = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .is_some_and(|e| matches!(e.name(), "script" | "style" | "noscript"))
        });
        if skipped {
            continue;
        }
        for piece in text.split('\n') {
            let piece = piece.trim();
            if !piece.is_empty() {
                lines.push(piece.to_string());
            }
        }
    }
}

// ── Tests ──
