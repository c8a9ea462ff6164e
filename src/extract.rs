// src/extract.rs
// Pulls ordered highlight records out of a kindle.amazon.com highlights export.

use anyhow::{bail, Context, Result};
use once_cell::sync::OnceCell;
use regex::Regex;

use crate::locator;

/// One highlighted passage, immutable once extracted. Records keep document
/// order: books in page order, highlights in order within their book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightRecord {
    pub book_title: String,
    pub book_author: String,
    pub text: String,
    pub source_link: String,
    pub id: String,
}

const CONTAINER_MARKER: &str = r#"id="allHighlightedBooks""#;
const BOOK_HEADER_MARKER: &str = r#"class="bookMain yourHighlightsHeader""#;

/// Parses the full export text into highlight records.
///
/// The export lays book headers and their highlight rows out as flat page
/// siblings, with no wrapper tying a book to its own highlights. Grouping is
/// re-established by slicing the document at each book header marker:
/// everything up to the next header belongs to that book. No DOM surgery,
/// no text splicing.
///
/// Fails when the top-level container marker is absent (wrong or corrupted
/// input format) and returns no partial results.
pub fn extract_highlights(html: &str) -> Result<Vec<HighlightRecord>> {
    if !html.contains(CONTAINER_MARKER) {
        bail!("did not find div {CONTAINER_MARKER}: not a Kindle highlights export");
    }

    let header_starts: Vec<usize> = html
        .match_indices(BOOK_HEADER_MARKER)
        .map(|(i, _)| i)
        .collect();

    let mut records = Vec::new();
    for (n, &start) in header_starts.iter().enumerate() {
        let end = header_starts.get(n + 1).copied().unwrap_or(html.len());
        book_records(&html[start..end], &mut records)
            .with_context(|| format!("extracting book section {}", n + 1))?;
    }
    Ok(records)
}

/// Extracts title, author and every highlight from one book's slice of the
/// document, appending to `out` in document order.
fn book_records(segment: &str, out: &mut Vec<HighlightRecord>) -> Result<()> {
    static RE_TITLE: OnceCell<Regex> = OnceCell::new();
    let re_title = RE_TITLE.get_or_init(|| {
        Regex::new(r#"(?is)<span[^>]*class="title"[^>]*>(.*?)</span>"#).unwrap()
    });
    static RE_AUTHOR: OnceCell<Regex> = OnceCell::new();
    let re_author = RE_AUTHOR.get_or_init(|| {
        Regex::new(r#"(?is)<span[^>]*class="author"[^>]*>(.*?)</span>"#).unwrap()
    });
    static RE_HIGHLIGHT: OnceCell<Regex> = OnceCell::new();
    let re_highlight = RE_HIGHLIGHT.get_or_init(|| {
        Regex::new(r#"(?is)<span[^>]*class="highlight"[^>]*>(.*?)</span>"#).unwrap()
    });
    static RE_LINK: OnceCell<Regex> = OnceCell::new();
    let re_link = RE_LINK.get_or_init(|| {
        Regex::new(r#"(?is)<a[^>]*href="([^"]+)""#).unwrap()
    });

    let book_title = match re_title.captures(segment) {
        Some(c) => clean_text(&c[1]),
        None => bail!("book header has no title span"),
    };
    if book_title.is_empty() {
        bail!("book header has an empty title span");
    }
    let book_author = re_author
        .captures(segment)
        .map(|c| strip_by_prefix(&clean_text(&c[1])))
        .unwrap_or_default();

    // The "Read more" anchor is the sibling right after each highlight span,
    // so the link search is bounded by the start of the next highlight.
    let matches: Vec<_> = re_highlight.captures_iter(segment).collect();
    for (i, cap) in matches.iter().enumerate() {
        let tail_start = cap.get(0).map(|m| m.end()).unwrap_or(segment.len());
        let tail_end = matches
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map(|m| m.start())
            .unwrap_or(segment.len());
        let tail = &segment[tail_start..tail_end];

        let source_link = match re_link.captures(tail) {
            Some(c) => html_escape::decode_html_entities(&c[1]).into_owned(),
            None => bail!(
                "highlight in {book_title:?} has no read-more link after it"
            ),
        };
        let id = locator::highlight_id(&source_link)?;

        out.push(HighlightRecord {
            book_title: book_title.clone(),
            book_author: book_author.clone(),
            text: clean_text(&cap[1]),
            source_link,
            id,
        });
    }
    Ok(())
}

/// Strip inner tags, decode entities, trim. Titles wrap their text in an
/// anchor, so the tag pass runs before decoding.
fn clean_text(raw: &str) -> String {
    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").unwrap());
    let stripped = re_tags.replace_all(raw, "");
    html_escape::decode_html_entities(stripped.as_ref())
        .trim()
        .to_string()
}

/// Author spans read "by Jane Doe"; drop the literal prefix only.
fn strip_by_prefix(author: &str) -> String {
    author
        .strip_prefix("by")
        .map(str::trim)
        .unwrap_or(author)
        .to_string()
}
