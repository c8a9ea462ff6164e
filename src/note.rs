// src/note.rs
// Renders a highlight record into a note title and an ENML body.

use chrono::Local;
use once_cell::sync::OnceCell;
use regex::Regex;

use crate::extract::HighlightRecord;

/// Titles carry at most this many words of the highlight text.
pub const TITLE_WORDS: usize = 11;

const ENML_PROLOGUE: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
     <!DOCTYPE en-note SYSTEM \"http://xml.evernote.com/pub/enml2.dtd\">";

/// Run-level batch token, shared by every note created in one invocation and
/// embedded in each body for provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchId(String);

impl BatchId {
    pub fn now() -> Self {
        BatchId(Local::now().format("batch%Y%m%d%H%M%S").to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedNote {
    pub title: String,
    pub body: String,
}

/// Pure render: record plus run batch id to a submittable note. Rendering the
/// same record with the same batch id is byte-identical.
pub fn render_note(rec: &HighlightRecord, batch: &BatchId) -> RenderedNote {
    RenderedNote {
        title: note_title(&rec.text),
        body: note_body(rec, batch),
    }
}

/// First eleven words of the highlight, joined by single spaces; the whole
/// text when shorter.
pub fn note_title(text: &str) -> String {
    text.split_whitespace()
        .take(TITLE_WORDS)
        .collect::<Vec<_>>()
        .join(" ")
}

fn note_body(rec: &HighlightRecord, batch: &BatchId) -> String {
    let inner = format!(
        "<p>{text}</p><p></p><hr/>\
         <p><em>{title}</em><br/>{author}</p>\
         <ul><li>Highlight ID: <tt>{id}</tt></li>\
         <li>Batch ID: <tt>{batch}</tt></li></ul>\
         <p><a href=\"{link}\">Read more...</a></p>",
        text = html_escape::encode_text(&rec.text),
        title = html_escape::encode_text(&rec.book_title),
        author = html_escape::encode_text(&rec.book_author),
        id = rec.id,
        batch = batch.as_str(),
        link = escape_bare_ampersands(&rec.source_link),
    );
    format!("{ENML_PROLOGUE}<en-note>{inner}</en-note>")
}

/// Escapes `&` to `&amp;` unless it already starts a character entity, so
/// locator links survive XML parsing without double-escaping anything.
pub fn escape_bare_ampersands(s: &str) -> String {
    static RE_AMP: OnceCell<Regex> = OnceCell::new();
    let re = RE_AMP.get_or_init(|| {
        Regex::new(r"&(?:[a-zA-Z][a-zA-Z0-9]{1,31};|#[0-9]{1,7};|#x[0-9a-fA-F]{1,6};)?").unwrap()
    });
    re.replace_all(s, |caps: &regex::Captures| {
        if &caps[0] == "&" {
            "&amp;".to_string()
        } else {
            caps[0].to_string()
        }
    })
    .into_owned()
}

/// True when the body parses end to end as one XML document. The note store
/// rejects anything that doesn't; the runner warns before submitting such a
/// body, keeping the renderer itself free of side effects.
pub fn is_well_formed_enml(body: &str) -> bool {
    let mut reader = quick_xml::Reader::from_str(body);
    loop {
        match reader.read_event() {
            Ok(quick_xml::events::Event::Eof) => return true,
            Ok(_) => {}
            Err(_) => return false,
        }
    }
}
