//! Turning a document into the text shown in the reader view.

pub mod markup;

use crate::documents::Document;

/// Readable body for `doc`.
///
/// Prefers `html_content`, falling back to `summary`. Markup is converted
/// only when the text looks like HTML. When the body does not already
/// mention the title, a `# title` heading (and a `*by author*` byline when
/// known) is prepended so the reader always opens with context.
pub fn compose(doc: &Document) -> String {
    let raw = if doc.html_content.is_empty() {
        doc.summary.as_str()
    } else {
        doc.html_content.as_str()
    };

    let body = if raw.contains('<') {
        markup::convert(raw)
    } else {
        raw.to_string()
    };

    if body.contains(doc.title.as_str()) {
        return body.trim_end().to_string();
    }

    let mut out = format!("# {}\n\n", doc.title);
    if !doc.author.is_empty() {
        out.push_str(&format!("*by {}*\n\n", doc.author));
    }
    out.push_str(&body);
    out.trim_end().to_string()
}
