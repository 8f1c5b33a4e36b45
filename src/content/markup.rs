//! Best-effort conversion of document HTML into Markdown-flavoured text.
//!
//! Only a small subset is translated (headings, emphasis, links, paragraph
//! breaks and blockquotes). Everything else is stripped by the sanitizer pass
//! so no markup ever reaches the terminal.

use regex::{Captures, Regex};
use std::borrow::Cow;
use std::collections::HashSet;
use std::sync::LazyLock;

fn compile(pattern: &str) -> Regex {
    // patterns are literals in this file; a failure here is a programming error
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid markup regex {pattern:?}: {e}"))
}

/// Attributes of an opening tag. A `>` inside a quoted value does not end the tag.
const ATTRS: &str = r#"(?:\s(?:[^>"']|"[^"]*"|'[^']*')*)?"#;

fn open_tag(name: &str) -> String {
    format!("<{name}{ATTRS}>")
}

static HEADINGS: LazyLock<[(Regex, String); 6]> = LazyLock::new(|| {
    std::array::from_fn(|i| {
        let level = i + 1;
        (
            compile(&format!(r"{}(.*?)</h{level}>", open_tag(&format!("h{level}")))),
            format!("{} ${{1}}", "#".repeat(level)),
        )
    })
});

static STRONG: LazyLock<Regex> = LazyLock::new(|| compile(&format!("{}(.*?)</strong>", open_tag("strong"))));
static BOLD: LazyLock<Regex> = LazyLock::new(|| compile(&format!("{}(.*?)</b>", open_tag("b"))));
static EM: LazyLock<Regex> = LazyLock::new(|| compile(&format!("{}(.*?)</em>", open_tag("em"))));
static ITALIC: LazyLock<Regex> = LazyLock::new(|| compile(&format!("{}(.*?)</i>", open_tag("i"))));

static ANCHOR: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r#"<a\s(?:[^>"']|"[^"]*"|'[^']*')*?href\s*=\s*(?:"([^"]*)"|'([^']*)')(?:[^>"']|"[^"]*"|'[^']*')*>(.*?)</a>"#,
    )
});

static PARAGRAPH: LazyLock<Regex> = LazyLock::new(|| compile(&format!("{}|</p>", open_tag("p"))));
static LINE_BREAK: LazyLock<Regex> = LazyLock::new(|| compile(&format!("<br{ATTRS}/?>")));
static QUOTE_OPEN: LazyLock<Regex> = LazyLock::new(|| compile(&open_tag("blockquote")));
static QUOTE_CLOSE: LazyLock<Regex> = LazyLock::new(|| compile(r"</blockquote>"));

/// Escapes in the sanitizer output that are safe to turn back into text.
/// `&lt;` is left alone so nothing downstream can see a tag opener.
static SAFE_ESCAPE: LazyLock<Regex> = LazyLock::new(|| compile(r"&(amp|gt|nbsp);"));

static BLANK_RUN: LazyLock<Regex> = LazyLock::new(|| compile(r"\n\s*\n\s*\n"));

/// Elements dropped together with their contents.
const OPAQUE: [&str; 6] = ["script", "style", "iframe", "object", "noscript", "template"];

/// Convert a restricted HTML subset to Markdown-like text.
///
/// ```
/// use reader_tui::content::markup::convert;
///
/// let text = convert("<h1>Title</h1><p>Hello <strong>world</strong></p>");
/// assert_eq!(text, "# Title\nHello **world**");
/// ```
pub fn convert(markup: &str) -> String {
    if markup.is_empty() {
        return String::new();
    }

    let mut text = markup.to_string();

    for (pattern, replacement) in HEADINGS.iter() {
        replace(&mut text, pattern, replacement.as_str());
    }

    replace(&mut text, &STRONG, "**${1}**");
    replace(&mut text, &BOLD, "**${1}**");
    replace(&mut text, &EM, "*${1}*");
    replace(&mut text, &ITALIC, "*${1}*");

    replace(&mut text, &ANCHOR, |caps: &Captures| {
        let href = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
        format!("[{}]({})", &caps[3], href)
    });

    replace(&mut text, &PARAGRAPH, "\n");
    replace(&mut text, &LINE_BREAK, "\n");
    replace(&mut text, &QUOTE_OPEN, "\n> ");
    replace(&mut text, &QUOTE_CLOSE, "\n");

    let mut text = sanitize(&text);
    replace(&mut text, &BLANK_RUN, "\n\n");

    text.trim().to_string()
}

/// Remove every remaining tag with an empty-allowlist ammonia policy.
///
/// The result is still entity-escaped text. `&amp;`, `&gt;` and `&nbsp;` are
/// unescaped for readability; `&lt;` stays escaped, which Markdown renders
/// as a literal `<`.
fn sanitize(text: &str) -> String {
    let mut out = ammonia::Builder::empty()
        .clean_content_tags(HashSet::from(OPAQUE))
        .strip_comments(true)
        .clean(text)
        .to_string();
    replace(&mut out, &SAFE_ESCAPE, |caps: &Captures| match &caps[1] {
        "amp" => "&",
        "gt" => ">",
        _ => " ",
    });
    out
}

/// Run a replacement in place, skipping the reallocation when nothing matched.
fn replace<R: regex::Replacer>(text: &mut String, pattern: &Regex, replacement: R) {
    let replaced = match pattern.replace_all(text.as_str(), replacement) {
        Cow::Owned(replaced) => replaced,
        Cow::Borrowed(_) => return,
    };
    *text = replaced;
}
