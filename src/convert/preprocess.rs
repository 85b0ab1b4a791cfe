//! Storage-format preprocessing.
//!
//! Rewrites Confluence-specific elements into either Markdown snippets
//! (code fences, callout blockquotes) or standard HTML (anchors, img
//! tags) before the document reaches the base HTML-to-Markdown
//! converter.
//!
//! Markdown snippets must survive the base converter untouched, but an
//! HTML parser collapses newlines inside text nodes. Each snippet is
//! therefore stashed behind an opaque alphanumeric token and restored
//! after base conversion; the observable output matches rewriting the
//! snippet in place.
//!
//! Macro matching is deliberately shortest-match: a pattern spans from
//! the opening tag to the first closing tag, so a same-named macro
//! nested inside another is consumed as part of the outer body rather
//! than matched independently. Downstream consumers rely on this
//! boundary behavior; see the nested fixture test before changing it.

use regex::{Captures, Regex};
use std::sync::LazyLock;

use crate::types::Result;

/// Base-conversion callback used for callout bodies, which are
/// themselves rich text.
pub(super) type BaseConvert<'a> = &'a dyn Fn(&str) -> Result<String>;

/// Markdown snippets stashed during preprocessing, keyed by token.
pub(super) struct Snippets {
    items: Vec<String>,
}

impl Snippets {
    pub(super) fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Stash a Markdown snippet and return its placeholder token.
    fn stash(&mut self, snippet: String) -> String {
        let token = Self::token(self.items.len());
        self.items.push(snippet);
        token
    }

    fn token(index: usize) -> String {
        format!("@@wikigatesnippet{}@@", index)
    }

    /// Replace every known token in `text` with its stashed snippet.
    pub(super) fn restore(&self, text: &str) -> String {
        let mut restored = text.to_string();
        for (index, snippet) in self.items.iter().enumerate() {
            let token = Self::token(index);
            if restored.contains(&token) {
                restored = restored.replace(&token, snippet);
            }
        }
        restored
    }
}

// Recognized callout macros and their blockquote indicators.
const CALLOUTS: [(&str, &str); 4] = [
    ("info", "ℹ️ INFO"),
    ("warning", "⚠️ WARNING"),
    ("note", "📝 NOTE"),
    ("tip", "💡 TIP"),
];

static CODE_MACRO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<ac:structured-macro ac:name="code"[^>]*>.*?</ac:structured-macro>"#)
        .expect("valid regex")
});

static CALLOUT_MACRO_RES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    CALLOUTS
        .iter()
        .map(|(name, indicator)| {
            let pattern = format!(
                r#"(?s)<ac:structured-macro ac:name="{}"[^>]*>.*?</ac:structured-macro>"#,
                name
            );
            (Regex::new(&pattern).expect("valid regex"), *indicator)
        })
        .collect()
});

static TOC_MACRO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<ac:structured-macro ac:name="toc"[^>]*>.*?</ac:structured-macro>"#)
        .expect("valid regex")
});

static ANY_MACRO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<ac:structured-macro[^>]*>.*?</ac:structured-macro>"#).expect("valid regex")
});

static EMPTY_MACRO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<ac:structured-macro[^>]*>\s*</ac:structured-macro>"#).expect("valid regex")
});

static PARAM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<ac:parameter ac:name="([^"]+)">([^<]+)</ac:parameter>"#).expect("valid regex")
});

static PLAIN_BODY_CDATA_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<ac:plain-text-body><!\[CDATA\[(.*?)\]\]></ac:plain-text-body>"#)
        .expect("valid regex")
});

static PLAIN_BODY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<ac:plain-text-body>(.*?)</ac:plain-text-body>"#).expect("valid regex")
});

static RICH_BODY_CDATA_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<ac:rich-text-body><!\[CDATA\[(.*?)\]\]></ac:rich-text-body>"#)
        .expect("valid regex")
});

static RICH_BODY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<ac:rich-text-body>(.*?)</ac:rich-text-body>"#).expect("valid regex")
});

static PAGE_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<ac:link>.*?<ri:page[^>]+/>.*?</ac:link>"#).expect("valid regex")
});

static URL_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<ac:link>.*?<ri:url[^>]+/>.*?</ac:link>"#).expect("valid regex")
});

static PAGE_TITLE_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"ri:content-title="([^"]+)""#).expect("valid regex"));

static URL_VALUE_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"ri:value="([^"]+)""#).expect("valid regex"));

static PAGE_LINK_TEXT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)<ac:link[^>]*>(.*?)<ri:page"#).expect("valid regex"));

static URL_LINK_TEXT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)<ac:link[^>]*>(.*?)<ri:url"#).expect("valid regex"));

static ATTACHMENT_IMAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<ac:image[^>]*>.*?<ri:attachment[^>]+/>.*?</ac:image>"#)
        .expect("valid regex")
});

static URL_IMAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<ac:image[^>]*>.*?<ri:url[^>]+/>.*?</ac:image>"#).expect("valid regex")
});

static FILENAME_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"ri:filename="([^"]+)""#).expect("valid regex"));

static ALT_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"ac:alt="([^"]+)""#).expect("valid regex"));

/// Run all preprocessing passes over the raw storage markup.
///
/// Returns the rewritten HTML plus the stashed Markdown snippets to be
/// restored after base conversion.
pub(super) fn run(html: &str, base: BaseConvert<'_>) -> Result<(String, Snippets)> {
    let mut snippets = Snippets::new();

    let mut processed = rewrite_macros(html, base, &mut snippets)?;
    processed = rewrite_links(&processed);
    processed = rewrite_images(&processed);
    processed = EMPTY_MACRO_RE.replace_all(&processed, "").into_owned();

    Ok((processed, snippets))
}

/// `re.sub` with a fallible substitution function; single pass, each
/// occurrence replaced independently.
fn replace_all_fallible(
    re: &Regex,
    input: &str,
    mut substitute: impl FnMut(&str) -> Result<String>,
) -> Result<String> {
    let mut output = String::with_capacity(input.len());
    let mut last = 0;
    for found in re.find_iter(input) {
        output.push_str(&input[last..found.start()]);
        output.push_str(&substitute(found.as_str())?);
        last = found.end();
    }
    output.push_str(&input[last..]);
    Ok(output)
}

/// Extract a named macro parameter value.
fn macro_parameter(html: &str, name: &str) -> Option<String> {
    PARAM_RE
        .captures_iter(html)
        .find(|caps| &caps[1] == name)
        .map(|caps| caps[2].to_string())
}

/// Body kinds a structured macro can carry.
enum BodyKind {
    PlainText,
    RichText,
}

/// Extract a macro body, preferring CDATA-wrapped content.
fn macro_body(html: &str, kind: BodyKind) -> Option<String> {
    let (cdata_re, bare_re) = match kind {
        BodyKind::PlainText => (&*PLAIN_BODY_CDATA_RE, &*PLAIN_BODY_RE),
        BodyKind::RichText => (&*RICH_BODY_CDATA_RE, &*RICH_BODY_RE),
    };

    if let Some(caps) = cdata_re.captures(html) {
        return Some(caps[1].trim().to_string());
    }
    bare_re.captures(html).map(|caps| caps[1].trim().to_string())
}

fn rewrite_macros(html: &str, base: BaseConvert<'_>, snippets: &mut Snippets) -> Result<String> {
    // Code macro -> fenced block
    let mut processed = replace_all_fallible(&CODE_MACRO_RE, html, |full| {
        let language = macro_parameter(full, "language").unwrap_or_default();
        let code = macro_body(full, BodyKind::PlainText).unwrap_or_default();
        Ok(snippets.stash(format!("\n```{}\n{}\n```\n", language, code)))
    })?;

    // Callout macros -> blockquotes with indicator headers
    for (re, indicator) in CALLOUT_MACRO_RES.iter() {
        processed = replace_all_fallible(re, &processed, |full| {
            let title = macro_parameter(full, "title");
            let body = macro_body(full, BodyKind::RichText).unwrap_or_default();

            let body_md = if body.is_empty() {
                String::new()
            } else {
                // The body may contain already-stashed snippets (a code
                // macro inside a callout); restore them so they are
                // quoted along with the rest.
                snippets.restore(&base(&body)?)
            };

            let header = match &title {
                Some(title) => format!("{}: {}", indicator, title),
                None => indicator.to_string(),
            };
            let quoted = body_md
                .split('\n')
                .map(|line| {
                    if line.is_empty() {
                        ">".to_string()
                    } else {
                        format!("> {}", line)
                    }
                })
                .collect::<Vec<_>>()
                .join("\n");

            Ok(snippets.stash(format!("\n> **{}**\n{}\n", header, quoted)))
        })?;
    }

    // TOC macro carries no useful plain-text content
    processed = TOC_MACRO_RE.replace_all(&processed, "").into_owned();

    // Unrecognized macros: keep the rich-text body, drop the wrapper
    processed = ANY_MACRO_RE
        .replace_all(&processed, |caps: &Captures| {
            macro_body(&caps[0], BodyKind::RichText).unwrap_or_default()
        })
        .into_owned();

    Ok(processed)
}

fn rewrite_links(html: &str) -> String {
    // Page links: <ac:link><ri:page ri:content-title="..." /></ac:link>
    let processed = PAGE_LINK_RE
        .replace_all(html, |caps: &Captures| {
            let full = &caps[0];
            let Some(title_caps) = PAGE_TITLE_ATTR_RE.captures(full) else {
                return full.to_string();
            };
            let title = &title_caps[1];

            let link_text = PAGE_LINK_TEXT_RE
                .captures(full)
                .map(|caps| caps[1].trim().to_string())
                .unwrap_or_else(|| title.to_string());
            // Nested tags in the inner text cannot be carried into an
            // anchor; fall back to the title.
            let link_text = if link_text.is_empty() || link_text.contains('<') {
                title.to_string()
            } else {
                link_text
            };

            format!(r##"<a href="#{}">{}</a>"##, title, link_text)
        })
        .into_owned();

    // External links: <ac:link><ri:url ri:value="..." /></ac:link>
    URL_LINK_RE
        .replace_all(&processed, |caps: &Captures| {
            let full = &caps[0];
            let Some(url_caps) = URL_VALUE_ATTR_RE.captures(full) else {
                return full.to_string();
            };
            let url = &url_caps[1];

            let link_text = URL_LINK_TEXT_RE
                .captures(full)
                .map(|caps| caps[1].trim().to_string())
                .unwrap_or_else(|| url.to_string());
            let link_text = if link_text.is_empty() || link_text.contains('<') {
                url.to_string()
            } else {
                link_text
            };

            format!(r#"<a href="{}">{}</a>"#, url, link_text)
        })
        .into_owned()
}

fn rewrite_images(html: &str) -> String {
    // Attachment images: <ac:image><ri:attachment ri:filename="..." /></ac:image>
    let processed = ATTACHMENT_IMAGE_RE
        .replace_all(html, |caps: &Captures| {
            let full = &caps[0];
            let Some(file_caps) = FILENAME_ATTR_RE.captures(full) else {
                return full.to_string();
            };
            let filename = &file_caps[1];
            let alt = ALT_ATTR_RE
                .captures(full)
                .map(|caps| caps[1].to_string())
                .unwrap_or_else(|| filename.to_string());
            format!(r#"<img src="{}" alt="{}" />"#, filename, alt)
        })
        .into_owned();

    // URL-based images
    URL_IMAGE_RE
        .replace_all(&processed, |caps: &Captures| {
            let full = &caps[0];
            let Some(url_caps) = URL_VALUE_ATTR_RE.captures(full) else {
                return full.to_string();
            };
            let url = &url_caps[1];
            let alt = ALT_ATTR_RE
                .captures(full)
                .map(|caps| caps[1].to_string())
                .unwrap_or_else(|| "image".to_string());
            format!(r#"<img src="{}" alt="{}" />"#, url, alt)
        })
        .into_owned()
}
