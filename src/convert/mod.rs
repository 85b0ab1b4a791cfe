//! Storage-Format to Markdown Conversion
//!
//! Confluence stores page bodies in its XHTML-based storage format with
//! `<ac:structured-macro>` elements for macros, `<ac:link>`/`<ri:page>`
//! for cross-references, and `<ac:image>` for attachments. Agents want
//! Markdown. The pipeline runs in three stages:
//!
//! 1. **Preprocess** — rewrite Confluence-specific elements into
//!    Markdown snippets or standard HTML ([`preprocess`])
//! 2. **Base conversion** — HTML to Markdown via `htmd`
//! 3. **Postprocess** — whitespace and spacing cleanup ([`postprocess`])
//!
//! Any failure inside the pipeline surfaces as a single
//! [`GateError::Conversion`]; callers decide whether to fall back to the
//! raw storage body.

mod postprocess;
mod preprocess;

use htmd::options::{BulletListMarker, CodeBlockFence, CodeBlockStyle, HeadingStyle, Options};
use htmd::HtmlToMarkdown;

use crate::types::{GateError, Result};

/// Conversion capability consumed by page retrieval.
///
/// A trait seam so callers can be exercised with a scripted converter.
pub trait MarkupConvert: Send + Sync {
    fn convert(&self, storage: &str) -> Result<String>;
}

/// Converts Confluence storage-format markup to Markdown.
pub struct StorageConverter {
    base: HtmlToMarkdown,
}

impl StorageConverter {
    pub fn new() -> Self {
        let base = HtmlToMarkdown::builder()
            .skip_tags(vec!["script", "style"])
            .options(Options {
                heading_style: HeadingStyle::Atx,
                bullet_list_marker: BulletListMarker::Dash,
                code_block_style: CodeBlockStyle::Fenced,
                code_block_fence: CodeBlockFence::Backticks,
                ul_bullet_spacing: 1,
                ..Default::default()
            })
            .build();
        Self { base }
    }

    /// Convert storage-format markup to Markdown.
    ///
    /// Empty or whitespace-only input returns an empty string without
    /// entering the pipeline.
    pub fn convert(&self, storage: &str) -> Result<String> {
        if storage.trim().is_empty() {
            return Ok(String::new());
        }

        let (processed, snippets) = preprocess::run(storage, &|html| self.base_convert(html))?;
        let markdown = self.base_convert(&processed)?;

        Ok(postprocess::run(&snippets.restore(&markdown)))
    }

    fn base_convert(&self, html: &str) -> Result<String> {
        self.base.convert(html).map_err(|e| GateError::Conversion {
            details: format!("Conversion error: io::Error: {}", e),
        })
    }
}

impl Default for StorageConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkupConvert for StorageConverter {
    fn convert(&self, storage: &str) -> Result<String> {
        StorageConverter::convert(self, storage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn converter() -> StorageConverter {
        StorageConverter::new()
    }

    #[test]
    fn test_empty_input_short_circuits() {
        let conv = converter();
        assert_eq!(conv.convert("").unwrap(), "");
        assert_eq!(conv.convert("   \n\t ").unwrap(), "");
    }

    #[test]
    fn test_plain_html_document() {
        let conv = converter();
        let out = conv.convert("<h1>Title</h1><p>Content</p>").unwrap();
        assert_eq!(out, "# Title\n\nContent");
    }

    #[test]
    fn test_unordered_list_uses_dash_marker() {
        let conv = converter();
        let out = conv.convert("<ul><li>alpha</li><li>beta</li></ul>").unwrap();
        assert!(out.contains("- alpha"));
        assert!(out.contains("- beta"));
    }

    #[test]
    fn test_code_macro_becomes_fenced_block() {
        let conv = converter();
        let html = concat!(
            r#"<ac:structured-macro ac:name="code" ac:schema-version="1">"#,
            r#"<ac:parameter ac:name="language">python</ac:parameter>"#,
            r#"<ac:plain-text-body><![CDATA[print("x")]]></ac:plain-text-body>"#,
            r#"</ac:structured-macro>"#
        );
        let out = conv.convert(html).unwrap();
        assert!(out.contains("```python\nprint(\"x\")\n```"), "got: {out:?}");
    }

    #[test]
    fn test_info_macro_becomes_blockquote() {
        let conv = converter();
        let html = concat!(
            r#"<ac:structured-macro ac:name="info">"#,
            r#"<ac:parameter ac:name="title">Heads up</ac:parameter>"#,
            r#"<ac:rich-text-body><p>Body text</p></ac:rich-text-body>"#,
            r#"</ac:structured-macro>"#
        );
        let out = conv.convert(html).unwrap();
        assert!(out.contains("> **ℹ️ INFO: Heads up**"), "got: {out:?}");
        assert!(out.contains("> Body text"), "got: {out:?}");
    }

    #[test]
    fn test_toc_macro_dropped() {
        let conv = converter();
        let html = concat!(
            r#"<ac:structured-macro ac:name="toc"></ac:structured-macro>"#,
            "<p>after</p>"
        );
        let out = conv.convert(html).unwrap();
        assert_eq!(out, "after");
    }

    #[test]
    fn test_page_link_keeps_text_and_anchor() {
        let conv = converter();
        let html = r#"<p>See <ac:link>the docs<ri:page ri:content-title="Home" /></ac:link>.</p>"#;
        let out = conv.convert(html).unwrap();
        assert!(out.contains("[the docs](#Home)"), "got: {out:?}");
    }

    #[test]
    fn test_attachment_image() {
        let conv = converter();
        let html = r#"<ac:image ac:alt="diagram"><ri:attachment ri:filename="arch.png" /></ac:image>"#;
        let out = conv.convert(html).unwrap();
        assert!(out.contains("![diagram](arch.png)"), "got: {out:?}");
    }

    #[test]
    fn test_script_and_style_skipped() {
        let conv = converter();
        let html = "<p>keep</p><script>alert(1)</script><style>p{}</style>";
        let out = conv.convert(html).unwrap();
        assert_eq!(out, "keep");
    }

    #[test]
    fn test_output_is_postprocess_fixed_point() {
        let conv = converter();
        let html = concat!(
            "<h2>Setup</h2><p>Install first.</p>",
            r#"<ac:structured-macro ac:name="code">"#,
            r#"<ac:plain-text-body><![CDATA[cargo install wikigate]]></ac:plain-text-body>"#,
            r#"</ac:structured-macro>"#,
            "<p>Done.</p>"
        );
        let out = conv.convert(html).unwrap();
        assert_eq!(super::postprocess::run(&out), out);
    }
}
