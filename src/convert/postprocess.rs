//! Markdown cleanup after base conversion.
//!
//! Five ordered passes: collapse runs of three or more newlines, strip
//! trailing whitespace per line, blank-line separation around headings,
//! tighten code-fence spacing, trim the document. Idempotent on its own
//! output for clean input.

use regex::Regex;
use std::sync::LazyLock;

static EXCESS_NEWLINES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

static BEFORE_HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([^\n])\n(#{1,6} )").expect("valid regex"));

static AFTER_HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(#{1,6} .+)\n([^\n#])").expect("valid regex"));

/// Normalize converted Markdown for readability.
pub(super) fn run(markdown: &str) -> String {
    let collapsed = EXCESS_NEWLINES_RE.replace_all(markdown, "\n\n");

    let stripped = collapsed
        .split('\n')
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n");

    let spaced = BEFORE_HEADING_RE.replace_all(&stripped, "${1}\n\n${2}");
    let spaced = AFTER_HEADING_RE.replace_all(&spaced, "${1}\n\n${2}");

    // Tighten the blank line the converter leaves around fences
    let fenced = spaced.replace("```\n\n", "```\n").replace("\n\n```", "\n```");

    fenced.trim().to_string()
}
