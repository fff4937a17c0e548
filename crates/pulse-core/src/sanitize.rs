//! Turns raw assistant text into a safe HTML fragment for display.
//!
//! The input is escaped before anything else runs, so no later step can
//! produce live markup from user or model text. Links are dropped whole
//! and code (fenced blocks and inline spans) is lifted out in a single scan,
//! so a link label holding code never leaves its target behind. Markdown
//! decoration is stripped from what remains and code is re-rendered.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// How newlines outside code blocks are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineBreaks {
    /// Each newline becomes `<br>`.
    #[default]
    Html,
    /// Newlines are left as they are.
    Preserve,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextFormatter {
    /// Remove table pipes and `---` rules.
    pub strip_table_markup: bool,
    pub line_breaks: LineBreaks,
}

impl Default for TextFormatter {
    fn default() -> Self {
        Self {
            strip_table_markup: true,
            line_breaks: LineBreaks::Html,
        }
    }
}

/// Format with the default policy.
pub fn format_text(raw: &str) -> String {
    TextFormatter::default().format(raw)
}

/// Escape the characters a DOM text node escapes when serialized.
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Leftmost match wins, so a link opening before a backtick swallows the
/// code in its label, and a fence opening first keeps its links verbatim.
fn span_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r"(?P<link>\[[^\n]*?\]\([^\n]*?\))",
            r"|(?s:```\w*\n(?P<block>.*?)```)",
            r"|`(?P<inline>[^`]+)`",
        ))
        .expect("valid span regex")
    })
}

fn strip_rules(strip_table_markup: bool) -> &'static [Regex] {
    static WITH_TABLES: OnceLock<Vec<Regex>> = OnceLock::new();
    static WITHOUT_TABLES: OnceLock<Vec<Regex>> = OnceLock::new();

    // Order matters: emphasis goes before stray backticks.
    const TABLE: &[&str] = &[r"\|", r"-{3,}"];
    const MARKDOWN: &[&str] = &[
        r"(?m)^#{1,6}[ \t]?",
        r"\*\*",
        r"__",
        r"\*",
        r"_",
        r"`+",
    ];

    let build = |patterns: &[&[&str]]| -> Vec<Regex> {
        patterns
            .iter()
            .flat_map(|group| group.iter())
            .map(|p| Regex::new(p).expect("valid strip regex"))
            .collect()
    };

    if strip_table_markup {
        WITH_TABLES.get_or_init(|| build(&[TABLE, MARKDOWN]))
    } else {
        WITHOUT_TABLES.get_or_init(|| build(&[MARKDOWN]))
    }
}

impl TextFormatter {
    pub fn format(&self, raw: &str) -> String {
        if raw.is_empty() {
            return String::new();
        }

        let escaped = escape_html(raw);
        let mut out = String::with_capacity(escaped.len());
        let mut last = 0;

        for caps in span_regex().captures_iter(&escaped) {
            let Some(whole) = caps.get(0) else { continue };
            out.push_str(&self.format_prose(&escaped[last..whole.start()]));

            // A matched link emits nothing, label and target alike.
            if let Some(block) = caps.name("block") {
                out.push_str("<pre><code>");
                out.push_str(block.as_str());
                out.push_str("</code></pre>");
            } else if let Some(inline) = caps.name("inline") {
                out.push_str("<code>");
                out.push_str(inline.as_str());
                out.push_str("</code>");
            }
            last = whole.end();
        }
        out.push_str(&self.format_prose(&escaped[last..]));

        out
    }

    /// Strip decoration from text that sits outside any code span.
    fn format_prose(&self, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }

        let mut text = text.to_string();
        for rule in strip_rules(self.strip_table_markup) {
            if rule.is_match(&text) {
                text = rule.replace_all(&text, "").into_owned();
            }
        }

        match self.line_breaks {
            LineBreaks::Html => text.replace("\r\n", "\n").replace('\n', "<br>"),
            LineBreaks::Preserve => text,
        }
    }
}
