//! Draws the sanitized message fragment as terminal lines.
//!
//! The fragment only ever contains the handful of tags the sanitizer emits
//! (`<pre><code>`, `<code>`, `<br>`) plus the three escaped entities, so
//! this is a small tokenizer rather than an HTML parser.

use ratatui::style::Style;
use ratatui::text::{Line, Span};

use crate::palette::Palette;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Text(&'a str),
    Break,
    PreOpen,
    PreClose,
    CodeOpen,
    CodeClose,
}

const TAGS: &[(&str, Token<'static>)] = &[
    ("<pre><code>", Token::PreOpen),
    ("</code></pre>", Token::PreClose),
    ("<code>", Token::CodeOpen),
    ("</code>", Token::CodeClose),
    ("<br>", Token::Break),
];

fn tokenize(fragment: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut rest = fragment;

    while !rest.is_empty() {
        let Some(lt) = rest.find('<') else {
            tokens.push(Token::Text(rest));
            break;
        };
        if lt > 0 {
            tokens.push(Token::Text(&rest[..lt]));
            rest = &rest[lt..];
        }

        match TAGS.iter().find(|(tag, _)| rest.starts_with(tag)) {
            Some((tag, token)) => {
                tokens.push(*token);
                rest = &rest[tag.len()..];
            }
            None => {
                tokens.push(Token::Text("<"));
                rest = &rest[1..];
            }
        }
    }

    tokens
}

/// Undo the sanitizer's escaping for display.
pub fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

struct LineBuilder {
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
}

impl LineBuilder {
    fn push_text(&mut self, text: &str, style: Style) {
        let mut parts = text.split('\n').peekable();
        while let Some(part) = parts.next() {
            if !part.is_empty() {
                self.current.push(Span::styled(unescape(part), style));
            }
            if parts.peek().is_some() {
                self.break_line();
            }
        }
    }

    fn break_line(&mut self) {
        self.lines.push(Line::from(std::mem::take(&mut self.current)));
    }

    fn flush_if_open(&mut self) {
        if !self.current.is_empty() {
            self.break_line();
        }
    }
}

pub fn fragment_to_lines(fragment: &str, palette: &Palette) -> Vec<Line<'static>> {
    let mut builder = LineBuilder {
        lines: Vec::new(),
        current: Vec::new(),
    };
    let mut in_pre = false;
    let mut in_code = false;

    for token in tokenize(fragment) {
        match token {
            Token::Text(text) => {
                let style = if in_pre {
                    palette.code_block()
                } else if in_code {
                    palette.inline_code()
                } else {
                    palette.text()
                };
                builder.push_text(text, style);
            }
            Token::Break => builder.break_line(),
            Token::PreOpen => {
                builder.flush_if_open();
                in_pre = true;
            }
            Token::PreClose => {
                builder.flush_if_open();
                in_pre = false;
            }
            Token::CodeOpen => in_code = true,
            Token::CodeClose => in_code = false,
        }
    }
    builder.flush_if_open();

    builder.lines
}
