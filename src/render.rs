//! Markdown rendering collaborator
//!
//! Pure and deterministic: `markup` is always invoked with the full
//! accumulated source text, never with fragments, because structural markup
//! (a list spanning several fragments, a heading split mid-line) is only
//! correct when rendered from the whole text.

use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};

const BOLD: &str = "\x1b[1m";
const ITALIC: &str = "\x1b[3m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

/// Render markdown to terminal-oriented markup.
pub fn markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    // Per-level ordered-list counters; `None` marks a bullet list.
    let mut lists: Vec<Option<u64>> = Vec::new();

    for event in Parser::new_ext(text, Options::empty()) {
        match event {
            Event::Start(tag) => match tag {
                Tag::Heading { .. } | Tag::Strong => out.push_str(BOLD),
                Tag::Emphasis => out.push_str(ITALIC),
                Tag::CodeBlock(_) => out.push_str(DIM),
                Tag::List(start) => lists.push(start),
                Tag::Item => {
                    let depth = lists.len().saturating_sub(1);
                    out.push_str(&"  ".repeat(depth));
                    match lists.last_mut() {
                        Some(Some(n)) => {
                            out.push_str(&format!("{n}. "));
                            *n += 1;
                        }
                        _ => out.push_str("- "),
                    }
                }
                _ => {}
            },
            Event::End(tag) => match tag {
                TagEnd::Heading(_) => {
                    out.push_str(RESET);
                    out.push_str("\n\n");
                }
                TagEnd::Strong | TagEnd::Emphasis => out.push_str(RESET),
                TagEnd::CodeBlock => {
                    out.push_str(RESET);
                    out.push('\n');
                }
                TagEnd::Paragraph => out.push_str("\n\n"),
                TagEnd::List(_) => {
                    lists.pop();
                    out.push('\n');
                }
                TagEnd::Item => out.push('\n'),
                _ => {}
            },
            Event::Text(text) => out.push_str(&text),
            Event::Code(code) => {
                out.push_str(DIM);
                out.push_str(&code);
                out.push_str(RESET);
            }
            Event::SoftBreak | Event::HardBreak => out.push('\n'),
            Event::Rule => out.push_str("--------\n"),
            _ => {}
        }
    }

    while out.ends_with('\n') {
        out.pop();
    }
    out
}
