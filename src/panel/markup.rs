// src/panel/markup.rs
//! Lightweight markup used by generated insights: `#` headings, `**bold**`,
//! blank-line separated paragraphs. Everything else is plain text.

use once_cell::sync::Lazy;
use regex::Regex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading(Vec<Inline>),
    Paragraph(Vec<Inline>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    Strong(String),
}

static RE_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s{0,3}(?:#{2,6}\s*|#\s+)(.+?)(?:\*\*)?\s*$").expect("heading regex"));
static RE_BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("bold regex"));

pub fn parse_insight(text: &str) -> Vec<Block> {
    let normalized = text.replace("\r\n", "\n");
    let mut blocks = Vec::new();

    for chunk in normalized.split("\n\n") {
        if chunk.trim().is_empty() {
            continue;
        }
        let mut lines: Vec<&str> = Vec::new();
        for line in chunk.lines() {
            match RE_HEADING.captures(line).and_then(|c| c.get(1)) {
                Some(h) => {
                    flush_paragraph(&mut lines, &mut blocks);
                    blocks.push(Block::Heading(parse_inline(h.as_str())));
                }
                None => lines.push(line),
            }
        }
        flush_paragraph(&mut lines, &mut blocks);
    }
    blocks
}

fn flush_paragraph(lines: &mut Vec<&str>, blocks: &mut Vec<Block>) {
    let joined = lines.join("\n");
    lines.clear();
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        blocks.push(Block::Paragraph(parse_inline(trimmed)));
    }
}

pub fn parse_inline(text: &str) -> Vec<Inline> {
    let mut out = Vec::new();
    let mut last = 0;
    for caps in RE_BOLD.captures_iter(text) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if whole.start() > last {
            out.push(Inline::Text(text[last..whole.start()].to_string()));
        }
        out.push(Inline::Strong(inner.as_str().to_string()));
        last = whole.end();
    }
    if last < text.len() {
        out.push(Inline::Text(text[last..].to_string()));
    }
    out
}
