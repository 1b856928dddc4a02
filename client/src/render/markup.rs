//! Markdown reader for remediation text
//!
//! Flattens CommonMark into the blocks the terminal printer knows how to
//! draw: headings, paragraphs, list items, rules and fenced code.

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

/// A top-level block of remediation text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading { level: u8, spans: Vec<Span> },

    Paragraph(Vec<Span>),

    /// One list entry; `number` is set for ordered lists
    ListItem {
        depth: usize,
        number: Option<u64>,
        spans: Vec<Span>,
    },

    /// Code block; `language` comes from the fence's info string
    Code {
        language: Option<String>,
        code: String,
    },

    Rule,
}

/// An inline run of text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Span {
    Plain(String),
    Strong(String),
    Emphasis(String),
    Code(String),
}

/// Language tag from a fence info string: its first word, lowercased
fn fence_language(info: &str) -> Option<String> {
    info.split_whitespace()
        .next()
        .map(|tag| tag.trim_matches(|c| c == '{' || c == '}' || c == '.').to_lowercase())
        .filter(|tag| !tag.is_empty())
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Open list entry waiting for its first line of text
#[derive(Debug, Clone, Copy)]
struct PendingItem {
    depth: usize,
    number: Option<u64>,
}

#[derive(Debug, Default)]
struct BlockBuilder {
    blocks: Vec<Block>,
    spans: Vec<Span>,
    strong: usize,
    emphasis: usize,
    heading: Option<u8>,
    /// Next number of each open list; `None` for bullet lists
    lists: Vec<Option<u64>>,
    item: Option<PendingItem>,
    link: Option<String>,
    code: Option<(Option<String>, String)>,
}

impl BlockBuilder {
    fn push_event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => match self.code.as_mut() {
                Some((_, code)) => code.push_str(&text),
                None => self.push_text(&text),
            },
            Event::Code(code) => self.spans.push(Span::Code(code.to_string())),
            Event::SoftBreak => self.push_text(" "),
            Event::HardBreak => self.push_text("\n"),
            Event::Html(html) | Event::InlineHtml(html) => self.push_text(&html),
            Event::Rule => {
                self.flush();
                self.blocks.push(Block::Rule);
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { level, .. } => {
                self.flush();
                self.heading = Some(heading_level(level));
            }
            Tag::List(first) => {
                self.flush();
                self.lists.push(first);
            }
            Tag::Item => {
                self.flush();
                let depth = self.lists.len().saturating_sub(1);
                let number = match self.lists.last_mut() {
                    Some(Some(next)) => {
                        let number = *next;
                        *next += 1;
                        Some(number)
                    }
                    _ => None,
                };
                self.item = Some(PendingItem { depth, number });
            }
            Tag::CodeBlock(kind) => {
                self.flush();
                let language = match kind {
                    CodeBlockKind::Fenced(info) => fence_language(&info),
                    CodeBlockKind::Indented => None,
                };
                self.code = Some((language, String::new()));
            }
            Tag::Strong => self.strong += 1,
            Tag::Emphasis => self.emphasis += 1,
            Tag::Link { dest_url, .. } => self.link = Some(dest_url.to_string()),
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.flush(),
            TagEnd::Heading(_) => {
                self.flush();
                self.heading = None;
            }
            TagEnd::Item => {
                self.flush();
                self.item = None;
            }
            TagEnd::List(_) => {
                self.flush();
                self.lists.pop();
            }
            TagEnd::CodeBlock => {
                if let Some((language, mut code)) = self.code.take() {
                    while code.ends_with('\n') {
                        code.pop();
                    }
                    self.blocks.push(Block::Code { language, code });
                }
            }
            TagEnd::Strong => self.strong = self.strong.saturating_sub(1),
            TagEnd::Emphasis => self.emphasis = self.emphasis.saturating_sub(1),
            TagEnd::Link => {
                if let Some(url) = self.link.take() {
                    self.push_text(&format!(" ({})", url));
                }
            }
            _ => {}
        }
    }

    fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let span = if self.strong > 0 {
            Span::Strong(text.to_string())
        } else if self.emphasis > 0 {
            Span::Emphasis(text.to_string())
        } else {
            Span::Plain(text.to_string())
        };

        if let Some(last) = self.spans.last_mut() {
            match (last, &span) {
                (Span::Plain(last), Span::Plain(text))
                | (Span::Strong(last), Span::Strong(text))
                | (Span::Emphasis(last), Span::Emphasis(text)) => {
                    last.push_str(text);
                    return;
                }
                _ => {}
            }
        }
        self.spans.push(span);
    }

    /// Close the inline run collected so far
    fn flush(&mut self) {
        if self.spans.is_empty() {
            return;
        }
        let spans = std::mem::take(&mut self.spans);

        let block = if let Some(level) = self.heading.take() {
            Block::Heading { level, spans }
        } else if let Some(item) = self.item.take() {
            Block::ListItem {
                depth: item.depth,
                number: item.number,
                spans,
            }
        } else {
            Block::Paragraph(spans)
        };
        self.blocks.push(block);
    }
}

/// Parse remediation text into printable blocks
pub fn parse_blocks(text: &str) -> Vec<Block> {
    let mut builder = BlockBuilder::default();
    for event in Parser::new_ext(text, Options::ENABLE_STRIKETHROUGH) {
        builder.push_event(event);
    }
    builder.flush();
    builder.blocks
}
