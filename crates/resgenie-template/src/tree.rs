//! Intermediate representation between bound Markdown and final markup.

use std::ops::Range;

use pulldown_cmark::{Alignment as CmarkAlignment, Event, Options, Parser, Tag};

/// Block-level structure of a bound document, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentTree {
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading { level: u8, content: Vec<Inline> },
    Paragraph(Vec<Inline>),
    /// Inline content outside a paragraph, as in tight list items.
    Plain(Vec<Inline>),
    List {
        ordered: bool,
        start: Option<u64>,
        items: Vec<ListItem>,
    },
    Table {
        alignments: Vec<Alignment>,
        header: Vec<Vec<Inline>>,
        rows: Vec<Vec<Vec<Inline>>>,
    },
    Rule,
    Quote(Vec<Block>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListItem {
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    None,
    Left,
    Center,
    Right,
}

impl From<CmarkAlignment> for Alignment {
    fn from(value: CmarkAlignment) -> Self {
        match value {
            CmarkAlignment::None => Alignment::None,
            CmarkAlignment::Left => Alignment::Left,
            CmarkAlignment::Center => Alignment::Center,
            CmarkAlignment::Right => Alignment::Right,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    Emphasis(Vec<Inline>),
    Strong(Vec<Inline>),
    Code(String),
    Link { url: String, content: Vec<Inline> },
    LineBreak,
    SoftBreak,
}

impl DocumentTree {
    /// Concatenated text of every heading, in order. Handy for assertions.
    pub fn headings(&self) -> Vec<(u8, String)> {
        self.blocks
            .iter()
            .filter_map(|block| match block {
                Block::Heading { level, content } => Some((*level, plain_text(content))),
                _ => None,
            })
            .collect()
    }
}

/// Flatten inline content to its visible text.
pub fn plain_text(inlines: &[Inline]) -> String {
    let mut out = String::new();
    for inline in inlines {
        match inline {
            Inline::Text(text) | Inline::Code(text) => out.push_str(text),
            Inline::Emphasis(inner) | Inline::Strong(inner) => out.push_str(&plain_text(inner)),
            Inline::Link { content, .. } => out.push_str(&plain_text(content)),
            Inline::LineBreak | Inline::SoftBreak => out.push(' '),
        }
    }
    out
}

/// Markup the tree has no representation for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Unsupported {
    pub line: usize,
    pub construct: &'static str,
}

/// Parse Markdown into a [`DocumentTree`], rejecting raw HTML, images, code
/// blocks and footnotes.
pub(crate) fn build(markdown: &str) -> Result<DocumentTree, Unsupported> {
    let mut builder = TreeBuilder {
        events: Parser::new_ext(markdown, Options::ENABLE_TABLES).into_offset_iter(),
        line_offsets: compute_line_offsets(markdown),
    };
    let blocks = builder.blocks()?;
    Ok(DocumentTree { blocks })
}

struct TreeBuilder<'a, I>
where
    I: Iterator<Item = (Event<'a>, Range<usize>)>,
{
    events: I,
    line_offsets: Vec<usize>,
}

impl<'a, I> TreeBuilder<'a, I>
where
    I: Iterator<Item = (Event<'a>, Range<usize>)>,
{
    /// Blocks until the end of the enclosing container (or the document).
    fn blocks(&mut self) -> Result<Vec<Block>, Unsupported> {
        let mut blocks = Vec::new();
        let mut loose = Vec::new();

        while let Some((event, range)) = self.events.next() {
            match event {
                Event::End(_) => break,
                Event::Start(tag) => {
                    let block = match tag {
                        Tag::Paragraph => Block::Paragraph(self.inlines()?),
                        Tag::Heading(level, _, _) => Block::Heading {
                            level: level as u8,
                            content: self.inlines()?,
                        },
                        Tag::BlockQuote => Block::Quote(self.blocks()?),
                        Tag::List(start) => Block::List {
                            ordered: start.is_some(),
                            start,
                            items: self.list_items()?,
                        },
                        Tag::Table(alignments) => self.table(alignments)?,
                        Tag::CodeBlock(_) => return Err(self.unsupported(&range, "code block")),
                        Tag::FootnoteDefinition(_) => {
                            return Err(self.unsupported(&range, "footnote"))
                        }
                        inline => {
                            push_inline(&mut loose, self.inline_tag(inline, &range)?);
                            continue;
                        }
                    };
                    flush_plain(&mut blocks, &mut loose);
                    blocks.push(block);
                }
                Event::Rule => {
                    flush_plain(&mut blocks, &mut loose);
                    blocks.push(Block::Rule);
                }
                other => {
                    if let Some(inline) = self.leaf_inline(other, &range)? {
                        push_inline(&mut loose, inline);
                    }
                }
            }
        }

        flush_plain(&mut blocks, &mut loose);
        Ok(blocks)
    }

    fn list_items(&mut self) -> Result<Vec<ListItem>, Unsupported> {
        let mut items = Vec::new();
        while let Some((event, _)) = self.events.next() {
            match event {
                Event::Start(Tag::Item) => items.push(ListItem {
                    blocks: self.blocks()?,
                }),
                Event::End(_) => break,
                _ => {}
            }
        }
        Ok(items)
    }

    fn table(&mut self, alignments: Vec<CmarkAlignment>) -> Result<Block, Unsupported> {
        let mut header = Vec::new();
        let mut rows = Vec::new();
        while let Some((event, _)) = self.events.next() {
            match event {
                Event::Start(Tag::TableHead) => header = self.cells()?,
                Event::Start(Tag::TableRow) => rows.push(self.cells()?),
                Event::End(_) => break,
                _ => {}
            }
        }
        Ok(Block::Table {
            alignments: alignments.into_iter().map(Alignment::from).collect(),
            header,
            rows,
        })
    }

    fn cells(&mut self) -> Result<Vec<Vec<Inline>>, Unsupported> {
        let mut cells = Vec::new();
        while let Some((event, _)) = self.events.next() {
            match event {
                Event::Start(Tag::TableCell) => cells.push(self.inlines()?),
                Event::End(_) => break,
                _ => {}
            }
        }
        Ok(cells)
    }

    /// Inline content until the end of the enclosing tag.
    fn inlines(&mut self) -> Result<Vec<Inline>, Unsupported> {
        let mut inlines = Vec::new();
        while let Some((event, range)) = self.events.next() {
            match event {
                Event::End(_) => break,
                Event::Start(tag) => push_inline(&mut inlines, self.inline_tag(tag, &range)?),
                other => {
                    if let Some(inline) = self.leaf_inline(other, &range)? {
                        push_inline(&mut inlines, inline);
                    }
                }
            }
        }
        Ok(inlines)
    }

    fn inline_tag(&mut self, tag: Tag<'a>, range: &Range<usize>) -> Result<Inline, Unsupported> {
        match tag {
            Tag::Emphasis => Ok(Inline::Emphasis(self.inlines()?)),
            Tag::Strong => Ok(Inline::Strong(self.inlines()?)),
            Tag::Link(_, url, _) => Ok(Inline::Link {
                url: url.into_string(),
                content: self.inlines()?,
            }),
            Tag::Image(..) => Err(self.unsupported(range, "image")),
            _ => Err(self.unsupported(range, "markup")),
        }
    }

    fn leaf_inline(
        &self,
        event: Event<'a>,
        range: &Range<usize>,
    ) -> Result<Option<Inline>, Unsupported> {
        match event {
            Event::Text(text) => Ok(Some(Inline::Text(text.into_string()))),
            Event::Code(code) => Ok(Some(Inline::Code(code.into_string()))),
            Event::SoftBreak => Ok(Some(Inline::SoftBreak)),
            Event::HardBreak => Ok(Some(Inline::LineBreak)),
            Event::Html(_) => Err(self.unsupported(range, "raw HTML")),
            Event::FootnoteReference(_) => Err(self.unsupported(range, "footnote")),
            _ => Ok(None),
        }
    }

    fn unsupported(&self, range: &Range<usize>, construct: &'static str) -> Unsupported {
        Unsupported {
            line: byte_to_line(range.start, &self.line_offsets),
            construct,
        }
    }
}

/// Append an inline, merging adjacent text runs that escapes split apart.
fn push_inline(inlines: &mut Vec<Inline>, inline: Inline) {
    if let Inline::Text(text) = &inline {
        if let Some(Inline::Text(previous)) = inlines.last_mut() {
            previous.push_str(text);
            return;
        }
    }
    inlines.push(inline);
}

fn flush_plain(blocks: &mut Vec<Block>, loose: &mut Vec<Inline>) {
    if !loose.is_empty() {
        blocks.push(Block::Plain(std::mem::take(loose)));
    }
}

fn compute_line_offsets(contents: &str) -> Vec<usize> {
    let mut offsets = vec![0];
    for (idx, ch) in contents.char_indices() {
        if ch == '\n' {
            offsets.push(idx + 1);
        }
    }
    offsets
}

fn byte_to_line(byte: usize, offsets: &[usize]) -> usize {
    match offsets.binary_search(&byte) {
        Ok(idx) => idx + 1,
        Err(idx) => idx,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text(value: &str) -> Inline {
        Inline::Text(value.to_string())
    }

    #[test]
    fn merges_text_split_by_escapes() {
        let tree = build(r"# A\. Author").expect("tree");
        assert_eq!(
            tree.blocks,
            vec![Block::Heading {
                level: 1,
                content: vec![text("A. Author")],
            }]
        );
    }

    #[test]
    fn tight_list_items_hold_plain_blocks() {
        let tree = build("- one\n- **two**\n").expect("tree");
        assert_eq!(
            tree.blocks,
            vec![Block::List {
                ordered: false,
                start: None,
                items: vec![
                    ListItem {
                        blocks: vec![Block::Plain(vec![text("one")])],
                    },
                    ListItem {
                        blocks: vec![Block::Plain(vec![Inline::Strong(vec![text("two")])])],
                    },
                ],
            }]
        );
    }

    #[test]
    fn tables_keep_header_and_rows() {
        let tree = build("| a | b |\n| :-- | --: |\n| 1 | 2 |\n").expect("tree");
        assert_eq!(
            tree.blocks,
            vec![Block::Table {
                alignments: vec![Alignment::Left, Alignment::Right],
                header: vec![vec![text("a")], vec![text("b")]],
                rows: vec![vec![vec![text("1")], vec![text("2")]]],
            }]
        );
    }

    #[test]
    fn links_rules_and_quotes() {
        let tree = build("[site](<https://example.com/>)\n\n---\n\n> quoted\n").expect("tree");
        assert_eq!(
            tree.blocks,
            vec![
                Block::Paragraph(vec![Inline::Link {
                    url: "https://example.com/".to_string(),
                    content: vec![text("site")],
                }]),
                Block::Rule,
                Block::Quote(vec![Block::Paragraph(vec![text("quoted")])]),
            ]
        );
    }

    #[test]
    fn rejects_unsupported_markup_with_line() {
        let html = build("intro\n\n<div>raw</div>\n").unwrap_err();
        assert_eq!(html.construct, "raw HTML");
        assert_eq!(html.line, 3);

        assert_eq!(build("![alt](a.png)").unwrap_err().construct, "image");
        assert_eq!(build("```\ncode\n```\n").unwrap_err().construct, "code block");
    }
}
