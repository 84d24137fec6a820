use std::fmt;

use resgenie_template::tree::{plain_text, Alignment, Block, Inline, ListItem};
use resgenie_template::DocumentTree;
use tracing::debug;

use crate::error::RenderError;

/// Stylesheet embedded when the caller does not supply one.
pub const DEFAULT_STYLESHEET: &str = include_str!("../assets/resume.css");

const DEFAULT_TITLE: &str = "Resume";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Contents of `<title>`.
    pub title: String,
    /// CSS to embed; `None` selects [`DEFAULT_STYLESHEET`].
    pub stylesheet: Option<String>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            title: DEFAULT_TITLE.to_string(),
            stylesheet: None,
        }
    }
}

/// A complete, self-contained HTML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlDocument {
    html: String,
}

impl HtmlDocument {
    /// Wrap markup produced outside [`render`].
    pub fn new(html: impl Into<String>) -> Self {
        HtmlDocument { html: html.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.html
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.html.as_bytes()
    }

    pub fn into_string(self) -> String {
        self.html
    }
}

impl fmt::Display for HtmlDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.html)
    }
}

/// Render `tree` into a full HTML page.
pub fn render(tree: &DocumentTree, options: &RenderOptions) -> Result<HtmlDocument, RenderError> {
    let stylesheet = options.stylesheet.as_deref().unwrap_or(DEFAULT_STYLESHEET);

    let mut out = String::with_capacity(stylesheet.len() + 4096);
    out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    out.push_str("<meta charset=\"utf-8\" />\n");
    out.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\" />\n");
    out.push_str("<meta name=\"generator\" content=\"resgenie\" />\n");
    out.push_str("<title>");
    out.push_str(&escape_html(&options.title));
    out.push_str("</title>\n<style>\n");
    // `</` inside a style element would end it early.
    out.push_str(&stylesheet.replace("</", "<\\/"));
    if !stylesheet.ends_with('\n') {
        out.push('\n');
    }
    out.push_str("</style>\n</head>\n<body class=\"resume\">\n<main>\n");

    for block in &tree.blocks {
        write_block(&mut out, block)?;
    }

    out.push_str("</main>\n</body>\n</html>\n");
    debug!(bytes = out.len(), blocks = tree.blocks.len(), "rendered html");
    Ok(HtmlDocument { html: out })
}

fn write_block(out: &mut String, block: &Block) -> Result<(), RenderError> {
    match block {
        Block::Heading { level, content } => {
            if !(1..=6).contains(level) {
                return Err(RenderError::InvalidHeadingLevel { level: *level });
            }
            out.push_str(&format!("<h{level}>"));
            write_inlines(out, content)?;
            out.push_str(&format!("</h{level}>\n"));
        }
        Block::Paragraph(content) => {
            out.push_str("<p>");
            write_inlines(out, content)?;
            out.push_str("</p>\n");
        }
        Block::Plain(content) => {
            write_inlines(out, content)?;
            out.push('\n');
        }
        Block::List {
            ordered,
            start,
            items,
        } => {
            match (ordered, start) {
                (true, Some(start)) if *start != 1 => out.push_str(&format!("<ol start=\"{start}\">\n")),
                (true, _) => out.push_str("<ol>\n"),
                (false, _) => out.push_str("<ul>\n"),
            }
            for item in items {
                write_item(out, item)?;
            }
            out.push_str(if *ordered { "</ol>\n" } else { "</ul>\n" });
        }
        Block::Table {
            alignments,
            header,
            rows,
        } => write_table(out, alignments, header, rows)?,
        Block::Rule => out.push_str("<hr />\n"),
        Block::Quote(blocks) => {
            out.push_str("<blockquote>\n");
            for inner in blocks {
                write_block(out, inner)?;
            }
            out.push_str("</blockquote>\n");
        }
    }
    Ok(())
}

fn write_item(out: &mut String, item: &ListItem) -> Result<(), RenderError> {
    out.push_str("<li>");
    match item.blocks.as_slice() {
        [Block::Plain(content)] => write_inlines(out, content)?,
        blocks => {
            out.push('\n');
            for block in blocks {
                write_block(out, block)?;
            }
        }
    }
    out.push_str("</li>\n");
    Ok(())
}

fn write_table(
    out: &mut String,
    alignments: &[Alignment],
    header: &[Vec<Inline>],
    rows: &[Vec<Vec<Inline>>],
) -> Result<(), RenderError> {
    let expected = header.len();
    for (idx, row) in rows.iter().enumerate() {
        if row.len() != expected {
            return Err(RenderError::RaggedTable {
                row: idx + 1,
                expected,
                found: row.len(),
            });
        }
    }

    out.push_str("<table>\n<thead>\n<tr>\n");
    for (idx, cell) in header.iter().enumerate() {
        write_cell(out, "th", alignments.get(idx).copied(), cell)?;
    }
    out.push_str("</tr>\n</thead>\n");

    if !rows.is_empty() {
        out.push_str("<tbody>\n");
        for row in rows {
            out.push_str("<tr>\n");
            for (idx, cell) in row.iter().enumerate() {
                write_cell(out, "td", alignments.get(idx).copied(), cell)?;
            }
            out.push_str("</tr>\n");
        }
        out.push_str("</tbody>\n");
    }
    out.push_str("</table>\n");
    Ok(())
}

fn write_cell(
    out: &mut String,
    tag: &str,
    alignment: Option<Alignment>,
    content: &[Inline],
) -> Result<(), RenderError> {
    let align = match alignment {
        Some(Alignment::Left) => Some("left"),
        Some(Alignment::Center) => Some("center"),
        Some(Alignment::Right) => Some("right"),
        Some(Alignment::None) | None => None,
    };
    match align {
        Some(align) => out.push_str(&format!("<{tag} style=\"text-align: {align}\">")),
        None => out.push_str(&format!("<{tag}>")),
    }
    write_inlines(out, content)?;
    out.push_str(&format!("</{tag}>\n"));
    Ok(())
}

fn write_inlines(out: &mut String, inlines: &[Inline]) -> Result<(), RenderError> {
    for inline in inlines {
        match inline {
            Inline::Text(text) => out.push_str(&escape_html(text)),
            Inline::Emphasis(inner) => {
                out.push_str("<em>");
                write_inlines(out, inner)?;
                out.push_str("</em>");
            }
            Inline::Strong(inner) => {
                out.push_str("<strong>");
                write_inlines(out, inner)?;
                out.push_str("</strong>");
            }
            Inline::Code(code) => {
                out.push_str("<code>");
                out.push_str(&escape_html(code));
                out.push_str("</code>");
            }
            Inline::Link { url, content } => {
                if url.trim().is_empty() {
                    return Err(RenderError::EmptyLink {
                        text: plain_text(content),
                    });
                }
                out.push_str("<a href=\"");
                out.push_str(&escape_attribute(url));
                out.push_str("\">");
                write_inlines(out, content)?;
                out.push_str("</a>");
            }
            Inline::LineBreak => out.push_str("<br />\n"),
            Inline::SoftBreak => out.push('\n'),
        }
    }
    Ok(())
}

/// Escape text for use as HTML element content. Quotes stay literal.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            other => out.push(other),
        }
    }
    out
}

/// Escape text for a double-quoted attribute value.
pub fn escape_attribute(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text(value: &str) -> Inline {
        Inline::Text(value.to_string())
    }

    fn body(html: &HtmlDocument) -> &str {
        let html = html.as_str();
        let start = html.find("<main>\n").map(|idx| idx + 7).unwrap_or(0);
        let end = html.rfind("</main>").unwrap_or(html.len());
        &html[start..end]
    }

    #[test]
    fn renders_blocks_with_fixed_mapping() {
        let tree = DocumentTree {
            blocks: vec![
                Block::Heading {
                    level: 1,
                    content: vec![text("A. Author")],
                },
                Block::Paragraph(vec![
                    Inline::Emphasis(vec![text("Jan 2020")]),
                    Inline::LineBreak,
                    Inline::Link {
                        url: "https://example.com/?a=1&b=2".to_string(),
                        content: vec![text("site")],
                    },
                ]),
                Block::List {
                    ordered: true,
                    start: Some(3),
                    items: vec![ListItem {
                        blocks: vec![Block::Plain(vec![Inline::Strong(vec![text("one")])])],
                    }],
                },
                Block::Rule,
            ],
        };

        let html = render(&tree, &RenderOptions::default()).expect("renders");
        assert_eq!(
            body(&html),
            "<h1>A. Author</h1>\n\
             <p><em>Jan 2020</em><br />\n<a href=\"https://example.com/?a=1&amp;b=2\">site</a></p>\n\
             <ol start=\"3\">\n<li><strong>one</strong></li>\n</ol>\n\
             <hr />\n"
        );
    }

    #[test]
    fn head_is_complete_and_escaped() {
        let options = RenderOptions {
            title: "CV <draft>".to_string(),
            stylesheet: Some("p { color: red; }".to_string()),
        };
        let html = render(&DocumentTree::default(), &options).expect("renders");
        let html = html.as_str();
        assert!(html.starts_with("<!DOCTYPE html>\n"));
        assert!(html.contains("<meta charset=\"utf-8\" />"));
        assert!(html.contains("<title>CV &lt;draft&gt;</title>"));
        assert!(html.contains("<style>\np { color: red; }\n</style>"));
        assert!(html.ends_with("</html>\n"));
    }

    #[test]
    fn text_is_escaped() {
        let tree = DocumentTree {
            blocks: vec![Block::Paragraph(vec![text("<script>\"x\" & 'y'</script>")])],
        };
        let html = render(&tree, &RenderOptions::default()).expect("renders");
        assert_eq!(
            body(&html),
            "<p>&lt;script&gt;\"x\" &amp; 'y'&lt;/script&gt;</p>\n"
        );
    }

    #[test]
    fn quotes_are_escaped_only_inside_attributes() {
        let tree = DocumentTree {
            blocks: vec![Block::Paragraph(vec![Inline::Link {
                url: "https://example.com/?q=\"o'neil\"".to_string(),
                content: vec![text("Pat O'Neil")],
            }])],
        };
        let html = render(&tree, &RenderOptions::default()).expect("renders");
        assert_eq!(
            body(&html),
            "<p><a href=\"https://example.com/?q=&quot;o&#39;neil&quot;\">Pat O'Neil</a></p>\n"
        );
    }

    #[test]
    fn tables_render_alignment() {
        let tree = DocumentTree {
            blocks: vec![Block::Table {
                alignments: vec![Alignment::None, Alignment::Right],
                header: vec![vec![text("a")], vec![text("b")]],
                rows: vec![vec![vec![text("1")], vec![text("2")]]],
            }],
        };
        let html = render(&tree, &RenderOptions::default()).expect("renders");
        assert_eq!(
            body(&html),
            "<table>\n<thead>\n<tr>\n<th>a</th>\n<th style=\"text-align: right\">b</th>\n</tr>\n</thead>\n\
             <tbody>\n<tr>\n<td>1</td>\n<td style=\"text-align: right\">2</td>\n</tr>\n</tbody>\n</table>\n"
        );
    }

    #[test]
    fn structural_defects_are_errors() {
        let heading = DocumentTree {
            blocks: vec![Block::Heading {
                level: 7,
                content: vec![text("deep")],
            }],
        };
        assert_eq!(
            render(&heading, &RenderOptions::default()).unwrap_err(),
            RenderError::InvalidHeadingLevel { level: 7 }
        );

        let ragged = DocumentTree {
            blocks: vec![Block::Table {
                alignments: vec![Alignment::None; 2],
                header: vec![vec![text("a")], vec![text("b")]],
                rows: vec![vec![vec![text("1")]]],
            }],
        };
        assert_eq!(
            render(&ragged, &RenderOptions::default()).unwrap_err(),
            RenderError::RaggedTable {
                row: 1,
                expected: 2,
                found: 1
            }
        );

        let link = DocumentTree {
            blocks: vec![Block::Paragraph(vec![Inline::Link {
                url: " ".to_string(),
                content: vec![text("nowhere")],
            }])],
        };
        assert_eq!(
            render(&link, &RenderOptions::default()).unwrap_err(),
            RenderError::EmptyLink {
                text: "nowhere".to_string()
            }
        );
    }

    #[test]
    fn closing_tags_in_stylesheets_are_neutralised() {
        let options = RenderOptions {
            stylesheet: Some("/* </style><script> */".to_string()),
            ..RenderOptions::default()
        };
        let html = render(&DocumentTree::default(), &options).expect("renders");
        assert_eq!(html.as_str().matches("</style>").count(), 1);
    }
}
