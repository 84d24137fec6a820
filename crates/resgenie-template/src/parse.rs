use tracing::debug;

use crate::error::TemplateError;
use crate::placeholder::{Collection, Placeholder, Scope};
use crate::tree;

/// A parsed, validated template. Parsing checks every placeholder against the
/// closed key set and its scope, block balance, and the static Markdown for
/// unsupported constructs, so binding a valid template cannot fail on syntax.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    name: String,
    nodes: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Node {
    Text(String),
    Value(Placeholder),
    Each {
        collection: Collection,
        body: Vec<Node>,
    },
    When {
        condition: Condition,
        body: Vec<Node>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Condition {
    Present(Placeholder),
    NonEmpty(Collection),
}

impl Template {
    pub fn parse(name: impl Into<String>, source: &str) -> Result<Self, TemplateError> {
        let name = name.into();
        let mut parser = TemplateParser::default();

        for (idx, line) in source.split_inclusive('\n').enumerate() {
            parser.line(idx + 1, line)?;
        }
        let nodes = parser.finish()?;

        debug!(template = %name, nodes = nodes.len(), "parsed template");
        Ok(Template { name, nodes })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn nodes(&self) -> &[Node] {
        &self.nodes
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagKind {
    Value,
    Open,
    Presence,
    Close,
}

#[derive(Debug)]
enum Token<'s> {
    Text(&'s str),
    Tag { kind: TagKind, key: &'s str },
}

fn tokenize(line: &str, number: usize) -> Result<Vec<Token<'_>>, TemplateError> {
    let mut tokens = Vec::new();
    let mut rest = line;

    while let Some(start) = rest.find("{{") {
        if start > 0 {
            tokens.push(Token::Text(&rest[..start]));
        }
        let after = &rest[start + 2..];
        let end = after.find("}}").ok_or_else(|| TemplateError::UnbalancedBlock {
            line: number,
            detail: "'{{' is never closed with '}}'".to_string(),
        })?;

        let inner = after[..end].trim();
        let (kind, key) = match inner.chars().next() {
            Some('#') => (TagKind::Open, inner[1..].trim()),
            Some('?') => (TagKind::Presence, inner[1..].trim()),
            Some('/') => (TagKind::Close, inner[1..].trim()),
            _ => (TagKind::Value, inner),
        };
        tokens.push(Token::Tag { kind, key });
        rest = &after[end + 2..];
    }

    if !rest.is_empty() {
        tokens.push(Token::Text(rest));
    }
    Ok(tokens)
}

/// A block tag with only whitespace around it on its line.
fn standalone_tag<'t, 's>(tokens: &'t [Token<'s>]) -> Option<(TagKind, &'s str)> {
    let mut found = None;
    for token in tokens {
        match token {
            Token::Text(text) if text.trim().is_empty() => {}
            Token::Tag { kind, key } if *kind != TagKind::Value && found.is_none() => {
                found = Some((*kind, *key));
            }
            _ => return None,
        }
    }
    found
}

struct OpenBlock {
    key: String,
    tag: String,
    line: usize,
    kind: Option<BlockKind>,
    nodes: Vec<Node>,
}

#[derive(Clone, Copy)]
enum BlockKind {
    Each(Collection),
    When(Condition),
}

impl BlockKind {
    fn opens(self) -> Option<Scope> {
        match self {
            BlockKind::Each(collection) => Some(collection.opens()),
            BlockKind::When(_) => None,
        }
    }
}

struct TemplateParser {
    stack: Vec<OpenBlock>,
    /// Template with placeholders replaced by a neutral word and standalone
    /// tag lines dropped; checked for unsupported Markdown at the end.
    skeleton: String,
    skeleton_lines: Vec<usize>,
}

impl Default for TemplateParser {
    fn default() -> Self {
        TemplateParser {
            stack: vec![OpenBlock {
                key: String::new(),
                tag: String::new(),
                line: 0,
                kind: None,
                nodes: Vec::new(),
            }],
            skeleton: String::new(),
            skeleton_lines: Vec::new(),
        }
    }
}

impl TemplateParser {
    fn line(&mut self, number: usize, line: &str) -> Result<(), TemplateError> {
        let tokens = tokenize(line, number)?;

        if let Some((kind, key)) = standalone_tag(&tokens) {
            return self.block_tag(kind, key, number);
        }

        for token in tokens {
            match token {
                Token::Text(text) => {
                    self.push_text(text);
                    self.skeleton.push_str(text);
                }
                Token::Tag {
                    kind: TagKind::Value,
                    key,
                } => {
                    let placeholder = self.placeholder(key, number)?;
                    self.current().push(Node::Value(placeholder));
                    self.skeleton.push('x');
                }
                Token::Tag { kind, key } => self.block_tag(kind, key, number)?,
            }
        }
        self.skeleton_lines.push(number);
        Ok(())
    }

    fn finish(mut self) -> Result<Vec<Node>, TemplateError> {
        if self.stack.len() > 1 {
            let open = &self.stack[self.stack.len() - 1];
            return Err(TemplateError::UnbalancedBlock {
                line: open.line,
                detail: format!("'{}' is never closed", open.tag),
            });
        }

        if let Err(unsupported) = tree::build(&self.skeleton) {
            let line = self
                .skeleton_lines
                .get(unsupported.line.saturating_sub(1))
                .copied()
                .unwrap_or(unsupported.line);
            return Err(TemplateError::UnsupportedMarkup {
                line,
                construct: unsupported.construct,
            });
        }

        let root = self.stack.pop().map(|block| block.nodes).unwrap_or_default();
        Ok(root)
    }

    fn current(&mut self) -> &mut Vec<Node> {
        let last = self.stack.len() - 1;
        &mut self.stack[last].nodes
    }

    fn push_text(&mut self, text: &str) {
        let nodes = self.current();
        if let Some(Node::Text(previous)) = nodes.last_mut() {
            previous.push_str(text);
        } else {
            nodes.push(Node::Text(text.to_string()));
        }
    }

    fn in_scope(&self, scope: Scope) -> bool {
        scope == Scope::Root
            || self
                .stack
                .iter()
                .any(|block| block.kind.and_then(BlockKind::opens) == Some(scope))
    }

    fn require_scope(&self, key: &str, scope: Scope, line: usize) -> Result<(), TemplateError> {
        if self.in_scope(scope) {
            Ok(())
        } else {
            Err(TemplateError::OutOfScope {
                line,
                key: key.to_string(),
                scope: scope.opened_by(),
            })
        }
    }

    fn placeholder(&self, key: &str, line: usize) -> Result<Placeholder, TemplateError> {
        let placeholder =
            Placeholder::from_key(key).ok_or_else(|| TemplateError::UnknownPlaceholder {
                line,
                key: key.to_string(),
            })?;
        self.require_scope(key, placeholder.scope(), line)?;
        Ok(placeholder)
    }

    fn block_tag(&mut self, kind: TagKind, key: &str, line: usize) -> Result<(), TemplateError> {
        match kind {
            TagKind::Value => {
                let placeholder = self.placeholder(key, line)?;
                self.current().push(Node::Value(placeholder));
                Ok(())
            }
            TagKind::Open | TagKind::Presence => {
                let sigil = if kind == TagKind::Open { '#' } else { '?' };
                let block = self.block_kind(kind, key, sigil, line)?;
                self.stack.push(OpenBlock {
                    key: key.to_string(),
                    tag: format!("{{{{{sigil}{key}}}}}"),
                    line,
                    kind: Some(block),
                    nodes: Vec::new(),
                });
                Ok(())
            }
            TagKind::Close => self.close(key, line),
        }
    }

    fn block_kind(
        &self,
        kind: TagKind,
        key: &str,
        sigil: char,
        line: usize,
    ) -> Result<BlockKind, TemplateError> {
        if let Some(collection) = Collection::from_key(key) {
            self.require_scope(key, collection.requires(), line)?;
            return Ok(match kind {
                TagKind::Open => BlockKind::Each(collection),
                _ => BlockKind::When(Condition::NonEmpty(collection)),
            });
        }

        match Placeholder::from_key(key) {
            Some(placeholder) if placeholder.is_optional() => {
                self.require_scope(key, placeholder.scope(), line)?;
                Ok(BlockKind::When(Condition::Present(placeholder)))
            }
            _ => Err(TemplateError::UnknownPlaceholder {
                line,
                key: format!("{sigil}{key}"),
            }),
        }
    }

    fn close(&mut self, key: &str, line: usize) -> Result<(), TemplateError> {
        if self.stack.len() == 1 {
            return Err(TemplateError::UnbalancedBlock {
                line,
                detail: format!("'{{{{/{key}}}}}' has no matching opening tag"),
            });
        }

        let open = &self.stack[self.stack.len() - 1];
        if open.key != key {
            return Err(TemplateError::UnbalancedBlock {
                line,
                detail: format!(
                    "'{{{{/{key}}}}}' closes '{}' opened on line {}",
                    open.tag, open.line
                ),
            });
        }

        let Some(block) = self.stack.pop() else {
            return Ok(());
        };
        let node = match block.kind {
            Some(BlockKind::Each(collection)) => Node::Each {
                collection,
                body: block.nodes,
            },
            Some(BlockKind::When(condition)) => Node::When {
                condition,
                body: block.nodes,
            },
            None => return Ok(()),
        };
        self.current().push(node);
        Ok(())
    }
}
