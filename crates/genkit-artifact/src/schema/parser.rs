//! Recursive descent parser for proto3 documents

use super::lexer::{tokenize, Token, TokenKind};
use super::{Block, Element, Item, Message, Rpc, SchemaDocument, Service, ServiceItem, Statement};
use crate::error::ParseError;

/// proto3 parser
///
/// Only the top level and service bodies are parsed into typed elements.
/// Message bodies, enums and options are kept as token statements and
/// nested blocks.
#[derive(Debug, Default, Clone, Copy)]
pub struct SchemaParser;

impl SchemaParser {
    /// Create a parser
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Parse proto3 text into a document
    ///
    /// # Errors
    /// Returns `SyntaxError` with the offending token position, or
    /// `UnexpectedEof` when a declaration is left open.
    pub fn parse(&self, text: &str) -> Result<SchemaDocument, ParseError> {
        let mut cursor = Cursor::new(tokenize(text)?);
        let mut doc = SchemaDocument::new();

        loop {
            let comments = cursor.leading_comments();
            let Some(token) = cursor.peek().cloned() else {
                if !comments.is_empty() {
                    doc.push(Element::Comment(comments));
                }
                break;
            };

            if token.is_punct(';') {
                cursor.bump();
                continue;
            }
            if token.is_word("syntax") {
                cursor.bump();
                cursor.expect_punct('=')?;
                let value = cursor.expect_str("syntax version")?;
                cursor.expect_punct(';')?;
                doc.push(Element::Syntax { comments, value });
            } else if token.is_word("package") {
                cursor.bump();
                let name = cursor.expect_word("package name")?;
                cursor.expect_punct(';')?;
                doc.push(Element::Package { comments, name });
            } else if token.is_word("import") {
                cursor.bump();
                let modifier = match cursor.peek() {
                    Some(t) if t.is_word("public") || t.is_word("weak") => {
                        cursor.bump().map(|t| t.text)
                    }
                    _ => None,
                };
                let path = cursor.expect_str("import path")?;
                cursor.expect_punct(';')?;
                doc.push(Element::Import {
                    comments,
                    modifier,
                    path,
                });
            } else if token.is_word("service") {
                doc.push(Element::Service(parse_service(&mut cursor, comments)?));
            } else {
                match parse_item(&mut cursor, comments)? {
                    Item::Statement(stmt) if stmt.tokens.first().is_some_and(|t| t == "option") => {
                        doc.push(Element::Option(stmt));
                    }
                    Item::Block(block) => push_top_level_block(&mut doc, block),
                    _ => {
                        return Err(ParseError::syntax(
                            token.line,
                            token.column,
                            format!("unexpected top-level `{}`", token.text),
                        ))
                    }
                }
            }
        }

        Ok(doc)
    }
}

fn push_top_level_block(doc: &mut SchemaDocument, block: Block) {
    let is_message = block.header.len() == 2 && block.header[0] == "message";
    if !is_message {
        doc.push(Element::Other(block));
        return;
    }
    let Block {
        comments,
        mut header,
        items,
        inline,
    } = block;
    doc.push(Element::Message(Message {
        comments,
        name: header.swap_remove(1),
        items,
    }));
    if let Some(inline) = inline {
        doc.push(Element::Comment(vec![inline]));
    }
}

fn parse_service(cursor: &mut Cursor, comments: Vec<String>) -> Result<Service, ParseError> {
    cursor.bump();
    let mut service = Service::new(cursor.expect_word("service name")?);
    service.comments = comments;
    cursor.expect_punct('{')?;

    loop {
        let comments = cursor.leading_comments();
        match cursor.peek() {
            None => return Err(ParseError::UnexpectedEof(format!("service {}", service.name))),
            Some(t) if t.is_punct('}') => {
                cursor.bump();
                if !comments.is_empty() {
                    service.items.push(ServiceItem::Other(Item::Comment(comments)));
                }
                break;
            }
            Some(t) if t.is_punct(';') => {
                cursor.bump();
            }
            Some(t) if t.is_word("rpc") => {
                let rpc = parse_rpc(cursor, comments)?;
                service.items.push(ServiceItem::Rpc(rpc));
            }
            Some(_) => {
                let item = parse_item(cursor, comments)?;
                service.items.push(ServiceItem::Other(item));
            }
        }
    }
    Ok(service)
}

fn parse_rpc(cursor: &mut Cursor, comments: Vec<String>) -> Result<Rpc, ParseError> {
    cursor.bump();
    let name = cursor.expect_word("rpc name")?;
    let (request, request_stream) = parse_rpc_type(cursor)?;
    cursor.expect_keyword("returns")?;
    let (response, response_stream) = parse_rpc_type(cursor)?;

    let body = match cursor.peek() {
        Some(t) if t.is_punct('{') => {
            cursor.bump();
            let items = parse_body(cursor, &name)?;
            if cursor.peek().is_some_and(|t| t.is_punct(';')) {
                cursor.bump();
            }
            Some(items)
        }
        _ => {
            cursor.expect_punct(';')?;
            None
        }
    };

    Ok(Rpc {
        comments,
        name,
        request,
        request_stream,
        response,
        response_stream,
        body,
        inline: cursor.inline_comment(),
    })
}

fn parse_rpc_type(cursor: &mut Cursor) -> Result<(String, bool), ParseError> {
    cursor.expect_punct('(')?;
    let mut stream = false;
    let mut ty = cursor.expect_word("message type")?;
    if ty == "stream" && cursor.peek().is_some_and(|t| t.kind == TokenKind::Word) {
        stream = true;
        ty = cursor.expect_word("message type")?;
    }
    cursor.expect_punct(')')?;
    Ok((ty, stream))
}

/// Parse items until the closing `}` (consumed)
fn parse_body(cursor: &mut Cursor, owner: &str) -> Result<Vec<Item>, ParseError> {
    let mut items = Vec::new();
    loop {
        let comments = cursor.leading_comments();
        match cursor.peek() {
            None => return Err(ParseError::UnexpectedEof(owner.to_string())),
            Some(t) if t.is_punct('}') => {
                cursor.bump();
                if !comments.is_empty() {
                    items.push(Item::Comment(comments));
                }
                return Ok(items);
            }
            Some(t) if t.is_punct(';') => {
                cursor.bump();
            }
            Some(_) => items.push(parse_item(cursor, comments)?),
        }
    }
}

/// Parse a statement or a block
///
/// Braces inside `[...]` field options or after `option` belong to an
/// aggregate value, not to a nested block.
fn parse_item(cursor: &mut Cursor, comments: Vec<String>) -> Result<Item, ParseError> {
    let is_option = cursor.peek().is_some_and(|t| t.is_word("option"));
    let mut tokens: Vec<String> = Vec::new();
    let mut inline: Option<String> = None;
    let (mut brackets, mut braces) = (0usize, 0usize);

    loop {
        let Some(token) = cursor.bump() else {
            let what = tokens.first().cloned().unwrap_or_else(|| "statement".into());
            return Err(ParseError::UnexpectedEof(what));
        };
        match token.kind {
            TokenKind::Comment => {
                inline = Some(match inline.take() {
                    Some(prev) => format!("{prev} {}", token.text.trim_end()),
                    None => token.text.trim_end().to_string(),
                });
                continue;
            }
            TokenKind::Punct => {}
            TokenKind::Word | TokenKind::Str => {
                tokens.push(token.text);
                continue;
            }
        }

        match token.text.as_str() {
            ";" if brackets == 0 && braces == 0 => {
                if tokens.is_empty() {
                    return Err(ParseError::syntax(token.line, token.column, "empty statement"));
                }
                let inline = inline.or_else(|| cursor.inline_comment());
                return Ok(Item::Statement(Statement {
                    comments,
                    tokens,
                    inline,
                }));
            }
            "{" if brackets == 0 && braces == 0 && !is_option => {
                if tokens.is_empty() {
                    return Err(ParseError::syntax(token.line, token.column, "block without a header"));
                }
                let items = parse_body(cursor, &tokens.join(" "))?;
                let inline = inline.or_else(|| cursor.inline_comment());
                return Ok(Item::Block(Block {
                    comments,
                    header: tokens,
                    items,
                    inline,
                }));
            }
            "[" => brackets += 1,
            "]" => {
                brackets = brackets
                    .checked_sub(1)
                    .ok_or_else(|| ParseError::syntax(token.line, token.column, "unbalanced `]`"))?;
            }
            "{" => braces += 1,
            "}" => {
                braces = braces
                    .checked_sub(1)
                    .ok_or_else(|| ParseError::syntax(token.line, token.column, "unexpected `}`"))?;
            }
            _ => {}
        }
        tokens.push(token.text);
    }
}

struct Cursor {
    tokens: Vec<Token>,
    pos: usize,
    last_line: usize,
}

impl Cursor {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            last_line: 0,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned()?;
        self.pos += 1;
        self.last_line = token.line;
        Some(token)
    }

    fn leading_comments(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        while let Some(token) = self.peek() {
            if token.kind != TokenKind::Comment {
                break;
            }
            lines.push(token.text.trim_end().to_string());
            self.pos += 1;
        }
        lines
    }

    /// Comment on the same line as the last consumed token
    fn inline_comment(&mut self) -> Option<String> {
        let token = self.peek()?;
        if token.kind == TokenKind::Comment && token.line == self.last_line {
            let text = token.text.trim_end().to_string();
            self.pos += 1;
            Some(text)
        } else {
            None
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        match self.peek() {
            Some(t) => ParseError::syntax(t.line, t.column, format!("expected {expected}, found `{}`", t.text)),
            None => ParseError::UnexpectedEof(expected.to_string()),
        }
    }

    fn expect_punct(&mut self, c: char) -> Result<(), ParseError> {
        if self.peek().is_some_and(|t| t.is_punct(c)) {
            self.bump();
            Ok(())
        } else {
            Err(self.unexpected(&format!("`{c}`")))
        }
    }

    fn expect_keyword(&mut self, word: &str) -> Result<(), ParseError> {
        if self.peek().is_some_and(|t| t.is_word(word)) {
            self.bump();
            Ok(())
        } else {
            Err(self.unexpected(&format!("`{word}`")))
        }
    }

    fn expect_word(&mut self, what: &str) -> Result<String, ParseError> {
        match self.peek() {
            Some(t) if t.kind == TokenKind::Word => Ok(self.bump().map(|t| t.text).unwrap_or_default()),
            _ => Err(self.unexpected(what)),
        }
    }

    fn expect_str(&mut self, what: &str) -> Result<String, ParseError> {
        match self.peek() {
            Some(t) if t.kind == TokenKind::Str => {
                let text = self.bump().map(|t| t.text).unwrap_or_default();
                Ok(text[1..text.len() - 1].to_string())
            }
            _ => Err(self.unexpected(what)),
        }
    }
}
