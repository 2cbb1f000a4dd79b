//! proto3 tokenizer

use crate::error::ParseError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TokenKind {
    /// Identifier, full name, number or keyword
    Word,
    /// Quoted string, quotes included
    Str,
    /// Single punctuation character
    Punct,
    /// `//` or `/* */` comment, markers included
    Comment,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token {
    pub(crate) kind: TokenKind,
    pub(crate) text: String,
    pub(crate) line: usize,
    pub(crate) column: usize,
}

impl Token {
    pub(crate) fn is_punct(&self, c: char) -> bool {
        self.kind == TokenKind::Punct && self.text.len() == 1 && self.text.starts_with(c)
    }

    pub(crate) fn is_word(&self, word: &str) -> bool {
        self.kind == TokenKind::Word && self.text == word
    }
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-' | '+')
}

pub(crate) fn tokenize(input: &str) -> Result<Vec<Token>, ParseError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let (mut i, mut line, mut col) = (0usize, 1usize, 1usize);

    while i < chars.len() {
        let c = chars[i];
        let (start_line, start_col) = (line, col);

        if c == '\n' {
            i += 1;
            line += 1;
            col = 1;
            continue;
        }
        if c.is_whitespace() {
            i += 1;
            col += 1;
            continue;
        }

        let start = i;
        let kind = if c == '/' && chars.get(i + 1) == Some(&'/') {
            while i < chars.len() && chars[i] != '\n' {
                i += 1;
            }
            TokenKind::Comment
        } else if c == '/' && chars.get(i + 1) == Some(&'*') {
            i += 2;
            loop {
                match chars.get(i) {
                    None => return Err(ParseError::UnexpectedEof("block comment".into())),
                    Some('*') if chars.get(i + 1) == Some(&'/') => {
                        i += 2;
                        break;
                    }
                    Some('\n') => {
                        line += 1;
                        i += 1;
                    }
                    Some(_) => i += 1,
                }
            }
            TokenKind::Comment
        } else if c == '"' || c == '\'' {
            i += 1;
            loop {
                match chars.get(i) {
                    None | Some('\n') => {
                        return Err(ParseError::syntax(start_line, start_col, "unterminated string"))
                    }
                    Some('\\') => i += 2,
                    Some(q) if *q == c => {
                        i += 1;
                        break;
                    }
                    Some(_) => i += 1,
                }
            }
            TokenKind::Str
        } else if is_word_char(c) {
            while i < chars.len() && is_word_char(chars[i]) {
                i += 1;
            }
            TokenKind::Word
        } else if "{}()[]<>;=,:".contains(c) {
            i += 1;
            TokenKind::Punct
        } else {
            return Err(ParseError::syntax(
                start_line,
                start_col,
                format!("unexpected character `{c}`"),
            ));
        };

        let text: String = chars[start..i].iter().collect();
        if kind != TokenKind::Comment || !text.contains('\n') {
            col += i - start;
        } else {
            col = 1 + text.rsplit('\n').next().map_or(0, |tail| tail.chars().count());
        }
        tokens.push(Token {
            kind,
            text,
            line: start_line,
            column: start_col,
        });
    }

    Ok(tokens)
}
