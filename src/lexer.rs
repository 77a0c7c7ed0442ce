//! Hand-rolled scanner turning Jam source into a flat token stream.

use std::fmt;

use tracing::warn;

use crate::error::{CompileError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Eof,
    Fn,
    Identifier,
    Type,
    Number,
    String,
    Colon,
    Arrow,
    OpenBrace,
    CloseBrace,
    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,
    Comma,
    Semi,
    Plus,
    Minus,
    Equal,
    EqualEqual,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Return,
    Const,
    Var,
    If,
    Else,
    While,
    For,
    In,
    Break,
    Continue,
    True,
    False,
}

/// A single lexeme. For string literals the lexeme is the raw text between the quotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub lexeme: &'a str,
    pub line: usize,
}

/// Non-fatal report about a character the lexer skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexDiagnostic {
    pub line: usize,
    pub ch: char,
}

impl fmt::Display for LexDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unexpected character at line {}: {}", self.line, self.ch)
    }
}

fn keyword(text: &str) -> Option<TokenKind> {
    Some(match text {
        "fn" => TokenKind::Fn,
        "return" => TokenKind::Return,
        "const" => TokenKind::Const,
        "var" => TokenKind::Var,
        "if" => TokenKind::If,
        "else" => TokenKind::Else,
        "while" => TokenKind::While,
        "for" => TokenKind::For,
        "in" => TokenKind::In,
        "break" => TokenKind::Break,
        "continue" => TokenKind::Continue,
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        "u8" | "u16" | "u32" | "i8" | "i16" | "i32" | "bool" | "str" => TokenKind::Type,
        _ => return None,
    })
}

pub struct Lexer<'a> {
    src: &'a str,
    start: usize,
    pos: usize,
    line: usize,
    tokens: Vec<Token<'a>>,
    diagnostics: Vec<LexDiagnostic>,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            start: 0,
            pos: 0,
            line: 1,
            tokens: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Characters skipped while scanning, in source order.
    pub fn diagnostics(&self) -> &[LexDiagnostic] {
        &self.diagnostics
    }

    /// Scan the whole source. The result always ends with an `Eof` token.
    pub fn scan_tokens(&mut self) -> Result<Vec<Token<'a>>> {
        self.tokens.clear();
        self.diagnostics.clear();
        loop {
            self.skip_trivia();
            self.start = self.pos;
            let Some(c) = self.advance() else { break };
            self.scan_token(c)?;
        }
        self.tokens.push(Token { kind: TokenKind::Eof, lexeme: "", line: self.line });
        Ok(std::mem::take(&mut self.tokens))
    }

    fn scan_token(&mut self, c: char) -> Result<()> {
        match c {
            '(' => self.push(TokenKind::OpenParen),
            ')' => self.push(TokenKind::CloseParen),
            '{' => self.push(TokenKind::OpenBrace),
            '}' => self.push(TokenKind::CloseBrace),
            '[' => self.push(TokenKind::OpenBracket),
            ']' => self.push(TokenKind::CloseBracket),
            ',' => self.push(TokenKind::Comma),
            ';' => self.push(TokenKind::Semi),
            ':' => self.push(TokenKind::Colon),
            '+' => self.push(TokenKind::Plus),
            '-' => {
                if self.eat('>') {
                    self.push(TokenKind::Arrow)
                } else if self.peek().is_some_and(|n| n.is_ascii_digit()) {
                    // `-` directly before a digit always starts a negative literal
                    self.number()?
                } else {
                    self.push(TokenKind::Minus)
                }
            }
            '=' => {
                let kind = if self.eat('=') { TokenKind::EqualEqual } else { TokenKind::Equal };
                self.push(kind)
            }
            '<' => {
                let kind = if self.eat('=') { TokenKind::LessEqual } else { TokenKind::Less };
                self.push(kind)
            }
            '>' => {
                let kind = if self.eat('=') { TokenKind::GreaterEqual } else { TokenKind::Greater };
                self.push(kind)
            }
            '!' if self.eat('=') => self.push(TokenKind::NotEqual),
            '"' => self.string()?,
            c if c.is_ascii_digit() => self.number()?,
            c if c.is_ascii_alphabetic() || c == '_' => self.identifier(),
            other => {
                let diagnostic = LexDiagnostic { line: self.line, ch: other };
                warn!(line = self.line, "{diagnostic}");
                self.diagnostics.push(diagnostic);
            }
        }
        Ok(())
    }

    fn skip_trivia(&mut self) {
        while let Some(c) = self.peek() {
            match c {
                ' ' | '\t' | '\r' => {
                    self.advance();
                }
                '\n' => {
                    self.line += 1;
                    self.advance();
                }
                '/' if self.peek_next() == Some('/') => {
                    while self.peek().is_some_and(|c| c != '\n') {
                        self.advance();
                    }
                }
                _ => return,
            }
        }
    }

    fn identifier(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_alphanumeric() || c == '_') {
            self.advance();
        }
        let text = &self.src[self.start..self.pos];
        self.push(keyword(text).unwrap_or(TokenKind::Identifier));
    }

    fn number(&mut self) -> Result<()> {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
        let text = &self.src[self.start..self.pos];
        if text.parse::<i64>().is_err() {
            return Err(CompileError::Lex {
                line: self.line,
                message: format!("number literal `{text}` does not fit in 64 bits"),
            });
        }
        self.push(TokenKind::Number);
        Ok(())
    }

    fn string(&mut self) -> Result<()> {
        let opened_on = self.line;
        loop {
            match self.advance() {
                Some('"') => break,
                Some('\n') => self.line += 1,
                Some(_) => {}
                None => {
                    return Err(CompileError::Lex {
                        line: opened_on,
                        message: "unterminated string".into(),
                    })
                }
            }
        }
        let text = &self.src[self.start + 1..self.pos - 1];
        self.tokens.push(Token { kind: TokenKind::String, lexeme: text, line: opened_on });
        Ok(())
    }

    fn push(&mut self, kind: TokenKind) {
        let lexeme = &self.src[self.start..self.pos];
        self.tokens.push(Token { kind, lexeme, line: self.line });
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_next(&self) -> Option<char> {
        let mut it = self.src[self.pos..].chars();
        it.next();
        it.next()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }
}

/// Tokenize `src`, logging (but otherwise ignoring) unrecognized characters.
pub fn scan(src: &str) -> Result<Vec<Token<'_>>> {
    Lexer::new(src).scan_tokens()
}
