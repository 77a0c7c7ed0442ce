//! Recursive-descent parser for Jam: statements, then comparison, addition and primary tiers.

use tracing::debug;

use crate::ast::{BinaryOp, Expr, FunctionDecl, Param, Stmt};
use crate::error::{CompileError, Result};
use crate::lexer::{self, Token, TokenKind};

/// Type assumed for a declaration without an annotation.
pub const DEFAULT_DECL_TYPE: &str = "u8";

/// Cursor over a token stream terminated by `Eof`.
pub struct Parser<'a> {
    tokens: Vec<Token<'a>>,
    current: usize,
}

impl<'a> Parser<'a> {
    pub fn new(mut tokens: Vec<Token<'a>>) -> Self {
        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            let line = tokens.last().map_or(1, |t| t.line);
            tokens.push(Token { kind: TokenKind::Eof, lexeme: "", line });
        }
        Self { tokens, current: 0 }
    }

    /// Parse every function in the stream. Stops at the first structural error.
    pub fn parse(&mut self) -> Result<Vec<FunctionDecl>> {
        let mut functions = Vec::new();
        while !self.is_at_end() {
            let function = self.function()?;
            debug!(function = %function.name, statements = function.body.len(), "parsed function");
            functions.push(function);
        }
        Ok(functions)
    }

    fn function(&mut self) -> Result<FunctionDecl> {
        self.consume(TokenKind::Fn, "Expected 'fn' keyword")?;
        let name = self.consume(TokenKind::Identifier, "Expected function name")?.lexeme.to_string();
        self.consume(TokenKind::OpenParen, "Expected '(' after function name")?;

        let mut params = Vec::new();
        if !self.check(TokenKind::CloseParen) {
            loop {
                let name = self.consume(TokenKind::Identifier, "Expected parameter name")?.lexeme.to_string();
                self.consume(TokenKind::Colon, "Expected ':' after parameter name")?;
                let ty = self.type_name("Expected parameter type")?;
                params.push(Param { name, ty });
                if !self.matches(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::CloseParen, "Expected ')' after parameters")?;

        let return_type = if self.matches(TokenKind::Arrow) {
            Some(self.type_name("Expected return type")?)
        } else {
            None
        };

        self.consume(TokenKind::OpenBrace, "Expected '{' before function body")?;
        let body = self.block_body("Expected '}' after function body")?;

        Ok(FunctionDecl { name, params, return_type, body })
    }

    /// `[]`-prefixed slice markers followed by a base type name, e.g. `[][]u8`.
    fn type_name(&mut self, message: &str) -> Result<String> {
        if self.matches(TokenKind::OpenBracket) {
            self.consume(TokenKind::CloseBracket, "Expected ']' in slice type")?;
            let inner = self.type_name(message)?;
            return Ok(format!("[]{inner}"));
        }
        Ok(self.consume(TokenKind::Type, message)?.lexeme.to_string())
    }

    /// Statements up to and including the closing brace.
    fn block_body(&mut self, message: &str) -> Result<Vec<Stmt>> {
        let mut body = Vec::new();
        while !self.check(TokenKind::CloseBrace) && !self.is_at_end() {
            body.push(self.statement()?);
        }
        self.consume(TokenKind::CloseBrace, message)?;
        Ok(body)
    }

    fn block(&mut self, construct: &str) -> Result<Vec<Stmt>> {
        self.consume(TokenKind::OpenBrace, &format!("Expected '{{' to open {construct} body"))?;
        self.block_body(&format!("Expected '}}' to close {construct} body"))
    }

    fn statement(&mut self) -> Result<Stmt> {
        match self.peek().kind {
            TokenKind::Return => {
                self.advance();
                if self.matches(TokenKind::Semi) {
                    return Ok(Stmt::Return(None));
                }
                let value = self.expression()?;
                self.consume(TokenKind::Semi, "Expected ';' after return statement")?;
                Ok(Stmt::Return(Some(value)))
            }
            TokenKind::Const | TokenKind::Var => self.declaration(),
            TokenKind::If => {
                self.advance();
                self.if_statement()
            }
            TokenKind::While => {
                self.advance();
                let cond = self.expression()?;
                let body = self.block("while")?;
                Ok(Stmt::While { cond, body })
            }
            TokenKind::For => {
                self.advance();
                self.for_statement()
            }
            TokenKind::Break => {
                self.advance();
                self.consume(TokenKind::Semi, "Expected ';' after 'break'")?;
                Ok(Stmt::Break)
            }
            TokenKind::Continue => {
                self.advance();
                self.consume(TokenKind::Semi, "Expected ';' after 'continue'")?;
                Ok(Stmt::Continue)
            }
            TokenKind::Identifier => {
                let checkpoint = self.current;
                self.advance();
                if self.check(TokenKind::OpenParen) {
                    self.current = checkpoint;
                    let call = self.primary()?;
                    self.consume(TokenKind::Semi, "Expected ';' after function call")?;
                    return Ok(Stmt::Expr(call));
                }
                self.current = checkpoint;
                self.expression_statement()
            }
            _ => self.expression_statement(),
        }
    }

    fn expression_statement(&mut self) -> Result<Stmt> {
        let expr = self.expression()?;
        self.matches(TokenKind::Semi);
        Ok(Stmt::Expr(expr))
    }

    fn declaration(&mut self) -> Result<Stmt> {
        let is_const = self.advance().kind == TokenKind::Const;
        let name = self.consume(TokenKind::Identifier, "Expected variable name")?.lexeme.to_string();
        let ty = if self.matches(TokenKind::Colon) {
            self.type_name("Expected variable type")?
        } else {
            DEFAULT_DECL_TYPE.to_string()
        };
        let init = if self.matches(TokenKind::Equal) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenKind::Semi, "Expected ';' after variable declaration")?;
        Ok(Stmt::VarDecl { name, ty, is_const, init })
    }

    fn if_statement(&mut self) -> Result<Stmt> {
        let cond = self.expression()?;
        let then_body = self.block("if")?;
        let else_body = if self.matches(TokenKind::Else) {
            if self.matches(TokenKind::If) {
                vec![self.if_statement()?]
            } else {
                self.block("else")?
            }
        } else {
            Vec::new()
        };
        Ok(Stmt::If { cond, then_body, else_body })
    }

    fn for_statement(&mut self) -> Result<Stmt> {
        let var = self.consume(TokenKind::Identifier, "Expected loop variable name after 'for'")?.lexeme.to_string();
        self.consume(TokenKind::In, "Expected 'in' after loop variable")?;
        let start = self.expression()?;
        self.consume(TokenKind::Colon, "Expected ':' between range bounds")?;
        let end = self.expression()?;
        let body = self.block("for")?;
        Ok(Stmt::For { var, start, end, body })
    }

    pub fn expression(&mut self) -> Result<Expr> {
        self.comparison()
    }

    // Single non-associative level: `a < b < c` is rejected by the caller.
    fn comparison(&mut self) -> Result<Expr> {
        let lhs = self.addition()?;
        let kind = self.peek().kind;
        if !matches!(
            kind,
            TokenKind::EqualEqual
                | TokenKind::NotEqual
                | TokenKind::Less
                | TokenKind::LessEqual
                | TokenKind::Greater
                | TokenKind::GreaterEqual
        ) {
            return Ok(lhs);
        }
        self.advance();
        let op = BinaryOp::try_from(kind)?;
        let rhs = self.addition()?;
        Ok(Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) })
    }

    // One `+` at most; sums do not chain.
    fn addition(&mut self) -> Result<Expr> {
        let lhs = self.primary()?;
        if !self.matches(TokenKind::Plus) {
            return Ok(lhs);
        }
        let rhs = self.primary()?;
        Ok(Expr::Binary { op: BinaryOp::Add, lhs: Box::new(lhs), rhs: Box::new(rhs) })
    }

    fn primary(&mut self) -> Result<Expr> {
        let token = self.advance();
        match token.kind {
            TokenKind::Number => token
                .lexeme
                .parse::<i64>()
                .map(Expr::Number)
                .map_err(|_| self.error_at(token, &format!("Invalid number literal '{}'", token.lexeme))),
            TokenKind::True => Ok(Expr::Bool(true)),
            TokenKind::False => Ok(Expr::Bool(false)),
            TokenKind::String => Ok(Expr::Str(token.lexeme.to_string())),
            TokenKind::OpenParen => {
                let inner = self.expression()?;
                self.consume(TokenKind::CloseParen, "Expected ')' after expression")?;
                Ok(inner)
            }
            TokenKind::Identifier => {
                let name = token.lexeme.to_string();
                if !self.matches(TokenKind::OpenParen) {
                    return Ok(Expr::Variable(name));
                }
                let mut args = Vec::new();
                if !self.check(TokenKind::CloseParen) {
                    loop {
                        args.push(self.expression()?);
                        if !self.matches(TokenKind::Comma) {
                            break;
                        }
                    }
                }
                self.consume(TokenKind::CloseParen, "Expected ')' after function arguments")?;
                Ok(Expr::Call { callee: name, args })
            }
            _ => Err(self.error_at(token, "Expected expression")),
        }
    }

    fn peek(&self) -> Token<'a> {
        self.tokens[self.current]
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn advance(&mut self) -> Token<'a> {
        let token = self.peek();
        if !self.is_at_end() {
            self.current += 1;
        }
        token
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn matches(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume(&mut self, kind: TokenKind, message: &str) -> Result<Token<'a>> {
        if self.check(kind) {
            return Ok(self.advance());
        }
        Err(self.error_at(self.peek(), message))
    }

    fn error_at(&self, token: Token<'_>, message: &str) -> CompileError {
        let found = if token.kind == TokenKind::Eof {
            "end of input".to_string()
        } else {
            format!("'{}'", token.lexeme)
        };
        CompileError::Parse {
            line: token.line,
            message: format!("{message}, found {found}"),
        }
    }
}

/// Parse an already-scanned token stream.
pub fn parse(tokens: Vec<Token<'_>>) -> Result<Vec<FunctionDecl>> {
    Parser::new(tokens).parse()
}

/// Scan and parse Jam source in one step.
pub fn parse_source(src: &str) -> Result<Vec<FunctionDecl>> {
    parse(lexer::scan(src)?)
}
