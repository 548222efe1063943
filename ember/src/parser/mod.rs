//! Recursive-descent parser
//!
//! Binary operators are parsed by precedence climbing, tightest first:
//!
//! ```text
//! unary  - !
//! mul    * / %
//! add    + -
//! range  .. ..=        (non-associative)
//! cmp    == != < > <= >=
//! and    &&
//! or     ||
//! ```

use crate::ast::{
    BinOp, Binder, Block, Expr, FnLit, LiteralPattern, MatchArm, Param, Pattern, Program, Span,
    Spanned, Stmt, Type, UnOp,
};
use crate::error::{CompileError, Result};
use crate::lexer::{Lexeme, Token};
use std::rc::Rc;

#[cfg(test)]
mod tests;

/// Stack growth parameters for deeply nested source
const STACK_RED_ZONE: usize = 64 * 1024;
const STACK_GROW_SIZE: usize = 1024 * 1024;

/// Parse tokens into AST
pub fn parse(tokens: Vec<Lexeme>) -> Result<Program> {
    let mut parser = Parser::new(tokens);
    let program = parser.parse_program()?;
    if parser.saw_fn && parser.saw_fun {
        tracing::warn!("program mixes `fn` and `fun` function keywords");
    }
    tracing::debug!(statements = program.stmts.len(), "parsed program");
    Ok(program)
}

struct Parser {
    tokens: Vec<Lexeme>,
    pos: usize,
    saw_fn: bool,
    saw_fun: bool,
}

/// Statements of a block or program plus its trailing expression
type Sequence = (Vec<Spanned<Stmt>>, Option<Box<Spanned<Expr>>>);

impl Parser {
    fn new(mut tokens: Vec<Lexeme>) -> Self {
        if tokens.last().map(|l| &l.token) != Some(&Token::Eof) {
            let end = tokens.last().map_or(0, |l| l.span.end);
            let pos = tokens.last().map(|l| l.pos).unwrap_or_default();
            tokens.push(Lexeme {
                token: Token::Eof,
                span: Span::new(end, end),
                pos,
            });
        }
        Parser {
            tokens,
            pos: 0,
            saw_fn: false,
            saw_fun: false,
        }
    }

    // ---- token cursor ----

    fn peek(&self) -> &Token {
        &self.current().token
    }

    fn peek_nth(&self, n: usize) -> &Token {
        let idx = (self.pos + n).min(self.tokens.len() - 1);
        &self.tokens[idx].token
    }

    fn current(&self) -> &Lexeme {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn span(&self) -> Span {
        self.current().span
    }

    /// Span of the most recently consumed token
    fn prev_span(&self) -> Span {
        if self.pos == 0 {
            self.span()
        } else {
            self.tokens[self.pos - 1].span
        }
    }

    fn check(&self, token: &Token) -> bool {
        self.peek() == token
    }

    fn advance(&mut self) -> Lexeme {
        let lexeme = self.current().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        lexeme
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token) -> Result<Span> {
        if self.check(token) {
            Ok(self.advance().span)
        } else {
            Err(self.error(&format!("'{token}'")))
        }
    }

    fn expect_ident(&mut self) -> Result<Spanned<String>> {
        match self.peek().clone() {
            Token::Ident(name) => {
                let span = self.advance().span;
                Ok(Spanned::new(name, span))
            }
            _ => Err(self.error("identifier")),
        }
    }

    fn error(&self, expected: &str) -> CompileError {
        let found = match self.peek() {
            Token::Eof => "end of input".to_string(),
            other => format!("'{other}'"),
        };
        CompileError::parser(expected, found, self.span())
    }

    // ---- statements ----

    fn parse_program(&mut self) -> Result<Program> {
        let (stmts, tail) = self.parse_sequence(&Token::Eof)?;
        Ok(Program { stmts, tail })
    }

    fn parse_sequence(&mut self, end: &Token) -> Result<Sequence> {
        let mut stmts = Vec::new();
        let mut tail = None;

        loop {
            while self.eat(&Token::Semi) {}
            if self.check(end) {
                break;
            }
            if self.check(&Token::Eof) {
                return Err(self.error(&format!("'{end}'")));
            }

            let start = self.span();
            match self.peek() {
                Token::Let => {
                    let stmt = self.parse_let()?;
                    stmts.push(Spanned::new(stmt, start.merge(self.prev_span())));
                }
                Token::Fn | Token::Fun if matches!(self.peek_nth(1), Token::Ident(_)) => {
                    let stmt = self.parse_fn_decl()?;
                    stmts.push(Spanned::new(stmt, start.merge(self.prev_span())));
                }
                Token::For => {
                    let stmt = self.parse_for()?;
                    stmts.push(Spanned::new(stmt, start.merge(self.prev_span())));
                }
                _ => {
                    // A statement that starts block-like ends with its closing brace
                    let expr = if matches!(self.peek(), Token::If | Token::Match | Token::LBrace) {
                        self.parse_primary()?
                    } else {
                        self.parse_expr()?
                    };
                    if self.eat(&Token::Semi) {
                        let span = expr.span;
                        stmts.push(Spanned::new(Stmt::Expr(expr), span));
                    } else if self.check(end) {
                        tail = Some(Box::new(expr));
                        break;
                    } else {
                        // Newline-separated statements need no `;`
                        let span = expr.span;
                        stmts.push(Spanned::new(Stmt::Expr(expr), span));
                    }
                }
            }
        }

        Ok((stmts, tail))
    }

    fn parse_binder(&mut self) -> Result<Spanned<Binder>> {
        if self.check(&Token::Underscore) {
            let span = self.advance().span;
            return Ok(Spanned::new(Binder::Discard, span));
        }
        self.expect_ident()
            .map(|name| name.map(Binder::Name))
            .map_err(|_| self.error("identifier or '_'"))
    }

    fn parse_let(&mut self) -> Result<Stmt> {
        self.expect(&Token::Let)?;
        let name = self.parse_binder()?;
        let ty = if self.eat(&Token::Colon) {
            Some(self.parse_type()?)
        } else {
            None
        };
        self.expect(&Token::Eq)?;
        let value = self.parse_expr()?;
        Ok(Stmt::Let { name, ty, value })
    }

    fn parse_fn_decl(&mut self) -> Result<Stmt> {
        let func = self.parse_fn_lit()?;
        // parse_fn_decl is only entered when a name follows the keyword
        let name = match &func.name {
            Some(name) => Spanned::new(name.clone(), func.span),
            None => return Err(self.error("function name")),
        };
        Ok(Stmt::FnDecl {
            name,
            func: Rc::new(func),
        })
    }

    fn parse_for(&mut self) -> Result<Stmt> {
        self.expect(&Token::For)?;
        let var = self.parse_binder()?;
        self.expect(&Token::In)?;
        let iter = self.parse_expr()?;
        let body = self.parse_block()?;
        Ok(Stmt::For { var, iter, body })
    }

    fn parse_type(&mut self) -> Result<Spanned<Type>> {
        let start = self.span();
        if self.eat(&Token::LParen) {
            let end = self.expect(&Token::RParen)?;
            return Ok(Spanned::new(Type::Unit, start.merge(end)));
        }
        match self.peek().clone() {
            Token::Ident(name) => {
                self.advance();
                Ok(Spanned::new(Type::Named(name), start))
            }
            _ => Err(self.error("type")),
        }
    }

    fn parse_block(&mut self) -> Result<Block> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
            let start = self.expect(&Token::LBrace)?;
            let (stmts, tail) = self.parse_sequence(&Token::RBrace)?;
            let end = self.expect(&Token::RBrace)?;
            Ok(Block {
                stmts,
                tail,
                span: start.merge(end),
            })
        })
    }

    /// `fn name(params) -> ty { body }`, shared by declarations and literals
    fn parse_fn_lit(&mut self) -> Result<FnLit> {
        let start = self.span();
        match self.peek() {
            Token::Fn => self.saw_fn = true,
            Token::Fun => self.saw_fun = true,
            _ => return Err(self.error("'fn'")),
        }
        self.advance();

        let name = match self.peek().clone() {
            Token::Ident(name) => {
                self.advance();
                Some(name)
            }
            _ => None,
        };

        self.expect(&Token::LParen)?;
        let params = self.parse_params(&Token::RParen)?;
        self.expect(&Token::RParen)?;

        let ret_ty = if self.eat(&Token::Arrow) {
            Some(self.parse_type()?)
        } else {
            None
        };

        let body = self.parse_block()?;
        Ok(FnLit {
            name,
            params,
            ret_ty,
            span: start.merge(body.span),
            body,
        })
    }

    fn parse_params(&mut self, close: &Token) -> Result<Vec<Param>> {
        let mut params = Vec::new();
        while !self.check(close) {
            let name = self.expect_ident()?;
            let ty = if self.eat(&Token::Colon) {
                Some(self.parse_type()?)
            } else {
                None
            };
            params.push(Param { name, ty });
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        Ok(params)
    }

    // ---- expressions ----

    fn parse_expr(&mut self) -> Result<Spanned<Expr>> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || self.parse_or())
    }

    fn binary(left: Spanned<Expr>, op: BinOp, right: Spanned<Expr>) -> Spanned<Expr> {
        let span = left.span.merge(right.span);
        Spanned::new(
            Expr::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
            },
            span,
        )
    }

    fn parse_or(&mut self) -> Result<Spanned<Expr>> {
        let mut left = self.parse_and()?;
        while self.eat(&Token::PipePipe) {
            let right = self.parse_and()?;
            left = Self::binary(left, BinOp::Or, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Spanned<Expr>> {
        let mut left = self.parse_comparison()?;
        while self.eat(&Token::AmpAmp) {
            let right = self.parse_comparison()?;
            left = Self::binary(left, BinOp::And, right);
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Spanned<Expr>> {
        let mut left = self.parse_range()?;
        loop {
            let op = match self.peek() {
                Token::EqEq => BinOp::Eq,
                Token::NotEq => BinOp::Ne,
                Token::Lt => BinOp::Lt,
                Token::Gt => BinOp::Gt,
                Token::LtEq => BinOp::Le,
                Token::GtEq => BinOp::Ge,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_range()?;
            left = Self::binary(left, op, right);
        }
    }

    fn parse_range(&mut self) -> Result<Spanned<Expr>> {
        let start = self.parse_additive()?;
        let inclusive = match self.peek() {
            Token::DotDot => false,
            Token::DotDotEq => true,
            _ => return Ok(start),
        };
        self.advance();
        let end = self.parse_additive()?;
        if matches!(self.peek(), Token::DotDot | Token::DotDotEq) {
            return Err(self.error("end of range expression"));
        }
        let span = start.span.merge(end.span);
        Ok(Spanned::new(
            Expr::Range {
                start: Box::new(start),
                end: Box::new(end),
                inclusive,
            },
            span,
        ))
    }

    fn parse_additive(&mut self) -> Result<Spanned<Expr>> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Token::Plus => BinOp::Add,
                Token::Minus => BinOp::Sub,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = Self::binary(left, op, right);
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Spanned<Expr>> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Token::Star => BinOp::Mul,
                Token::Slash => BinOp::Div,
                Token::Percent => BinOp::Mod,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_unary()?;
            left = Self::binary(left, op, right);
        }
    }

    fn parse_unary(&mut self) -> Result<Spanned<Expr>> {
        let op = match self.peek() {
            Token::Minus => UnOp::Neg,
            Token::Bang => UnOp::Not,
            _ => return self.parse_postfix(),
        };
        let start = self.advance().span;
        let operand = stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || self.parse_unary())?;
        let span = start.merge(operand.span);
        Ok(Spanned::new(
            Expr::Unary {
                op,
                expr: Box::new(operand),
            },
            span,
        ))
    }

    fn parse_postfix(&mut self) -> Result<Spanned<Expr>> {
        let mut expr = self.parse_primary()?;
        while self.check(&Token::LParen) {
            self.advance();
            let mut args = Vec::new();
            while !self.check(&Token::RParen) {
                args.push(self.parse_expr()?);
                if !self.eat(&Token::Comma) {
                    break;
                }
            }
            let end = self.expect(&Token::RParen)?;
            let span = expr.span.merge(end);
            expr = Spanned::new(
                Expr::Call {
                    callee: Box::new(expr),
                    args,
                },
                span,
            );
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Spanned<Expr>> {
        let start = self.span();
        match self.peek().clone() {
            Token::IntLit(n) => {
                self.advance();
                Ok(Spanned::new(Expr::IntLit(n), start))
            }
            Token::StringLit(s) => {
                self.advance();
                Ok(Spanned::new(Expr::StringLit(s), start))
            }
            Token::True => {
                self.advance();
                Ok(Spanned::new(Expr::BoolLit(true), start))
            }
            Token::False => {
                self.advance();
                Ok(Spanned::new(Expr::BoolLit(false), start))
            }
            Token::Ident(name) => {
                self.advance();
                Ok(Spanned::new(Expr::Var(name), start))
            }
            Token::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                let end = self.expect(&Token::RParen)?;
                Ok(Spanned::new(inner.node, start.merge(end)))
            }
            Token::LBrace => {
                let block = self.parse_block()?;
                let span = block.span;
                Ok(Spanned::new(Expr::Block(block), span))
            }
            Token::If => self.parse_if(),
            Token::Match => self.parse_match(),
            Token::Fn | Token::Fun => {
                let func = self.parse_fn_lit()?;
                let span = func.span;
                Ok(Spanned::new(Expr::Fn(Rc::new(func)), span))
            }
            Token::Pipe | Token::PipePipe => self.parse_closure(),
            _ => Err(self.error("expression")),
        }
    }

    fn parse_if(&mut self) -> Result<Spanned<Expr>> {
        let start = self.expect(&Token::If)?;
        let cond = self.parse_expr()?;
        let then_branch = self.parse_block()?;
        let mut span = start.merge(then_branch.span);

        let else_branch = if self.eat(&Token::Else) {
            let branch = if self.check(&Token::If) {
                self.parse_if()?
            } else {
                let block = self.parse_block()?;
                let block_span = block.span;
                Spanned::new(Expr::Block(block), block_span)
            };
            span = span.merge(branch.span);
            Some(Box::new(branch))
        } else {
            None
        };

        Ok(Spanned::new(
            Expr::If {
                cond: Box::new(cond),
                then_branch,
                else_branch,
            },
            span,
        ))
    }

    fn parse_match(&mut self) -> Result<Spanned<Expr>> {
        let start = self.expect(&Token::Match)?;
        let subject = self.parse_expr()?;
        self.expect(&Token::LBrace)?;

        let mut arms = Vec::new();
        loop {
            if self.check(&Token::RBrace) && !arms.is_empty() {
                break;
            }
            let pattern = self.parse_pattern()?;
            self.expect(&Token::FatArrow)?;
            let body = self.parse_expr()?;
            let block_bodied = body.node.is_block_like();
            arms.push(MatchArm { pattern, body });

            if self.eat(&Token::Comma) {
                continue;
            }
            if self.check(&Token::RBrace) {
                break;
            }
            if !block_bodied {
                return Err(self.error("',' or '}'"));
            }
        }

        let end = self.expect(&Token::RBrace)?;
        Ok(Spanned::new(
            Expr::Match {
                subject: Box::new(subject),
                arms,
            },
            start.merge(end),
        ))
    }

    fn parse_pattern(&mut self) -> Result<Spanned<Pattern>> {
        let start = self.span();
        let pattern = match self.peek().clone() {
            Token::Underscore => Pattern::Wildcard,
            Token::IntLit(n) => Pattern::Literal(LiteralPattern::Int(n)),
            Token::StringLit(s) => Pattern::Literal(LiteralPattern::Str(s)),
            Token::True => Pattern::Literal(LiteralPattern::Bool(true)),
            Token::False => Pattern::Literal(LiteralPattern::Bool(false)),
            Token::Minus => {
                self.advance();
                return match self.peek().clone() {
                    Token::IntLit(n) => {
                        let end = self.advance().span;
                        Ok(Spanned::new(
                            Pattern::Literal(LiteralPattern::Int(-n)),
                            start.merge(end),
                        ))
                    }
                    _ => Err(self.error("integer literal")),
                };
            }
            _ => return Err(self.error("pattern")),
        };
        self.advance();
        Ok(Spanned::new(pattern, start))
    }

    /// `|a, b| expr`
    fn parse_closure(&mut self) -> Result<Spanned<Expr>> {
        let start = self.span();
        let params = if self.eat(&Token::PipePipe) {
            Vec::new()
        } else {
            self.expect(&Token::Pipe)?;
            let params = self.parse_params(&Token::Pipe)?;
            self.expect(&Token::Pipe)?;
            params
        };

        let body_expr = self.parse_expr()?;
        let span = start.merge(body_expr.span);
        let body = match body_expr.node {
            Expr::Block(block) => block,
            node => Block {
                stmts: Vec::new(),
                span: body_expr.span,
                tail: Some(Box::new(Spanned::new(node, body_expr.span))),
            },
        };

        Ok(Spanned::new(
            Expr::Fn(Rc::new(FnLit {
                name: None,
                params,
                ret_ty: None,
                body,
                span,
            })),
            span,
        ))
    }
}
