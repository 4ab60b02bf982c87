//! Parser for QBET
//!
//! Recursive descent over the token stream, producing a [`Program`]. Parsing
//! stops at the first unexpected token; there is no error recovery.

use std::rc::Rc;

use crate::ast::{BinaryOp, Expr, FunctionDecl, LogicalOp, Program, Stmt, UnaryOp};
use crate::error::{ErrorKind, QbetError, Result};
use crate::stack::ensure_sufficient_stack;
use crate::token::{Span, Token, TokenKind};

/// The parser state
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

impl Parser {
    /// Create a new parser from tokens
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, current: 0 }
    }

    /// Parse the tokens into a program
    pub fn parse(&mut self) -> Result<Program> {
        let mut statements = Vec::new();

        self.skip_separators();
        while !self.is_at_end() {
            statements.push(self.statement()?);
            self.skip_separators();
        }

        tracing::trace!(statements = statements.len(), "parsed program");
        Ok(Program::new(statements))
    }

    // ==================== Statements ====================

    fn statement(&mut self) -> Result<Stmt> {
        ensure_sufficient_stack(|| match self.peek().kind {
            TokenKind::Function => self.function_declaration(),
            TokenKind::If => self.if_statement(),
            TokenKind::While => self.while_statement(),
            TokenKind::For => self.for_statement(),
            TokenKind::Return => self.return_statement(),
            TokenKind::Import => self.import_statement(),
            TokenKind::LeftBrace => self.block(),
            _ => {
                let expr = self.expression()?;
                Ok(Stmt::Expr { expr })
            }
        })
    }

    fn function_declaration(&mut self) -> Result<Stmt> {
        let span = self.advance().span; // consume 'function'

        let name = self.expect_ident("expected function name")?;

        self.expect(&TokenKind::LeftParen, "expected '(' after function name")?;

        let mut params = Vec::new();
        self.skip_newlines();
        if !self.check(&TokenKind::RightParen) {
            loop {
                self.skip_newlines();
                params.push(self.expect_ident("expected parameter name")?);
                self.skip_newlines();
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            }
        }

        self.expect(&TokenKind::RightParen, "expected ')' after parameters")?;

        let (body, _) = self.block_statements()?;

        Ok(Stmt::Function(Rc::new(FunctionDecl { name, params, body, span })))
    }

    fn if_statement(&mut self) -> Result<Stmt> {
        let span = self.advance().span; // consume 'if'

        let condition = self.parenthesized("if")?;
        let then_branch = Box::new(self.block()?);

        // `else` may sit on the line after the closing brace.
        let save = self.current;
        self.skip_newlines();
        let else_branch = if self.match_token(&TokenKind::Else) {
            self.skip_newlines();
            if self.check(&TokenKind::If) {
                Some(Box::new(self.if_statement()?))
            } else {
                Some(Box::new(self.block()?))
            }
        } else {
            self.current = save;
            None
        };

        Ok(Stmt::If { condition, then_branch, else_branch, span })
    }

    fn while_statement(&mut self) -> Result<Stmt> {
        let span = self.advance().span; // consume 'while'

        let condition = self.parenthesized("while")?;
        let body = Box::new(self.block()?);

        Ok(Stmt::While { condition, body, span })
    }

    fn for_statement(&mut self) -> Result<Stmt> {
        let span = self.advance().span; // consume 'for'

        self.expect(&TokenKind::LeftParen, "expected '(' after 'for'")?;
        let var = self.expect_ident("expected variable name in for loop")?;
        self.expect(&TokenKind::In, "expected 'in' after loop variable")?;
        let iterable = self.expression()?;
        self.expect(&TokenKind::RightParen, "expected ')' after for clause")?;

        let body = Box::new(self.block()?);

        Ok(Stmt::For { var, iterable, body, span })
    }

    fn return_statement(&mut self) -> Result<Stmt> {
        let span = self.advance().span; // consume 'return'

        let value = match self.peek().kind {
            TokenKind::Newline | TokenKind::Semicolon | TokenKind::RightBrace | TokenKind::Eof => {
                None
            }
            _ => Some(self.expression()?),
        };

        Ok(Stmt::Return { value, span })
    }

    fn import_statement(&mut self) -> Result<Stmt> {
        let span = self.advance().span; // consume 'import'

        let module = self.expect_ident("expected module name after 'import'")?;
        let alias = if self.match_token(&TokenKind::As) {
            Some(self.expect_ident("expected alias after 'as'")?)
        } else {
            None
        };

        Ok(Stmt::Import { module, alias, span })
    }

    fn block(&mut self) -> Result<Stmt> {
        let (stmts, span) = self.block_statements()?;
        Ok(Stmt::Block { stmts, span })
    }

    fn block_statements(&mut self) -> Result<(Vec<Stmt>, Span)> {
        self.skip_newlines();
        let span = self.expect(&TokenKind::LeftBrace, "expected '{' to start block")?.span;

        let mut stmts = Vec::new();
        self.skip_separators();

        while !self.check(&TokenKind::RightBrace) && !self.is_at_end() {
            stmts.push(self.statement()?);
            self.skip_separators();
        }

        self.expect(&TokenKind::RightBrace, "expected '}' after block")?;

        Ok((stmts, span))
    }

    /// `( expr )` as used by `if` and `while`
    fn parenthesized(&mut self, keyword: &str) -> Result<Expr> {
        self.expect(&TokenKind::LeftParen, &format!("expected '(' after '{}'", keyword))?;
        let expr = self.expression()?;
        self.expect(&TokenKind::RightParen, "expected ')' after condition")?;
        Ok(expr)
    }

    // ==================== Expressions ====================

    fn expression(&mut self) -> Result<Expr> {
        ensure_sufficient_stack(|| self.assignment())
    }

    fn assignment(&mut self) -> Result<Expr> {
        let expr = self.or_expr()?;

        if self.match_token(&TokenKind::Equal) {
            let equals = self.previous().span;

            if let Expr::Ident { name, span } = expr {
                let value = self.expression()?;
                let span = span.to(value.span());
                return Ok(Expr::Assign { name, value: Box::new(value), span });
            }

            return Err(QbetError::new(ErrorKind::InvalidAssignmentTarget, Some(equals)));
        }

        Ok(expr)
    }

    fn or_expr(&mut self) -> Result<Expr> {
        let mut left = self.and_expr()?;

        while self.match_token(&TokenKind::Or) {
            let right = self.and_expr()?;
            let span = left.span().to(right.span());
            left = Expr::Logical {
                left: Box::new(left),
                op: LogicalOp::Or,
                right: Box::new(right),
                span,
            };
        }

        Ok(left)
    }

    fn and_expr(&mut self) -> Result<Expr> {
        let mut left = self.equality()?;

        while self.match_token(&TokenKind::And) {
            let right = self.equality()?;
            let span = left.span().to(right.span());
            left = Expr::Logical {
                left: Box::new(left),
                op: LogicalOp::And,
                right: Box::new(right),
                span,
            };
        }

        Ok(left)
    }

    fn equality(&mut self) -> Result<Expr> {
        let mut left = self.comparison()?;

        loop {
            let op = if self.match_token(&TokenKind::EqualEqual) {
                BinaryOp::Eq
            } else if self.match_token(&TokenKind::BangEqual) {
                BinaryOp::Ne
            } else {
                break;
            };

            let right = self.comparison()?;
            left = binary(left, op, right);
        }

        Ok(left)
    }

    fn comparison(&mut self) -> Result<Expr> {
        let mut left = self.term()?;

        loop {
            let op = if self.match_token(&TokenKind::Less) {
                BinaryOp::Lt
            } else if self.match_token(&TokenKind::LessEqual) {
                BinaryOp::Le
            } else if self.match_token(&TokenKind::Greater) {
                BinaryOp::Gt
            } else if self.match_token(&TokenKind::GreaterEqual) {
                BinaryOp::Ge
            } else {
                break;
            };

            let right = self.term()?;
            left = binary(left, op, right);
        }

        Ok(left)
    }

    fn term(&mut self) -> Result<Expr> {
        let mut left = self.factor()?;

        loop {
            let op = if self.match_token(&TokenKind::Plus) {
                BinaryOp::Add
            } else if self.match_token(&TokenKind::Minus) {
                BinaryOp::Sub
            } else {
                break;
            };

            let right = self.factor()?;
            left = binary(left, op, right);
        }

        Ok(left)
    }

    fn factor(&mut self) -> Result<Expr> {
        let mut left = self.power()?;

        loop {
            let op = if self.match_token(&TokenKind::Star) {
                BinaryOp::Mul
            } else if self.match_token(&TokenKind::Slash) {
                BinaryOp::Div
            } else if self.match_token(&TokenKind::Percent) {
                BinaryOp::Mod
            } else {
                break;
            };

            let right = self.power()?;
            left = binary(left, op, right);
        }

        Ok(left)
    }

    /// `**` is right-associative
    fn power(&mut self) -> Result<Expr> {
        let left = self.unary()?;

        if self.match_token(&TokenKind::StarStar) {
            let right = ensure_sufficient_stack(|| self.power())?;
            return Ok(binary(left, BinaryOp::Pow, right));
        }

        Ok(left)
    }

    fn unary(&mut self) -> Result<Expr> {
        let op = if self.match_token(&TokenKind::Minus) {
            UnaryOp::Neg
        } else if self.match_token(&TokenKind::Not) {
            UnaryOp::Not
        } else {
            return self.postfix();
        };

        let span = self.previous().span;
        let operand = ensure_sufficient_stack(|| self.unary())?;
        let span = span.to(operand.span());
        Ok(Expr::Unary { op, operand: Box::new(operand), span })
    }

    fn postfix(&mut self) -> Result<Expr> {
        let mut expr = self.primary()?;

        loop {
            if self.match_token(&TokenKind::LeftParen) {
                let args = self.list(&TokenKind::RightParen, "expected ')' after arguments")?;
                let span = expr.span().to(self.previous().span);
                expr = match expr {
                    Expr::Member { object, name, .. } => Expr::MethodCall {
                        object,
                        method: name,
                        args,
                        span,
                    },
                    callee => Expr::Call { callee: Box::new(callee), args, span },
                };
            } else if self.match_token(&TokenKind::Dot) {
                let name = self.expect_ident("expected member name after '.'")?;
                let span = expr.span().to(self.previous().span);
                expr = Expr::Member { object: Box::new(expr), name, span };
            } else if self.match_token(&TokenKind::LeftBracket) {
                self.skip_newlines();
                let index = self.expression()?;
                self.skip_newlines();
                self.expect(&TokenKind::RightBracket, "expected ']' after index")?;
                let span = expr.span().to(self.previous().span);
                expr = Expr::Index {
                    object: Box::new(expr),
                    index: Box::new(index),
                    span,
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    /// Comma separated expressions up to `close`; newlines are ignored inside.
    fn list(&mut self, close: &TokenKind, message: &str) -> Result<Vec<Expr>> {
        let mut items = Vec::new();

        self.skip_newlines();
        if !self.check(close) {
            loop {
                self.skip_newlines();
                items.push(self.expression()?);
                self.skip_newlines();
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            }
        }

        self.expect(close, message)?;
        Ok(items)
    }

    fn primary(&mut self) -> Result<Expr> {
        let token = self.peek().clone();

        match &token.kind {
            TokenKind::Number(n) => {
                let value = *n;
                self.advance();
                Ok(Expr::Number { value, span: token.span })
            }
            TokenKind::String(s) => {
                let value = s.clone();
                self.advance();
                Ok(Expr::String { value, span: token.span })
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::Bool { value: true, span: token.span })
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::Bool { value: false, span: token.span })
            }
            TokenKind::Null => {
                self.advance();
                Ok(Expr::Null { span: token.span })
            }
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.advance();
                Ok(Expr::Ident { name, span: token.span })
            }
            TokenKind::LeftParen => {
                self.advance();
                self.skip_newlines();
                let expr = self.expression()?;
                self.skip_newlines();
                self.expect(&TokenKind::RightParen, "expected ')' after expression")?;
                Ok(expr)
            }
            TokenKind::LeftBracket => {
                self.advance();
                let elements =
                    self.list(&TokenKind::RightBracket, "expected ']' after array elements")?;
                let span = token.span.to(self.previous().span);
                Ok(Expr::Array { elements, span })
            }
            other => Err(QbetError::new(
                ErrorKind::ExpectedExpression(other.to_string()),
                Some(token.span),
            )),
        }
    }

    // ==================== Helpers ====================

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.peek().kind) == std::mem::discriminant(kind)
    }

    fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind, message: &str) -> Result<&Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(QbetError::new(
                ErrorKind::ExpectedToken(message.to_string(), self.peek().kind.to_string()),
                Some(self.peek().span),
            ))
        }
    }

    fn expect_ident(&mut self, message: &str) -> Result<String> {
        if let TokenKind::Ident(name) = &self.peek().kind {
            let name = name.clone();
            self.advance();
            Ok(name)
        } else {
            Err(QbetError::new(
                ErrorKind::ExpectedToken(message.to_string(), self.peek().kind.to_string()),
                Some(self.peek().span),
            ))
        }
    }

    fn skip_newlines(&mut self) {
        while self.match_token(&TokenKind::Newline) {}
    }

    /// Statement separators: newlines and semicolons
    fn skip_separators(&mut self) {
        while self.match_token(&TokenKind::Newline) || self.match_token(&TokenKind::Semicolon) {}
    }
}

fn binary(left: Expr, op: BinaryOp, right: Expr) -> Expr {
    let span = left.span().to(right.span());
    Expr::Binary {
        left: Box::new(left),
        op,
        right: Box::new(right),
        span,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;
    use crate::lexer::Lexer;

    fn parse(source: &str) -> Program {
        let mut lexer = Lexer::new(source);
        let tokens = lexer.tokenize().unwrap();
        let mut parser = Parser::new(tokens);
        parser.parse().unwrap()
    }

    fn parse_err(source: &str) -> QbetError {
        let tokens = Lexer::new(source).tokenize().unwrap();
        Parser::new(tokens).parse().unwrap_err()
    }

    fn single_expr(source: &str) -> Expr {
        let program = parse(source);
        assert_eq!(program.statements.len(), 1);
        match program.statements.into_iter().next() {
            Some(Stmt::Expr { expr }) => expr,
            other => panic!("expected expression statement, got {:?}", other),
        }
    }

    #[test]
    fn test_assignment() {
        match single_expr("x = 42") {
            Expr::Assign { name, value, .. } => {
                assert_eq!(name, "x");
                assert!(matches!(*value, Expr::Number { value, .. } if value == 42.0));
            }
            other => panic!("expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_assignment_is_right_associative() {
        match single_expr("a = b = 1") {
            Expr::Assign { name, value, .. } => {
                assert_eq!(name, "a");
                assert!(matches!(*value, Expr::Assign { ref name, .. } if name == "b"));
            }
            other => panic!("expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_assignment_target() {
        let err = parse_err("a.b = 1");
        assert_eq!(err.kind, ErrorKind::InvalidAssignmentTarget);
        assert_eq!(err.span.unwrap().column, 5);
    }

    #[test]
    fn test_function() {
        let program = parse("function add(a, b) { return a + b }");
        assert_eq!(program.statements.len(), 1);
        match &program.statements[0] {
            Stmt::Function(decl) => {
                assert_eq!(decl.name, "add");
                assert_eq!(decl.params, ["a", "b"]);
                assert_eq!(decl.body.len(), 1);
            }
            _ => panic!("expected function"),
        }
    }

    #[test]
    fn test_if_else() {
        let program = parse("if (x > 0) { print(x) }\nelse { print(0) }");
        assert_eq!(program.statements.len(), 1);
        match &program.statements[0] {
            Stmt::If { else_branch, .. } => assert!(else_branch.is_some()),
            _ => panic!("expected if statement"),
        }
    }

    #[test]
    fn test_if_without_else_keeps_following_statement() {
        let program = parse("if (x) { 1 }\ny");
        assert_eq!(program.statements.len(), 2);
    }

    #[test]
    fn test_for_loop() {
        let program = parse("for (item in [1, 2]) { print(item) }");
        match &program.statements[0] {
            Stmt::For { var, iterable, .. } => {
                assert_eq!(var, "item");
                assert!(matches!(iterable, Expr::Array { elements, .. } if elements.len() == 2));
            }
            _ => panic!("expected for statement"),
        }
    }

    #[test]
    fn test_precedence() {
        // 1 + (2 * 3)
        match single_expr("1 + 2 * 3") {
            Expr::Binary { op: BinaryOp::Add, right, .. } => {
                assert!(matches!(*right, Expr::Binary { op: BinaryOp::Mul, .. }));
            }
            other => panic!("unexpected tree {:?}", other),
        }
    }

    #[test]
    fn test_power_is_right_associative() {
        match single_expr("2 ** 3 ** 2") {
            Expr::Binary { op: BinaryOp::Pow, left, right, .. } => {
                assert!(matches!(*left, Expr::Number { value, .. } if value == 2.0));
                assert!(matches!(*right, Expr::Binary { op: BinaryOp::Pow, .. }));
            }
            other => panic!("unexpected tree {:?}", other),
        }
    }

    #[test]
    fn test_logical_binds_looser_than_equality() {
        match single_expr("a == 1 or not b") {
            Expr::Logical { op: LogicalOp::Or, left, right, .. } => {
                assert!(matches!(*left, Expr::Binary { op: BinaryOp::Eq, .. }));
                assert!(matches!(*right, Expr::Unary { op: UnaryOp::Not, .. }));
            }
            other => panic!("unexpected tree {:?}", other),
        }
    }

    #[test]
    fn test_postfix_chain() {
        match single_expr("a.b(1)[0].c") {
            Expr::Member { object, name, .. } => {
                assert_eq!(name, "c");
                match *object {
                    Expr::Index { object, .. } => {
                        assert!(matches!(*object, Expr::MethodCall { ref method, .. } if method == "b"));
                    }
                    other => panic!("expected index, got {:?}", other),
                }
            }
            other => panic!("unexpected tree {:?}", other),
        }
    }

    #[test]
    fn test_chained_call() {
        match single_expr("make()(2)") {
            Expr::Call { callee, args, .. } => {
                assert_eq!(args.len(), 1);
                assert!(matches!(*callee, Expr::Call { .. }));
            }
            other => panic!("unexpected tree {:?}", other),
        }
    }

    #[test]
    fn test_separators() {
        let program = parse("x = 5; { x = 6 }; x");
        assert_eq!(program.statements.len(), 3);
        assert!(matches!(program.statements[1], Stmt::Block { .. }));
    }

    #[test]
    fn test_multiline_arguments() {
        let program = parse("print(\n  1,\n  2\n)\n[\n 1,\n 2\n]");
        assert_eq!(program.statements.len(), 2);
    }

    #[test]
    fn test_return_without_value() {
        let program = parse("function f() { return }");
        match &program.statements[0] {
            Stmt::Function(decl) => {
                assert!(matches!(decl.body[0], Stmt::Return { value: None, .. }));
            }
            _ => panic!("expected function"),
        }
    }

    #[test]
    fn test_import() {
        let program = parse("import quantum as q");
        match &program.statements[0] {
            Stmt::Import { module, alias, .. } => {
                assert_eq!(module, "quantum");
                assert_eq!(alias.as_deref(), Some("q"));
            }
            _ => panic!("expected import"),
        }
    }

    #[test]
    fn test_syntax_error_position() {
        let err = parse_err("x = (1 + \n");
        assert_eq!(err.category(), ErrorCategory::SyntaxError);
        let span = err.span.unwrap();
        assert_eq!((span.line, span.column), (1, 10));
    }

    #[test]
    fn test_unclosed_block() {
        let err = parse_err("{ x = 1");
        assert!(matches!(err.kind, ErrorKind::ExpectedToken(_, ref got) if got == "EOF"));
    }
}
