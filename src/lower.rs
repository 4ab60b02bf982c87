//! Lowering of declarative creation files into a JSON instruction list
//!
//! Creation files describe universes and entities rather than computations:
//!
//! ```text
//! universe Eden { dimensions: 3, 4  laws: gravity }
//! entity Adam { kind: "human" }
//! manifest Eden with Adam
//! flow time forward
//! observe Adam
//! ```
//!
//! The lowerer walks the token stream, emits one [`Instruction`] per
//! recognized form and skips every other token.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::error::{ErrorKind, QbetError, Result};
use crate::lexer::Lexer;
use crate::token::{Token, TokenKind};

/// Property name to value mapping of a universe or entity
pub type Properties = BTreeMap<String, Json>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t", content = "v", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Instruction {
    Universe(String, Properties),
    Entity(String, Properties),
    Manifest(String, String),
    FlowTime(String),
    Observe(String),
}

/// A lowered file as written by `qbet build`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoweredModule {
    pub version: String,
    pub source: String,
    pub instructions: Vec<Instruction>,
}

impl LoweredModule {
    pub fn new(source: impl Into<String>, instructions: Vec<Instruction>) -> Self {
        Self {
            version: crate::VERSION.to_string(),
            source: source.into(),
            instructions,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ErrorKind::Runtime(format!("cannot serialize module: {}", e)).into())
    }
}

pub struct Lowerer {
    tokens: Vec<Token>,
    current: usize,
}

impl Lowerer {
    /// Tokenize `source`; line breaks carry no meaning here and are dropped.
    pub fn new(source: &str) -> Result<Self> {
        let tokens = Lexer::new(source)
            .tokenize()?
            .into_iter()
            .filter(|token| token.kind != TokenKind::Newline)
            .collect();
        Ok(Self { tokens, current: 0 })
    }

    pub fn lower(&mut self) -> Result<Vec<Instruction>> {
        let mut instructions = Vec::new();

        while !self.is_at_end() {
            let word = match &self.peek().kind {
                TokenKind::Ident(word) => word.clone(),
                _ => String::new(),
            };
            let instruction = match word.as_str() {
                "universe" => Some(self.universe()?),
                "entity" => Some(self.entity()?),
                "manifest" => Some(self.manifest()?),
                "flow" => Some(self.flow()?),
                "observe" => Some(self.observe()?),
                _ => None,
            };

            match instruction {
                Some(instruction) => instructions.push(instruction),
                None => {
                    self.advance();
                }
            }
        }

        tracing::debug!(count = instructions.len(), "lowered creation file");
        Ok(instructions)
    }

    // ==================== Forms ====================

    fn universe(&mut self) -> Result<Instruction> {
        self.advance();
        let name = self.expect_ident("expected universe name")?;
        self.expect(TokenKind::LeftBrace, "expected '{' after universe name")?;

        let mut properties = Properties::new();
        while !self.check(&TokenKind::RightBrace) && !self.is_at_end() {
            let key = self.expect_ident("expected property name")?;
            self.expect(TokenKind::Colon, "expected ':' after property name")?;

            let mut values = Vec::new();
            while !self.check(&TokenKind::RightBrace) && !self.is_at_end() && !self.at_property() {
                let token = self.advance();
                if token.kind != TokenKind::Comma {
                    values.push(literal(&token));
                }
            }

            let value = match values.len() {
                0 => Json::Null,
                1 => values.remove(0),
                _ => Json::Array(values),
            };
            properties.insert(key, value);
        }

        self.expect(TokenKind::RightBrace, "expected '}' after universe body")?;
        Ok(Instruction::Universe(name, properties))
    }

    fn entity(&mut self) -> Result<Instruction> {
        self.advance();
        let name = self.expect_ident("expected entity name")?;
        self.expect(TokenKind::LeftBrace, "expected '{' after entity name")?;

        let mut properties = Properties::new();
        while !self.check(&TokenKind::RightBrace) && !self.is_at_end() {
            let key = self.expect_ident("expected property name")?;
            self.expect(TokenKind::Colon, "expected ':' after property name")?;
            if self.is_at_end() {
                return Err(self.error("expected property value"));
            }
            let token = self.advance();
            properties.insert(key, literal(&token));
            self.match_token(&TokenKind::Comma);
        }

        self.expect(TokenKind::RightBrace, "expected '}' after entity body")?;
        Ok(Instruction::Entity(name, properties))
    }

    fn manifest(&mut self) -> Result<Instruction> {
        self.advance();
        let universe = self.expect_ident("expected universe name after 'manifest'")?;
        let with = self.expect_ident("expected 'with'")?;
        if with != "with" {
            return Err(QbetError::new(
                ErrorKind::ExpectedToken("expected 'with'".to_string(), with),
                Some(self.previous().span),
            ));
        }
        let entity = self.expect_ident("expected entity name after 'with'")?;
        Ok(Instruction::Manifest(universe, entity))
    }

    fn flow(&mut self) -> Result<Instruction> {
        self.advance();
        self.expect_ident("expected 'time' after 'flow'")?;
        if self.is_at_end() {
            return Err(self.error("expected time direction"));
        }
        let direction = self.advance();
        Ok(Instruction::FlowTime(text(&direction)))
    }

    fn observe(&mut self) -> Result<Instruction> {
        self.advance();
        let target = self.expect_ident("expected name after 'observe'")?;
        Ok(Instruction::Observe(target))
    }

    // ==================== Helpers ====================

    fn peek(&self) -> &Token {
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if !self.is_at_end() {
            self.current += 1;
        }
        token
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

    /// An identifier followed by a colon starts the next property.
    fn at_property(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Ident(_))
            && self
                .tokens
                .get(self.current + 1)
                .map_or(false, |next| next.kind == TokenKind::Colon)
    }

    fn expect(&mut self, kind: TokenKind, message: &str) -> Result<Token> {
        if self.check(&kind) {
            Ok(self.advance())
        } else {
            Err(self.error(message))
        }
    }

    fn expect_ident(&mut self, message: &str) -> Result<String> {
        match &self.peek().kind {
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.error(message)),
        }
    }

    fn error(&self, message: &str) -> QbetError {
        let token = self.peek();
        QbetError::new(
            ErrorKind::ExpectedToken(message.to_string(), token.kind.to_string()),
            Some(token.span),
        )
    }
}

/// JSON form of a single value token.
fn literal(token: &Token) -> Json {
    match &token.kind {
        TokenKind::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => Json::from(*n as i64),
        TokenKind::Number(n) => Json::from(*n),
        TokenKind::True => Json::Bool(true),
        TokenKind::False => Json::Bool(false),
        TokenKind::Null => Json::Null,
        _ => Json::String(text(token)),
    }
}

fn text(token: &Token) -> String {
    match &token.kind {
        TokenKind::String(s) | TokenKind::Ident(s) => s.clone(),
        _ => token.lexeme.clone(),
    }
}
