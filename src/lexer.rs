//! Lexer for QBET
//!
//! Converts source code into a stream of tokens terminated by an EOF token.

use crate::error::{ErrorKind, QbetError, Result};
use crate::token::{lookup_keyword, Span, Token, TokenKind};

/// The lexer state
pub struct Lexer<'a> {
    source: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    current_pos: usize,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer from source code
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            current_pos: 0,
            line: 1,
            column: 1,
        }
    }

    /// Tokenize the entire source
    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();

        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }

        tokens.push(Token::new(
            TokenKind::Eof,
            Span::new(self.current_pos, self.current_pos, self.line, self.column),
            String::new(),
        ));

        Ok(tokens)
    }

    /// Get the next token
    fn next_token(&mut self) -> Result<Option<Token>> {
        self.skip_whitespace_and_comments();

        let Some(&(start_pos, ch)) = self.chars.peek() else {
            return Ok(None);
        };

        let start_line = self.line;
        let start_column = self.column;

        let kind = match ch {
            // Single character tokens
            '(' => { self.advance(); TokenKind::LeftParen }
            ')' => { self.advance(); TokenKind::RightParen }
            '{' => { self.advance(); TokenKind::LeftBrace }
            '}' => { self.advance(); TokenKind::RightBrace }
            '[' => { self.advance(); TokenKind::LeftBracket }
            ']' => { self.advance(); TokenKind::RightBracket }
            ',' => { self.advance(); TokenKind::Comma }
            ';' => { self.advance(); TokenKind::Semicolon }
            ':' => { self.advance(); TokenKind::Colon }
            '.' => { self.advance(); TokenKind::Dot }
            '+' => { self.advance(); TokenKind::Plus }
            '/' => { self.advance(); TokenKind::Slash }
            '%' => { self.advance(); TokenKind::Percent }

            // Potentially two-character tokens
            '*' => self.one_or_two('*', TokenKind::StarStar, TokenKind::Star),
            '-' => self.one_or_two('>', TokenKind::Arrow, TokenKind::Minus),
            '=' => self.one_or_two('=', TokenKind::EqualEqual, TokenKind::Equal),
            '<' => self.one_or_two('=', TokenKind::LessEqual, TokenKind::Less),
            '>' => self.one_or_two('=', TokenKind::GreaterEqual, TokenKind::Greater),
            '!' => {
                self.advance();
                if self.peek_char() == Some('=') {
                    self.advance();
                    TokenKind::BangEqual
                } else {
                    return Err(QbetError::new(
                        ErrorKind::UnexpectedCharacter('!'),
                        Some(Span::new(start_pos, self.current_pos, start_line, start_column)),
                    ));
                }
            }

            '\n' => {
                self.advance();
                self.line += 1;
                self.column = 1;
                TokenKind::Newline
            }

            '"' | '\'' => self.scan_string(ch)?,

            c if c.is_ascii_digit() => self.scan_number()?,

            c if c.is_alphabetic() || c == '_' => self.scan_identifier(),

            _ => {
                self.advance();
                return Err(QbetError::new(
                    ErrorKind::UnexpectedCharacter(ch),
                    Some(Span::new(start_pos, self.current_pos, start_line, start_column)),
                ));
            }
        };

        let lexeme = self.source[start_pos..self.current_pos].to_string();

        Ok(Some(Token::new(
            kind,
            Span::new(start_pos, self.current_pos, start_line, start_column),
            lexeme,
        )))
    }

    /// Consume the current character, then `second` if it follows.
    fn one_or_two(&mut self, second: char, double: TokenKind, single: TokenKind) -> TokenKind {
        self.advance();
        if self.peek_char() == Some(second) {
            self.advance();
            double
        } else {
            single
        }
    }

    /// Advance and return the current character
    fn advance(&mut self) -> Option<char> {
        if let Some((pos, ch)) = self.chars.next() {
            self.current_pos = pos + ch.len_utf8();
            self.column += 1;
            Some(ch)
        } else {
            None
        }
    }

    /// Peek at the next character without advancing
    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, ch)| ch)
    }

    /// Skip whitespace (except newlines) and `#` comments
    fn skip_whitespace_and_comments(&mut self) {
        while let Some(&(_, ch)) = self.chars.peek() {
            match ch {
                ' ' | '\t' | '\r' => {
                    self.advance();
                }
                '#' => {
                    while let Some(&(_, c)) = self.chars.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    /// Scan a string literal delimited by `quote`
    fn scan_string(&mut self, quote: char) -> Result<TokenKind> {
        let start_line = self.line;
        let start_column = self.column;
        let start_pos = self.current_pos;

        // Opening quote
        self.advance();

        let mut value = String::new();

        loop {
            match self.peek_char() {
                Some(c) if c == quote => {
                    self.advance();
                    return Ok(TokenKind::String(value));
                }
                Some('\\') => {
                    self.advance();
                    match self.peek_char() {
                        Some('n') => { self.advance(); value.push('\n'); }
                        Some('t') => { self.advance(); value.push('\t'); }
                        Some('\\') => { self.advance(); value.push('\\'); }
                        Some(c) => { self.advance(); value.push(c); }
                        None => break,
                    }
                }
                Some('\n') => {
                    value.push('\n');
                    self.advance();
                    self.line += 1;
                    self.column = 1;
                }
                Some(c) => {
                    value.push(c);
                    self.advance();
                }
                None => break,
            }
        }

        Err(QbetError::new(
            ErrorKind::UnterminatedString,
            Some(Span::new(start_pos, self.current_pos, start_line, start_column)),
        ))
    }

    /// Scan a number literal: digits with at most one decimal point
    fn scan_number(&mut self) -> Result<TokenKind> {
        let start = self.current_pos;
        let start_column = self.column;
        let mut seen_dot = false;

        while let Some(c) = self.peek_char() {
            if c.is_ascii_digit() {
                self.advance();
            } else if c == '.' {
                self.advance();
                if seen_dot {
                    return Err(QbetError::new(
                        ErrorKind::InvalidNumber(self.source[start..self.current_pos].to_string()),
                        Some(Span::new(start, self.current_pos, self.line, start_column)),
                    ));
                }
                seen_dot = true;
            } else {
                break;
            }
        }

        let text = &self.source[start..self.current_pos];
        match text.parse::<f64>() {
            Ok(value) => Ok(TokenKind::Number(value)),
            Err(_) => Err(QbetError::new(
                ErrorKind::InvalidNumber(text.to_string()),
                Some(Span::new(start, self.current_pos, self.line, start_column)),
            )),
        }
    }

    /// Scan an identifier or keyword
    fn scan_identifier(&mut self) -> TokenKind {
        let start = self.current_pos;

        while let Some(c) = self.peek_char() {
            if c.is_alphabetic() || c.is_ascii_digit() || c == '_' {
                self.advance();
            } else {
                break;
            }
        }

        let text = &self.source[start..self.current_pos];

        lookup_keyword(text).unwrap_or_else(|| TokenKind::Ident(text.to_string()))
    }
}
