//! Hand-rolled lexer for the expression subset.

use crate::error::EvalError;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Ident(String),
    Number(f64),
    Str(String),
    True,
    False,
    Null,
    Dot,
    LParen,
    RParen,
    Bang,
    Minus,
    EqEq,
    NotEq,
    EqEqEq,
    NotEqEq,
    Lt,
    Le,
    Gt,
    Ge,
    AndAnd,
    OrOr,
    Eof,
}

pub struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    src: &'a str,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            chars: src.char_indices().peekable(),
            src,
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, EvalError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace();
            let Some(&(pos, c)) = self.chars.peek() else {
                tokens.push(Token::Eof);
                break;
            };

            match c {
                '.' => {
                    self.chars.next();
                    tokens.push(Token::Dot);
                }
                '(' => {
                    self.chars.next();
                    tokens.push(Token::LParen);
                }
                ')' => {
                    self.chars.next();
                    tokens.push(Token::RParen);
                }
                '-' => {
                    self.chars.next();
                    tokens.push(Token::Minus);
                }
                '!' => {
                    self.chars.next();
                    if self.eat('=') {
                        if self.eat('=') {
                            tokens.push(Token::NotEqEq);
                        } else {
                            tokens.push(Token::NotEq);
                        }
                    } else {
                        tokens.push(Token::Bang);
                    }
                }
                '=' => {
                    self.chars.next();
                    if !self.eat('=') {
                        return Err(EvalError::UnexpectedChar('=', pos));
                    }
                    if self.eat('=') {
                        tokens.push(Token::EqEqEq);
                    } else {
                        tokens.push(Token::EqEq);
                    }
                }
                '<' => {
                    self.chars.next();
                    tokens.push(if self.eat('=') { Token::Le } else { Token::Lt });
                }
                '>' => {
                    self.chars.next();
                    tokens.push(if self.eat('=') { Token::Ge } else { Token::Gt });
                }
                '&' => {
                    self.chars.next();
                    if !self.eat('&') {
                        return Err(EvalError::UnexpectedChar('&', pos));
                    }
                    tokens.push(Token::AndAnd);
                }
                '|' => {
                    self.chars.next();
                    if !self.eat('|') {
                        return Err(EvalError::UnexpectedChar('|', pos));
                    }
                    tokens.push(Token::OrOr);
                }
                '\'' | '"' => {
                    tokens.push(self.read_string(c)?);
                }
                c if c.is_ascii_digit() => {
                    tokens.push(self.read_number());
                }
                c if c.is_alphabetic() || c == '_' => {
                    tokens.push(self.read_ident());
                }
                other => return Err(EvalError::UnexpectedChar(other, pos)),
            }
        }
        Ok(tokens)
    }

    fn eat(&mut self, expected: char) -> bool {
        if matches!(self.chars.peek(), Some(&(_, c)) if c == expected) {
            self.chars.next();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.chars.peek(), Some(&(_, c)) if c.is_whitespace()) {
            self.chars.next();
        }
    }

    fn read_ident(&mut self) -> Token {
        let start = self.chars.peek().unwrap().0;
        let mut end = start;
        while let Some(&(pos, c)) = self.chars.peek() {
            if c.is_alphanumeric() || c == '_' {
                end = pos + c.len_utf8();
                self.chars.next();
            } else {
                break;
            }
        }
        let word = &self.src[start..end];
        match word {
            "true" => Token::True,
            "false" => Token::False,
            "null" => Token::Null,
            _ => Token::Ident(word.to_string()),
        }
    }

    fn read_number(&mut self) -> Token {
        let start = self.chars.peek().unwrap().0;
        let mut end = start;
        let mut seen_dot = false;
        while let Some(&(pos, c)) = self.chars.peek() {
            if c.is_ascii_digit() {
                end = pos + 1;
                self.chars.next();
            } else if c == '.' && !seen_dot {
                // Only consume the dot if it's followed by a digit —
                // otherwise it's the path-access operator.
                let mut lookahead = self.chars.clone();
                lookahead.next();
                if matches!(lookahead.peek(), Some(&(_, d)) if d.is_ascii_digit()) {
                    seen_dot = true;
                    end = pos + 1;
                    self.chars.next();
                } else {
                    break;
                }
            } else {
                break;
            }
        }
        let text = &self.src[start..end];
        Token::Number(text.parse().unwrap_or(0.0))
    }

    fn read_string(&mut self, quote: char) -> Result<Token, EvalError> {
        self.chars.next(); // consume opening quote
        let mut s = String::new();
        loop {
            match self.chars.next() {
                Some((_, c)) if c == quote => return Ok(Token::Str(s)),
                Some((_, '\\')) => {
                    if let Some((_, escaped)) = self.chars.next() {
                        s.push(match escaped {
                            'n' => '\n',
                            't' => '\t',
                            other => other,
                        });
                    } else {
                        return Err(EvalError::UnexpectedEof);
                    }
                }
                Some((_, c)) => s.push(c),
                None => return Err(EvalError::UnexpectedEof),
            }
        }
    }
}
