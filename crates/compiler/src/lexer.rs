//! Hand-written lexer. The reference compiler's lexer is a generated flex
//! scanner; treated as an external collaborator by the spec, it is
//! reproduced here as an ordinary hand-rolled tokenizer since there is no
//! lexer-generator in the Rust ecosystem this crate otherwise reaches for.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Int,
    If,
    Else,
    While,
    For,
    Do,
    Return,
    Ident(String),
    IntLit(i32),
    LParen,
    RParen,
    LBrace,
    RBrace,
    Semi,
    Comma,
    Assign,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    Plus,
    Minus,
    Star,
    Slash,
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Ident(s) => write!(f, "identifier `{s}`"),
            TokenKind::IntLit(v) => write!(f, "integer literal `{v}`"),
            TokenKind::Eof => write!(f, "end of file"),
            other => write!(f, "{other:?}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: u32,
}

pub struct Lexer<'a> {
    src: &'a [u8],
    pos: usize,
    line: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Lexer {
            src: src.as_bytes(),
            pos: 0,
            line: 1,
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, (u32, String)> {
        let mut out = Vec::new();
        loop {
            let tok = self.next_token()?;
            let done = tok.kind == TokenKind::Eof;
            out.push(tok);
            if done {
                break;
            }
        }
        Ok(out)
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.src.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let c = self.peek()?;
        self.pos += 1;
        if c == b'\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(b' ') | Some(b'\t') | Some(b'\r') | Some(b'\n') => {
                    self.bump();
                }
                Some(b'/') if self.peek_at(1) == Some(b'/') => {
                    while !matches!(self.peek(), None | Some(b'\n')) {
                        self.bump();
                    }
                }
                Some(b'/') if self.peek_at(1) == Some(b'*') => {
                    self.bump();
                    self.bump();
                    while !(self.peek().is_none()
                        || (self.peek() == Some(b'*') && self.peek_at(1) == Some(b'/')))
                    {
                        self.bump();
                    }
                    self.bump();
                    self.bump();
                }
                _ => break,
            }
        }
    }

    fn next_token(&mut self) -> Result<Token, (u32, String)> {
        self.skip_trivia();
        let line = self.line;
        let Some(c) = self.peek() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                line,
            });
        };
        let kind = match c {
            b'(' => {
                self.bump();
                TokenKind::LParen
            }
            b')' => {
                self.bump();
                TokenKind::RParen
            }
            b'{' => {
                self.bump();
                TokenKind::LBrace
            }
            b'}' => {
                self.bump();
                TokenKind::RBrace
            }
            b';' => {
                self.bump();
                TokenKind::Semi
            }
            b',' => {
                self.bump();
                TokenKind::Comma
            }
            b'+' => {
                self.bump();
                TokenKind::Plus
            }
            b'-' => {
                self.bump();
                TokenKind::Minus
            }
            b'*' => {
                self.bump();
                TokenKind::Star
            }
            b'/' => {
                self.bump();
                TokenKind::Slash
            }
            b'=' => {
                self.bump();
                if self.peek() == Some(b'=') {
                    self.bump();
                    TokenKind::EqEq
                } else {
                    TokenKind::Assign
                }
            }
            b'!' => {
                self.bump();
                if self.peek() == Some(b'=') {
                    self.bump();
                    TokenKind::NotEq
                } else {
                    return Err((line, format!("unexpected character '{}'", c as char)));
                }
            }
            b'<' => {
                self.bump();
                if self.peek() == Some(b'=') {
                    self.bump();
                    TokenKind::Le
                } else {
                    TokenKind::Lt
                }
            }
            b'>' => {
                self.bump();
                if self.peek() == Some(b'=') {
                    self.bump();
                    TokenKind::Ge
                } else {
                    TokenKind::Gt
                }
            }
            b'0'..=b'9' => self.lex_number(line)?,
            c if c.is_ascii_alphabetic() || c == b'_' => self.lex_ident(),
            other => {
                return Err((line, format!("unexpected character '{}'", other as char)));
            }
        };
        Ok(Token { kind, line })
    }

    fn lex_number(&mut self, line: u32) -> Result<TokenKind, (u32, String)> {
        let start = self.pos;
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.bump();
        }
        let text = std::str::from_utf8(&self.src[start..self.pos]).unwrap();
        // Parsed as the unsigned magnitude first and then reinterpreted as
        // i32's bit pattern, not `i32::from_str`: `INT32_MIN` is written as
        // `-2147483648`, a unary minus applied to the literal `2147483648`,
        // whose magnitude itself overflows `i32`. Reinterpreting
        // `2147483648u32` as `i32` yields `i32::MIN`, which `neg` then maps
        // back to itself (the two's-complement negation of `INT32_MIN`
        // overflows back to `INT32_MIN`), so the literal still loads the
        // correct value.
        text.parse::<u32>()
            .map(|magnitude| TokenKind::IntLit(magnitude as i32))
            .map_err(|_| (line, format!("integer literal `{text}` out of range")))
    }

    fn lex_ident(&mut self) -> TokenKind {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == b'_') {
            self.bump();
        }
        let text = std::str::from_utf8(&self.src[start..self.pos]).unwrap();
        match text {
            "int" => TokenKind::Int,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "while" => TokenKind::While,
            "for" => TokenKind::For,
            "do" => TokenKind::Do,
            "return" => TokenKind::Return,
            _ => TokenKind::Ident(text.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn lexes_a_small_function() {
        let ks = kinds("int f(int a){ return a+1; }");
        assert_eq!(
            ks,
            vec![
                TokenKind::Int,
                TokenKind::Ident("f".into()),
                TokenKind::LParen,
                TokenKind::Int,
                TokenKind::Ident("a".into()),
                TokenKind::RParen,
                TokenKind::LBrace,
                TokenKind::Return,
                TokenKind::Ident("a".into()),
                TokenKind::Plus,
                TokenKind::IntLit(1),
                TokenKind::Semi,
                TokenKind::RBrace,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn tracks_line_numbers_across_comments() {
        let toks = Lexer::new("int a; // comment\nint b;").tokenize().unwrap();
        let second_int = &toks[3];
        assert_eq!(second_int.kind, TokenKind::Int);
        assert_eq!(second_int.line, 2);
    }

    #[test]
    fn lexes_int32_min_magnitude_as_the_wrapped_bit_pattern() {
        let ks = kinds("2147483648;");
        assert_eq!(ks[0], TokenKind::IntLit(i32::MIN));
    }

    #[test]
    fn rejects_magnitude_overflowing_u32() {
        let err = Lexer::new("4294967296;").tokenize().unwrap_err();
        assert!(err.1.contains("out of range"));
    }

    #[test]
    fn rejects_stray_character() {
        let err = Lexer::new("int a = 1 @ 2;").tokenize().unwrap_err();
        assert_eq!(err.0, 1);
    }
}
