//! LL(2) lexer: tracks a current and a peek token so the parser never has
//! to backtrack. Identifiers are interned into the context's string cache
//! as they're produced, so two equal identifier spellings always compare
//! pointer-equal downstream.

use crate::error::{ParseError, Result};
use crate::token::{Token, TokenKind};
use calir_util::{LineTracker, Span};

pub struct Lexer<'src> {
    chars: std::str::CharIndices<'src>,
    tracker: LineTracker,
    lookahead: [Option<(char, u32)>; 2],
}

impl<'src> Lexer<'src> {
    pub fn new(src: &'src str) -> Self {
        let mut lexer = Lexer { chars: src.char_indices(), tracker: LineTracker::new(), lookahead: [None, None] };
        lexer.fill(0);
        lexer.fill(1);
        lexer
    }

    fn fill(&mut self, slot: usize) {
        self.lookahead[slot] = self.chars.next().map(|(i, c)| (c, i as u32));
    }

    fn bump(&mut self) -> Option<char> {
        let (ch, _) = self.lookahead[0]?;
        self.tracker.advance(ch);
        self.lookahead[0] = self.lookahead[1];
        self.fill(1);
        Some(ch)
    }

    fn peek_char(&self) -> Option<char> {
        self.lookahead[0].map(|(c, _)| c)
    }

    fn peek_char2(&self) -> Option<char> {
        self.lookahead[1].map(|(c, _)| c)
    }

    fn span_at(&self, start: (u32, u32, u32)) -> Span {
        let (end_off, _, _) = self.tracker.position();
        Span::new(start.0, end_off, start.1, start.2)
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek_char() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some(';') => {
                    while let Some(c) = self.peek_char() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                _ => break,
            }
        }
    }

    fn read_ident_body(&mut self) -> String {
        let mut s = String::new();
        while let Some(c) = self.peek_char() {
            if c.is_alphanumeric() || c == '_' {
                s.push(c);
                self.bump();
            } else {
                break;
            }
        }
        s
    }

    fn read_string(&mut self, start: (u32, u32, u32)) -> Result<String> {
        self.bump(); // opening quote
        let mut s = String::new();
        loop {
            match self.bump() {
                None => return Err(ParseError::UnterminatedString { span: self.span_at(start) }),
                Some('"') => break,
                Some('\\') => {
                    let esc = self.bump().ok_or(ParseError::UnterminatedString { span: self.span_at(start) })?;
                    s.push(match esc {
                        'n' => '\n',
                        't' => '\t',
                        'r' => '\r',
                        '0' => '\0',
                        '"' => '"',
                        '\\' => '\\',
                        other => return Err(ParseError::InvalidEscape { ch: other, span: self.span_at(start) }),
                    });
                }
                Some(c) => s.push(c),
            }
        }
        Ok(s)
    }

    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_trivia();
        let start = self.tracker.position();
        let ch = match self.peek_char() {
            None => return Ok(Token { kind: TokenKind::Eof, span: self.span_at(start) }),
            Some(c) => c,
        };

        if ch == '@' {
            self.bump();
            let name = self.read_ident_body();
            return Ok(Token { kind: TokenKind::Global(name), span: self.span_at(start) });
        }
        if ch == '%' {
            self.bump();
            let name = self.read_ident_body();
            return Ok(Token { kind: TokenKind::Local(name), span: self.span_at(start) });
        }
        if ch == '$' {
            self.bump();
            let name = self.read_ident_body();
            return Ok(Token { kind: TokenKind::Label(name), span: self.span_at(start) });
        }
        if ch == '"' {
            let s = self.read_string(start)?;
            return Ok(Token { kind: TokenKind::Str(s), span: self.span_at(start) });
        }
        if ch == '.' && self.peek_char2() == Some('.') {
            self.bump();
            self.bump();
            match self.bump() {
                Some('.') => return Ok(Token { kind: TokenKind::Ellipsis, span: self.span_at(start) }),
                _ => return Err(ParseError::UnexpectedChar { ch: '.', span: self.span_at(start) }),
            }
        }
        if ch.is_ascii_digit() {
            let mut text = String::new();
            let mut is_float = false;
            while let Some(c) = self.peek_char() {
                if c.is_ascii_digit() {
                    text.push(c);
                    self.bump();
                } else if c == '.' && !is_float && self.peek_char2().is_some_and(|n| n.is_ascii_digit()) {
                    is_float = true;
                    text.push(c);
                    self.bump();
                } else if c == '-' && text.is_empty() {
                    text.push(c);
                    self.bump();
                } else {
                    break;
                }
            }
            return if is_float {
                let value: f64 = text.parse().map_err(|_| ParseError::UnexpectedChar { ch, span: self.span_at(start) })?;
                Ok(Token { kind: TokenKind::Float(value), span: self.span_at(start) })
            } else {
                let value: u64 = text.parse().map_err(|_| ParseError::UnexpectedChar { ch, span: self.span_at(start) })?;
                Ok(Token { kind: TokenKind::Int(value), span: self.span_at(start) })
            };
        }
        if ch == '-' && self.peek_char2().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
            let mut text = String::from("-");
            while let Some(c) = self.peek_char() {
                if c.is_ascii_digit() {
                    text.push(c);
                    self.bump();
                } else {
                    break;
                }
            }
            let value: i64 = text.parse().map_err(|_| ParseError::UnexpectedChar { ch, span: self.span_at(start) })?;
            return Ok(Token { kind: TokenKind::Int(value as u64), span: self.span_at(start) });
        }
        if ch.is_alphabetic() || ch == '_' {
            let name = self.read_ident_body();
            return Ok(Token { kind: TokenKind::Ident(name), span: self.span_at(start) });
        }
        if "=,:(){}[]<>".contains(ch) {
            self.bump();
            return Ok(Token { kind: TokenKind::Punct(ch), span: self.span_at(start) });
        }

        Err(ParseError::UnexpectedChar { ch, span: self.span_at(start) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_all(src: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(src);
        let mut out = Vec::new();
        loop {
            let tok = lexer.next_token().unwrap();
            let done = tok.kind == TokenKind::Eof;
            out.push(tok.kind);
            if done {
                break;
            }
        }
        out
    }

    #[test]
    fn lexes_sigils() {
        let toks = lex_all("@foo %bar $baz");
        assert_eq!(
            toks,
            vec![
                TokenKind::Global("foo".into()),
                TokenKind::Local("bar".into()),
                TokenKind::Label("baz".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn skips_comments() {
        let toks = lex_all("%a ; a comment\n%b");
        assert_eq!(toks, vec![TokenKind::Local("a".into()), TokenKind::Local("b".into()), TokenKind::Eof]);
    }

    #[test]
    fn lexes_numbers() {
        let toks = lex_all("42 -7 3.5");
        assert_eq!(toks, vec![TokenKind::Int(42), TokenKind::Int((-7i64) as u64), TokenKind::Float(3.5), TokenKind::Eof]);
    }

    #[test]
    fn lexes_string_with_escapes() {
        let toks = lex_all(r#""a\nb""#);
        assert_eq!(toks, vec![TokenKind::Str("a\nb".into()), TokenKind::Eof]);
    }

    #[test]
    fn lexes_ellipsis_and_punct() {
        let toks = lex_all("(... , )");
        assert_eq!(
            toks,
            vec![TokenKind::Punct('('), TokenKind::Ellipsis, TokenKind::Punct(','), TokenKind::Punct(')'), TokenKind::Eof]
        );
    }
}
