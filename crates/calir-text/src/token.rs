//! Token kinds. Keywords (opcode mnemonics, type names, ICmp predicates)
//! are not a separate lexical class — they come back as `Ident` and the
//! parser matches their text contextually, the same way the grammar
//! itself treats them as ordinary words that only mean something in
//! certain grammar positions.

use calir_util::Span;

#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    /// `@name`
    Global(String),
    /// `%name`
    Local(String),
    /// `$name`
    Label(String),
    Ident(String),
    Int(u64),
    Float(f64),
    Str(String),
    /// One of `= , : ( ) { } [ ] < >`
    Punct(char),
    Ellipsis,
    Eof,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}
