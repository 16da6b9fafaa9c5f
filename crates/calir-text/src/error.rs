use calir_util::Span;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum ParseError {
    #[error("{span}: unexpected character {ch:?}")]
    UnexpectedChar { ch: char, span: Span },

    #[error("{span}: unterminated string literal")]
    UnterminatedString { span: Span },

    #[error("{span}: invalid escape sequence '\\{ch}'")]
    InvalidEscape { ch: char, span: Span },

    #[error("{span}: expected {expected}, found {found}")]
    Unexpected { expected: String, found: String, span: Span },

    #[error("{span}: unknown type keyword '{name}'")]
    UnknownType { name: String, span: Span },

    #[error("{span}: duplicate label '${name}'")]
    DuplicateLabel { name: String, span: Span },

    #[error("{span}: duplicate value definition '%{name}'")]
    DuplicateValue { name: String, span: Span },

    #[error("{span}: reference to undefined block '${name}'")]
    UndefinedBlock { name: String, span: Span },

    #[error("{span}: reference to undefined value '%{name}'")]
    UndefinedValue { name: String, span: Span },

    #[error("{span}: reference to undefined global '@{name}'")]
    UndefinedGlobal { name: String, span: Span },

    #[error("{1}: {0}")]
    Ir(calir_ir::IrError, Span),
}

pub type Result<T> = std::result::Result<T, ParseError>;
