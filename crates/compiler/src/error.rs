use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("unterminated string literal starting at byte {start}")]
    UnterminatedString { start: usize },
    #[error("unterminated quoted identifier starting at byte {start}")]
    UnterminatedIdentifier { start: usize },
    #[error("unterminated block comment starting at byte {start}")]
    UnterminatedBlockComment { start: usize },
    #[error("unterminated dollar-quoted body starting at byte {start}")]
    UnterminatedDollarQuote { start: usize },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BindError {
    #[error("could not find name {0:?} in the supplied arguments")]
    UnknownName(String),
    #[error("cannot bind an empty sequence to a query with named parameters")]
    EmptySequence,
}
