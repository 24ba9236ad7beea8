use thiserror::Error;

/// Tokenizer failure. The tokenizer is a pure classifier: the only way it
/// fails is an unterminated quoted/commented region, since those leave the
/// state machine with no way to know where the next top-level token
/// begins.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenizeError {
    #[error("unterminated string literal starting at byte {start}")]
    UnterminatedString { start: usize },
    #[error("unterminated quoted identifier starting at byte {start}")]
    UnterminatedIdentifier { start: usize },
    #[error("unterminated block comment starting at byte {start}")]
    UnterminatedBlockComment { start: usize },
    #[error("unterminated dollar-quoted body starting at byte {start}")]
    UnterminatedDollarQuote { start: usize },
}
