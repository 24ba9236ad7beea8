//! Dialect-configurable SQL tokenizer. Converts SQL text into a stream of
//! typed lexemes without consulting SQL semantics; everything that needs to
//! reason about statement shape (the named-parameter compiler, the
//! resource-scope rewriter) is built on top of this crate, not inside it.

mod config;
mod error;
mod token;
mod tokenizer;

pub use config::TokenizerConfig;
pub use error::TokenizeError;
pub use token::{with_depth, Token, TokenInfo, TokenKind};
pub use tokenizer::tokenize;
