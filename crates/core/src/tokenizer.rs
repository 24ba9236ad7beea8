use crate::config::TokenizerConfig;
use crate::error::TokenizeError;
use crate::token::{Token, TokenKind};

/// Classifies `sql` into a stream of [`Token`]s according to `config`.
/// Restartable and free of global state: calling this twice with the same
/// arguments always produces the same result.
pub fn tokenize<'a>(
    sql: &'a str,
    config: &TokenizerConfig,
) -> Result<Vec<Token<'a>>, TokenizeError> {
    Cursor::new(sql, config).run()
}

struct Cursor<'a> {
    src: &'a str,
    chars: Vec<(usize, char)>,
    pos: usize,
    config: &'a TokenizerConfig,
    tokens: Vec<Token<'a>>,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str, config: &'a TokenizerConfig) -> Self {
        Self {
            src,
            chars: src.char_indices().collect(),
            pos: 0,
            config,
            tokens: Vec::new(),
        }
    }

    fn byte_len(&self) -> usize {
        self.src.len()
    }

    fn at(&self, idx: usize) -> Option<(usize, char)> {
        self.chars.get(idx).copied()
    }

    fn byte_at(&self, idx: usize) -> usize {
        self.at(idx).map(|(b, _)| b).unwrap_or(self.byte_len())
    }

    fn push(&mut self, kind: TokenKind, start_idx: usize, end_idx: usize) {
        let start = self.byte_at(start_idx);
        let end = self.byte_at(end_idx);
        self.tokens.push(Token {
            kind,
            text: &self.src[start..end],
            byte_start: start,
            byte_end: end,
        });
    }

    fn run(mut self) -> Result<Vec<Token<'a>>, TokenizeError> {
        while self.pos < self.chars.len() {
            self.step()?;
        }
        Ok(self.tokens)
    }

    fn step(&mut self) -> Result<(), TokenizeError> {
        let (_, c) = self.at(self.pos).expect("loop guard");

        if c.is_whitespace() {
            return self.consume_whitespace();
        }
        if c == '-' && self.peek_char(1) == Some('-') {
            return self.consume_line_comment(2);
        }
        if self.config.hash_comment && c == '#' {
            return self.consume_line_comment(1);
        }
        if c == '/' && self.peek_char(1) == Some('*') {
            return self.consume_block_comment();
        }
        if c == '\'' {
            return self.consume_string_literal();
        }
        if self.config.double_quote_identifiers && c == '"' {
            return self.consume_quoted_identifier('"', '"');
        }
        if self.config.backtick_identifiers && c == '`' {
            return self.consume_quoted_identifier('`', '`');
        }
        if self.config.bracket_identifiers && c == '[' {
            return self.consume_quoted_identifier('[', ']');
        }
        if c == '$' {
            return self.consume_dollar();
        }
        if c.is_ascii_digit() {
            return self.consume_number();
        }
        if self.config.binary_number && matches!(c, 'b' | 'B') && self.peek_char(1) == Some('\'') {
            return self.consume_binary_literal();
        }
        if c == ':' {
            return self.consume_colon();
        }
        if self.config.at_word && c == '@' {
            return self.consume_at_word();
        }
        if self.config.question_mark && c == '?' {
            self.push(TokenKind::QuestionMark, self.pos, self.pos + 1);
            self.pos += 1;
            return Ok(());
        }
        if c == ';' {
            self.push(TokenKind::Semicolon, self.pos, self.pos + 1);
            self.pos += 1;
            return Ok(());
        }
        if is_ident_start(c) {
            return self.consume_word();
        }
        self.push(TokenKind::Punctuation, self.pos, self.pos + 1);
        self.pos += 1;
        Ok(())
    }

    fn peek_char(&self, ahead: usize) -> Option<char> {
        self.at(self.pos + ahead).map(|(_, c)| c)
    }

    fn consume_whitespace(&mut self) -> Result<(), TokenizeError> {
        let start = self.pos;
        while self.peek_char(0).is_some_and(|c| c.is_whitespace()) {
            self.pos += 1;
        }
        self.push(TokenKind::Whitespace, start, self.pos);
        Ok(())
    }

    fn consume_line_comment(&mut self, marker_len: usize) -> Result<(), TokenizeError> {
        let start = self.pos;
        self.pos += marker_len;
        while self.peek_char(0).is_some_and(|c| c != '\n') {
            self.pos += 1;
        }
        if self.peek_char(0) == Some('\n') {
            self.pos += 1;
        }
        self.push(TokenKind::LineComment, start, self.pos);
        Ok(())
    }

    fn consume_block_comment(&mut self) -> Result<(), TokenizeError> {
        let start = self.pos;
        self.pos += 2; // "/*"
        let mut depth = 1u32;
        loop {
            match (self.peek_char(0), self.peek_char(1)) {
                (None, _) => {
                    return Err(TokenizeError::UnterminatedBlockComment {
                        start: self.byte_at(start),
                    });
                }
                (Some('*'), Some('/')) => {
                    self.pos += 2;
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                (Some('/'), Some('*')) if self.config.nested_block_comment => {
                    self.pos += 2;
                    depth += 1;
                }
                _ => self.pos += 1,
            }
        }
        self.push(TokenKind::BlockComment, start, self.pos);
        Ok(())
    }

    fn consume_string_literal(&mut self) -> Result<(), TokenizeError> {
        let start = self.pos;
        self.pos += 1; // opening '
        loop {
            match self.peek_char(0) {
                None => {
                    return Err(TokenizeError::UnterminatedString {
                        start: self.byte_at(start),
                    });
                }
                Some('\'') => {
                    let prev_is_backslash = self.pos > 0
                        && self.config.backslash_escapes
                        && self.at(self.pos - 1).map(|(_, c)| c) == Some('\\');
                    if prev_is_backslash {
                        self.pos += 1;
                        continue;
                    }
                    if self.peek_char(1) == Some('\'') {
                        // doubled '' escape: stays inside the literal.
                        self.pos += 2;
                        continue;
                    }
                    self.pos += 1; // closing '
                    break;
                }
                Some('\\') if self.config.backslash_escapes => {
                    self.pos += 2; // skip escaped char, including another backslash
                }
                Some(_) => self.pos += 1,
            }
        }
        self.push(TokenKind::StringLiteral, start, self.pos);
        Ok(())
    }

    fn consume_quoted_identifier(&mut self, _open: char, close: char) -> Result<(), TokenizeError> {
        let start = self.pos;
        self.pos += 1;
        loop {
            match self.peek_char(0) {
                None => {
                    return Err(TokenizeError::UnterminatedIdentifier {
                        start: self.byte_at(start),
                    });
                }
                Some(c) if c == close => {
                    if self.peek_char(1) == Some(close) {
                        // doubled closing-quote escape, stays inside.
                        self.pos += 2;
                        continue;
                    }
                    self.pos += 1;
                    break;
                }
                Some(_) => self.pos += 1,
            }
        }
        self.push(TokenKind::Identifier, start, self.pos);
        Ok(())
    }

    fn consume_dollar(&mut self) -> Result<(), TokenizeError> {
        let start = self.pos;
        if self.config.dollar_quote {
            if let Some(tag_end) = self.find_dollar_tag_close(self.pos) {
                let tag_len_idx = tag_end; // index just past the second '$' of the opening tag
                let opening = self.slice_idx(start, tag_len_idx);
                if let Some(close_idx) = self.find_matching_dollar_tag(tag_len_idx, opening) {
                    self.pos = close_idx;
                    self.push(TokenKind::DollarQuotedBody, start, self.pos);
                    return Ok(());
                }
                return Err(TokenizeError::UnterminatedDollarQuote {
                    start: self.byte_at(start),
                });
            }
        }
        if self.config.dollar_number && self.peek_char(1).is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
            while self.peek_char(0).is_some_and(|c| c.is_ascii_digit()) {
                self.pos += 1;
            }
            self.push(TokenKind::DollarNumber, start, self.pos);
            return Ok(());
        }
        self.push(TokenKind::Punctuation, start, start + 1);
        self.pos = start + 1;
        Ok(())
    }

    /// Looks for `$tag$` starting at `idx` (which points at the first `$`).
    /// Returns the char index just past the closing `$` of the opening tag
    /// if `tag` is made entirely of identifier characters (possibly empty).
    fn find_dollar_tag_close(&self, idx: usize) -> Option<usize> {
        let mut j = idx + 1;
        while self.at(j).is_some_and(|(_, c)| is_ident_continue(c)) {
            j += 1;
        }
        if self.at(j).map(|(_, c)| c) == Some('$') {
            Some(j + 1)
        } else {
            None
        }
    }

    fn find_matching_dollar_tag(&self, from_idx: usize, tag: &str) -> Option<usize> {
        let mut j = from_idx;
        while j < self.chars.len() {
            if self.at(j).map(|(_, c)| c) == Some('$') {
                if let Some(candidate_end) = self.find_dollar_tag_close(j) {
                    let candidate = self.slice_idx(j, candidate_end);
                    if candidate == tag {
                        return Some(candidate_end);
                    }
                }
            }
            j += 1;
        }
        None
    }

    fn slice_idx(&self, from_idx: usize, to_idx: usize) -> &'a str {
        &self.src[self.byte_at(from_idx)..self.byte_at(to_idx)]
    }

    fn consume_number(&mut self) -> Result<(), TokenizeError> {
        let start = self.pos;
        if self.config.hex_number
            && self.peek_char(0) == Some('0')
            && matches!(self.peek_char(1), Some('x') | Some('X'))
        {
            self.pos += 2;
            while self.peek_char(0).is_some_and(|c| c.is_ascii_hexdigit()) {
                self.pos += 1;
            }
            self.push(TokenKind::Number, start, self.pos);
            return Ok(());
        }
        while self.peek_char(0).is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        if self.peek_char(0) == Some('.') && self.peek_char(1).is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
            while self.peek_char(0).is_some_and(|c| c.is_ascii_digit()) {
                self.pos += 1;
            }
        }
        if matches!(self.peek_char(0), Some('e') | Some('E'))
            && (self.peek_char(1).is_some_and(|c| c.is_ascii_digit())
                || (matches!(self.peek_char(1), Some('+') | Some('-'))
                    && self.peek_char(2).is_some_and(|c| c.is_ascii_digit())))
        {
            self.pos += 1;
            if matches!(self.peek_char(0), Some('+') | Some('-')) {
                self.pos += 1;
            }
            while self.peek_char(0).is_some_and(|c| c.is_ascii_digit()) {
                self.pos += 1;
            }
        }
        self.push(TokenKind::Number, start, self.pos);
        Ok(())
    }

    /// Consumes a MySQL-style `b'0101'` binary literal as a single `Number`
    /// token, called only once `config.binary_number` and the `b'` prefix
    /// have already been confirmed by the caller.
    fn consume_binary_literal(&mut self) -> Result<(), TokenizeError> {
        let start = self.pos;
        self.pos += 2; // "b'" / "B'"
        while self.peek_char(0).is_some_and(|c| c == '0' || c == '1') {
            self.pos += 1;
        }
        if self.peek_char(0) != Some('\'') {
            return Err(TokenizeError::UnterminatedString {
                start: self.byte_at(start),
            });
        }
        self.pos += 1;
        self.push(TokenKind::Number, start, self.pos);
        Ok(())
    }

    fn consume_colon(&mut self) -> Result<(), TokenizeError> {
        let start = self.pos;
        if self.peek_char(1) == Some(':') {
            self.pos += 2;
            self.push(TokenKind::Punctuation, start, self.pos);
            return Ok(());
        }
        if self.peek_char(1) == Some('=') {
            self.pos += 2;
            self.push(TokenKind::Punctuation, start, self.pos);
            return Ok(());
        }
        if self.config.colon_word && self.peek_char(1).is_some_and(is_ident_start) {
            self.pos += 1;
            while self.peek_char(0).is_some_and(is_placeholder_name_continue) {
                self.pos += 1;
            }
            self.push(TokenKind::ColonWord, start, self.pos);
            return Ok(());
        }
        self.pos += 1;
        self.push(TokenKind::Punctuation, start, self.pos);
        Ok(())
    }

    fn consume_at_word(&mut self) -> Result<(), TokenizeError> {
        let start = self.pos;
        if self.peek_char(1).is_some_and(is_ident_start) {
            self.pos += 1;
            while self.peek_char(0).is_some_and(is_ident_continue) {
                self.pos += 1;
            }
            self.push(TokenKind::AtWord, start, self.pos);
            return Ok(());
        }
        self.pos += 1;
        self.push(TokenKind::Punctuation, start, self.pos);
        Ok(())
    }

    fn consume_word(&mut self) -> Result<(), TokenizeError> {
        let start = self.pos;
        self.pos += 1;
        while self.peek_char(0).is_some_and(is_ident_continue) {
            self.pos += 1;
        }
        self.push(TokenKind::Word, start, self.pos);
        Ok(())
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// The named-placeholder identifier class from spec §4.2: letters, digits,
/// underscore, and dot (for `:record.field`-style paths).
fn is_placeholder_name_continue(c: char) -> bool {
    is_ident_continue(c) || c == '.'
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(sql: &str, config: &TokenizerConfig) -> Vec<(TokenKind, String)> {
        tokenize(sql, config)
            .unwrap()
            .into_iter()
            .map(|t| (t.kind, t.text.to_string()))
            .collect()
    }

    #[test]
    fn reproduces_input_exactly() {
        let config = TokenizerConfig::postgres();
        let sql = "SELECT * FROM t WHERE a = :a -- trailing\n AND b = 'x''y'";
        let tokens = tokenize(sql, &config).unwrap();
        let rebuilt: String = tokens.iter().map(|t| t.text).collect();
        assert_eq!(rebuilt, sql);
    }

    #[test]
    fn colon_word_vs_cast_vs_assign() {
        let config = TokenizerConfig::postgres();
        let sql = "a::int := :name";
        let ks = kinds(sql, &config);
        assert_eq!(
            ks,
            vec![
                (TokenKind::Word, "a".to_string()),
                (TokenKind::Punctuation, "::".to_string()),
                (TokenKind::Word, "int".to_string()),
                (TokenKind::Whitespace, " ".to_string()),
                (TokenKind::Punctuation, ":=".to_string()),
                (TokenKind::Whitespace, " ".to_string()),
                (TokenKind::ColonWord, ":name".to_string()),
            ]
        );
    }

    #[test]
    fn string_literal_with_doubled_quote() {
        let config = TokenizerConfig::default();
        let sql = "'it''s'";
        let tokens = tokenize(sql, &config).unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::StringLiteral);
        assert_eq!(tokens[0].text, sql);
    }

    #[test]
    fn dollar_quoted_body_is_one_token() {
        let config = TokenizerConfig::postgres();
        let sql = "$$ a :b string with '$1' inside $$";
        let tokens = tokenize(sql, &config).unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::DollarQuotedBody);
    }

    #[test]
    fn dollar_quote_with_tag() {
        let config = TokenizerConfig::postgres();
        let sql = "$tag$ :placeholder is inert here $tag$";
        let tokens = tokenize(sql, &config).unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::DollarQuotedBody);
        assert_eq!(tokens[0].text, sql);
    }

    #[test]
    fn dollar_number_placeholder() {
        let config = TokenizerConfig::postgres();
        let tokens = tokenize("$12", &config).unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::DollarNumber);
        assert_eq!(tokens[0].text, "$12");
    }

    #[test]
    fn binary_literal_is_one_token_when_enabled() {
        let mut config = TokenizerConfig::default();
        config.binary_number = true;
        let tokens = tokenize("b'0101'", &config).unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Number);
        assert_eq!(tokens[0].text, "b'0101'");
    }

    #[test]
    fn binary_literal_disabled_tokenizes_as_word_and_string() {
        let config = TokenizerConfig::default();
        let ks = kinds("b'0101'", &config);
        assert_eq!(
            ks,
            vec![
                (TokenKind::Word, "b".to_string()),
                (TokenKind::StringLiteral, "'0101'".to_string()),
            ]
        );
    }

    #[test]
    fn block_comment_nesting() {
        let mut config = TokenizerConfig::default();
        config.nested_block_comment = true;
        let sql = "/* outer /* inner */ still-outer */";
        let tokens = tokenize(sql, &config).unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::BlockComment);
        assert_eq!(tokens[0].text, sql);
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let config = TokenizerConfig::default();
        assert!(matches!(
            tokenize("SELECT 'oops", &config),
            Err(TokenizeError::UnterminatedString { .. })
        ));
    }

    #[test]
    fn unicode_identifier_words() {
        let config = TokenizerConfig::default();
        let tokens = tokenize("café", &config).unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Word);
        assert_eq!(tokens[0].text, "café");
    }
}
