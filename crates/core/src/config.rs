use scopeql_helpers::Config;

/// Toggles the tokenizer's recognition of dialect-specific lexemes. Every
/// field defaults to the ANSI-ish common denominator; dialect front ends
/// flip on what they need rather than selecting from a closed list of
/// dialect enums, so a caller can describe an arbitrary mix (e.g. Postgres
/// dollar-quoting with MySQL backtick identifiers, for a proxy that speaks
/// both).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenizerConfig {
    /// Recognize bare `?` as a dedicated placeholder token.
    pub question_mark: bool,
    /// Recognize `$1`, `$2`, ... as a dedicated placeholder token.
    pub dollar_number: bool,
    /// Recognize `@word` as a dedicated token (SQL Server named params).
    pub at_word: bool,
    /// Recognize `:word` as a dedicated token, distinct from `::` and `:=`.
    pub colon_word: bool,
    /// Treat `# ... \n` as a line comment in addition to `-- ...`.
    pub hash_comment: bool,
    /// Track nesting depth inside `/* ... */` comments instead of closing
    /// at the first `*/`.
    pub nested_block_comment: bool,
    /// Recognize Postgres `$tag$ ... $tag$` dollar-quoted bodies.
    pub dollar_quote: bool,
    /// Recognize `"..."` identifier quoting.
    pub double_quote_identifiers: bool,
    /// Recognize `` `...` `` identifier quoting (MySQL).
    pub backtick_identifiers: bool,
    /// Recognize `[...]` identifier quoting (SQL Server).
    pub bracket_identifiers: bool,
    /// A `\` immediately before a `'` suppresses closing the string (MySQL
    /// style). When false, only the standard `''` doubled-quote escape
    /// applies.
    pub backslash_escapes: bool,
    /// Recognize `0x1F` / `x'1F'` hex numeric literals.
    pub hex_number: bool,
    /// Recognize `b'0101'` binary numeric literals.
    pub binary_number: bool,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            question_mark: true,
            dollar_number: false,
            at_word: false,
            colon_word: true,
            hash_comment: false,
            nested_block_comment: false,
            dollar_quote: false,
            double_quote_identifiers: true,
            backtick_identifiers: false,
            bracket_identifiers: false,
            backslash_escapes: false,
            hex_number: false,
            binary_number: false,
        }
    }
}

impl TokenizerConfig {
    /// Postgres / CockroachDB flavored configuration: `$N` placeholders,
    /// dollar-quoted bodies, no backslash escapes by default.
    pub fn postgres() -> Self {
        Self::default().config(|c| {
            c.dollar_number = true;
            c.dollar_quote = true;
        })
    }

    /// MySQL flavored configuration: backtick identifiers, `#` comments,
    /// backslash escapes.
    pub fn mysql() -> Self {
        Self::default().config(|c| {
            c.backtick_identifiers = true;
            c.hash_comment = true;
            c.backslash_escapes = true;
        })
    }

    /// SQL Server flavored configuration: bracket identifiers, `@p1` style
    /// at-words.
    pub fn mssql() -> Self {
        Self::default().config(|c| {
            c.bracket_identifiers = true;
            c.at_word = true;
        })
    }
}
