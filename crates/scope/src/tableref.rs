use scopeql_core::{Token, TokenInfo, TokenKind};
use scopeql_helpers::canonical_identifier;

/// A table reference discovered in a statement: spec §3 "Table Reference".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub table_raw: String,
    pub table_canonical: String,
    pub alias: String,
}

const RESERVED_BOUNDARY_WORDS: &[&str] = &[
    "ON", "USING", "WHERE", "GROUP", "ORDER", "LIMIT", "OFFSET", "FETCH", "JOIN", "INNER", "LEFT",
    "RIGHT", "FULL", "CROSS", "UNION", "EXCEPT", "INTERSECT", "SET", "FROM", "RETURNING",
];

fn is_word(token: &Token, text: &str) -> bool {
    token.kind == TokenKind::Word && token.text.eq_ignore_ascii_case(text)
}

fn is_reserved_boundary(token: &Token) -> bool {
    token.kind == TokenKind::Word
        && RESERVED_BOUNDARY_WORDS
            .iter()
            .any(|w| token.text.eq_ignore_ascii_case(w))
}

/// True when `token` can start a bare (possibly schema-qualified, possibly
/// quoted) table identifier.
fn is_identifier_start(token: &Token) -> bool {
    matches!(token.kind, TokenKind::Word | TokenKind::Identifier) && !is_reserved_boundary(token)
}

/// Consumes a (possibly dotted, possibly quoted) identifier starting at
/// `tokens[start]`, returning its raw text and the index just past it.
fn read_dotted_identifier(tokens: &[TokenInfo], start: usize) -> (String, usize) {
    let mut raw = tokens[start].token.text.to_string();
    let mut i = start + 1;
    loop {
        let Some(dot) = tokens.get(i) else { break };
        if dot.token.kind == TokenKind::Punctuation && dot.token.text == "." {
            if let Some(next) = tokens.get(i + 1) {
                if matches!(next.token.kind, TokenKind::Word | TokenKind::Identifier) {
                    raw.push('.');
                    raw.push_str(next.token.text);
                    i += 2;
                    continue;
                }
            }
        }
        break;
    }
    (raw, i)
}

/// Reads an optional `[AS] alias` following a table identifier ending at
/// index `after`. Returns the alias (defaulting to the canonical table
/// name) and the index just past whatever was consumed.
fn read_alias(tokens: &[TokenInfo], after: usize, canonical: &str) -> (String, usize) {
    if let Some(t) = tokens.get(after) {
        if is_word(&t.token, "AS") {
            if let Some(alias_tok) = tokens.get(after + 1) {
                if matches!(alias_tok.token.kind, TokenKind::Word | TokenKind::Identifier) {
                    return (alias_tok.token.text.to_string(), after + 2);
                }
            }
        } else if is_identifier_start(&t.token) {
            return (t.token.text.to_string(), after + 1);
        }
    }
    (canonical.to_string(), after)
}

/// Collects table references from a `SELECT` statement's depth-0
/// `FROM`/`JOIN` clauses. Subquery sources (`FROM (`/`JOIN (`) are skipped;
/// they were already handled by the inner recursion. Returns `None` if a
/// `FROM`/`JOIN` is not followed by anything recognizable as a table
/// reference or a subquery, signaling an unknown shape.
pub fn collect_select_refs(tokens: &[TokenInfo]) -> Option<Vec<TableRef>> {
    let mut refs = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        let info = &tokens[i];
        if info.depth == 0 && (is_word(&info.token, "FROM") || is_word(&info.token, "JOIN")) {
            let mut j = i + 1;
            while tokens.get(j).is_some_and(|t| !t.token.is_significant()) {
                j += 1;
            }
            match tokens.get(j) {
                Some(next) if next.token.kind == TokenKind::Punctuation && next.token.text == "(" => {
                    // Subquery source; already rewritten by the inner recursion pass.
                    i = j + 1;
                    continue;
                }
                Some(next) if is_identifier_start(&next.token) => {
                    let (raw, after) = read_dotted_identifier(tokens, j);
                    let canonical = canonical_identifier(&raw);
                    let (alias, after) = read_alias(tokens, after, &canonical);
                    refs.push(TableRef {
                        table_raw: raw,
                        table_canonical: canonical,
                        alias,
                    });
                    i = after;
                    continue;
                }
                _ => return None,
            }
        }
        i += 1;
    }
    Some(refs)
}

/// Collects the single table reference for an `UPDATE` statement: the
/// token following the `UPDATE` keyword.
pub fn collect_update_ref(tokens: &[TokenInfo]) -> Option<Vec<TableRef>> {
    let Some(update_idx) = tokens
        .iter()
        .position(|t| t.depth == 0 && is_word(&t.token, "UPDATE"))
    else {
        return Some(Vec::new());
    };
    let mut j = update_idx + 1;
    while tokens.get(j).is_some_and(|t| !t.token.is_significant()) {
        j += 1;
    }
    match tokens.get(j) {
        Some(next) if is_identifier_start(&next.token) => {
            let (raw, after) = read_dotted_identifier(tokens, j);
            let canonical = canonical_identifier(&raw);
            let (alias, _) = read_alias(tokens, after, &canonical);
            Some(vec![TableRef {
                table_raw: raw,
                table_canonical: canonical,
                alias,
            }])
        }
        _ => None,
    }
}

/// Collects the single table reference for a `DELETE` statement: the token
/// following the first `FROM` after `DELETE`. A `DELETE` with no `FROM`
/// collects no refs (spec §8 boundary behavior).
pub fn collect_delete_ref(tokens: &[TokenInfo]) -> Option<Vec<TableRef>> {
    let Some(from_idx) = tokens
        .iter()
        .position(|t| t.depth == 0 && is_word(&t.token, "FROM"))
    else {
        return Some(Vec::new());
    };
    let mut j = from_idx + 1;
    while tokens.get(j).is_some_and(|t| !t.token.is_significant()) {
        j += 1;
    }
    match tokens.get(j) {
        Some(next) if is_identifier_start(&next.token) => {
            let (raw, after) = read_dotted_identifier(tokens, j);
            let canonical = canonical_identifier(&raw);
            let (alias, _) = read_alias(tokens, after, &canonical);
            Some(vec![TableRef {
                table_raw: raw,
                table_canonical: canonical,
                alias,
            }])
        }
        _ => None,
    }
}
