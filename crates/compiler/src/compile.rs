use crate::dialect::Dialect;
use crate::error::CompileError;

/// Compiles `sql` containing `:name` placeholders into the target
/// `dialect`'s wire form, returning the rewritten text and the ordered
/// list of names encountered (one entry per occurrence, in source order).
///
/// This is a small hand-written state machine, independent of the
/// [`scopeql_core`] tokenizer: a byte-paced walk over `char`s that only
/// needs to know enough about quoting/commenting to avoid treating a `:`
/// inside a string, identifier, dollar-quoted body, or comment as a
/// placeholder.
pub fn compile(sql: &str, dialect: Dialect) -> Result<(String, Vec<String>), CompileError> {
    let chars: Vec<(usize, char)> = sql.char_indices().collect();
    let mut out = String::with_capacity(sql.len());
    let mut names = Vec::new();
    let mut state = State::Query;
    let mut prev: Option<char> = None;
    let mut i = 0usize;

    macro_rules! c_at {
        ($idx:expr) => {
            chars.get($idx).map(|(_, c)| *c)
        };
    }

    while i < chars.len() {
        let (_, ch) = chars[i];
        match &mut state {
            State::Query => {
                if ch == '\'' {
                    out.push(ch);
                    state = State::StringConstant;
                    i += 1;
                } else if ch == '"' {
                    out.push(ch);
                    state = State::QuotedIdent;
                    i += 1;
                } else if ch == '-' && c_at!(i + 1) == Some('-') {
                    out.push_str("--");
                    state = State::LineComment;
                    i += 2;
                } else if ch == '/' && c_at!(i + 1) == Some('*') {
                    out.push_str("/*");
                    state = State::BlockComment(1);
                    i += 2;
                } else if ch == '$' && looks_like_dollar_tag_open(&chars, i) {
                    let tag_end = dollar_tag_end(&chars, i);
                    let tag: String = chars[i..tag_end].iter().map(|(_, c)| *c).collect();
                    out.push_str(&tag);
                    state = State::DollarQuoteLiteral { tag, start: i };
                    i = tag_end;
                } else if ch == ':'
                    && prev != Some(':')
                    && c_at!(i + 1).is_some_and(is_name_start)
                {
                    state = State::ConsumingIdent {
                        start: i,
                        name: String::new(),
                    };
                    i += 1;
                } else {
                    out.push(ch);
                    i += 1;
                }
                prev = Some(ch);
            }
            State::ConsumingIdent { name, .. } => {
                if is_name_continue(ch) {
                    name.push(ch);
                    i += 1;
                } else {
                    let name = std::mem::take(name);
                    flush_name(&mut out, &mut names, name, dialect);
                    prev = None;
                    state = State::Query;
                    // re-process `ch` in Query state without consuming it here.
                }
            }
            State::StringConstant => {
                if ch == '\'' {
                    if c_at!(i + 1) == Some('\'') {
                        out.push_str("''");
                        i += 2;
                    } else {
                        out.push(ch);
                        state = State::Query;
                        prev = Some(ch);
                        i += 1;
                    }
                } else {
                    out.push(ch);
                    i += 1;
                }
            }
            State::QuotedIdent => {
                if ch == '"' {
                    if c_at!(i + 1) == Some('"') {
                        out.push_str("\"\"");
                        i += 2;
                    } else {
                        out.push(ch);
                        state = State::Query;
                        prev = Some(ch);
                        i += 1;
                    }
                } else {
                    out.push(ch);
                    i += 1;
                }
            }
            State::LineComment => {
                out.push(ch);
                i += 1;
                if ch == '\n' {
                    state = State::Query;
                    prev = Some(ch);
                }
            }
            State::BlockComment(depth) => {
                if ch == '*' && c_at!(i + 1) == Some('/') {
                    out.push_str("*/");
                    i += 2;
                    *depth -= 1;
                    if *depth == 0 {
                        state = State::Query;
                        prev = Some('/');
                    }
                } else if ch == '/' && c_at!(i + 1) == Some('*') {
                    out.push_str("/*");
                    i += 2;
                    *depth += 1;
                } else {
                    out.push(ch);
                    i += 1;
                }
            }
            State::DollarQuoteLiteral { tag, .. } => {
                if ch == '$' && matches_tag_at(&chars, i, tag) {
                    out.push_str(tag);
                    i += tag.chars().count();
                    state = State::Query;
                    prev = Some('$');
                } else {
                    out.push(ch);
                    i += 1;
                }
            }
        }
    }

    match state {
        State::ConsumingIdent { name, .. } => {
            flush_name(&mut out, &mut names, name, dialect);
        }
        State::DollarQuoteLiteral { start, .. } => {
            return Err(CompileError::UnterminatedDollarQuote {
                start: chars[start].0,
            });
        }
        State::StringConstant => {
            return Err(CompileError::UnterminatedString {
                start: 0,
            });
        }
        State::QuotedIdent => {
            return Err(CompileError::UnterminatedIdentifier { start: 0 });
        }
        State::BlockComment(_) => {
            return Err(CompileError::UnterminatedBlockComment { start: 0 });
        }
        State::LineComment | State::Query => {}
    }

    Ok((out, names))
}

enum State {
    Query,
    ConsumingIdent { start: usize, name: String },
    StringConstant,
    QuotedIdent,
    LineComment,
    BlockComment(u32),
    DollarQuoteLiteral { tag: String, start: usize },
}

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_name_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.'
}

fn flush_name(out: &mut String, names: &mut Vec<String>, name: String, dialect: Dialect) {
    names.push(name.clone());
    match dialect {
        Dialect::Named => {
            out.push(':');
            out.push_str(&name);
        }
        other => out.push_str(&other.placeholder(names.len())),
    }
}

fn looks_like_dollar_tag_open(chars: &[(usize, char)], i: usize) -> bool {
    dollar_tag_closer(chars, i).is_some()
}

fn dollar_tag_end(chars: &[(usize, char)], i: usize) -> usize {
    dollar_tag_closer(chars, i).expect("checked by looks_like_dollar_tag_open")
}

fn dollar_tag_closer(chars: &[(usize, char)], i: usize) -> Option<usize> {
    let mut j = i + 1;
    while chars.get(j).is_some_and(|(_, c)| c.is_alphanumeric() || *c == '_') {
        j += 1;
    }
    if chars.get(j).map(|(_, c)| *c) == Some('$') {
        Some(j + 1)
    } else {
        None
    }
}

fn matches_tag_at(chars: &[(usize, char)], i: usize, tag: &str) -> bool {
    let tag_chars: Vec<char> = tag.chars().collect();
    for (k, expected) in tag_chars.iter().enumerate() {
        if chars.get(i + k).map(|(_, c)| c) != Some(expected) {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn named_to_dollar() {
        let (sql, names) =
            compile("SELECT * FROM t WHERE a = :a AND b = :b", Dialect::Dollar).unwrap();
        assert_eq!(sql, "SELECT * FROM t WHERE a = $1 AND b = $2");
        assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn named_to_question() {
        let (sql, names) =
            compile("SELECT * FROM t WHERE a = :a AND b = :b", Dialect::Question).unwrap();
        assert_eq!(sql, "SELECT * FROM t WHERE a = ? AND b = ?");
        assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn named_to_at() {
        let (sql, _) = compile("SELECT * FROM t WHERE a = :a", Dialect::At).unwrap();
        assert_eq!(sql, "SELECT * FROM t WHERE a = @p1");
    }

    #[test]
    fn named_round_trip_is_idempotent_up_to_reemission() {
        let sql = "SELECT * FROM t WHERE a = :a";
        let (out, _) = compile(sql, Dialect::Named).unwrap();
        assert_eq!(out, sql);
    }

    #[test]
    fn cast_and_assignment_are_not_placeholders() {
        let (sql, names) = compile("a::int, b := :c", Dialect::Dollar).unwrap();
        assert_eq!(sql, "a::int, b := $1");
        assert_eq!(names, vec!["c".to_string()]);
    }

    #[test]
    fn placeholder_inside_string_is_inert() {
        let (sql, names) = compile("SELECT ':not_a_param' AS lit", Dialect::Dollar).unwrap();
        assert_eq!(sql, "SELECT ':not_a_param' AS lit");
        assert!(names.is_empty());
    }

    #[test]
    fn placeholder_inside_quoted_identifier_is_inert() {
        let (sql, names) = compile(r#"SELECT "col:not_a_param" FROM t"#, Dialect::Dollar).unwrap();
        assert_eq!(sql, r#"SELECT "col:not_a_param" FROM t"#);
        assert!(names.is_empty());
    }

    #[test]
    fn placeholder_inside_line_comment_is_inert() {
        let (sql, names) = compile("SELECT 1 -- :oops\n", Dialect::Dollar).unwrap();
        assert_eq!(sql, "SELECT 1 -- :oops\n");
        assert!(names.is_empty());
    }

    #[test]
    fn placeholder_inside_block_comment_is_inert() {
        let (sql, names) = compile("SELECT 1 /* :oops */", Dialect::Dollar).unwrap();
        assert_eq!(sql, "SELECT 1 /* :oops */");
        assert!(names.is_empty());
    }

    #[test]
    fn placeholder_inside_dollar_quoted_body_is_inert() {
        let (sql, names) = compile("SELECT $$ :oops $$ AS lit", Dialect::Dollar).unwrap();
        assert_eq!(sql, "SELECT $$ :oops $$ AS lit");
        assert!(names.is_empty());
    }

    #[test]
    fn name_at_end_of_input_is_flushed() {
        let (sql, names) = compile("SELECT * FROM t WHERE a = :a", Dialect::Question).unwrap();
        assert_eq!(sql, "SELECT * FROM t WHERE a = ?");
        assert_eq!(names, vec!["a".to_string()]);
    }
}
