use fancy_regex::Regex;
use std::sync::OnceLock;

/// Duplicates a single `VALUES (...)` group `count` times, for binding a
/// homogeneous sequence of `count` records to one `INSERT ... VALUES (...)`
/// statement. `sql` is expected to already have had its named placeholders
/// compiled to the target dialect (see [`crate::compile::compile`]).
///
/// If the group or its matching closing parenthesis cannot be located, the
/// input is returned unchanged, per spec.
pub fn expand_values(sql: &str, count: usize) -> String {
    if count <= 1 {
        return sql.to_string();
    }
    let Some((open_idx, close_idx)) = locate_values_group(sql) else {
        return sql.to_string();
    };
    let group = &sql[open_idx..=close_idx];
    let mut out = String::with_capacity(sql.len() + group.len() * (count - 1) + count);
    out.push_str(&sql[..=close_idx]);
    for _ in 1..count {
        out.push(',');
        out.push_str(group);
    }
    out.push_str(&sql[close_idx + 1..]);
    out
}

fn values_opener() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(?:\)|AS\s*\(|FROM\s*\()\s*VALUES\s*\(").expect("valid literal regex")
    })
}

/// Returns the byte indices of the opening and matching closing parenthesis
/// of the first `VALUES (...)` group in `sql`.
fn locate_values_group(sql: &str) -> Option<(usize, usize)> {
    let m = values_opener().find(sql).ok().flatten()?;
    let open_idx = m.end() - 1;
    debug_assert_eq!(&sql[open_idx..open_idx + 1], "(");
    let close_idx = matching_close_paren(sql, open_idx)?;
    Some((open_idx, close_idx))
}

/// Byte index of the `)` matching the `(` at `open_idx`, skipping parens
/// that occur inside single-quoted string literals.
fn matching_close_paren(sql: &str, open_idx: usize) -> Option<usize> {
    let mut depth = 0i32;
    let mut in_string = false;
    let bytes = sql.as_bytes();
    let mut i = open_idx;
    while i < bytes.len() {
        match bytes[i] {
            b'\'' => {
                if in_string && bytes.get(i + 1) == Some(&b'\'') {
                    i += 1; // doubled '' escape
                } else {
                    in_string = !in_string;
                }
            }
            b'(' if !in_string => depth += 1,
            b')' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}
