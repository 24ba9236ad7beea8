use std::cell::Cell;

use scopeql_compiler::Dialect;

use crate::context::CallContext;

/// Infers the placeholder dialect for a call: the driver-name hint on the
/// context wins when present, otherwise the query text is inspected for
/// existing `$N` / `@pN` placeholders. Only `QUESTION | DOLLAR | AT` are
/// produced; a query with no hint and no recognizable placeholder defaults
/// to `QUESTION`, per spec §4.4.
pub fn detect(ctx: &CallContext, query: &str) -> Dialect {
    if let Some(hint) = &ctx.driver_hint {
        if let Some(dialect) = Dialect::from_driver_hint(hint) {
            return dialect;
        }
    }
    if max_numbered_index(query, b'$', &[]).is_some() {
        Dialect::Dollar
    } else if max_numbered_index(query, b'@', b"p").is_some() {
        Dialect::At
    } else {
        Dialect::Question
    }
}

/// Largest `N` found in occurrences of `prefix_byte` + `infix` + digits
/// (e.g. `$` + `` + digits for `$12`, `@` + `p` + digits for `@p3`), or
/// `None` if the pattern never occurs.
fn max_numbered_index(text: &str, prefix_byte: u8, infix: &[u8]) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut best: Option<usize> = None;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == prefix_byte && bytes[i + 1..].starts_with(infix) {
            let mut j = i + 1 + infix.len();
            let digit_start = j;
            while j < bytes.len() && bytes[j].is_ascii_digit() {
                j += 1;
            }
            if j > digit_start {
                if let Ok(n) = text[digit_start..j].parse::<usize>() {
                    best = Some(best.map_or(n, |b| b.max(n)));
                }
                i = j;
                continue;
            }
        }
        i += 1;
    }
    best
}

/// Issues fresh placeholder strings for one rewrite pass, numbered so they
/// never collide with placeholders already present in the query. A single
/// builder is shared across an entire rewrite call (all statement segments
/// and nested subqueries) so numbering stays contiguous.
pub struct PlaceholderBuilder {
    dialect: Dialect,
    counter: Cell<usize>,
}

impl PlaceholderBuilder {
    pub fn new(dialect: Dialect, query: &str, starting_arg_count: usize) -> Self {
        let existing_max = match dialect {
            Dialect::Dollar => max_numbered_index(query, b'$', &[]).unwrap_or(0),
            Dialect::At => max_numbered_index(query, b'@', b"p").unwrap_or(0),
            _ => 0,
        };
        Self {
            dialect,
            counter: Cell::new(starting_arg_count.max(existing_max)),
        }
    }

    /// Returns the next placeholder string, advancing the internal counter
    /// for numbered dialects. `?` dialects always return `"?"`; the caller
    /// is responsible for working out its positional index separately.
    pub fn next_placeholder(&self) -> String {
        match self.dialect {
            Dialect::Question | Dialect::Unknown => "?".to_string(),
            Dialect::Dollar => {
                let n = self.counter.get() + 1;
                self.counter.set(n);
                format!("${n}")
            }
            Dialect::At => {
                let n = self.counter.get() + 1;
                self.counter.set(n);
                format!("@p{n}")
            }
            Dialect::Named => unreachable!("the rewriter never targets the NAMED dialect"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_prefers_driver_hint() {
        let ctx = CallContext::new().with_driver_hint("postgres");
        assert_eq!(detect(&ctx, "SELECT 1"), Dialect::Dollar);
    }

    #[test]
    fn detect_falls_back_to_dollar_pattern() {
        let ctx = CallContext::new();
        assert_eq!(detect(&ctx, "SELECT * FROM t WHERE a = $1"), Dialect::Dollar);
    }

    #[test]
    fn detect_falls_back_to_at_pattern() {
        let ctx = CallContext::new();
        assert_eq!(detect(&ctx, "SELECT * FROM t WHERE a = @p1"), Dialect::At);
    }

    #[test]
    fn detect_defaults_to_question() {
        let ctx = CallContext::new();
        assert_eq!(detect(&ctx, "SELECT * FROM t WHERE a = ?"), Dialect::Question);
    }

    #[test]
    fn builder_seeds_counter_from_existing_max() {
        let builder = PlaceholderBuilder::new(Dialect::Dollar, "SELECT $1, $3", 0);
        assert_eq!(builder.next_placeholder(), "$4");
        assert_eq!(builder.next_placeholder(), "$5");
    }

    #[test]
    fn builder_seeds_counter_from_arg_count_when_larger() {
        let builder = PlaceholderBuilder::new(Dialect::Dollar, "SELECT $1", 5);
        assert_eq!(builder.next_placeholder(), "$6");
    }

    #[test]
    fn question_builder_always_emits_bare_mark() {
        let builder = PlaceholderBuilder::new(Dialect::Question, "SELECT ?", 0);
        assert_eq!(builder.next_placeholder(), "?");
        assert_eq!(builder.next_placeholder(), "?");
    }
}
