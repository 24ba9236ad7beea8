use std::hash::BuildHasherDefault;

/// An [`indexmap::IndexMap`] keyed with the same fast, non-cryptographic
/// hasher used throughout scopeql. Iteration order matches insertion order,
/// which matters for deterministic audit output.
pub type IndexMap<K, V> = indexmap::IndexMap<K, V, BuildHasherDefault<ahash::AHasher>>;
pub type IndexSet<V> = indexmap::IndexSet<V, BuildHasherDefault<ahash::AHasher>>;

/// Blanket builder-style configuration helper: `Thing::default().config(|t| t.x = 1)`.
pub trait Config: Sized {
    fn config(mut self, f: impl FnOnce(&mut Self)) -> Self {
        f(&mut self);
        self
    }
}

impl<T> Config for T {}

/// Lowercases and strips one layer of `"` / `` ` `` / `[ ]` quoting from an
/// identifier, then takes the last `.`-separated segment. Used to derive a
/// canonical table name from a possibly schema-qualified, possibly quoted
/// SQL identifier.
pub fn canonical_identifier(raw: &str) -> String {
    let trimmed = raw.trim();
    let last_segment = trimmed.rsplit('.').next().unwrap_or(trimmed);
    strip_identifier_quotes(last_segment).to_lowercase()
}

fn strip_identifier_quotes(raw: &str) -> &str {
    let trimmed = raw.trim();
    let pairs: [(char, char); 3] = [('"', '"'), ('`', '`'), ('[', ']')];
    for (open, close) in pairs {
        if let Some(stripped) = trimmed.strip_prefix(open) {
            if let Some(inner) = stripped.strip_suffix(close) {
                return inner;
            }
        }
    }
    trimmed
}

/// Converts `CamelCase` / `camelCase` field names to `snake_case`, the
/// fallback column-name convention for the record binder's field mapper.
pub fn to_snake_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len() + 4);
    let mut prev_lower_or_digit = false;
    for ch in field.chars() {
        if ch.is_uppercase() {
            if prev_lower_or_digit {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
            prev_lower_or_digit = false;
        } else {
            out.push(ch);
            prev_lower_or_digit = ch.is_alphanumeric();
        }
    }
    out
}
