use std::ops::Range;

use scopeql_compiler::Dialect;
use scopeql_core::{tokenize, Token, TokenInfo, TokenKind, TokenizerConfig};
use scopeql_helpers::Config;

use crate::context::CallContext;
use crate::error::{DenyCode, ScopeError};
use crate::placeholder::PlaceholderBuilder;
use crate::rule::ScopeRegistry;
use crate::tableref::{collect_delete_ref, collect_select_refs, collect_update_ref, TableRef};

/// A permissive tokenizer configuration covering every placeholder and
/// identifier-quoting convention the rewriter might see; it only needs to
/// classify shape, not validate dialect-specific syntax.
fn scan_config() -> TokenizerConfig {
    TokenizerConfig::default().config(|c| {
        c.dollar_number = true;
        c.at_word = true;
        c.backtick_identifiers = true;
        c.bracket_identifiers = true;
        c.nested_block_comment = true;
    })
}

fn tokens_with_depth(text: &str) -> Vec<TokenInfo<'_>> {
    let tokens = tokenize(text, &scan_config()).unwrap_or_default();
    scopeql_core::with_depth(tokens)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementType {
    Select,
    Update,
    Delete,
    With,
    Other,
}

impl StatementType {
    pub fn as_str(self) -> &'static str {
        match self {
            StatementType::Select => "SELECT",
            StatementType::Update => "UPDATE",
            StatementType::Delete => "DELETE",
            StatementType::With => "WITH",
            StatementType::Other => "OTHER",
        }
    }
}

fn first_significant(tokens: &[TokenInfo]) -> Option<&Token> {
    tokens.iter().map(|t| &t.token).find(|t| t.is_significant())
}

pub fn classify_statement_type(text: &str) -> StatementType {
    let tokens = tokens_with_depth(text);
    match first_significant(&tokens) {
        Some(t) if t.kind == TokenKind::Word && t.text.eq_ignore_ascii_case("SELECT") => {
            StatementType::Select
        }
        Some(t) if t.kind == TokenKind::Word && t.text.eq_ignore_ascii_case("UPDATE") => {
            StatementType::Update
        }
        Some(t) if t.kind == TokenKind::Word && t.text.eq_ignore_ascii_case("DELETE") => {
            StatementType::Delete
        }
        Some(t) if t.kind == TokenKind::Word && t.text.eq_ignore_ascii_case("WITH") => {
            StatementType::With
        }
        _ => StatementType::Other,
    }
}

/// Splits `sql` into top-level statement segments on depth-0 semicolons.
/// Semicolons inside string literals or parentheses never split.
pub fn split_statements(sql: &str) -> Vec<Range<usize>> {
    let tokens = tokens_with_depth(sql);
    let mut segments = Vec::new();
    let mut start = 0usize;
    for info in &tokens {
        if info.depth == 0 && info.token.kind == TokenKind::Semicolon {
            segments.push(start..info.token.byte_start);
            start = info.token.byte_end;
        }
    }
    if sql[start..].trim().is_empty() {
        if segments.is_empty() {
            segments.push(start..sql.len());
        }
    } else {
        segments.push(start..sql.len());
    }
    segments
}

/// Index of the token matching the `(` at `open_idx`, using the recorded
/// depth (the depth field on a `)` token equals the depth field on its
/// matching `(`).
fn matching_close(tokens: &[TokenInfo], open_idx: usize) -> Option<usize> {
    let target = tokens[open_idx].depth;
    tokens[open_idx + 1..]
        .iter()
        .position(|t| t.token.kind == TokenKind::Punctuation && t.token.text == ")" && t.depth == target)
        .map(|rel| open_idx + 1 + rel)
}

const STATEMENT_STARTERS: &[&str] = &["SELECT", "WITH", "UPDATE", "DELETE"];

/// Finds every parenthesized group within `text` whose first significant
/// inner token is `SELECT`/`WITH`/`UPDATE`/`DELETE` (a nested scopeable
/// statement) that is *not* itself nested inside another such group found in
/// the same scan. Each returned group is handled by recursing into it
/// exactly once; that recursive call finds and resolves whatever candidate
/// groups are nested inside it before rewriting itself, so depth is handled
/// by the call stack rather than by repeatedly re-scanning this level.
/// Returned in left-to-right order as byte offsets of the opening and
/// matching closing parenthesis.
fn find_maximal_candidate_groups(text: &str) -> Vec<(usize, usize)> {
    let tokens = tokens_with_depth(text);
    let mut candidates: Vec<(usize, usize)> = Vec::new();
    for (idx, info) in tokens.iter().enumerate() {
        if info.token.kind != TokenKind::Punctuation || info.token.text != "(" {
            continue;
        }
        let Some(close_idx) = matching_close(&tokens, idx) else {
            continue;
        };
        let inner_first = tokens[idx + 1..close_idx]
            .iter()
            .map(|t| &t.token)
            .find(|t| t.is_significant());
        if let Some(tok) = inner_first {
            if tok.kind == TokenKind::Word
                && STATEMENT_STARTERS.iter().any(|s| tok.text.eq_ignore_ascii_case(s))
            {
                candidates.push((idx, close_idx));
            }
        }
    }
    candidates
        .iter()
        .copied()
        .filter(|&(open, close)| {
            !candidates
                .iter()
                .any(|&(o2, c2)| (o2, c2) != (open, close) && o2 < open && close < c2)
        })
        .map(|(open, close)| (tokens[open].token.byte_start, tokens[close].token.byte_start))
        .collect()
}

/// Finds the byte offset where a `WITH` statement's main body starts: the
/// first `SELECT`/`UPDATE`/`DELETE`/`INSERT` keyword after the CTE list.
fn find_with_main_body_start(text: &str) -> Option<usize> {
    let tokens = tokens_with_depth(text);
    let significant: Vec<usize> = (0..tokens.len())
        .filter(|&i| tokens[i].token.is_significant())
        .collect();
    let mut pos = 0; // index into `significant`
    let with_tok = significant.get(pos).copied()?;
    if !tokens[with_tok].token.text.eq_ignore_ascii_case("WITH") {
        return None;
    }
    pos += 1;
    if significant
        .get(pos)
        .map(|&i| tokens[i].token.text.eq_ignore_ascii_case("RECURSIVE"))
        == Some(true)
    {
        pos += 1;
    }
    loop {
        // CTE name
        pos += 1;
        // optional column list `(...)`
        if let Some(&i) = significant.get(pos) {
            if tokens[i].token.kind == TokenKind::Punctuation && tokens[i].token.text == "(" {
                let close = matching_close(&tokens, i)?;
                pos = significant.iter().position(|&s| s > close)?;
            }
        }
        // AS
        match significant.get(pos) {
            Some(&i) if tokens[i].token.text.eq_ignore_ascii_case("AS") => pos += 1,
            _ => return None,
        }
        // CTE body `(...)`
        match significant.get(pos) {
            Some(&i) if tokens[i].token.kind == TokenKind::Punctuation && tokens[i].token.text == "(" => {
                let close = matching_close(&tokens, i)?;
                pos = significant.iter().position(|&s| s > close)?;
            }
            _ => return None,
        }
        match significant.get(pos) {
            Some(&i) if tokens[i].token.kind == TokenKind::Punctuation && tokens[i].token.text == "," => {
                pos += 1;
                continue;
            }
            Some(&i) => {
                let word = &tokens[i].token;
                if word.kind == TokenKind::Word
                    && ["SELECT", "UPDATE", "DELETE", "INSERT"]
                        .iter()
                        .any(|s| word.text.eq_ignore_ascii_case(s))
                {
                    return Some(word.byte_start);
                }
                return None;
            }
            None => return None,
        }
    }
}

const SELECT_CLAUSE_STARTERS: &[&str] = &[
    "GROUP", "ORDER", "LIMIT", "OFFSET", "FETCH", "FOR", "UNION", "EXCEPT", "INTERSECT",
];
const WRITE_CLAUSE_STARTERS: &[&str] = &["RETURNING", "ORDER", "LIMIT"];

/// Finds the depth-0 `WHERE` position (if any) and the insertion point: the
/// earliest relevant clause-starter, or the end of `text` if none.
fn find_insertion_point(text: &str, stype: StatementType) -> (Option<usize>, usize) {
    let tokens = tokens_with_depth(text);
    let starters: &[&str] = match stype {
        StatementType::Select => SELECT_CLAUSE_STARTERS,
        _ => WRITE_CLAUSE_STARTERS,
    };
    let mut where_pos = None;
    let mut insertion_pos = text.len();
    for info in &tokens {
        if info.depth != 0 || info.token.kind != TokenKind::Word {
            continue;
        }
        if where_pos.is_none() && info.token.text.eq_ignore_ascii_case("WHERE") {
            where_pos = Some(info.token.byte_start);
        }
        if starters.iter().any(|s| info.token.text.eq_ignore_ascii_case(s))
            && info.token.byte_start < insertion_pos
        {
            insertion_pos = info.token.byte_start;
        }
    }
    (where_pos, insertion_pos)
}

pub(crate) fn count_question_marks(text: &str) -> usize {
    tokens_with_depth(text)
        .iter()
        .filter(|t| t.token.kind == TokenKind::QuestionMark)
        .count()
}

/// Shared mutable state threaded through one rewrite call: the evolving
/// query text, the accumulated argument sequence, and the running
/// placeholder/audit bookkeeping.
pub struct Workspace<'r, V> {
    pub full: String,
    pub args: Vec<V>,
    pub dialect: Dialect,
    pub placeholders: PlaceholderBuilder,
    pub registry: &'r ScopeRegistry<V>,
    pub config: &'r crate::config::HookConfig,
    pub default_resolver: Option<&'r crate::rule::Resolver<V>>,
    pub ctx: &'r CallContext,
    pub matched_tables: Vec<String>,
    pub applied_rules: Vec<String>,
    pub added_predicate_count: u32,
    pub any_scoped: bool,
}

impl<'r, V: Clone> Workspace<'r, V> {
    pub fn process_all(&mut self, segments: &[Range<usize>]) -> Result<(), ScopeError> {
        for seg in segments.iter().rev() {
            self.process_region(seg.clone())?;
        }
        Ok(())
    }

    /// Processes the statement occupying `region` (absolute byte range into
    /// `self.full`), rewriting nested scopeable statements first. Returns
    /// the signed change in length of `self.full` caused by edits within
    /// `region`.
    fn process_region(&mut self, mut region: Range<usize>) -> Result<isize, ScopeError> {
        let mut total_delta: isize = 0;
        let stype = classify_statement_type(&self.full[region.clone()]);

        // For a WITH statement, only the CTE-list prefix is scanned for
        // nested candidate groups here; the main body (after the CTE list)
        // gets its own recursive call below, which scans its own range for
        // candidates. Scanning the whole region here would find the main
        // body's nested subqueries too, and the main-body recursion would
        // then find and rewrite them a second time.
        let scan_end = match stype {
            StatementType::With => match find_with_main_body_start(&self.full[region.clone()]) {
                Some(main_rel) => region.start + main_rel,
                None => region.end,
            },
            _ => region.end,
        };

        let maximal = find_maximal_candidate_groups(&self.full[region.start..scan_end]);
        // Rightmost first: an edit inside one group never shifts the
        // (not-yet-processed) byte offsets of groups lying to its left.
        for &(open_rel, close_rel) in maximal.iter().rev() {
            let open_abs = region.start + open_rel;
            let close_abs = region.start + close_rel;
            let delta = self.process_region(open_abs + 1..close_abs)?;
            region.end = (region.end as isize + delta) as usize;
            total_delta += delta;
        }

        let slice = &self.full[region.clone()];
        let delta = match stype {
            StatementType::With => {
                if let Some(main_rel) = find_with_main_body_start(slice) {
                    self.process_region(region.start + main_rel..region.end)?
                } else {
                    self.handle_unsupported()?;
                    0
                }
            }
            StatementType::Other => {
                self.handle_unsupported()?;
                0
            }
            _ => self.rewrite_single_statement(region.clone(), stype)?,
        };
        total_delta += delta;
        Ok(total_delta)
    }

    fn handle_unsupported(&mut self) -> Result<(), ScopeError> {
        if self.config.reject_unknown_shapes || self.config.strict_all_tables {
            return Err(ScopeError::new(
                DenyCode::UnsupportedStatement,
                "statement type is not SELECT, UPDATE, DELETE, or WITH",
            ));
        }
        Ok(())
    }

    fn rewrite_single_statement(
        &mut self,
        region: Range<usize>,
        stype: StatementType,
    ) -> Result<isize, ScopeError> {
        let text = self.full[region.clone()].to_string();
        let tokens = tokens_with_depth(&text);

        let refs = match stype {
            StatementType::Select => collect_select_refs(&tokens),
            StatementType::Update => collect_update_ref(&tokens),
            StatementType::Delete => collect_delete_ref(&tokens),
            _ => unreachable!("rewrite_single_statement only sees read/write statements"),
        };
        let refs: Vec<TableRef> = match refs {
            Some(refs) => refs,
            None => {
                if self.config.reject_unknown_shapes {
                    return Err(ScopeError::new(
                        DenyCode::UnknownShape,
                        "could not determine this statement's table references",
                    ));
                }
                Vec::new()
            }
        };

        let mut predicate_parts = Vec::new();
        let mut added_values: Vec<V> = Vec::new();
        for table_ref in &refs {
            let Some(rule) = self.registry.get(&table_ref.table_canonical) else {
                if self.config.strict_all_tables {
                    return Err(ScopeError::new(
                        DenyCode::MissingRule,
                        format!("no scope rule registered for table {:?}", table_ref.table_canonical),
                    ));
                }
                continue;
            };

            let template = rule.template();
            let mut predicate = template.replace(
                "{{alias}}",
                if rule.has_alias_token {
                    &table_ref.alias
                } else {
                    ""
                },
            );
            while predicate.contains("{{param}}") {
                let ph = self.placeholders.next_placeholder();
                predicate = predicate.replacen("{{param}}", &ph, 1);
            }

            let mut values = if rule.param_count == 0 {
                Vec::new()
            } else if let Some(resolver) = rule.resolver.as_ref().or(self.default_resolver) {
                resolver(self.ctx)?
            } else {
                return Err(ScopeError::new(
                    DenyCode::ResolverRequired,
                    format!("table {:?} has no resolver and no default resolver is configured", table_ref.table_canonical),
                ));
            };
            if values.len() == 1 && rule.param_count > 1 {
                let only = values.remove(0);
                values = std::iter::repeat(only).take(rule.param_count).collect();
            }
            if values.len() != rule.param_count {
                return Err(ScopeError::new(
                    DenyCode::ParamMismatch,
                    format!(
                        "rule for {:?} expects {} value(s), resolver returned {}",
                        table_ref.table_canonical,
                        rule.param_count,
                        values.len()
                    ),
                ));
            }

            predicate_parts.push(predicate);
            added_values.extend(values);
            self.matched_tables.push(table_ref.table_canonical.clone());
            self.applied_rules.push(rule.canonical.clone());
        }

        if predicate_parts.is_empty() {
            if self.config.strict_mode {
                return Err(ScopeError::new(
                    DenyCode::UnscopedStatement,
                    "strict mode requires a predicate but none was produced",
                ));
            }
            return Ok(0);
        }

        let combined = format!("({})", predicate_parts.join(" AND "));
        let (where_pos, insertion_pos) = find_insertion_point(&text, stype);
        let has_where = where_pos.is_some_and(|w| w < insertion_pos);
        let clause = if has_where {
            format!("AND {combined}")
        } else {
            format!("WHERE {combined}")
        };
        // `insertion_pos` either sits at the end of the statement text (no
        // trailing whitespace to reuse) or at the start of a following
        // keyword token (which always has a separating whitespace token
        // immediately before it already).
        let insert_text = if insertion_pos == text.len() {
            format!(" {clause}")
        } else {
            format!("{clause} ")
        };

        let absolute_insert_pos = region.start + insertion_pos;
        match self.dialect {
            Dialect::Question | Dialect::Unknown => {
                let global_index = count_question_marks(&self.full[..absolute_insert_pos]);
                self.args.splice(global_index..global_index, added_values);
            }
            _ => self.args.extend(added_values),
        }
        self.full.insert_str(absolute_insert_pos, &insert_text);

        self.added_predicate_count += predicate_parts.len() as u32;
        self.any_scoped = true;
        Ok(insert_text.len() as isize)
    }
}

/// The result of one full rewrite pass, before the hook turns it into an
/// [`crate::audit::AuditDecision`].
pub struct RewriteOutcome<V> {
    pub sql: String,
    pub args: Vec<V>,
    pub matched_tables: Vec<String>,
    pub applied_rules: Vec<String>,
    pub added_predicate_count: u32,
    pub any_scoped: bool,
    /// The classified type of the first statement in the batch, per spec §3's
    /// `statement_type` audit field. `None` only for a fully empty query.
    pub statement_type: Option<&'static str>,
}

/// Runs the full rewrite pipeline (spec §4.3 steps 1-12) over `sql`,
/// assuming bypass handling has already been resolved by the caller.
pub fn rewrite_query<V: Clone>(
    ctx: &CallContext,
    sql: &str,
    args: &[V],
    registry: &ScopeRegistry<V>,
    config: &crate::config::HookConfig,
    default_resolver: Option<&crate::rule::Resolver<V>>,
) -> Result<RewriteOutcome<V>, ScopeError> {
    let dialect = crate::placeholder::detect(ctx, sql);
    let placeholders = PlaceholderBuilder::new(dialect, sql, args.len());
    let segments = split_statements(sql);
    let statement_type = segments
        .first()
        .map(|seg| classify_statement_type(&sql[seg.clone()]).as_str());

    let mut ws = Workspace {
        full: sql.to_string(),
        args: args.to_vec(),
        dialect,
        placeholders,
        registry,
        config,
        default_resolver,
        ctx,
        matched_tables: Vec::new(),
        applied_rules: Vec::new(),
        added_predicate_count: 0,
        any_scoped: false,
    };
    ws.process_all(&segments)?;

    Ok(RewriteOutcome {
        sql: ws.full,
        args: ws.args,
        matched_tables: ws.matched_tables,
        applied_rules: ws.applied_rules,
        added_predicate_count: ws.added_predicate_count,
        any_scoped: ws.any_scoped,
        statement_type,
    })
}
