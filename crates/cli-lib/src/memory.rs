use scopeql_core::{tokenize, TokenKind, TokenizerConfig};
use scopeql_helpers::{canonical_identifier, IndexMap};

use crate::driver::{Driver, DriverError, DriverHint};
use crate::value::Value;

/// An in-memory stand-in for a real network driver: enough to prove the
/// façade's compile-then-hook-then-dispatch pipeline actually runs,
/// without owning any SQL execution semantics. `exec`/`query` only need
/// to know which table a statement targets; they find that by scanning
/// for the token following `FROM`, not by understanding the rest of the
/// statement.
pub struct MemoryDriver {
    name: DriverHint,
    tables: IndexMap<String, Vec<Vec<Value>>>,
}

impl MemoryDriver {
    pub fn new(driver_name: impl Into<String>) -> Self {
        Self {
            name: DriverHint::new(driver_name),
            tables: IndexMap::default(),
        }
    }

    pub fn with_table(mut self, table: impl AsRef<str>, rows: Vec<Vec<Value>>) -> Self {
        self.tables.insert(canonical_identifier(table.as_ref()), rows);
        self
    }
}

fn table_name_from_sql(sql: &str) -> Option<String> {
    let tokens = tokenize(sql, &TokenizerConfig::default()).ok()?;
    let mut significant = tokens.iter().filter(|t| t.is_significant());
    while let Some(tok) = significant.next() {
        if tok.kind == TokenKind::Word && tok.text.eq_ignore_ascii_case("FROM") {
            let next = significant.next()?;
            return Some(canonical_identifier(next.text));
        }
    }
    None
}

impl Driver for MemoryDriver {
    fn driver_name(&self) -> DriverHint {
        self.name.clone()
    }

    fn prepare(&self, sql: &str) -> Result<String, DriverError> {
        Ok(sql.to_string())
    }

    fn exec(&self, sql: &str, _args: &[Value]) -> Result<u64, DriverError> {
        let table = table_name_from_sql(sql).ok_or_else(|| DriverError::UnknownTable(sql.to_string()))?;
        self.tables
            .get(&table)
            .map(|rows| rows.len() as u64)
            .ok_or(DriverError::UnknownTable(table))
    }

    fn query(&self, sql: &str, _args: &[Value]) -> Result<Vec<Vec<Value>>, DriverError> {
        let table = table_name_from_sql(sql).ok_or_else(|| DriverError::UnknownTable(sql.to_string()))?;
        self.tables
            .get(&table)
            .cloned()
            .ok_or(DriverError::UnknownTable(table))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_returns_stored_rows_for_matched_table() {
        let driver = MemoryDriver::new("postgres").with_table("orders", vec![vec![Value::Int(1)]]);
        let rows = driver.query("SELECT id FROM orders WHERE x = $1", &[Value::Int(1)]).unwrap();
        assert_eq!(rows, vec![vec![Value::Int(1)]]);
    }

    #[test]
    fn unknown_table_is_an_error() {
        let driver = MemoryDriver::new("postgres");
        let err = driver.query("SELECT * FROM ghosts", &[]).unwrap_err();
        assert_eq!(err, DriverError::UnknownTable("ghosts".to_string()));
    }

    #[test]
    fn exec_counts_existing_rows() {
        let driver = MemoryDriver::new("postgres")
            .with_table("orders", vec![vec![Value::Int(1)], vec![Value::Int(2)]]);
        assert_eq!(driver.exec("UPDATE orders SET paid = true", &[]).unwrap(), 2);
    }
}
