/// The placeholder convention a driver expects. `Unknown` behaves like
/// `Question` for emission purposes but signals to callers that no driver
/// hint was available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// `?`, numbered implicitly by position.
    Question,
    /// `$1`, `$2`, ... numbered from 1.
    Dollar,
    /// `:name`, re-emitted verbatim.
    Named,
    /// `@p1`, `@p2`, ... numbered from 1.
    At,
    /// No driver hint; placeholders are emitted as `?`.
    Unknown,
}

impl Dialect {
    /// Maps a driver-name hint (as surfaced by `DriverName()` on the
    /// execution façade) to its placeholder dialect, per spec §6.
    pub fn from_driver_hint(hint: &str) -> Option<Dialect> {
        match hint.to_ascii_lowercase().as_str() {
            "pgx" | "postgres" | "postgresql" | "cockroach" | "cockroachdb" => Some(Dialect::Dollar),
            "mssql" | "sqlserver" => Some(Dialect::At),
            "mysql" | "sqlite" | "sqlite3" => Some(Dialect::Question),
            _ => None,
        }
    }

    pub(crate) fn placeholder(self, n: usize) -> String {
        match self {
            Dialect::Question | Dialect::Unknown => "?".to_string(),
            Dialect::Dollar => format!("${n}"),
            Dialect::At => format!("@p{n}"),
            Dialect::Named => unreachable!("Named dialect re-emits :name, not a numbered placeholder"),
        }
    }
}
