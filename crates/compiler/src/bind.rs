use scopeql_helpers::IndexMap;

use crate::error::BindError;

/// The contract the binder needs of a record type: given a record and a
/// declared parameter name, yield its value. A real implementation is a
/// reflection-based lookup (honoring a `db` column tag, falling back to
/// `snake_case` of the field name) and lives outside this crate — this
/// trait is the seam the binder is written against, not an implementation
/// of it.
pub trait FieldMapper {
    type Record;
    type Value;

    /// Resolves `name` against `record`. Returns `None` when the name has
    /// no corresponding field, which the binder turns into
    /// [`BindError::UnknownName`].
    fn resolve(&self, record: &Self::Record, name: &str) -> Option<Self::Value>;
}

/// Produces the ordered value sequence a compiled query needs, given the
/// ordered parameter-name list the named compiler returned.
pub trait Bind<V> {
    fn bind(&self, names: &[String]) -> Result<Vec<V>, BindError>;
}

/// Binds from a string-keyed mapping: spec §4.2(a).
pub struct MapBinder<'a, V> {
    values: &'a IndexMap<String, V>,
}

impl<'a, V> MapBinder<'a, V> {
    pub fn new(values: &'a IndexMap<String, V>) -> Self {
        Self { values }
    }
}

impl<V: Clone> Bind<V> for MapBinder<'_, V> {
    fn bind(&self, names: &[String]) -> Result<Vec<V>, BindError> {
        names
            .iter()
            .map(|name| {
                self.values
                    .get(name)
                    .cloned()
                    .ok_or_else(|| BindError::UnknownName(name.clone()))
            })
            .collect()
    }
}

/// Binds from a single typed record via a [`FieldMapper`]: spec §4.2(b).
pub struct RecordBinder<'a, M: FieldMapper> {
    record: &'a M::Record,
    mapper: &'a M,
}

impl<'a, M: FieldMapper> RecordBinder<'a, M> {
    pub fn new(record: &'a M::Record, mapper: &'a M) -> Self {
        Self { record, mapper }
    }
}

impl<M: FieldMapper> Bind<M::Value> for RecordBinder<'_, M> {
    fn bind(&self, names: &[String]) -> Result<Vec<M::Value>, BindError> {
        names
            .iter()
            .map(|name| {
                self.mapper
                    .resolve(self.record, name)
                    .ok_or_else(|| BindError::UnknownName(name.clone()))
            })
            .collect()
    }
}

/// Binds from a homogeneous sequence of records, for `VALUES (...)` block
/// duplication: spec §4.2(c). Total value count is `len(names) *
/// len(records)`; an empty sequence is an error rather than an empty bind,
/// since a zero-row `VALUES` list is not valid SQL.
pub struct SequenceBinder<'a, M: FieldMapper> {
    records: &'a [M::Record],
    mapper: &'a M,
}

impl<'a, M: FieldMapper> SequenceBinder<'a, M> {
    pub fn new(records: &'a [M::Record], mapper: &'a M) -> Self {
        Self { records, mapper }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<M: FieldMapper> Bind<M::Value> for SequenceBinder<'_, M> {
    fn bind(&self, names: &[String]) -> Result<Vec<M::Value>, BindError> {
        if self.records.is_empty() {
            return Err(BindError::EmptySequence);
        }
        let mut out = Vec::with_capacity(names.len() * self.records.len());
        for record in self.records {
            for name in names {
                let value = self
                    .mapper
                    .resolve(record, name)
                    .ok_or_else(|| BindError::UnknownName(name.clone()))?;
                out.push(value);
            }
        }
        Ok(out)
    }
}
