//! The named-parameter query compiler: rewrites `:name` placeholders into a
//! driver-appropriate wire form and binds parameter values from a keyed
//! mapping, a typed record, or a homogeneous sequence of records.

mod bind;
mod compile;
mod dialect;
mod error;
mod values;

pub use bind::{Bind, FieldMapper, MapBinder, RecordBinder, SequenceBinder};
pub use compile::compile;
pub use dialect::Dialect;
pub use error::{BindError, CompileError};
pub use values::expand_values;
