//! esform - Compile annotated search forms into Elasticsearch queries.
//!
//! A form is a plain struct describing what a caller wants to search for.
//! Each field carries a directive saying how its values become query
//! clauses, how clauses combine and how results are ordered. The compiler
//! turns one form value into a bool query and a sort list.
//!
//! # Quick Start
//!
//! ```rust
//! use esform::{ArrayInt64, Compiler, Searchable};
//! use serde_json::json;
//!
//! #[derive(Searchable)]
//! struct GoodsForm {
//!     #[search("must")]
//!     integer: Vec<i32>,
//!     #[search("must;range")]
//!     long: ArrayInt64,
//!     #[search("should", fields = "goodsArea,userArea")]
//!     area: Vec<i32>,
//! }
//!
//! let form = GoodsForm {
//!     integer: vec![10],
//!     long: ArrayInt64(vec![100, 200]),
//!     area: vec![1, 2],
//! };
//!
//! let query = Compiler::new().to_query(&form).unwrap();
//! assert_eq!(
//!     query.to_json(),
//!     json!({"bool": {
//!         "must": [
//!             {"term": {"integer": 10}},
//!             {"range": {"long": {"gte": 100, "lte": 200}}}
//!         ],
//!         "should": [
//!             {"terms": {"goodsArea": [1, 2]}},
//!             {"terms": {"userArea": [1, 2]}}
//!         ],
//!         "minimum_should_match": 1
//!     }})
//! );
//! ```
//!
//! # Directives
//!
//! A directive is a `;` separated list of `key:value` pairs and bare
//! keywords (see [`directive`] for the full grammar):
//!
//! | Directive | Meaning |
//! |-----------|---------|
//! | `must`, `not`, `should`, `filter` | occurrence of the field's clause |
//! | `logical:must@g,should` | chain of containers; `@g` names a group shared across fields |
//! | `logical:must,nested@items,must` | route the field into the nested scope `items` |
//! | `eq`, `match`, `matchAnd`, `range`, `rangeLte`, `lt`, `lte`, `gt`, `gte` | relational operator |
//! | `nested`, `obj` | the field is a sub-form addressed by a dotted path |
//! | `innerHits` | the field pages the current scope |
//! | `sort`, `sort:byValue`, `sort:nested`, `level:n`, `mode:min` | sort criterion |
//! | `custom` | clauses or sorts come from a hook |
//! | `block` | flatten the sub-form into the current scope |
//! | `-` | skip the field |
//!
//! # Semantics
//!
//! - Absent values (`None`, empty lists, zero scalars) produce nothing.
//! - A form producing no clause compiles to an empty bool query, which the
//!   engine treats as "match everything".
//! - A field with several target names emits one clause per name, OR-ed.
//! - A `should` clause next to `must` or `filter` clauses is required.
//! - Sorts are emitted by ascending level, in field order within a level.

mod array;
mod body;
mod compiler;
mod compose;
pub mod directive;
mod error;
mod form;
mod mapping;
mod materialize;
mod options;
mod query;
mod sort;
mod sorter;
mod value;
mod walker;

// Re-export public API
pub use array::{ArrayInt, ArrayInt64, ArrayKeyword, ArrayString};
pub use body::SearchBody;
pub use compiler::{Compiled, Compiler, CompilerBuilder, QueryHook, SortHook};
pub use directive::{ChainLink, Directive, Nesting, Occur, Relational, SortMode, ValueType};
pub use error::{CompileError, Result, TagError};
pub use form::{FieldDescriptor, FieldValue, Searchable, Select};
pub use mapping::{FieldType, Mapping};
pub use materialize::relational_clause;
pub use options::CompileOptions;
pub use query::{BoolQuery, InnerHits, NestedQuery, Query, RangeQuery, SourceFilter};
pub use sorter::{Dir, FieldSort, NestedSort, ScriptSort, Sort};
pub use value::{Extract, Number, Scalar};

pub use esform_macros::Searchable;
