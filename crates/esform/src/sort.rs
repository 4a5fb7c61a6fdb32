//! Sort assembly.
//!
//! Sort fields are bucketed by level. Levels are emitted in ascending order
//! and each level keeps the order its fields were visited in. A sort field
//! without values emits nothing.
//!
//! | Mode | Criterion |
//! |------|-----------|
//! | `default` | field sort, descending when the value equals the sentinel (`2`) |
//! | `byValue` | script sort ranking documents by the position of their value among the supplied ones |
//! | `nested` | the sub-form's default sorts, restricted to sub-documents matching the sub-form's query |
//! | `custom` | whatever the custom sort hook returns |

use std::collections::BTreeMap;

use serde_json::{Map, Value as Json};
use tracing::{debug, trace};

use crate::compiler::FieldPlan;
use crate::compose::join_path;
use crate::directive::{Directive, SortMode, ValueType};
use crate::error::Result;
use crate::form::FieldValue;
use crate::materialize;
use crate::query::Query;
use crate::sorter::{Dir, FieldSort, NestedSort, ScriptSort, Sort};
use crate::value::Scalar;
use crate::walker::Walker;

/// Sort criteria grouped by level.
#[derive(Debug, Clone, Default)]
pub(crate) struct SortBuckets {
    levels: BTreeMap<i32, Vec<Sort>>,
}

impl SortBuckets {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, level: i32, sort: Sort) {
        self.levels.entry(level).or_default().push(sort);
    }

    pub(crate) fn extend(&mut self, level: i32, sorts: impl IntoIterator<Item = Sort>) {
        self.levels.entry(level).or_default().extend(sorts);
    }

    /// Criteria with their levels, in emission order.
    pub(crate) fn into_entries(self) -> impl Iterator<Item = (i32, Sort)> {
        self.levels
            .into_iter()
            .flat_map(|(level, sorts)| sorts.into_iter().map(move |sort| (level, sort)))
    }

    /// Criteria in emission order.
    pub(crate) fn into_sorts(self) -> Vec<Sort> {
        self.into_entries().map(|(_, sort)| sort).collect()
    }
}

/// Returns `true` when `value` is the descending sentinel.
pub(crate) fn is_descending(value: &Scalar, sentinel: i64) -> bool {
    match value {
        Scalar::Number(n) => n.to_f64() == sentinel as f64,
        Scalar::String(s) => s.trim().parse::<i64>().is_ok_and(|n| n == sentinel),
        Scalar::Bool(_) => false,
    }
}

/// Field sort whose direction comes from the first value.
pub(crate) fn default_sort(
    field: &str,
    values: &[Scalar],
    mode: Option<&str>,
    sentinel: i64,
) -> Option<Sort> {
    let first = values.first()?;
    let order = if is_descending(first, sentinel) {
        Dir::Desc
    } else {
        Dir::Asc
    };
    let mut sort = FieldSort::new(field, order);
    if let Some(mode) = mode {
        sort = sort.mode(mode);
    }
    Some(Sort::Field(sort))
}

/// Script sort ranking documents by where their `field` value appears in
/// `values`. A repeated value keeps its last position.
pub(crate) fn by_value_sort(field: &str, values: &[Scalar], value_type: ValueType) -> Option<Sort> {
    if values.is_empty() {
        return None;
    }
    let mut ranks = Map::new();
    for (index, value) in values.iter().enumerate() {
        ranks.insert(value.key(), Json::from(index));
    }
    let mut params = Map::new();
    params.insert("idMap".to_string(), Json::Object(ranks));

    Some(Sort::Script(ScriptSort {
        source: format!("params.idMap[String.valueOf(doc['{}'].value)]", field),
        params,
        value_type,
        order: Dir::Asc,
    }))
}

impl Walker<'_> {
    /// Routes a sort field to its bucket.
    pub(crate) fn assemble_sort(
        &mut self,
        field: &FieldPlan,
        directive: &Directive,
        value: FieldValue<'_>,
        path: &str,
    ) -> Result<()> {
        let compiler = self.compiler;
        let level = directive.level;

        if directive.sort == SortMode::Nested {
            let FieldValue::Form(Some(sub)) = value else {
                trace!(field = field.ident, "skipping absent nested sort");
                return Ok(());
            };
            let sub_path = join_path(path, field.primary_name());
            let mut inner = Walker::for_nested_sort(compiler);
            let root = inner.arena.root();
            inner.walk(sub, root, &sub_path)?;

            let filter = materialize::root_query(&inner.arena);
            if filter.is_empty() {
                debug!(field = field.ident, "nested sort without filter, skipping");
                return Ok(());
            }
            let filter = Box::new(Query::Bool(filter));
            for (inner_level, sort) in inner.sorts.into_entries() {
                if let Sort::Field(field_sort) = sort {
                    let nested = NestedSort {
                        path: sub_path.clone(),
                        filter: Some(filter.clone()),
                    };
                    self.sorts
                        .push(inner_level, Sort::Field(field_sort.nested(nested)));
                }
            }
            return Ok(());
        }

        if directive.custom {
            match compiler.sort_hook() {
                Some(hook) => self.sorts.extend(level, hook(field.primary_name())),
                None => debug!(field = field.ident, "no custom sort hook, skipping field"),
            }
            return Ok(());
        }

        if self.nested_sort && directive.sort != SortMode::Default {
            return Ok(());
        }

        let values = match value {
            FieldValue::Values(values) if !values.is_empty() => values,
            _ => {
                trace!(field = field.ident, "skipping absent sort value");
                return Ok(());
            }
        };

        for name in &field.names {
            let target = join_path(path, name);
            let sort = match directive.sort {
                SortMode::Default => default_sort(
                    &target,
                    &values,
                    directive.sort_qualifier.as_deref(),
                    compiler.options().descending_sentinel,
                ),
                SortMode::ByValue => {
                    let value_type = compiler
                        .mapping()
                        .and_then(|mapping| mapping.field_type(&target))
                        .map(|field_type| field_type.value_type())
                        .unwrap_or(directive.value_type);
                    by_value_sort(&target, &values, value_type)
                }
                SortMode::None | SortMode::Nested => None,
            };
            if let Some(sort) = sort {
                self.sorts.push(level, sort);
            }
        }
        Ok(())
    }
}
