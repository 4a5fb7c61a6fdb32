//! Structural walk over a form.
//!
//! The walker visits the planned fields of a form in declaration order and
//! routes each one:
//!
//! 1. embedded or `block` fields are flattened into the current scope, and
//!    an embedded selection pages the current scope;
//! 2. sort fields go to the sort assembler;
//! 3. `innerHits` fields page the current scope, or the nested scope their
//!    chain names;
//! 4. `nested` / `obj` fields open a child scope on their dotted path;
//! 5. `custom` fields call the query hook;
//! 6. everything else is a value leaf.
//!
//! Absent values contribute nothing anywhere in the tree.

use tracing::{debug, trace};

use crate::compiler::{Compiler, FieldPlan};
use crate::compose::{join_path, Arena, NodeId, NodeKind, Payload};
use crate::directive::{Directive, Nesting, Relational, SortMode};
use crate::error::Result;
use crate::form::{FieldValue, Searchable, Select};
use crate::sort::SortBuckets;

/// State of one compile call.
pub(crate) struct Walker<'c> {
    pub(crate) compiler: &'c Compiler,
    pub(crate) arena: Arena,
    pub(crate) sorts: SortBuckets,
    /// Pagination of the search itself.
    pub(crate) select: Option<Select>,
    /// Walking the sub-form of a nested sort: only default sorts are kept
    /// and selections are ignored.
    pub(crate) nested_sort: bool,
}

impl<'c> Walker<'c> {
    pub(crate) fn new(compiler: &'c Compiler) -> Self {
        Walker {
            compiler,
            arena: Arena::new(),
            sorts: SortBuckets::new(),
            select: None,
            nested_sort: false,
        }
    }

    pub(crate) fn for_nested_sort(compiler: &'c Compiler) -> Self {
        Walker {
            nested_sort: true,
            ..Walker::new(compiler)
        }
    }

    /// Walks every field of `form` inside the scope `scope` at `path`.
    pub(crate) fn walk(&mut self, form: &dyn Searchable, scope: NodeId, path: &str) -> Result<()> {
        let compiler = self.compiler;
        let plan = compiler.plan(form)?;
        for field in plan.iter() {
            let Some(directive) = &field.directive else {
                continue;
            };
            let value = form.field_value(field.ident);

            if field.embedded || directive.block {
                match value {
                    FieldValue::Form(Some(sub)) => self.walk(sub, scope, path)?,
                    FieldValue::Select(Some(select)) => self.select_scope(scope, select),
                    _ => trace!(field = field.ident, "skipping absent embedded field"),
                }
                continue;
            }

            if directive.sort != SortMode::None {
                self.assemble_sort(field, directive, value, path)?;
                continue;
            }

            match directive.nesting {
                Nesting::InnerHits => self.inner_hits(field, directive, value, scope, path),
                Nesting::Nested | Nesting::Obj => {
                    let FieldValue::Form(Some(sub)) = value else {
                        trace!(field = field.ident, "skipping absent sub-form");
                        continue;
                    };
                    let (node, parent_path) =
                        self.arena.attach(scope, path, &directive.chain, field.ident);
                    let sub_path = join_path(&parent_path, field.primary_name());
                    let kind = if directive.nesting == Nesting::Nested {
                        // An earlier `innerHits` field may have paged this scope.
                        let inner_hits = match &self.arena.node(node).kind {
                            NodeKind::Nested { inner_hits, .. } => inner_hits.clone(),
                            _ => None,
                        };
                        NodeKind::Nested {
                            path: sub_path.clone(),
                            inner_hits,
                        }
                    } else {
                        NodeKind::Object {
                            path: sub_path.clone(),
                        }
                    };
                    self.arena.set_kind(node, kind);
                    self.walk(sub, node, &sub_path)?;
                }
                Nesting::None if directive.custom => {
                    let Some(hook) = compiler.query_hook() else {
                        debug!(field = field.ident, "no custom query hook, skipping field");
                        continue;
                    };
                    let queries = hook(field.primary_name());
                    if queries.is_empty() {
                        continue;
                    }
                    let (node, _) = self.arena.attach(scope, path, &directive.chain, field.ident);
                    self.arena.push(node, Payload::Custom(queries));
                }
                Nesting::None => {
                    let values = match value {
                        FieldValue::Values(values) if !values.is_empty() => values,
                        _ => {
                            trace!(field = field.ident, "skipping absent value");
                            continue;
                        }
                    };
                    let (node, parent_path) =
                        self.arena.attach(scope, path, &directive.chain, field.ident);
                    let fields: Vec<String> = field
                        .names
                        .iter()
                        .map(|name| join_path(&parent_path, name))
                        .collect();
                    let relational = self.relational(directive, &fields);
                    self.arena.push(
                        node,
                        Payload::Value {
                            fields,
                            relational,
                            values,
                        },
                    );
                }
            }
        }
        Ok(())
    }

    fn inner_hits(
        &mut self,
        field: &FieldPlan,
        directive: &Directive,
        value: FieldValue<'_>,
        scope: NodeId,
        path: &str,
    ) {
        let FieldValue::Select(Some(select)) = value else {
            trace!(field = field.ident, "skipping absent selection");
            return;
        };
        if directive.has_nested_link() {
            let (node, _) = self.arena.attach(scope, path, &directive.chain, field.ident);
            if matches!(self.arena.node(node).kind, NodeKind::Nested { .. }) {
                self.select_scope(node, select);
                return;
            }
        }
        self.select_scope(scope, select);
    }

    /// Attaches a selection to a scope: the root pages the search, a nested
    /// scope pages its inner hits.
    fn select_scope(&mut self, scope: NodeId, select: &Select) {
        if self.nested_sort {
            return;
        }
        if scope == self.arena.root() {
            self.select = Some(select.clone());
            return;
        }
        let options = self.compiler.options();
        let hits = select.inner_hits(options.default_page, options.inner_hits_size);
        if !self.arena.set_inner_hits(scope, hits) {
            debug!("selection outside a nested scope is ignored");
        }
    }

    /// An explicit operator wins; otherwise the mapped type of the first
    /// target decides, falling back to equality.
    fn relational(&self, directive: &Directive, fields: &[String]) -> Relational {
        directive
            .relational
            .or_else(|| {
                let mapping = self.compiler.mapping()?;
                mapping.default_relational(fields.first()?)
            })
            .unwrap_or(Relational::Eq)
    }
}
