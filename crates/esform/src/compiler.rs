//! The compiler entry point.
//!
//! A [`Compiler`] holds everything that outlives a single compile: options,
//! the optional index mapping, the custom hooks and the parsed field plans of
//! every form type it has seen. Compiling borrows the compiler immutably, so
//! one instance can be shared across threads; the hooks must then be
//! reentrant.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::body::SearchBody;
use crate::directive::Directive;
use crate::error::{CompileError, Result};
use crate::form::{FieldDescriptor, Searchable, Select};
use crate::mapping::Mapping;
use crate::materialize;
use crate::options::CompileOptions;
use crate::query::{BoolQuery, Query};
use crate::sorter::Sort;
use crate::walker::Walker;

/// Builds the clauses of a `custom` field from its name.
pub type QueryHook = Arc<dyn Fn(&str) -> Vec<Query> + Send + Sync>;

/// Builds the sort criteria of a `custom` sort field from its name.
pub type SortHook = Arc<dyn Fn(&str) -> Vec<Sort> + Send + Sync>;

/// A field with its directive parsed and names resolved.
#[derive(Debug, Clone)]
pub(crate) struct FieldPlan {
    pub(crate) ident: &'static str,
    pub(crate) embedded: bool,
    /// `None` for skipped fields.
    pub(crate) directive: Option<Directive>,
    pub(crate) names: Vec<String>,
}

impl FieldPlan {
    fn new(form: &'static str, descriptor: &FieldDescriptor) -> Result<Self> {
        let directive =
            Directive::parse(descriptor.directive).map_err(|source| CompileError::Directive {
                form: form.to_string(),
                field: descriptor.ident.to_string(),
                source,
            })?;
        let names = directive
            .as_ref()
            .map(|directive| descriptor.target_names(directive))
            .unwrap_or_default();
        Ok(FieldPlan {
            ident: descriptor.ident,
            embedded: descriptor.embedded,
            directive,
            names,
        })
    }

    /// First target name; scopes, hooks and nested sorts use it.
    pub(crate) fn primary_name(&self) -> &str {
        self.names.first().map(String::as_str).unwrap_or(self.ident)
    }
}

/// Output of one compile.
#[derive(Debug, Clone, PartialEq)]
pub struct Compiled {
    /// Root bool query; empty means "match everything".
    pub query: BoolQuery,
    /// Sort criteria ordered by level.
    pub sorts: Vec<Sort>,
    /// Pagination and `_source` selection found at the root of the form.
    pub select: Option<Select>,
}

impl Compiled {
    /// Bundles the result into a search body.
    pub fn into_search_body(self, options: &CompileOptions) -> SearchBody {
        let body = SearchBody::with_options(self.query, options).set_sorter(self.sorts);
        match &self.select {
            Some(select) => body.select(select),
            None => body,
        }
    }
}

/// Compiles [`Searchable`] forms into queries and sort lists.
///
/// ```
/// use esform::{Compiler, Searchable};
/// use serde_json::json;
///
/// #[derive(Searchable)]
/// struct Filter {
///     #[search("must")]
///     status: Vec<i32>,
///     #[search("sort;level:1")]
///     created: i32,
/// }
///
/// let compiler = Compiler::new();
/// let compiled = compiler
///     .compile(&Filter { status: vec![1, 2], created: 2 })
///     .unwrap();
///
/// assert_eq!(
///     compiled.query.to_json(),
///     json!({"bool": {"must": [{"terms": {"status": [1, 2]}}]}})
/// );
/// assert_eq!(
///     compiled.sorts[0].to_json(),
///     json!({"created": {"order": "desc"}})
/// );
/// ```
pub struct Compiler {
    options: CompileOptions,
    mapping: Option<Mapping>,
    query_hook: Option<QueryHook>,
    sort_hook: Option<SortHook>,
    plans: RwLock<HashMap<&'static str, Arc<[FieldPlan]>>>,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Compiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compiler")
            .field("options", &self.options)
            .field("mapping", &self.mapping)
            .field("query_hook", &self.query_hook.is_some())
            .field("sort_hook", &self.sort_hook.is_some())
            .finish()
    }
}

impl Compiler {
    /// Creates a compiler with default options and no hooks.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> CompilerBuilder {
        CompilerBuilder::default()
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    pub fn mapping(&self) -> Option<&Mapping> {
        self.mapping.as_ref()
    }

    pub(crate) fn query_hook(&self) -> Option<&QueryHook> {
        self.query_hook.as_ref()
    }

    pub(crate) fn sort_hook(&self) -> Option<&SortHook> {
        self.sort_hook.as_ref()
    }

    /// Compiles a form into its query, sort list and root selection.
    ///
    /// Fails only on malformed directives, which are reported the first time
    /// a form type is seen.
    pub fn compile(&self, form: &dyn Searchable) -> Result<Compiled> {
        let span = tracing::debug_span!("compile", form = form.form_name());
        let _enter = span.enter();

        let mut walker = Walker::new(self);
        let root = walker.arena.root();
        walker.walk(form, root, "")?;

        let query = materialize::root_query(&walker.arena);
        let sorts = walker.sorts.into_sorts();
        debug!(clauses = query.len(), sorts = sorts.len(), "compiled form");

        Ok(Compiled {
            query,
            sorts,
            select: walker.select,
        })
    }

    /// Compiles only the query.
    pub fn to_query(&self, form: &dyn Searchable) -> Result<BoolQuery> {
        self.compile(form).map(|compiled| compiled.query)
    }

    /// Compiles only the sort list.
    pub fn to_sorts(&self, form: &dyn Searchable) -> Result<Vec<Sort>> {
        self.compile(form).map(|compiled| compiled.sorts)
    }

    /// Compiles a form into a search body, paged by its root selection.
    pub fn to_search_body(&self, form: &dyn Searchable) -> Result<SearchBody> {
        self.compile(form)
            .map(|compiled| compiled.into_search_body(&self.options))
    }

    /// Checks every directive of a form type without compiling values.
    pub fn validate(&self, form: &dyn Searchable) -> Result<()> {
        self.plan(form).map(|_| ())
    }

    /// Parsed plan of a form type, built on first use.
    pub(crate) fn plan(&self, form: &dyn Searchable) -> Result<Arc<[FieldPlan]>> {
        let name = form.form_name();
        {
            let plans = self.plans.read().unwrap_or_else(|e| e.into_inner());
            if let Some(plan) = plans.get(name) {
                return Ok(Arc::clone(plan));
            }
        }

        let plan: Arc<[FieldPlan]> = form
            .descriptors()
            .iter()
            .map(|descriptor| FieldPlan::new(name, descriptor))
            .collect::<Result<Vec<_>>>()?
            .into();
        debug!(form = name, fields = plan.len(), "planned form type");

        let mut plans = self.plans.write().unwrap_or_else(|e| e.into_inner());
        Ok(Arc::clone(plans.entry(name).or_insert(plan)))
    }
}

/// Builder for [`Compiler`].
#[derive(Default)]
pub struct CompilerBuilder {
    options: CompileOptions,
    mapping: Option<Mapping>,
    query_hook: Option<QueryHook>,
    sort_hook: Option<SortHook>,
}

impl CompilerBuilder {
    pub fn options(mut self, options: CompileOptions) -> Self {
        self.options = options;
        self
    }

    pub fn mapping(mut self, mapping: Mapping) -> Self {
        self.mapping = Some(mapping);
        self
    }

    /// Sets the hook called for `custom` fields.
    pub fn custom_query<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str) -> Vec<Query> + Send + Sync + 'static,
    {
        self.query_hook = Some(Arc::new(hook));
        self
    }

    /// Sets the hook called for `custom` sort fields.
    pub fn custom_sort<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str) -> Vec<Sort> + Send + Sync + 'static,
    {
        self.sort_hook = Some(Arc::new(hook));
        self
    }

    pub fn build(self) -> Compiler {
        Compiler {
            options: self.options,
            mapping: self.mapping,
            query_hook: self.query_hook,
            sort_hook: self.sort_hook,
            plans: RwLock::new(HashMap::new()),
        }
    }
}
