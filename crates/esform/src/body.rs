//! Search request body.

use serde::{Serialize, Serializer};
use serde_json::{json, Map, Value as Json};

use crate::form::Select;
use crate::options::CompileOptions;
use crate::query::{BoolQuery, SourceFilter};
use crate::sorter::{Dir, FieldSort, Sort};

/// Query, pagination, `_source` selection and sort of one search request.
///
/// Page and size start at the configured defaults. Setters ignore values
/// that are not positive, and the size never exceeds the maximum page size.
///
/// ```
/// use esform::{BoolQuery, SearchBody};
///
/// let body = SearchBody::new(BoolQuery::new())
///     .set_page(3)
///     .set_size(50_000)
///     .include(["id", "title"])
///     .set_sort("created", false);
///
/// assert_eq!(body.size(), 10_000);
/// assert_eq!(body.from(), 20_000);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SearchBody {
    query: BoolQuery,
    page: u32,
    size: u32,
    max_size: u32,
    source: Option<SourceFilter>,
    sort: Vec<Sort>,
}

impl SearchBody {
    /// Creates a body with the default options.
    pub fn new(query: BoolQuery) -> Self {
        Self::with_options(query, &CompileOptions::default())
    }

    pub fn with_options(query: BoolQuery, options: &CompileOptions) -> Self {
        SearchBody {
            query,
            page: options.default_page.max(1),
            size: options.default_size.clamp(1, options.max_page_size.max(1)),
            max_size: options.max_page_size.max(1),
            source: None,
            sort: Vec::new(),
        }
    }

    /// Appends fields to the `_source` include list.
    pub fn include<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        if !fields.is_empty() {
            self.source
                .get_or_insert_with(SourceFilter::default)
                .includes
                .extend(fields);
        }
        self
    }

    /// Appends fields to the `_source` exclude list.
    pub fn exclude<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        if !fields.is_empty() {
            self.source
                .get_or_insert_with(SourceFilter::default)
                .excludes
                .extend(fields);
        }
        self
    }

    pub fn set_page(mut self, page: u32) -> Self {
        if page > 0 {
            self.page = page;
        }
        self
    }

    pub fn set_size(mut self, size: u32) -> Self {
        if size > 0 {
            self.size = size.min(self.max_size);
        }
        self
    }

    /// Appends a plain field sort.
    pub fn set_sort(mut self, field: impl Into<String>, ascending: bool) -> Self {
        let order = if ascending { Dir::Asc } else { Dir::Desc };
        self.sort.push(Sort::Field(FieldSort::new(field, order)));
        self
    }

    /// Appends sort criteria.
    pub fn set_sorter(mut self, sorts: impl IntoIterator<Item = Sort>) -> Self {
        self.sort.extend(sorts);
        self
    }

    /// Applies the page, size and `_source` selection of a form.
    pub fn select(self, select: &Select) -> Self {
        self.set_page(select.page)
            .set_size(select.size)
            .include(select.include.iter().cloned())
            .exclude(select.exclude.iter().cloned())
    }

    pub fn query(&self) -> &BoolQuery {
        &self.query
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Offset of the first hit.
    pub fn from(&self) -> u32 {
        (self.page - 1).saturating_mul(self.size)
    }

    pub fn source(&self) -> Option<&SourceFilter> {
        self.source.as_ref()
    }

    pub fn sorts(&self) -> &[Sort] {
        &self.sort
    }

    /// Request JSON for the engine's `_search` endpoint.
    pub fn to_json(&self) -> Json {
        let mut body = Map::new();
        body.insert("query".into(), self.query.to_json());
        body.insert("from".into(), json!(self.from()));
        body.insert("size".into(), json!(self.size));
        if let Some(source) = &self.source {
            body.insert("_source".into(), source.to_json());
        }
        if !self.sort.is_empty() {
            body.insert(
                "sort".into(),
                Json::Array(self.sort.iter().map(Sort::to_json).collect()),
            );
        }
        Json::Object(body)
    }
}

impl Serialize for SearchBody {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}
