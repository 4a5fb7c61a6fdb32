//! Typed subset of the Elasticsearch query DSL.
//!
//! Only the clauses the compiler emits are modelled. [`Query::Raw`] carries
//! anything else verbatim, which is what custom hooks usually return.
//!
//! Every type serializes to the engine's JSON shape:
//!
//! | Query | JSON |
//! |-------|------|
//! | `Term` | `{"term": {"f": v}}` |
//! | `Terms` | `{"terms": {"f": [v, ...]}}` |
//! | `Match` | `{"match": {"f": {"query": v, "operator": "and"}}}` |
//! | `Range` | `{"range": {"f": {"gte": a, "lte": b}}}` |
//! | `Bool` | `{"bool": {"must": [...], "must_not": [...], ...}}` |
//! | `Nested` | `{"nested": {"path": p, "query": q, "inner_hits": {...}}}` |

use serde::{Serialize, Serializer};
use serde_json::{json, Map, Value as Json};

use crate::value::Scalar;

/// One query clause.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    MatchAll,
    Term {
        field: String,
        value: Scalar,
    },
    Terms {
        field: String,
        values: Vec<Scalar>,
    },
    Match {
        field: String,
        query: Scalar,
        /// Every term of the query must match.
        operator_and: bool,
    },
    Range(RangeQuery),
    Bool(BoolQuery),
    Nested(NestedQuery),
    /// Opaque clause passed through verbatim.
    Raw(Json),
}

impl Query {
    pub fn term(field: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Query::Term {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn terms<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Scalar>,
    {
        Query::Terms {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn matches(field: impl Into<String>, query: impl Into<Scalar>) -> Self {
        Query::Match {
            field: field.into(),
            query: query.into(),
            operator_and: false,
        }
    }

    pub fn matches_all_terms(field: impl Into<String>, query: impl Into<Scalar>) -> Self {
        Query::Match {
            field: field.into(),
            query: query.into(),
            operator_and: true,
        }
    }

    /// Engine JSON of this clause.
    pub fn to_json(&self) -> Json {
        match self {
            Query::MatchAll => json!({ "match_all": {} }),
            Query::Term { field, value } => json!({ "term": { field.as_str(): value } }),
            Query::Terms { field, values } => json!({ "terms": { field.as_str(): values } }),
            Query::Match {
                field,
                query,
                operator_and,
            } => {
                let mut body = Map::new();
                body.insert("query".into(), scalar_json(query));
                if *operator_and {
                    body.insert("operator".into(), json!("and"));
                }
                json!({ "match": { field.as_str(): body } })
            }
            Query::Range(range) => range.to_json(),
            Query::Bool(bool_query) => bool_query.to_json(),
            Query::Nested(nested) => nested.to_json(),
            Query::Raw(raw) => raw.clone(),
        }
    }
}

impl Serialize for Query {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl From<BoolQuery> for Query {
    fn from(query: BoolQuery) -> Self {
        Query::Bool(query)
    }
}

impl From<RangeQuery> for Query {
    fn from(query: RangeQuery) -> Self {
        Query::Range(query)
    }
}

impl From<NestedQuery> for Query {
    fn from(query: NestedQuery) -> Self {
        Query::Nested(query)
    }
}

fn scalar_json(value: &Scalar) -> Json {
    serde_json::to_value(value).unwrap_or(Json::Null)
}

/// Boolean combination of clauses.
///
/// An empty bool query matches every document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoolQuery {
    pub must: Vec<Query>,
    pub must_not: Vec<Query>,
    pub should: Vec<Query>,
    pub filter: Vec<Query>,
    pub minimum_should_match: Option<u32>,
}

impl BoolQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn must(mut self, query: impl Into<Query>) -> Self {
        self.must.push(query.into());
        self
    }

    pub fn must_not(mut self, query: impl Into<Query>) -> Self {
        self.must_not.push(query.into());
        self
    }

    pub fn should(mut self, query: impl Into<Query>) -> Self {
        self.should.push(query.into());
        self
    }

    pub fn filter(mut self, query: impl Into<Query>) -> Self {
        self.filter.push(query.into());
        self
    }

    pub fn minimum_should_match(mut self, count: u32) -> Self {
        self.minimum_should_match = Some(count);
        self
    }

    /// Returns `true` when no clause is present.
    pub fn is_empty(&self) -> bool {
        self.must.is_empty()
            && self.must_not.is_empty()
            && self.should.is_empty()
            && self.filter.is_empty()
    }

    /// Total number of direct clauses.
    pub fn len(&self) -> usize {
        self.must.len() + self.must_not.len() + self.should.len() + self.filter.len()
    }

    pub fn to_json(&self) -> Json {
        let mut body = Map::new();
        for (key, clauses) in [
            ("must", &self.must),
            ("must_not", &self.must_not),
            ("should", &self.should),
            ("filter", &self.filter),
        ] {
            if !clauses.is_empty() {
                body.insert(
                    key.into(),
                    Json::Array(clauses.iter().map(Query::to_json).collect()),
                );
            }
        }
        if let Some(count) = self.minimum_should_match {
            body.insert("minimum_should_match".into(), json!(count));
        }
        json!({ "bool": body })
    }
}

impl Serialize for BoolQuery {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// Bounded range on one field.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeQuery {
    pub field: String,
    pub gt: Option<Scalar>,
    pub gte: Option<Scalar>,
    pub lt: Option<Scalar>,
    pub lte: Option<Scalar>,
}

impl RangeQuery {
    pub fn new(field: impl Into<String>) -> Self {
        RangeQuery {
            field: field.into(),
            gt: None,
            gte: None,
            lt: None,
            lte: None,
        }
    }

    pub fn gt(mut self, value: impl Into<Scalar>) -> Self {
        self.gt = Some(value.into());
        self
    }

    pub fn gte(mut self, value: impl Into<Scalar>) -> Self {
        self.gte = Some(value.into());
        self
    }

    pub fn lt(mut self, value: impl Into<Scalar>) -> Self {
        self.lt = Some(value.into());
        self
    }

    pub fn lte(mut self, value: impl Into<Scalar>) -> Self {
        self.lte = Some(value.into());
        self
    }

    /// Returns `true` when at least one bound is set.
    pub fn is_bounded(&self) -> bool {
        self.gt.is_some() || self.gte.is_some() || self.lt.is_some() || self.lte.is_some()
    }

    pub fn to_json(&self) -> Json {
        let mut bounds = Map::new();
        for (key, bound) in [
            ("gt", &self.gt),
            ("gte", &self.gte),
            ("lt", &self.lt),
            ("lte", &self.lte),
        ] {
            if let Some(value) = bound {
                bounds.insert(key.into(), scalar_json(value));
            }
        }
        json!({ "range": { self.field.as_str(): bounds } })
    }
}

/// Query isolated to the sub-documents under `path`.
#[derive(Debug, Clone, PartialEq)]
pub struct NestedQuery {
    pub path: String,
    pub query: Box<Query>,
    pub inner_hits: Option<InnerHits>,
}

impl NestedQuery {
    pub fn new(path: impl Into<String>, query: impl Into<Query>) -> Self {
        NestedQuery {
            path: path.into(),
            query: Box::new(query.into()),
            inner_hits: None,
        }
    }

    pub fn inner_hits(mut self, inner_hits: InnerHits) -> Self {
        self.inner_hits = Some(inner_hits);
        self
    }

    pub fn to_json(&self) -> Json {
        let mut body = Map::new();
        body.insert("path".into(), json!(self.path));
        body.insert("query".into(), self.query.to_json());
        if let Some(inner_hits) = &self.inner_hits {
            body.insert("inner_hits".into(), inner_hits.to_json());
        }
        json!({ "nested": body })
    }
}

/// Pagination of the matching sub-documents of a nested query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InnerHits {
    pub from: u32,
    pub size: u32,
    pub source: Option<SourceFilter>,
}

impl InnerHits {
    pub fn to_json(&self) -> Json {
        let mut body = Map::new();
        body.insert("from".into(), json!(self.from));
        body.insert("size".into(), json!(self.size));
        if let Some(source) = &self.source {
            body.insert("_source".into(), source.to_json());
        }
        Json::Object(body)
    }
}

/// `_source` include/exclude lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceFilter {
    pub includes: Vec<String>,
    pub excludes: Vec<String>,
}

impl SourceFilter {
    pub fn to_json(&self) -> Json {
        let mut body = Map::new();
        if !self.includes.is_empty() {
            body.insert("includes".into(), json!(self.includes));
        }
        if !self.excludes.is_empty() {
            body.insert("excludes".into(), json!(self.excludes));
        }
        Json::Object(body)
    }
}
