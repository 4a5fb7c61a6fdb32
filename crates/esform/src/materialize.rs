//! Turns a composed [`Arena`] into engine clauses.
//!
//! Materialization is bottom-up and pure: value payloads become relational
//! clauses, containers become bool queries and nested nodes wrap their bool
//! in a nested query. Nodes that produce no clause disappear, so absent
//! fields never leave empty containers behind.

use crate::compose::{Arena, NodeId, NodeKind, Payload};
use crate::directive::{Occur, Relational};
use crate::query::{BoolQuery, NestedQuery, Query, RangeQuery};
use crate::value::Scalar;

/// Bool query of the root node. Empty when nothing was composed.
pub fn root_query(arena: &Arena) -> BoolQuery {
    bool_of(arena, arena.root())
}

/// Clauses a node contributes to its parent's bucket.
fn members(arena: &Arena, id: NodeId) -> Vec<Query> {
    let node = arena.node(id);
    let mut queries: Vec<Query> = node.payload.iter().flat_map(payload_queries).collect();
    let mut inner = bool_of(arena, id);
    let grouped = node.groups.values().flat_map(|&group| members(arena, group));

    match &node.kind {
        // Groups opened on a nested scope stay inside its wrapper.
        NodeKind::Nested { path, inner_hits } => {
            inner.must.extend(grouped);
            require_should(&mut inner);
            if !inner.is_empty() {
                queries.push(Query::Nested(NestedQuery {
                    path: path.clone(),
                    query: Box::new(Query::Bool(inner)),
                    inner_hits: inner_hits.clone(),
                }));
            }
        }
        _ => {
            if !inner.is_empty() {
                queries.push(Query::Bool(inner));
            }
            queries.extend(grouped);
        }
    }
    queries
}

/// Bool query of a node's buckets.
///
/// Object scopes holding only clauses of their parent's occurrence are
/// spliced into that bucket.
pub(crate) fn bool_of(arena: &Arena, id: NodeId) -> BoolQuery {
    let mut query = BoolQuery::new();
    for (occur, children) in &arena.node(id).buckets {
        for &child in children.values() {
            let object = matches!(arena.node(child).kind, NodeKind::Object { .. });
            for clause in members(arena, child) {
                match (occur, clause) {
                    (Occur::Must, Query::Bool(inner)) if object && only_must(&inner) => {
                        query.must.extend(inner.must)
                    }
                    (Occur::Filter, Query::Bool(inner)) if object && only_filter(&inner) => {
                        query.filter.extend(inner.filter)
                    }
                    (Occur::Must, clause) => query.must.push(clause),
                    (Occur::Not, clause) => query.must_not.push(clause),
                    (Occur::Filter, clause) => query.filter.push(clause),
                    (Occur::Should, Query::Bool(alternatives)) if is_plain_or(&alternatives) => {
                        query.should.extend(alternatives.should)
                    }
                    (Occur::Should, clause) => query.should.push(clause),
                }
            }
        }
    }
    require_should(&mut query);
    query
}

/// A `should` clause next to `must` or `filter` clauses makes at least one
/// alternative required.
fn require_should(query: &mut BoolQuery) {
    if !query.should.is_empty() && (!query.must.is_empty() || !query.filter.is_empty()) {
        query.minimum_should_match = Some(1);
    }
}

fn only_must(query: &BoolQuery) -> bool {
    query.must_not.is_empty() && query.should.is_empty() && query.filter.is_empty()
}

fn only_filter(query: &BoolQuery) -> bool {
    query.must.is_empty() && query.must_not.is_empty() && query.should.is_empty()
}

fn is_plain_or(query: &BoolQuery) -> bool {
    query.must.is_empty()
        && query.must_not.is_empty()
        && query.filter.is_empty()
        && query.minimum_should_match.is_none()
}

fn payload_queries(payload: &Payload) -> Vec<Query> {
    match payload {
        Payload::Custom(queries) => queries.clone(),
        Payload::Value {
            fields,
            relational,
            values,
        } => {
            let clauses: Vec<Query> = fields
                .iter()
                .filter_map(|field| relational_clause(field, *relational, values))
                .collect();
            if clauses.len() > 1 {
                vec![Query::Bool(BoolQuery {
                    should: clauses,
                    ..BoolQuery::default()
                })]
            } else {
                clauses
            }
        }
    }
}

/// Builds the clause comparing `field` against `values`.
///
/// Returns `None` when there is nothing to compare, which for the
/// ignore-zero ranges includes every bound being zero.
pub fn relational_clause(field: &str, relational: Relational, values: &[Scalar]) -> Option<Query> {
    let first = values.first()?.clone();
    let second = values.get(1).cloned();

    let query = match relational {
        Relational::Eq => match second {
            None => Query::term(field, first),
            Some(_) => Query::terms(field, values.iter().cloned()),
        },
        Relational::Match | Relational::MatchAnd => {
            let build = |value: &Scalar| Query::Match {
                field: field.to_string(),
                query: value.clone(),
                operator_and: relational == Relational::MatchAnd,
            };
            match second {
                None => build(&first),
                Some(_) => Query::Bool(BoolQuery {
                    should: values.iter().map(build).collect(),
                    ..BoolQuery::default()
                }),
            }
        }
        Relational::Range | Relational::RangeLte => {
            let range = RangeQuery::new(field);
            let range = match second {
                None if relational == Relational::Range => range.gte(first),
                None => range.lte(first),
                Some(upper) if first.is_empty_string() => range.lte(upper),
                Some(upper) => range.gte(first).lte(upper),
            };
            range.into()
        }
        Relational::RangeIgnoreZero | Relational::RangeLteIgnoreZero => {
            let mut range = RangeQuery::new(field);
            match second {
                None if relational == Relational::RangeLteIgnoreZero => {
                    if !first.is_zero() {
                        range = range.lte(first);
                    }
                }
                lower_and_upper => {
                    if !first.is_zero() {
                        range = range.gte(first);
                    }
                    if let Some(upper) = lower_and_upper.filter(|upper| !upper.is_zero()) {
                        range = range.lte(upper);
                    }
                }
            }
            if !range.is_bounded() {
                return None;
            }
            range.into()
        }
        Relational::Lt => RangeQuery::new(field).lt(first).into(),
        Relational::Lte => RangeQuery::new(field).lte(first).into(),
        Relational::Gt => RangeQuery::new(field).gt(first).into(),
        Relational::Gte => RangeQuery::new(field).gte(first).into(),
    };
    Some(query)
}
