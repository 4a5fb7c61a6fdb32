//! Logical composition tree.
//!
//! Every compile builds one [`Arena`] of nodes. A node owns one bucket per
//! occurrence (`must`, `not`, `should`, `filter`), each mapping a key to a
//! child node, plus a separate table of named groups. Walking a directive's
//! logical chain descends through these tables, creating nodes on demand;
//! the first field to claim a `(occurrence, key)` pair or a group name owns
//! the node and every later field merges into it.
//!
//! ```text
//! must@prices,should  ─►  root.must[""] ─► group "prices" ─► should[field]
//! must,nested@items,must  ─►  root.must["items"] (nested "items") ─► must[field]
//! ```

use indexmap::IndexMap;

use crate::directive::{ChainLink, Occur, Relational};
use crate::query::{InnerHits, Query};
use crate::value::Scalar;

/// Index of a node in an [`Arena`].
pub type NodeId = usize;

/// What a node stands for when it is materialized.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// The form itself.
    Root,
    /// Anonymous container created by a chain element.
    Logical,
    /// Named container shared by every field naming the group.
    Group,
    /// Scope-isolated sub-document query.
    Nested {
        path: String,
        inner_hits: Option<InnerHits>,
    },
    /// Flattened sub-object addressed by dotted paths.
    Object { path: String },
}

/// Clauses attached directly to a node.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Values of one field, compared against every target name.
    Value {
        fields: Vec<String>,
        relational: Relational,
        values: Vec<Scalar>,
    },
    /// Clauses returned by the custom query hook.
    Custom(Vec<Query>),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub buckets: IndexMap<Occur, IndexMap<String, NodeId>>,
    pub groups: IndexMap<String, NodeId>,
    pub payload: Vec<Payload>,
}

impl Node {
    fn new(kind: NodeKind) -> Self {
        Node {
            kind,
            buckets: IndexMap::new(),
            groups: IndexMap::new(),
            payload: Vec::new(),
        }
    }
}

/// Storage for the nodes of one compile.
#[derive(Debug, Clone)]
pub struct Arena {
    nodes: Vec<Node>,
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

impl Arena {
    /// Creates an arena holding only the root node.
    pub fn new() -> Self {
        Arena {
            nodes: vec![Node::new(NodeKind::Root)],
        }
    }

    pub fn root(&self) -> NodeId {
        0
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn set_kind(&mut self, id: NodeId, kind: NodeKind) {
        self.nodes[id].kind = kind;
    }

    pub fn push(&mut self, id: NodeId, payload: Payload) {
        self.nodes[id].payload.push(payload);
    }

    /// Sets the inner-hits spec of a nested node. Returns `false` for any
    /// other kind of node.
    pub fn set_inner_hits(&mut self, id: NodeId, hits: InnerHits) -> bool {
        match &mut self.nodes[id].kind {
            NodeKind::Nested { inner_hits, .. } => {
                *inner_hits = Some(hits);
                true
            }
            _ => false,
        }
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.push(Node::new(kind));
        self.nodes.len() - 1
    }

    /// Returns the child under `occur`/`key`, creating it with `kind` if
    /// the slot is free.
    pub fn child(&mut self, parent: NodeId, occur: Occur, key: &str, kind: NodeKind) -> NodeId {
        if let Some(&id) = self.nodes[parent]
            .buckets
            .get(&occur)
            .and_then(|bucket| bucket.get(key))
        {
            return id;
        }
        let id = self.alloc(kind);
        self.nodes[parent]
            .buckets
            .entry(occur)
            .or_default()
            .insert(key.to_string(), id);
        id
    }

    /// Returns the named group under `parent`, creating it if needed.
    pub fn group(&mut self, parent: NodeId, name: &str) -> NodeId {
        if let Some(&id) = self.nodes[parent].groups.get(name) {
            return id;
        }
        let id = self.alloc(NodeKind::Group);
        self.nodes[parent].groups.insert(name.to_string(), id);
        id
    }

    /// Walks `chain` from `scope` and returns the node the field attaches to,
    /// together with the dotted path in effect at that node.
    ///
    /// The last operator is keyed by `leaf_key`. An operator followed by
    /// `nested@path` is keyed by that path and becomes a nested scope on it.
    /// Every other operator uses the empty key.
    pub fn attach(
        &mut self,
        scope: NodeId,
        scope_path: &str,
        chain: &[ChainLink],
        leaf_key: &str,
    ) -> (NodeId, String) {
        let mut current = scope;
        let mut path = scope_path.to_string();

        for (index, link) in chain.iter().enumerate() {
            let ChainLink::Op { occur, group } = link else {
                continue;
            };

            if index + 1 == chain.len() {
                current = self.child(current, *occur, leaf_key, NodeKind::Logical);
            } else if let Some(ChainLink::Nested { path: nested }) = chain.get(index + 1) {
                let full = join_path(&path, nested);
                current = self.child(
                    current,
                    *occur,
                    nested,
                    NodeKind::Nested {
                        path: full.clone(),
                        inner_hits: None,
                    },
                );
                path = full;
            } else {
                current = self.child(current, *occur, "", NodeKind::Logical);
            }

            if let Some(group) = group {
                current = self.group(current, group);
            }
        }
        (current, path)
    }
}

/// Joins a scope path and a field name with a dot.
pub fn join_path(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", path, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directive::Directive;

    fn chain(tag: &str) -> Vec<ChainLink> {
        Directive::parse(tag).unwrap().unwrap().chain
    }

    #[test]
    fn single_operator_keys_by_field() {
        let mut arena = Arena::new();
        let (leaf, path) = arena.attach(arena.root(), "", &chain("must"), "name");
        assert_eq!(path, "");
        assert_eq!(arena.node(0).buckets[&Occur::Must]["name"], leaf);
    }

    #[test]
    fn intermediate_operators_use_empty_key() {
        let mut arena = Arena::new();
        let (a, _) = arena.attach(0, "", &chain("logical:must,should"), "a");
        let (b, _) = arena.attach(0, "", &chain("logical:must,should"), "b");
        let middle = arena.node(0).buckets[&Occur::Must][""];
        assert_eq!(arena.node(middle).buckets[&Occur::Should].len(), 2);
        assert_ne!(a, b);
    }

    #[test]
    fn same_group_is_shared() {
        let mut arena = Arena::new();
        let (a, _) = arena.attach(0, "", &chain("logical:must@g,should"), "a");
        let (b, _) = arena.attach(0, "", &chain("logical:must@g,should"), "b");
        let middle = arena.node(0).buckets[&Occur::Must][""];
        let group = arena.node(middle).groups["g"];
        assert_eq!(arena.node(group).kind, NodeKind::Group);
        assert_eq!(arena.node(group).buckets[&Occur::Should]["a"], a);
        assert_eq!(arena.node(group).buckets[&Occur::Should]["b"], b);
    }

    #[test]
    fn first_writer_keeps_the_slot() {
        let mut arena = Arena::new();
        let first = arena.child(0, Occur::Must, "k", NodeKind::Logical);
        let second = arena.child(
            0,
            Occur::Must,
            "k",
            NodeKind::Object {
                path: "other".into(),
            },
        );
        assert_eq!(first, second);
        assert_eq!(arena.node(first).kind, NodeKind::Logical);
    }

    #[test]
    fn inline_nested_link_opens_scope() {
        let mut arena = Arena::new();
        let (leaf, path) = arena.attach(0, "order", &chain("logical:must,nested@items,should"), "sku");
        assert_eq!(path, "order.items");
        let scope = arena.node(0).buckets[&Occur::Must]["items"];
        assert_eq!(
            arena.node(scope).kind,
            NodeKind::Nested {
                path: "order.items".into(),
                inner_hits: None
            }
        );
        assert_eq!(arena.node(scope).buckets[&Occur::Should]["sku"], leaf);
    }

    #[test]
    fn trailing_nested_link_returns_scope() {
        let mut arena = Arena::new();
        let (node, path) = arena.attach(0, "", &chain("innerHits;logical:must,nested@items"), "page");
        assert_eq!(path, "items");
        let hits = InnerHits {
            from: 0,
            size: 5,
            source: None,
        };
        assert!(arena.set_inner_hits(node, hits));
        assert!(!arena.set_inner_hits(0, InnerHits { from: 0, size: 1, source: None }));
    }

    #[test]
    fn paths_join_with_dots() {
        assert_eq!(join_path("", "a"), "a");
        assert_eq!(join_path("a", "b"), "a.b");
    }
}
