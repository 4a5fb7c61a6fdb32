//! Typed sort criteria.
//!
//! Provides [`Dir`] for sort direction and [`Sort`] for the criteria the
//! compiler emits, serialized to the engine's sort JSON.

use serde::{Serialize, Serializer};
use serde_json::{json, Map, Value as Json};

use crate::directive::ValueType;
use crate::query::Query;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dir {
    /// Ascending order (smallest first).
    #[default]
    Asc,
    /// Descending order (largest first).
    Desc,
}

impl Dir {
    /// Returns `true` if this is ascending order.
    pub fn is_asc(self) -> bool {
        matches!(self, Dir::Asc)
    }

    /// Returns `true` if this is descending order.
    pub fn is_desc(self) -> bool {
        matches!(self, Dir::Desc)
    }

    /// Returns the engine name of this direction.
    pub fn as_str(self) -> &'static str {
        match self {
            Dir::Asc => "asc",
            Dir::Desc => "desc",
        }
    }
}

impl std::fmt::Display for Dir {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One sort criterion.
#[derive(Debug, Clone, PartialEq)]
pub enum Sort {
    Field(FieldSort),
    Script(ScriptSort),
    /// Opaque criterion passed through verbatim.
    Raw(Json),
}

impl Sort {
    /// Ascending sort on a field.
    pub fn asc(field: impl Into<String>) -> Self {
        Sort::Field(FieldSort::new(field, Dir::Asc))
    }

    /// Descending sort on a field.
    pub fn desc(field: impl Into<String>) -> Self {
        Sort::Field(FieldSort::new(field, Dir::Desc))
    }

    pub fn to_json(&self) -> Json {
        match self {
            Sort::Field(sort) => sort.to_json(),
            Sort::Script(sort) => sort.to_json(),
            Sort::Raw(raw) => raw.clone(),
        }
    }
}

impl Serialize for Sort {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl From<FieldSort> for Sort {
    fn from(sort: FieldSort) -> Self {
        Sort::Field(sort)
    }
}

impl From<ScriptSort> for Sort {
    fn from(sort: ScriptSort) -> Self {
        Sort::Script(sort)
    }
}

/// Sort on a document field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSort {
    pub field: String,
    pub order: Dir,
    /// Multi-value selection (`min`, `max`, `avg`, ...).
    pub mode: Option<String>,
    pub nested: Option<NestedSort>,
}

impl FieldSort {
    pub fn new(field: impl Into<String>, order: Dir) -> Self {
        FieldSort {
            field: field.into(),
            order,
            mode: None,
            nested: None,
        }
    }

    pub fn mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }

    pub fn nested(mut self, nested: NestedSort) -> Self {
        self.nested = Some(nested);
        self
    }

    pub fn to_json(&self) -> Json {
        let mut body = Map::new();
        body.insert("order".into(), json!(self.order.as_str()));
        if let Some(mode) = &self.mode {
            body.insert("mode".into(), json!(mode));
        }
        if let Some(nested) = &self.nested {
            body.insert("nested".into(), nested.to_json());
        }
        json!({ self.field.as_str(): body })
    }
}

/// Restricts a field sort to the nested sub-documents matching `filter`.
#[derive(Debug, Clone, PartialEq)]
pub struct NestedSort {
    pub path: String,
    pub filter: Option<Box<Query>>,
}

impl NestedSort {
    pub fn to_json(&self) -> Json {
        let mut body = Map::new();
        body.insert("path".into(), json!(self.path));
        if let Some(filter) = &self.filter {
            body.insert("filter".into(), filter.to_json());
        }
        Json::Object(body)
    }
}

/// Script-computed sort key.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptSort {
    pub source: String,
    pub params: Map<String, Json>,
    pub value_type: ValueType,
    pub order: Dir,
}

impl ScriptSort {
    pub fn to_json(&self) -> Json {
        json!({
            "_script": {
                "type": self.value_type.as_str(),
                "script": {
                    "source": self.source,
                    "params": self.params,
                },
                "order": self.order.as_str(),
            }
        })
    }
}
