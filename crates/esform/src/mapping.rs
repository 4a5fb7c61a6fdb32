//! Optional index mapping lookup.
//!
//! A [`Mapping`] lets the compiler pick operator semantics from the engine's
//! field types: an unannotated `text` field is matched, a `date` field is
//! ranged and everything else is compared exactly. Script sorts also take
//! their value type from the mapping. An operator or type declared in a
//! directive always wins over the mapping.

use indexmap::IndexMap;
use serde_json::{Map, Value as Json};

use crate::directive::{Relational, ValueType};
use crate::error::{CompileError, Result};

/// Engine field type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Text,
    Keyword,
    Date,
    Long,
    Integer,
    Short,
    Byte,
    Double,
    Float,
    HalfFloat,
    ScaledFloat,
    Boolean,
    Nested,
    Object,
    Other(String),
}

impl FieldType {
    pub fn parse(name: &str) -> Self {
        match name {
            "text" => FieldType::Text,
            "keyword" => FieldType::Keyword,
            "date" => FieldType::Date,
            "long" => FieldType::Long,
            "integer" => FieldType::Integer,
            "short" => FieldType::Short,
            "byte" => FieldType::Byte,
            "double" => FieldType::Double,
            "float" => FieldType::Float,
            "half_float" => FieldType::HalfFloat,
            "scaled_float" => FieldType::ScaledFloat,
            "boolean" => FieldType::Boolean,
            "nested" => FieldType::Nested,
            "object" => FieldType::Object,
            other => FieldType::Other(other.to_string()),
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            FieldType::Long
                | FieldType::Integer
                | FieldType::Short
                | FieldType::Byte
                | FieldType::Double
                | FieldType::Float
                | FieldType::HalfFloat
                | FieldType::ScaledFloat
        )
    }

    /// Operator used when a directive declares none.
    pub fn default_relational(&self) -> Relational {
        match self {
            FieldType::Text => Relational::Match,
            FieldType::Date => Relational::Range,
            _ => Relational::Eq,
        }
    }

    /// Value type of script sorts on this field.
    pub fn value_type(&self) -> ValueType {
        if self.is_numeric() {
            ValueType::Number
        } else {
            ValueType::String
        }
    }
}

/// Field types of an index, keyed by dotted path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mapping {
    fields: IndexMap<String, FieldType>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces one field.
    pub fn with_field(mut self, path: impl Into<String>, field_type: FieldType) -> Self {
        self.fields.insert(path.into(), field_type);
        self
    }

    /// Parses a mapping from JSON text.
    ///
    /// See [`Mapping::from_json`] for the accepted shapes.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let json: Json =
            serde_json::from_str(text).map_err(|e| CompileError::InvalidMapping(e.to_string()))?;
        Self::from_json(&json)
    }

    /// Reads a mapping from the engine's JSON.
    ///
    /// Accepts the `GET /index/_mapping` response, an index body with a
    /// `mappings` key, a bare mappings object, or a legacy object wrapped in
    /// a type name such as `_doc`. Object properties and multi-fields are
    /// flattened into dotted paths.
    pub fn from_json(json: &Json) -> Result<Self> {
        let properties = find_properties(json).ok_or_else(|| {
            CompileError::InvalidMapping("no \"properties\" object found".to_string())
        })?;
        let mut mapping = Mapping::new();
        mapping.collect(properties, "")?;
        Ok(mapping)
    }

    fn collect(&mut self, properties: &Map<String, Json>, prefix: &str) -> Result<()> {
        for (name, definition) in properties {
            let path = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{}.{}", prefix, name)
            };
            let definition = definition.as_object().ok_or_else(|| {
                CompileError::InvalidMapping(format!("field '{}' is not an object", path))
            })?;

            let children = definition.get("properties").and_then(Json::as_object);
            let field_type = match definition.get("type").and_then(Json::as_str) {
                Some(name) => FieldType::parse(name),
                None if children.is_some() => FieldType::Object,
                None => {
                    return Err(CompileError::InvalidMapping(format!(
                        "field '{}' has no type",
                        path
                    )))
                }
            };
            self.fields.insert(path.clone(), field_type);

            if let Some(children) = children {
                self.collect(children, &path)?;
            }
            if let Some(multi) = definition.get("fields").and_then(Json::as_object) {
                self.collect(multi, &path)?;
            }
        }
        Ok(())
    }

    pub fn field_type(&self, path: &str) -> Option<&FieldType> {
        self.fields.get(path)
    }

    /// Default operator for `path`, when the field is mapped.
    pub fn default_relational(&self, path: &str) -> Option<Relational> {
        self.field_type(path).map(FieldType::default_relational)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

fn find_properties(json: &Json) -> Option<&Map<String, Json>> {
    let object = json.as_object()?;
    if let Some(properties) = object.get("properties").and_then(Json::as_object) {
        return Some(properties);
    }
    if let Some(mappings) = object.get("mappings") {
        return find_properties(mappings);
    }
    if object.len() == 1 {
        return object.values().next().and_then(find_properties);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Json {
        json!({
            "goods": {
                "mappings": {
                    "properties": {
                        "title": {"type": "text", "fields": {"raw": {"type": "keyword"}}},
                        "created": {"type": "date"},
                        "price": {"type": "scaled_float", "scaling_factor": 100},
                        "shop": {"properties": {"name": {"type": "keyword"}}},
                        "items": {"type": "nested", "properties": {"qty": {"type": "integer"}}}
                    }
                }
            }
        })
    }

    #[test]
    fn flattens_paths() {
        let mapping = Mapping::from_json(&sample()).unwrap();
        assert_eq!(mapping.field_type("title"), Some(&FieldType::Text));
        assert_eq!(mapping.field_type("title.raw"), Some(&FieldType::Keyword));
        assert_eq!(mapping.field_type("shop"), Some(&FieldType::Object));
        assert_eq!(mapping.field_type("shop.name"), Some(&FieldType::Keyword));
        assert_eq!(mapping.field_type("items"), Some(&FieldType::Nested));
        assert_eq!(mapping.field_type("items.qty"), Some(&FieldType::Integer));
        assert_eq!(mapping.len(), 8);
    }

    #[test]
    fn accepts_bare_and_typed_shapes() {
        let bare = json!({"properties": {"a": {"type": "long"}}});
        assert_eq!(Mapping::from_json(&bare).unwrap().len(), 1);

        let typed = json!({"mappings": {"_doc": {"properties": {"a": {"type": "long"}}}}});
        assert_eq!(
            Mapping::from_json(&typed).unwrap().field_type("a"),
            Some(&FieldType::Long)
        );
    }

    #[test]
    fn default_operators() {
        let mapping = Mapping::from_json(&sample()).unwrap();
        assert_eq!(mapping.default_relational("title"), Some(Relational::Match));
        assert_eq!(mapping.default_relational("created"), Some(Relational::Range));
        assert_eq!(mapping.default_relational("price"), Some(Relational::Eq));
        assert_eq!(mapping.default_relational("missing"), None);
    }

    #[test]
    fn value_types() {
        assert_eq!(FieldType::ScaledFloat.value_type(), ValueType::Number);
        assert_eq!(FieldType::Keyword.value_type(), ValueType::String);
        assert_eq!(FieldType::parse("geo_point"), FieldType::Other("geo_point".into()));
    }

    #[test]
    fn rejects_malformed_mappings() {
        assert!(matches!(
            Mapping::from_json_str("{not json"),
            Err(CompileError::InvalidMapping(_))
        ));
        assert!(matches!(
            Mapping::from_json(&json!({"a": 1, "b": 2})),
            Err(CompileError::InvalidMapping(_))
        ));
        assert!(matches!(
            Mapping::from_json(&json!({"properties": {"a": {"index": false}}})),
            Err(CompileError::InvalidMapping(_))
        ));
    }
}
