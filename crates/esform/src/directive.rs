//! Field directive grammar.
//!
//! A directive is a semicolon separated list of segments. A segment is
//! either `key:value[,value...]` or a bare keyword:
//!
//! ```text
//! logical:must@prices,should;relational:range;level:2
//! must;range;sort
//! -
//! ```
//!
//! | Key | Values | Bare keywords |
//! |-----|--------|---------------|
//! | `nesting` | `nested`, `obj`, `innerHits` | `nested`, `obj`, `innerHits` |
//! | `logical` | chain of `must`, `not`, `should`, `filter`, each optionally `@group`; `nested@path` | `must`, `not`, `should`, `filter` |
//! | `relational` | `eq`, `match`, `matchAnd`, `range`, `rangeLte`, `rangeIgnoreZero`, `rangeLteIgnoreZero`, `lt`, `lte`, `gt`, `gte` | same names |
//! | `sort` | `default`, `byValue` (`val`), `nested` | `sort` (default) |
//! | `mode` | engine sort mode (`min`, `max`, ...) | |
//! | `level` | integer | |
//! | `type` | `string`, `number` | |
//! | `field` / `fields` | target field name(s) | |
//! | | | `custom`, `block` |
//!
//! `-` on its own skips the field. Unknown keys and keywords are ignored.

use std::fmt;
use std::str::FromStr;

use crate::error::TagError;

/// How a field addresses a sub-document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Nesting {
    /// Plain value field.
    #[default]
    None,
    /// Isolated sub-document query.
    Nested,
    /// Flattened dotted-path sub-object.
    Obj,
    /// Pagination and field selection for the enclosing scope.
    InnerHits,
}

impl FromStr for Nesting {
    type Err = TagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" => Ok(Nesting::None),
            "nested" => Ok(Nesting::Nested),
            "obj" => Ok(Nesting::Obj),
            "innerHits" => Ok(Nesting::InnerHits),
            other => Err(TagError::UnsupportedNesting(other.to_string())),
        }
    }
}

/// Logical occurrence of a clause inside a boolean query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Occur {
    /// All must match (scored).
    Must,
    /// None may match.
    Not,
    /// At least one must match.
    Should,
    /// All must match (not scored).
    Filter,
}

impl Occur {
    /// Returns the directive keyword.
    pub fn as_str(self) -> &'static str {
        match self {
            Occur::Must => "must",
            Occur::Not => "not",
            Occur::Should => "should",
            Occur::Filter => "filter",
        }
    }
}

impl FromStr for Occur {
    type Err = TagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "must" => Ok(Occur::Must),
            "not" => Ok(Occur::Not),
            "should" => Ok(Occur::Should),
            "filter" => Ok(Occur::Filter),
            other => Err(TagError::UnsupportedLogical(other.to_string())),
        }
    }
}

impl fmt::Display for Occur {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One element of a logical chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainLink {
    /// `must`, `should@group`, ...
    Op { occur: Occur, group: Option<String> },
    /// `nested@path`: the preceding operator's container becomes a nested
    /// scope on `path`.
    Nested { path: String },
}

impl ChainLink {
    fn parse(item: &str) -> Result<Self, TagError> {
        let (op, group) = match item.split_once('@') {
            Some((op, group)) if !group.is_empty() => (op, Some(group)),
            Some(_) => return Err(TagError::UnsupportedLogical(item.to_string())),
            None => (item, None),
        };

        if op == "nested" {
            return match group {
                Some(path) => Ok(ChainLink::Nested {
                    path: path.to_string(),
                }),
                None => Err(TagError::UnsupportedLogical(item.to_string())),
            };
        }

        Ok(ChainLink::Op {
            occur: op.parse()?,
            group: group.map(str::to_string),
        })
    }

    fn group(&self) -> Option<&str> {
        match self {
            ChainLink::Op { group, .. } => group.as_deref(),
            ChainLink::Nested { .. } => None,
        }
    }
}

/// Relational operator turning values into leaf clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relational {
    /// Exact match of one value, or any of several.
    Eq,
    /// Full-text match.
    Match,
    /// Full-text match requiring every term.
    MatchAnd,
    /// `>= a`, or `>= a` and `<= b`; `["", b]` means `<= b`.
    Range,
    /// Like `Range`, but a single value is an upper bound.
    RangeLte,
    /// `Range` without bounds whose value is zero.
    RangeIgnoreZero,
    /// `RangeLte` without bounds whose value is zero.
    RangeLteIgnoreZero,
    /// Strictly less than the first value.
    Lt,
    /// Less than or equal to the first value.
    Lte,
    /// Strictly greater than the first value.
    Gt,
    /// Greater than or equal to the first value.
    Gte,
}

impl FromStr for Relational {
    type Err = TagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "eq" => Ok(Relational::Eq),
            "match" => Ok(Relational::Match),
            "matchAnd" => Ok(Relational::MatchAnd),
            "range" => Ok(Relational::Range),
            "rangeLte" => Ok(Relational::RangeLte),
            "rangeIgnoreZero" | "rangeIgnore0" => Ok(Relational::RangeIgnoreZero),
            "rangeLteIgnoreZero" | "rangeLteIgnore0" => Ok(Relational::RangeLteIgnoreZero),
            "lt" => Ok(Relational::Lt),
            "lte" => Ok(Relational::Lte),
            "gt" => Ok(Relational::Gt),
            "gte" => Ok(Relational::Gte),
            other => Err(TagError::UnsupportedRelational(other.to_string())),
        }
    }
}

/// How a sort-annotated field orders results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    /// Not a sort field.
    #[default]
    None,
    /// Direction taken from the field value.
    Default,
    /// Rank by the position of the document value among the supplied values.
    ByValue,
    /// Sort on a nested path restricted by the sub-form's query.
    Nested,
}

impl FromStr for SortMode {
    type Err = TagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default" => Ok(SortMode::Default),
            "byValue" | "val" => Ok(SortMode::ByValue),
            "nested" => Ok(SortMode::Nested),
            other => Err(TagError::UnsupportedSortMode(other.to_string())),
        }
    }
}

/// Value type used by scripted sorts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValueType {
    #[default]
    String,
    Number,
}

impl ValueType {
    pub fn as_str(self) -> &'static str {
        match self {
            ValueType::String => "string",
            ValueType::Number => "number",
        }
    }
}

impl FromStr for ValueType {
    type Err = TagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(ValueType::String),
            "number" => Ok(ValueType::Number),
            other => Err(TagError::UnsupportedValueType(other.to_string())),
        }
    }
}

/// Parsed directive of one form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub nesting: Nesting,
    pub chain: Vec<ChainLink>,
    /// `None` when the directive does not declare an operator.
    pub relational: Option<Relational>,
    pub sort: SortMode,
    /// Engine sort mode qualifier (`min`, `max`, ...).
    pub sort_qualifier: Option<String>,
    pub level: i32,
    pub value_type: ValueType,
    pub custom: bool,
    pub block: bool,
    pub field: Option<String>,
    pub fields: Vec<String>,
}

impl Default for Directive {
    fn default() -> Self {
        Directive {
            nesting: Nesting::None,
            chain: vec![ChainLink::Op {
                occur: Occur::Must,
                group: None,
            }],
            relational: None,
            sort: SortMode::None,
            sort_qualifier: None,
            level: 0,
            value_type: ValueType::String,
            custom: false,
            block: false,
            field: None,
            fields: Vec::new(),
        }
    }
}

impl Directive {
    /// Parses a directive string.
    ///
    /// Returns `Ok(None)` for `-`, meaning the field is skipped.
    pub fn parse(tag: &str) -> Result<Option<Directive>, TagError> {
        let tag = tag.trim();
        if tag == "-" {
            return Ok(None);
        }

        let mut directive = Directive::default();
        for segment in tag.split(';').map(str::trim) {
            if segment.is_empty() {
                continue;
            }
            match segment.split_once(':') {
                Some((key, value)) => directive.apply_pair(key.trim(), value.trim())?,
                None => directive.apply_keyword(segment),
            }
        }
        directive.validate_chain()?;
        Ok(Some(directive))
    }

    fn apply_pair(&mut self, key: &str, value: &str) -> Result<(), TagError> {
        match key {
            "nesting" => self.nesting = value.parse()?,
            "logical" => {
                self.chain = value
                    .split(',')
                    .map(|item| ChainLink::parse(item.trim()))
                    .collect::<Result<_, _>>()?;
            }
            "relational" => {
                self.relational = if value.is_empty() {
                    None
                } else {
                    Some(value.parse()?)
                };
            }
            "sort" => self.sort = value.parse()?,
            "mode" => self.sort_qualifier = Some(value.to_string()).filter(|m| !m.is_empty()),
            "level" => {
                self.level = value
                    .parse()
                    .map_err(|_| TagError::InvalidLevel(value.to_string()))?;
            }
            "type" => self.value_type = value.parse()?,
            "field" => self.field = Some(value.to_string()).filter(|f| !f.is_empty()),
            "fields" => {
                self.fields = value
                    .split(',')
                    .map(str::trim)
                    .filter(|f| !f.is_empty())
                    .map(str::to_string)
                    .collect();
            }
            _ => {}
        }
        Ok(())
    }

    fn apply_keyword(&mut self, keyword: &str) {
        if let Ok(nesting) = keyword.parse::<Nesting>() {
            self.nesting = nesting;
        } else if let Ok(occur) = keyword.parse::<Occur>() {
            self.chain = vec![ChainLink::Op { occur, group: None }];
        } else if let Ok(relational) = keyword.parse::<Relational>() {
            self.relational = Some(relational);
        } else {
            match keyword {
                "sort" => self.sort = SortMode::Default,
                "custom" => self.custom = true,
                "block" => self.block = true,
                _ => {}
            }
        }
    }

    fn validate_chain(&self) -> Result<(), TagError> {
        // Inner-hits fields may close their chain on a group or a nested
        // path: they attach pagination to that container instead of clauses.
        let open_end = self.nesting == Nesting::InnerHits;
        let mut seen: Vec<&str> = Vec::new();

        for (index, link) in self.chain.iter().enumerate() {
            let last = index + 1 == self.chain.len();
            if let ChainLink::Nested { path } = link {
                if index == 0 {
                    return Err(TagError::UnsupportedLogical(format!("nested@{}", path)));
                }
                if last && !open_end {
                    return Err(TagError::TerminalNested(path.clone()));
                }
            }
            if let Some(group) = link.group() {
                if last && !open_end {
                    return Err(TagError::TerminalGroup(group.to_string()));
                }
                if seen.contains(&group) {
                    return Err(TagError::DuplicateGroup(group.to_string()));
                }
                seen.push(group);
            }
        }
        Ok(())
    }

    /// Returns `true` when the chain routes through an inline nested path.
    pub fn has_nested_link(&self) -> bool {
        self.chain
            .iter()
            .any(|link| matches!(link, ChainLink::Nested { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(tag: &str) -> Directive {
        Directive::parse(tag).unwrap().unwrap()
    }

    fn op(occur: Occur, group: Option<&str>) -> ChainLink {
        ChainLink::Op {
            occur,
            group: group.map(str::to_string),
        }
    }

    #[test]
    fn dash_skips_field() {
        assert_eq!(Directive::parse("-").unwrap(), None);
        assert_eq!(Directive::parse(" - ").unwrap(), None);
    }

    #[test]
    fn empty_directive_uses_defaults() {
        let directive = parse("");
        assert_eq!(directive.chain, vec![op(Occur::Must, None)]);
        assert_eq!(directive.relational, None);
        assert_eq!(directive.value_type, ValueType::String);
        assert_eq!(directive.level, 0);
        assert_eq!(directive.sort, SortMode::None);
    }

    #[test]
    fn bare_keywords() {
        let directive = parse("should;range;sort;custom;block;nested");
        assert_eq!(directive.chain, vec![op(Occur::Should, None)]);
        assert_eq!(directive.relational, Some(Relational::Range));
        assert_eq!(directive.sort, SortMode::Default);
        assert!(directive.custom);
        assert!(directive.block);
        assert_eq!(directive.nesting, Nesting::Nested);
    }

    #[test]
    fn key_value_segments() {
        let directive = parse(
            "logical:must@prices,should;relational:rangeLte;level:2;type:number;sort:val;mode:min",
        );
        assert_eq!(
            directive.chain,
            vec![op(Occur::Must, Some("prices")), op(Occur::Should, None)]
        );
        assert_eq!(directive.relational, Some(Relational::RangeLte));
        assert_eq!(directive.level, 2);
        assert_eq!(directive.value_type, ValueType::Number);
        assert_eq!(directive.sort, SortMode::ByValue);
        assert_eq!(directive.sort_qualifier.as_deref(), Some("min"));
    }

    #[test]
    fn field_names_in_directive() {
        let directive = parse("field:goods.area;fields: a , b ,");
        assert_eq!(directive.field.as_deref(), Some("goods.area"));
        assert_eq!(directive.fields, vec!["a", "b"]);
    }

    #[test]
    fn ignore_zero_aliases() {
        assert_eq!(
            parse("relational:rangeIgnore0").relational,
            Some(Relational::RangeIgnoreZero)
        );
        assert_eq!(
            parse("rangeLteIgnoreZero").relational,
            Some(Relational::RangeLteIgnoreZero)
        );
    }

    #[test]
    fn unknown_keywords_are_ignored() {
        let directive = parse("must;frobnicate;color:blue");
        assert_eq!(directive, parse("must"));
    }

    #[test]
    fn negative_level() {
        assert_eq!(parse("sort;level:-1").level, -1);
    }

    #[test]
    fn invalid_level() {
        assert_eq!(
            Directive::parse("sort;level:abc"),
            Err(TagError::InvalidLevel("abc".into()))
        );
        assert_eq!(
            Directive::parse("sort;level:"),
            Err(TagError::InvalidLevel(String::new()))
        );
    }

    #[test]
    fn unsupported_logical() {
        assert_eq!(
            Directive::parse("logical:must,maybe"),
            Err(TagError::UnsupportedLogical("maybe".into()))
        );
        assert_eq!(
            Directive::parse("logical:must@"),
            Err(TagError::UnsupportedLogical("must@".into()))
        );
        assert!(matches!(
            Directive::parse("logical:nested@items,must"),
            Err(TagError::UnsupportedLogical(_))
        ));
    }

    #[test]
    fn terminal_group_is_rejected() {
        assert_eq!(
            Directive::parse("logical:must,should@g"),
            Err(TagError::TerminalGroup("g".into()))
        );
    }

    #[test]
    fn terminal_group_allowed_for_inner_hits() {
        let directive = parse("innerHits;logical:must,nested@items");
        assert!(directive.has_nested_link());
        assert!(Directive::parse("innerHits;logical:must@g").is_ok());
    }

    #[test]
    fn terminal_nested_is_rejected_for_values() {
        assert_eq!(
            Directive::parse("logical:must,nested@items"),
            Err(TagError::TerminalNested("items".into()))
        );
    }

    #[test]
    fn duplicate_group_is_rejected() {
        assert_eq!(
            Directive::parse("logical:must@g,should@g,must"),
            Err(TagError::DuplicateGroup("g".into()))
        );
    }

    #[test]
    fn unsupported_relational_sort_and_type() {
        assert_eq!(
            Directive::parse("relational:like"),
            Err(TagError::UnsupportedRelational("like".into()))
        );
        assert_eq!(
            Directive::parse("sort:random"),
            Err(TagError::UnsupportedSortMode("random".into()))
        );
        assert_eq!(
            Directive::parse("type:date"),
            Err(TagError::UnsupportedValueType("date".into()))
        );
        assert_eq!(
            Directive::parse("nesting:deep"),
            Err(TagError::UnsupportedNesting("deep".into()))
        );
    }

    #[test]
    fn inline_nested_chain() {
        let directive = parse("logical:must,nested@items,should");
        assert_eq!(
            directive.chain,
            vec![
                op(Occur::Must, None),
                ChainLink::Nested {
                    path: "items".into()
                },
                op(Occur::Should, None),
            ]
        );
    }
}
