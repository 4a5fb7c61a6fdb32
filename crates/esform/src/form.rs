//! Form binding.
//!
//! A form is any type implementing [`Searchable`]. The trait exposes a static
//! table of [`FieldDescriptor`]s and an accessor returning each field's value
//! by identifier. It is normally derived:
//!
//! ```
//! use esform::{ArrayInt64, Searchable};
//!
//! #[derive(Searchable)]
//! struct GoodsForm {
//!     #[search("must")]
//!     integer: Vec<i32>,
//!     #[search("must;range")]
//!     long: ArrayInt64,
//!     #[search("should", fields = "goodsArea,userArea")]
//!     area: Vec<i32>,
//! }
//! ```
//!
//! Hand-written bindings build the table with the `const` constructors of
//! [`FieldDescriptor`] and return [`FieldValue`]s from [`Searchable::field_value`].

use serde::{Deserialize, Serialize};

use crate::array::ArrayKeyword;
use crate::directive::Directive;
use crate::query::{InnerHits, SourceFilter};
use crate::value::Scalar;

/// A type that can be compiled into a search query.
///
/// The trait is object safe: sub-forms are visited as `&dyn Searchable`.
pub trait Searchable {
    /// Stable name of the form type, used to cache its parsed directives.
    fn form_name(&self) -> &'static str;

    /// Static description of every field, in declaration order.
    fn descriptors(&self) -> &'static [FieldDescriptor];

    /// Returns the current value of the field with the given identifier.
    fn field_value(&self, ident: &str) -> FieldValue<'_>;
}

impl<T: Searchable + ?Sized> Searchable for &T {
    fn form_name(&self) -> &'static str {
        (**self).form_name()
    }

    fn descriptors(&self) -> &'static [FieldDescriptor] {
        (**self).descriptors()
    }

    fn field_value(&self, ident: &str) -> FieldValue<'_> {
        (**self).field_value(ident)
    }
}

impl<T: Searchable + ?Sized> Searchable for Box<T> {
    fn form_name(&self) -> &'static str {
        (**self).form_name()
    }

    fn descriptors(&self) -> &'static [FieldDescriptor] {
        (**self).descriptors()
    }

    fn field_value(&self, ident: &str) -> FieldValue<'_> {
        (**self).field_value(ident)
    }
}

/// Static metadata of one form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Rust identifier of the field.
    pub ident: &'static str,
    /// Directive string (`"must;range"`, `"-"`, ...).
    pub directive: &'static str,
    /// Explicit target field name.
    pub field: Option<&'static str>,
    /// Comma-separated fan-out target names.
    pub fields: Option<&'static str>,
    /// Serialization key of the field.
    pub rename: Option<&'static str>,
    /// Transparently flattened into the enclosing scope.
    pub embedded: bool,
}

impl FieldDescriptor {
    pub const fn new(ident: &'static str, directive: &'static str) -> Self {
        FieldDescriptor {
            ident,
            directive,
            field: None,
            fields: None,
            rename: None,
            embedded: false,
        }
    }

    pub const fn field(mut self, field: &'static str) -> Self {
        self.field = Some(field);
        self
    }

    pub const fn fields(mut self, fields: &'static str) -> Self {
        self.fields = Some(fields);
        self
    }

    pub const fn rename(mut self, rename: &'static str) -> Self {
        self.rename = Some(rename);
        self
    }

    pub const fn embedded(mut self) -> Self {
        self.embedded = true;
        self
    }

    /// Resolves the target field names of this field.
    ///
    /// Precedence: fan-out list, then single field name, then serialization
    /// key, then identifier. Names set in the directive override those set
    /// on the descriptor.
    pub fn target_names(&self, directive: &Directive) -> Vec<String> {
        if !directive.fields.is_empty() {
            return directive.fields.clone();
        }
        if let Some(fields) = self.fields {
            let names: Vec<String> = fields
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect();
            if !names.is_empty() {
                return names;
            }
        }
        let single = directive
            .field
            .as_deref()
            .or(self.field)
            .or(self.rename)
            .unwrap_or(self.ident);
        vec![single.to_string()]
    }
}

/// Value of a form field as seen by the compiler.
pub enum FieldValue<'a> {
    /// Extracted scalars; empty means absent.
    Values(Vec<Scalar>),
    /// A sub-form; `None` means absent.
    Form(Option<&'a dyn Searchable>),
    /// Pagination and field selection; `None` means absent.
    Select(Option<&'a Select>),
    /// No such field.
    Absent,
}

impl std::fmt::Debug for FieldValue<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Values(values) => f.debug_tuple("Values").field(values).finish(),
            FieldValue::Form(form) => f
                .debug_tuple("Form")
                .field(&form.map(|form| form.form_name()))
                .finish(),
            FieldValue::Select(select) => f.debug_tuple("Select").field(select).finish(),
            FieldValue::Absent => f.write_str("Absent"),
        }
    }
}

/// Pagination and `_source` selection.
///
/// At the root of a form it pages the search itself; inside a nested scope it
/// pages that scope's inner hits. Zero page or size falls back to the
/// configured defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Select {
    pub page: u32,
    pub size: u32,
    pub include: ArrayKeyword,
    pub exclude: ArrayKeyword,
}

impl Select {
    pub fn new(page: u32, size: u32) -> Self {
        Select {
            page,
            size,
            ..Select::default()
        }
    }

    pub fn include<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn exclude<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Page number, or `default` when unset.
    pub fn page_or(&self, default: u32) -> u32 {
        if self.page == 0 {
            default
        } else {
            self.page
        }
    }

    /// Page size, or `default` when unset.
    pub fn size_or(&self, default: u32) -> u32 {
        if self.size == 0 {
            default
        } else {
            self.size
        }
    }

    /// `_source` filter, or `None` when no field is selected.
    pub fn source(&self) -> Option<SourceFilter> {
        if self.include.is_empty() && self.exclude.is_empty() {
            return None;
        }
        Some(SourceFilter {
            includes: self.include.to_vec(),
            excludes: self.exclude.to_vec(),
        })
    }

    /// Inner-hits spec for a nested scope.
    pub fn inner_hits(&self, default_page: u32, default_size: u32) -> InnerHits {
        let page = self.page_or(default_page);
        let size = self.size_or(default_size);
        InnerHits {
            from: page.saturating_sub(1).saturating_mul(size),
            size,
            source: self.source(),
        }
    }
}
