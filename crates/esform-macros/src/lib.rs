//! Proc macros for esform.
//!
//! # Available Macros
//!
//! - [`Searchable`] - Generate the field descriptor table and value accessor
//!   of a search form

mod searchable;

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

/// Derives the `Searchable` trait for search forms.
///
/// Every named field becomes a descriptor in declaration order. The first
/// string of `#[search(...)]` is the field's directive; an unannotated field
/// uses the empty directive (`must`, exact match).
///
/// # Field Attributes
///
/// | Attribute | Description |
/// |-----------|-------------|
/// | `"must;range"` | Directive string (also `directive = "..."`) |
/// | `field = "..."` | Target field name |
/// | `fields = "a,b"` | Fan-out target names, OR-ed |
/// | `rename = "..."` | Serialization key; `#[serde(rename = "...")]` is used when absent |
/// | `flatten` | Walk the sub-form (or selection) in the enclosing scope |
/// | `skip` | Leave the field out of the form |
///
/// # Field Types
///
/// The directive decides how the field is read:
///
/// | Directive | Field type |
/// |-----------|------------|
/// | `nested`, `obj`, `block`, `sort:nested`, or `flatten` | a `Searchable` type, optionally in `Option` or `Box` |
/// | `innerHits` | `esform::Select`, optionally in `Option` or `Box` |
/// | anything else | any `esform::Extract` type: scalars, `Option`, `Vec`, array helpers |
///
/// # Example
///
/// ```ignore
/// use esform::{Compiler, Select, Searchable};
///
/// #[derive(Searchable)]
/// struct Item {
///     #[search("must")]
///     sku: String,
/// }
///
/// #[derive(Searchable)]
/// struct Order {
///     #[search("must;match")]
///     title: String,
///
///     #[search("nested")]
///     items: Option<Item>,
///
///     #[search("sort;level:1")]
///     created: i32,
///
///     #[search("innerHits", flatten)]
///     select: Option<Select>,
///
///     #[search(skip)]
///     cache_key: u64,
/// }
///
/// let body = Compiler::new().to_search_body(&order)?;
/// ```
#[proc_macro_derive(Searchable, attributes(search))]
pub fn searchable_derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    searchable::searchable_derive_impl(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
