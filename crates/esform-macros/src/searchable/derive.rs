//! Implementation of the `#[derive(Searchable)]` macro.
//!
//! This macro generates an implementation of the `Searchable` trait: a
//! static descriptor table built from the field annotations and an accessor
//! returning each field's value.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{
    spanned::Spanned, Data, DeriveInput, Error, Fields, GenericArgument, PathArguments, Result,
    Type,
};

use super::attrs::{parse_search_attrs, serde_rename};

/// How the compiler reads a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Scalars through `Extract`.
    Values,
    /// A sub-form.
    Form,
    /// A pagination selection.
    Select,
}

impl FieldKind {
    /// Classifies a field from its directive string.
    pub fn classify(directive: &str, flatten: bool) -> Self {
        let mut form = flatten;
        for segment in directive.split(';').map(str::trim) {
            let (key, value) = match segment.split_once(':') {
                Some((key, value)) => (key.trim(), value.trim()),
                None => ("", segment),
            };
            match (key, value) {
                ("" | "nesting", "innerHits") => return FieldKind::Select,
                ("" | "nesting", "nested" | "obj") | ("", "block") | ("sort", "nested") => {
                    form = true
                }
                _ => {}
            }
        }
        if form {
            FieldKind::Form
        } else {
            FieldKind::Values
        }
    }
}

/// Returns the single type argument of `ty` when its last path segment is
/// `wrapper`.
fn unwrap_type<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    if segment.ident != wrapper {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first()? {
        GenericArgument::Type(inner) if args.args.len() == 1 => Some(inner),
        _ => None,
    }
}

fn value_expr(kind: FieldKind, ident: &syn::Ident, ty: &Type) -> TokenStream {
    let optional = unwrap_type(ty, "Option");
    match kind {
        FieldKind::Values => quote! {
            ::esform::FieldValue::Values(::esform::Extract::extract(&self.#ident))
        },
        FieldKind::Form => match optional {
            Some(_) => quote! {
                ::esform::FieldValue::Form(
                    self.#ident.as_ref().map(|form| form as &dyn ::esform::Searchable)
                )
            },
            None => quote! {
                ::esform::FieldValue::Form(::core::option::Option::Some(
                    &self.#ident as &dyn ::esform::Searchable
                ))
            },
        },
        FieldKind::Select => match optional {
            Some(inner) if unwrap_type(inner, "Box").is_some() => quote! {
                ::esform::FieldValue::Select(self.#ident.as_deref())
            },
            Some(_) => quote! {
                ::esform::FieldValue::Select(self.#ident.as_ref())
            },
            None if unwrap_type(ty, "Box").is_some() => quote! {
                ::esform::FieldValue::Select(::core::option::Option::Some(&*self.#ident))
            },
            None => quote! {
                ::esform::FieldValue::Select(::core::option::Option::Some(&self.#ident))
            },
        },
    }
}

/// Main implementation of the Searchable derive macro.
pub fn searchable_derive_impl(input: DeriveInput) -> Result<TokenStream> {
    let struct_name = &input.ident;
    let struct_name_str = struct_name.to_string();

    // Ensure we have a struct with named fields
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(Error::new(
                    input.span(),
                    "Searchable can only be derived for structs with named fields",
                ))
            }
        },
        _ => {
            return Err(Error::new(
                input.span(),
                "Searchable can only be derived for structs",
            ))
        }
    };

    let mut descriptors: Vec<TokenStream> = Vec::new();
    let mut field_matches: Vec<TokenStream> = Vec::new();

    for field in fields.iter() {
        let field_name = field
            .ident
            .as_ref()
            .ok_or_else(|| Error::new(field.span(), "expected named field"))?;

        let search_attrs = parse_search_attrs(&field.attrs)?;
        if search_attrs.skip {
            continue;
        }

        let ident_str = field_name.to_string();
        let ident_str = ident_str.strip_prefix("r#").unwrap_or(&ident_str).to_string();
        let directive = search_attrs.directive.clone().unwrap_or_default();

        let mut descriptor = quote! {
            ::esform::FieldDescriptor::new(#ident_str, #directive)
        };
        if let Some(target) = &search_attrs.field {
            descriptor = quote! { #descriptor.field(#target) };
        }
        if let Some(targets) = &search_attrs.fields {
            descriptor = quote! { #descriptor.fields(#targets) };
        }
        if let Some(rename) = search_attrs.rename.clone().or_else(|| serde_rename(&field.attrs)) {
            descriptor = quote! { #descriptor.rename(#rename) };
        }
        if search_attrs.flatten {
            descriptor = quote! { #descriptor.embedded() };
        }
        descriptors.push(descriptor);

        // Skipped fields keep their descriptor but are never read.
        if directive.trim() == "-" {
            continue;
        }

        let kind = FieldKind::classify(&directive, search_attrs.flatten);
        let value = value_expr(kind, field_name, &field.ty);
        field_matches.push(quote! {
            #ident_str => #value,
        });
    }

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let expanded = quote! {
        impl #impl_generics ::esform::Searchable for #struct_name #ty_generics #where_clause {
            fn form_name(&self) -> &'static str {
                ::core::concat!(::core::module_path!(), "::", #struct_name_str)
            }

            fn descriptors(&self) -> &'static [::esform::FieldDescriptor] {
                const DESCRIPTORS: &[::esform::FieldDescriptor] = &[#(#descriptors),*];
                DESCRIPTORS
            }

            fn field_value(&self, ident: &str) -> ::esform::FieldValue<'_> {
                match ident {
                    #(#field_matches)*
                    _ => ::esform::FieldValue::Absent,
                }
            }
        }
    };

    Ok(expanded)
}
