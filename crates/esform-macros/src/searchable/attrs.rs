//! Attribute parsing for the Searchable derive macro.
//!
//! This module provides parsers for the `#[search(...)]` field attributes
//! and picks up `#[serde(rename = "...")]` as the field's serialization key.

use proc_macro2::{Span, TokenStream};
use syn::{
    parse::{Parse, ParseStream},
    punctuated::Punctuated,
    spanned::Spanned,
    Attribute, Error, Expr, ExprLit, Lit, LitStr, Meta, Result, Token,
};

/// Field-level attributes from `#[search(...)]`.
#[derive(Debug, Clone)]
pub struct SearchAttr {
    /// Directive string, given first or as `directive = "..."`.
    pub directive: Option<String>,
    /// Leave the field out of the form.
    pub skip: bool,
    /// Flatten the field into the enclosing scope.
    pub flatten: bool,
    /// Explicit target field name.
    pub field: Option<String>,
    /// Comma-separated fan-out target names.
    pub fields: Option<String>,
    /// Serialization key, overriding `#[serde(rename)]`.
    pub rename: Option<String>,
    /// The span for error reporting.
    pub span: Span,
}

impl Default for SearchAttr {
    fn default() -> Self {
        SearchAttr {
            directive: None,
            skip: false,
            flatten: false,
            field: None,
            fields: None,
            rename: None,
            span: Span::call_site(),
        }
    }
}

fn string_value(expr: &Expr, key: &str) -> Result<String> {
    match expr {
        Expr::Lit(ExprLit {
            lit: Lit::Str(s), ..
        }) => Ok(s.value()),
        other => Err(Error::new(
            other.span(),
            format!("{} must be a string literal", key),
        )),
    }
}

impl Parse for SearchAttr {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut attr = SearchAttr::default();

        if input.peek(LitStr) {
            let directive: LitStr = input.parse()?;
            attr.directive = Some(directive.value());
            attr.span = directive.span();
            if input.is_empty() {
                return Ok(attr);
            }
            input.parse::<Token![,]>()?;
        }

        let content: Punctuated<Meta, Token![,]> = Punctuated::parse_terminated(input)?;

        for meta in content {
            match &meta {
                Meta::Path(p) if p.is_ident("skip") => attr.skip = true,
                Meta::Path(p) if p.is_ident("flatten") => attr.flatten = true,

                Meta::NameValue(nv) => {
                    let key = nv
                        .path
                        .get_ident()
                        .map(|ident| ident.to_string())
                        .unwrap_or_default();
                    let value = string_value(&nv.value, &key);
                    match key.as_str() {
                        "directive" => {
                            attr.directive = Some(value?);
                            attr.span = nv.value.span();
                        }
                        "field" => attr.field = Some(value?),
                        "fields" => attr.fields = Some(value?),
                        "rename" => attr.rename = Some(value?),
                        _ => {
                            return Err(Error::new(
                                nv.path.span(),
                                "unknown attribute. Expected: directive, field, fields or rename",
                            ));
                        }
                    }
                }

                _ => {
                    return Err(Error::new(
                        meta.span(),
                        "unknown search attribute. Expected: \"directive\", skip, flatten, directive = \"...\", field = \"...\", fields = \"...\", or rename = \"...\"",
                    ));
                }
            }
        }

        Ok(attr)
    }
}

/// Extract `#[search(...)]` attributes from a field's attributes.
pub fn parse_search_attrs(attrs: &[Attribute]) -> Result<SearchAttr> {
    for attr in attrs {
        if attr.path().is_ident("search") {
            return attr.parse_args::<SearchAttr>();
        }
    }
    Ok(SearchAttr::default())
}

/// Returns the key of `#[serde(rename = "...")]`, if any.
///
/// Other serde keys are skipped; anything unparseable is ignored and left
/// for serde to report.
pub fn serde_rename(attrs: &[Attribute]) -> Option<String> {
    let mut rename = None;
    for attr in attrs.iter().filter(|attr| attr.path().is_ident("serde")) {
        let _ = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") && meta.input.peek(Token![=]) {
                let value: LitStr = meta.value()?.parse()?;
                rename = Some(value.value());
            } else if meta.input.peek(Token![=]) {
                meta.value()?.parse::<Expr>()?;
            } else if meta.input.peek(syn::token::Paren) {
                let content;
                syn::parenthesized!(content in meta.input);
                content.parse::<TokenStream>()?;
            }
            Ok(())
        });
    }
    rename
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn parse_search(tokens: &str) -> Result<SearchAttr> {
        syn::parse_str::<SearchAttr>(tokens)
    }

    #[test]
    fn test_directive_only() {
        let attr = parse_search(r#""must;range""#).unwrap();
        assert_eq!(attr.directive.as_deref(), Some("must;range"));
        assert!(!attr.skip);
        assert!(!attr.flatten);
    }

    #[test]
    fn test_directive_with_options() {
        let attr = parse_search(r#""should", fields = "goodsArea,userArea", rename = "area""#).unwrap();
        assert_eq!(attr.directive.as_deref(), Some("should"));
        assert_eq!(attr.fields.as_deref(), Some("goodsArea,userArea"));
        assert_eq!(attr.rename.as_deref(), Some("area"));
    }

    #[test]
    fn test_named_directive() {
        let attr = parse_search(r#"directive = "nested", field = "items""#).unwrap();
        assert_eq!(attr.directive.as_deref(), Some("nested"));
        assert_eq!(attr.field.as_deref(), Some("items"));
    }

    #[test]
    fn test_flags() {
        let attr = parse_search("skip").unwrap();
        assert!(attr.skip);
        let attr = parse_search(r#""innerHits", flatten"#).unwrap();
        assert!(attr.flatten);
    }

    #[test]
    fn test_empty() {
        let attr = parse_search("").unwrap();
        assert_eq!(attr.directive, None);
    }

    #[test]
    fn test_unknown_key() {
        assert!(parse_search(r#"color = "blue""#).is_err());
        assert!(parse_search("frobnicate").is_err());
        assert!(parse_search("field = 3").is_err());
    }

    #[test]
    fn test_parse_from_attributes() {
        let attrs: Vec<Attribute> = vec![
            parse_quote!(#[doc = "docs"]),
            parse_quote!(#[search("filter", field = "shop.id")]),
        ];
        let attr = parse_search_attrs(&attrs).unwrap();
        assert_eq!(attr.directive.as_deref(), Some("filter"));
        assert_eq!(attr.field.as_deref(), Some("shop.id"));

        let attr = parse_search_attrs(&[]).unwrap();
        assert_eq!(attr.directive, None);
    }

    #[test]
    fn test_serde_rename() {
        let attrs: Vec<Attribute> = vec![parse_quote!(
            #[serde(default, skip_serializing_if = "Option::is_none", rename = "goodsId")]
        )];
        assert_eq!(serde_rename(&attrs).as_deref(), Some("goodsId"));

        let attrs: Vec<Attribute> = vec![parse_quote!(#[serde(default)])];
        assert_eq!(serde_rename(&attrs), None);
    }
}
