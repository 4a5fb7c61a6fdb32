//! Sort list assembly through derived forms.

use esform::{Compiler, FieldType, Mapping, Searchable, Sort};
use serde_json::{json, Value as Json};

fn sorts_json(compiler: &Compiler, form: &dyn Searchable) -> Vec<Json> {
    compiler
        .to_sorts(form)
        .unwrap()
        .iter()
        .map(Sort::to_json)
        .collect()
}

// ============================================================================
// Levels and directions
// ============================================================================

#[derive(Searchable)]
struct Levels {
    #[search("sort;level:2")]
    price: i32,
    #[search("sort;level:1")]
    created: i32,
    #[search("sort;level:1")]
    id: i32,
}

#[test]
fn levels_order_criteria() {
    let form = Levels {
        price: 1,
        created: 2,
        id: 1,
    };
    assert_eq!(
        sorts_json(&Compiler::new(), &form),
        vec![
            json!({"created": {"order": "desc"}}),
            json!({"id": {"order": "asc"}}),
            json!({"price": {"order": "asc"}}),
        ]
    );
}

#[test]
fn absent_sort_values_emit_nothing() {
    let form = Levels {
        price: 0,
        created: 2,
        id: 0,
    };
    assert_eq!(
        Compiler::new().to_sorts(&form).unwrap(),
        vec![Sort::desc("created")]
    );
}

#[derive(Searchable)]
struct TextualDirection {
    #[search("sort;mode:max", field = "prices")]
    price_order: Option<String>,
}

#[test]
fn textual_sentinel_and_mode() {
    let form = TextualDirection {
        price_order: Some("2".into()),
    };
    assert_eq!(
        sorts_json(&Compiler::new(), &form),
        vec![json!({"prices": {"order": "desc", "mode": "max"}})]
    );
}

#[derive(Searchable)]
struct SortAndFilter {
    #[search("must")]
    status: i32,
    #[search("sort")]
    status_order: i32,
}

#[test]
fn sort_fields_add_no_clauses() {
    let compiled = Compiler::new()
        .compile(&SortAndFilter {
            status: 0,
            status_order: 1,
        })
        .unwrap();
    assert!(compiled.query.is_empty());
    assert_eq!(compiled.sorts, vec![Sort::asc("status_order")]);
}

// ============================================================================
// By-value sorts
// ============================================================================

#[derive(Searchable)]
struct Pinned {
    #[search("sort:byValue;type:number", field = "shop_id")]
    shop_order: Vec<i64>,
}

#[derive(Searchable)]
struct PinnedUntyped {
    #[search("sort:val", field = "shop_id")]
    shop_order: Vec<i64>,
}

#[test]
fn by_value_ranks_supplied_values() {
    let form = Pinned {
        shop_order: vec![9, 4],
    };
    assert_eq!(
        sorts_json(&Compiler::new(), &form),
        vec![json!({"_script": {
            "type": "number",
            "script": {
                "source": "params.idMap[String.valueOf(doc['shop_id'].value)]",
                "params": {"idMap": {"9": 0, "4": 1}}
            },
            "order": "asc"
        }})]
    );
}

#[test]
fn by_value_type_follows_mapping() {
    let form = PinnedUntyped {
        shop_order: vec![9, 4],
    };
    let untyped = sorts_json(&Compiler::new(), &form);
    assert_eq!(untyped[0]["_script"]["type"], json!("string"));

    let compiler = Compiler::builder()
        .mapping(Mapping::new().with_field("shop_id", FieldType::Long))
        .build();
    let mapped = sorts_json(&compiler, &form);
    assert_eq!(mapped[0]["_script"]["type"], json!("number"));
}

#[derive(Searchable)]
struct PinnedPrices {
    #[search("sort:byValue;type:number")]
    price: Vec<f32>,
}

#[test]
fn by_value_ranks_keep_float_text() {
    let form = PinnedPrices {
        price: vec![19.99, 5.5],
    };
    let sorts = sorts_json(&Compiler::new(), &form);
    assert_eq!(
        sorts[0]["_script"]["script"]["params"]["idMap"],
        json!({"19.99": 0, "5.5": 1})
    );
}

#[test]
fn by_value_without_values_is_skipped() {
    let form = Pinned { shop_order: vec![] };
    assert!(Compiler::new().to_sorts(&form).unwrap().is_empty());
}

// ============================================================================
// Nested sorts
// ============================================================================

#[derive(Searchable)]
struct SkuSort {
    #[search("must")]
    sku: String,
    #[search("sort;level:1")]
    price: i32,
    #[search("sort:byValue")]
    color: Vec<String>,
}

#[derive(Searchable)]
struct WithNestedSort {
    #[search("sort:nested")]
    items: Option<SkuSort>,
    #[search("sort")]
    id: i32,
}

#[test]
fn nested_sort_carries_sub_form_filter() {
    let form = WithNestedSort {
        items: Some(SkuSort {
            sku: "A1".into(),
            price: 2,
            color: vec!["red".into()],
        }),
        id: 1,
    };
    let compiled = Compiler::new().compile(&form).unwrap();
    assert!(compiled.query.is_empty());
    assert_eq!(
        compiled.sorts.iter().map(Sort::to_json).collect::<Vec<_>>(),
        vec![
            json!({"id": {"order": "asc"}}),
            json!({"items.price": {
                "order": "desc",
                "nested": {
                    "path": "items",
                    "filter": {"bool": {"must": [{"term": {"items.sku": "A1"}}]}}
                }
            }}),
        ]
    );
}

#[test]
fn nested_sort_without_filter_is_skipped() {
    let form = WithNestedSort {
        items: Some(SkuSort {
            sku: String::new(),
            price: 2,
            color: vec![],
        }),
        id: 0,
    };
    assert!(Compiler::new().to_sorts(&form).unwrap().is_empty());
}

// ============================================================================
// Custom sorts
// ============================================================================

#[derive(Searchable)]
struct GeoSort {
    #[search("sort;custom;level:3")]
    distance: bool,
    #[search("sort;level:1")]
    rating: i32,
}

#[test]
fn custom_sort_hook_fills_its_level() {
    let compiler = Compiler::builder()
        .custom_sort(|name| {
            vec![Sort::Raw(json!({"_geo_distance": {
                "location": [2.35, 48.85],
                "order": "asc",
                "name": name
            }}))]
        })
        .build();
    let form = GeoSort {
        distance: false,
        rating: 2,
    };
    assert_eq!(
        sorts_json(&compiler, &form),
        vec![
            json!({"rating": {"order": "desc"}}),
            json!({"_geo_distance": {
                "location": [2.35, 48.85],
                "order": "asc",
                "name": "distance"
            }}),
        ]
    );
}

#[test]
fn custom_sort_without_hook_is_skipped() {
    let form = GeoSort {
        distance: true,
        rating: 0,
    };
    assert!(Compiler::new().to_sorts(&form).unwrap().is_empty());
}
