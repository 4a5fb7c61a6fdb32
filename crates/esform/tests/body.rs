//! Search bodies built from compiled forms.

use esform::{CompileOptions, Compiler, Searchable, Select};
use serde_json::json;

#[derive(Searchable)]
struct Listing {
    #[search("filter")]
    shop_id: Option<i64>,
    #[search("sort;level:1")]
    created: i32,
    #[search("innerHits", flatten)]
    select: Option<Select>,
}

#[test]
fn body_uses_defaults_without_selection() {
    let form = Listing {
        shop_id: Some(7),
        created: 0,
        select: None,
    };
    let body = Compiler::new().to_search_body(&form).unwrap();
    assert_eq!(
        body.to_json(),
        json!({
            "query": {"bool": {"filter": [{"term": {"shop_id": 7}}]}},
            "from": 0,
            "size": 10
        })
    );
}

#[test]
fn root_selection_pages_and_filters_source() {
    let form = Listing {
        shop_id: None,
        created: 2,
        select: Some(Select::new(3, 25).include(["id", "title"])),
    };
    let body = Compiler::new().to_search_body(&form).unwrap();
    assert_eq!(
        body.to_json(),
        json!({
            "query": {"bool": {}},
            "from": 50,
            "size": 25,
            "_source": {"includes": ["id", "title"]},
            "sort": [{"created": {"order": "desc"}}]
        })
    );
}

#[test]
fn options_bound_the_page_size() {
    let options = CompileOptions::from_yaml_str("max_page_size: 100\ndefault_size: 20\n").unwrap();
    let compiler = Compiler::builder().options(options).build();

    let unpaged = Listing {
        shop_id: None,
        created: 0,
        select: Some(Select::default()),
    };
    assert_eq!(compiler.to_search_body(&unpaged).unwrap().size(), 20);

    let oversized = Listing {
        shop_id: None,
        created: 0,
        select: Some(Select::new(2, 5_000)),
    };
    let body = compiler.to_search_body(&oversized).unwrap();
    assert_eq!(body.size(), 100);
    assert_eq!(body.from(), 100);
}

#[test]
fn selection_deserializes_from_request_json() {
    let select: Select = serde_json::from_value(json!({
        "page": 2,
        "size": 30,
        "include": "id,title"
    }))
    .unwrap();
    let body = Compiler::new()
        .to_search_body(&Listing {
            shop_id: None,
            created: 0,
            select: Some(select),
        })
        .unwrap();
    assert_eq!(body.from(), 30);
    assert_eq!(body.source().map(|s| s.includes.clone()), Some(vec!["id".to_string(), "title".to_string()]));
}
