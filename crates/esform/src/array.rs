//! Lenient list types for request forms.
//!
//! Search forms usually arrive as JSON built by hand or from query strings,
//! where a list may be sent as a single value, a comma-joined string or a
//! proper array. These types accept all three and always hold an ordered
//! list:
//!
//! | Type | Accepts |
//! |------|---------|
//! | [`ArrayInt`], [`ArrayInt64`] | `5`, `"5"`, `"5,6"`, `[5, "6"]` |
//! | [`ArrayKeyword`] | `"a"`, `"a,b"`, `["a", "b"]`, `[1, 2]` (split on commas, trimmed) |
//! | [`ArrayString`] | `"any text, kept whole"`, `["a", "b"]` |
//!
//! `null` and the empty string decode to an empty list.

use std::ops::Deref;
use std::str::FromStr;

use serde::de::{self, Deserialize, Deserializer};
use serde::Serialize;
use serde_json::Value as Json;

use crate::value::{Extract, Scalar};

fn flatten_json(value: Json) -> Vec<Json> {
    match value {
        Json::Null => Vec::new(),
        Json::Array(items) => items.into_iter().filter(|v| !v.is_null()).collect(),
        other => vec![other],
    }
}

fn split_commas(s: &str) -> impl Iterator<Item = &str> {
    s.split(',').map(str::trim).filter(|part| !part.is_empty())
}

fn parse_numbers<N, E>(value: Json) -> Result<Vec<N>, E>
where
    N: FromStr,
    E: de::Error,
{
    let mut numbers = Vec::new();
    for item in flatten_json(value) {
        match item {
            Json::Number(n) => {
                let parsed = n
                    .to_string()
                    .parse::<N>()
                    .map_err(|_| E::custom(format!("number out of range: {}", n)))?;
                numbers.push(parsed);
            }
            Json::String(s) => {
                for part in split_commas(&s) {
                    let parsed = part
                        .parse::<N>()
                        .map_err(|_| E::custom(format!("invalid number: {}", part)))?;
                    numbers.push(parsed);
                }
            }
            other => return Err(E::custom(format!("expected number, got {}", other))),
        }
    }
    Ok(numbers)
}

fn json_to_text<E: de::Error>(item: Json) -> Result<String, E> {
    match item {
        Json::String(s) => Ok(s),
        Json::Number(n) => Ok(n.to_string()),
        Json::Bool(b) => Ok(b.to_string()),
        other => Err(E::custom(format!("expected string, got {}", other))),
    }
}

macro_rules! list_type {
    ($(#[$doc:meta])* $name:ident($item:ty)) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Default, PartialEq, Serialize)]
        #[serde(transparent)]
        pub struct $name(pub Vec<$item>);

        impl Deref for $name {
            type Target = Vec<$item>;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl From<Vec<$item>> for $name {
            fn from(items: Vec<$item>) -> Self {
                $name(items)
            }
        }

        impl FromIterator<$item> for $name {
            fn from_iter<I: IntoIterator<Item = $item>>(iter: I) -> Self {
                $name(iter.into_iter().collect())
            }
        }

        impl Extract for $name {
            fn scalars(&self) -> Vec<Scalar> {
                self.0.scalars()
            }
        }
    };
}

list_type!(
    /// List of `i32` decoded from a number, numeric string or array.
    ArrayInt(i32)
);
list_type!(
    /// List of `i64` decoded from a number, numeric string or array.
    ArrayInt64(i64)
);
list_type!(
    /// List of keywords; strings are split on commas.
    ///
    /// Only suitable for values that never contain a comma themselves.
    ArrayKeyword(String)
);
list_type!(
    /// List of arbitrary strings; a lone string is kept whole.
    ArrayString(String)
);

impl<'de> Deserialize<'de> for ArrayInt {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        parse_numbers(Json::deserialize(deserializer)?).map(ArrayInt)
    }
}

impl<'de> Deserialize<'de> for ArrayInt64 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        parse_numbers(Json::deserialize(deserializer)?).map(ArrayInt64)
    }
}

impl<'de> Deserialize<'de> for ArrayKeyword {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut keywords = Vec::new();
        for item in flatten_json(Json::deserialize(deserializer)?) {
            let text = json_to_text::<D::Error>(item)?;
            keywords.extend(split_commas(&text).map(str::to_string));
        }
        Ok(ArrayKeyword(keywords))
    }
}

impl<'de> Deserialize<'de> for ArrayString {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut strings = Vec::new();
        for item in flatten_json(Json::deserialize(deserializer)?) {
            let text = json_to_text::<D::Error>(item)?;
            if !text.is_empty() {
                strings.push(text);
            }
        }
        Ok(ArrayString(strings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ints(value: Json) -> Vec<i32> {
        serde_json::from_value::<ArrayInt>(value).unwrap().0
    }

    #[test]
    fn int_from_every_shape() {
        assert_eq!(ints(json!(10)), vec![10]);
        assert_eq!(ints(json!("10")), vec![10]);
        assert_eq!(ints(json!("1, 2,3")), vec![1, 2, 3]);
        assert_eq!(ints(json!([1, "2", "3,4"])), vec![1, 2, 3, 4]);
        assert_eq!(ints(json!(null)), Vec::<i32>::new());
        assert_eq!(ints(json!("")), Vec::<i32>::new());
    }

    #[test]
    fn int_rejects_garbage() {
        assert!(serde_json::from_value::<ArrayInt>(json!("abc")).is_err());
        assert!(serde_json::from_value::<ArrayInt>(json!({"a": 1})).is_err());
        assert!(serde_json::from_value::<ArrayInt>(json!(1.5)).is_err());
    }

    #[test]
    fn int64_holds_large_values() {
        let parsed: ArrayInt64 = serde_json::from_value(json!([100, "9000000000"])).unwrap();
        assert_eq!(parsed.0, vec![100, 9_000_000_000]);
    }

    #[test]
    fn keyword_splits_and_trims() {
        let parsed: ArrayKeyword = serde_json::from_value(json!(" a , b ")).unwrap();
        assert_eq!(parsed.0, vec!["a", "b"]);
        let parsed: ArrayKeyword = serde_json::from_value(json!(["x,y", 3])).unwrap();
        assert_eq!(parsed.0, vec!["x", "y", "3"]);
    }

    #[test]
    fn string_keeps_commas() {
        let parsed: ArrayString = serde_json::from_value(json!("hello, world")).unwrap();
        assert_eq!(parsed.0, vec!["hello, world"]);
        let parsed: ArrayString = serde_json::from_value(json!(["a", "b"])).unwrap();
        assert_eq!(parsed.len(), 2);
    }

    #[test]
    fn lists_extract_in_order() {
        let list = ArrayInt(vec![3, 0, 1]);
        assert_eq!(
            list.extract(),
            vec![Scalar::from(3i32), Scalar::from(0i32), Scalar::from(1i32)]
        );
        assert!(ArrayKeyword::default().extract().is_empty());
    }

    #[test]
    fn lists_serialize_as_arrays() {
        let list = ArrayKeyword(vec!["a".into()]);
        assert_eq!(serde_json::to_value(&list).unwrap(), json!(["a"]));
    }
}
