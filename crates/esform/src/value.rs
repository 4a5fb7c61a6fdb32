//! Scalar values extracted from form fields.
//!
//! The [`Extract`] trait turns a field into the ordered list of [`Scalar`]s
//! the compiler works with. An empty list means the field is absent and
//! contributes nothing to the compiled query.
//!
//! | Field shape | Extracted values |
//! |-------------|------------------|
//! | bare scalar | the value, or nothing when it is the type's zero value |
//! | `Option<T>` | nothing for `None`, otherwise every value of `T` (zero included) |
//! | `Vec<T>`, slices, arrays | every element, in order |

use std::fmt;

use serde::{Serialize, Serializer};

/// Numeric value keeping the precision of the source type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    /// Signed integer.
    I64(i64),
    /// Unsigned integer.
    U64(u64),
    /// Floating point.
    F64(f64),
}

impl Number {
    /// Converts the number to f64.
    pub fn to_f64(self) -> f64 {
        match self {
            Number::I64(n) => n as f64,
            Number::U64(n) => n as f64,
            Number::F64(n) => n,
        }
    }

    /// Returns `true` for the zero value of any representation.
    pub fn is_zero(self) -> bool {
        match self {
            Number::I64(n) => n == 0,
            Number::U64(n) => n == 0,
            Number::F64(n) => n == 0.0,
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::I64(n) => write!(f, "{}", n),
            Number::U64(n) => write!(f, "{}", n),
            Number::F64(n) => write!(f, "{}", n),
        }
    }
}

impl Serialize for Number {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match *self {
            Number::I64(n) => serializer.serialize_i64(n),
            Number::U64(n) => serializer.serialize_u64(n),
            Number::F64(n) => serializer.serialize_f64(n),
        }
    }
}

macro_rules! number_from {
    ($variant:ident as $target:ty: $($source:ty),*) => {
        $(
            impl From<$source> for Number {
                fn from(n: $source) -> Self {
                    Number::$variant(n as $target)
                }
            }
        )*
    };
}

number_from!(I64 as i64: i8, i16, i32, i64, isize);
number_from!(U64 as u64: u8, u16, u32, u64, usize);
number_from!(F64 as f64: f64);

impl From<f32> for Number {
    /// Widens through the shortest decimal form, so `19.99f32` stays `19.99`.
    fn from(n: f32) -> Self {
        Number::F64(n.to_string().parse().unwrap_or(f64::from(n)))
    }
}

/// A single value a clause compares against.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// String value.
    String(String),
    /// Numeric value.
    Number(Number),
    /// Boolean value.
    Bool(bool),
}

impl Scalar {
    /// Returns `true` for `""`, `0` and `false`.
    pub fn is_zero(&self) -> bool {
        match self {
            Scalar::String(s) => s.is_empty(),
            Scalar::Number(n) => n.is_zero(),
            Scalar::Bool(b) => !b,
        }
    }

    /// Returns `true` only for the empty string.
    ///
    /// The empty string is the "no lower bound" marker of the range operators.
    pub fn is_empty_string(&self) -> bool {
        matches!(self, Scalar::String(s) if s.is_empty())
    }

    /// Returns the number, if this is one.
    pub fn as_number(&self) -> Option<Number> {
        match self {
            Scalar::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the string, if this is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }

    /// Stringified form used as a key when ranking by supplied value order.
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::String(s) => f.write_str(s),
            Scalar::Number(n) => write!(f, "{}", n),
            Scalar::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Scalar::String(s) => serializer.serialize_str(s),
            Scalar::Number(n) => n.serialize(serializer),
            Scalar::Bool(b) => serializer.serialize_bool(*b),
        }
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::String(s)
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::String(s.to_string())
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

impl From<Number> for Scalar {
    fn from(n: Number) -> Self {
        Scalar::Number(n)
    }
}

macro_rules! scalar_from_number {
    ($($source:ty),*) => {
        $(
            impl From<$source> for Scalar {
                fn from(n: $source) -> Self {
                    Scalar::Number(Number::from(n))
                }
            }
        )*
    };
}

scalar_from_number!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

/// Extracts the ordered values of a form field.
///
/// `scalars` returns everything the field holds. `extract` is what the
/// compiler calls; it differs only for bare scalars, where the zero value
/// means "not set".
pub trait Extract {
    /// Every value held, zero values included.
    fn scalars(&self) -> Vec<Scalar>;

    /// Values used for compilation. Empty means absent.
    fn extract(&self) -> Vec<Scalar> {
        self.scalars()
    }
}

macro_rules! extract_scalar {
    ($($source:ty),*) => {
        $(
            impl Extract for $source {
                fn scalars(&self) -> Vec<Scalar> {
                    vec![Scalar::from(*self)]
                }

                fn extract(&self) -> Vec<Scalar> {
                    let value = Scalar::from(*self);
                    if value.is_zero() {
                        Vec::new()
                    } else {
                        vec![value]
                    }
                }
            }
        )*
    };
}

extract_scalar!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, bool);

impl Extract for str {
    fn scalars(&self) -> Vec<Scalar> {
        vec![Scalar::from(self)]
    }

    fn extract(&self) -> Vec<Scalar> {
        if self.is_empty() {
            Vec::new()
        } else {
            self.scalars()
        }
    }
}

impl Extract for String {
    fn scalars(&self) -> Vec<Scalar> {
        self.as_str().scalars()
    }

    fn extract(&self) -> Vec<Scalar> {
        self.as_str().extract()
    }
}

impl Extract for Scalar {
    fn scalars(&self) -> Vec<Scalar> {
        vec![self.clone()]
    }

    fn extract(&self) -> Vec<Scalar> {
        if self.is_zero() {
            Vec::new()
        } else {
            self.scalars()
        }
    }
}

impl<T: Extract + ?Sized> Extract for &T {
    fn scalars(&self) -> Vec<Scalar> {
        (**self).scalars()
    }

    fn extract(&self) -> Vec<Scalar> {
        (**self).extract()
    }
}

impl<T: Extract + ?Sized> Extract for Box<T> {
    fn scalars(&self) -> Vec<Scalar> {
        (**self).scalars()
    }

    fn extract(&self) -> Vec<Scalar> {
        (**self).extract()
    }
}

// An explicitly set optional value is present even when it is zero.
impl<T: Extract> Extract for Option<T> {
    fn scalars(&self) -> Vec<Scalar> {
        self.as_ref().map(Extract::scalars).unwrap_or_default()
    }
}

impl<T: Extract> Extract for [T] {
    fn scalars(&self) -> Vec<Scalar> {
        self.iter().flat_map(Extract::scalars).collect()
    }
}

impl<T: Extract, const N: usize> Extract for [T; N] {
    fn scalars(&self) -> Vec<Scalar> {
        self.as_slice().scalars()
    }
}

impl<T: Extract> Extract for Vec<T> {
    fn scalars(&self) -> Vec<Scalar> {
        self.as_slice().scalars()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_zero_scalars_are_absent() {
        assert!(0i32.extract().is_empty());
        assert!(0.0f64.extract().is_empty());
        assert!(false.extract().is_empty());
        assert!(String::new().extract().is_empty());
        assert_eq!(7u8.extract(), vec![Scalar::Number(Number::U64(7))]);
    }

    #[test]
    fn option_is_dereferenced() {
        let none: Option<i64> = None;
        assert!(none.extract().is_empty());
        assert_eq!(Some(0i64).extract(), vec![Scalar::Number(Number::I64(0))]);
        assert_eq!(
            Some(String::from("a")).extract(),
            vec![Scalar::String("a".into())]
        );
    }

    #[test]
    fn sequences_keep_order_and_zero_elements() {
        let values = vec![String::new(), "b".to_string()];
        assert_eq!(
            values.extract(),
            vec![Scalar::String(String::new()), Scalar::String("b".into())]
        );
        assert!(Vec::<i32>::new().extract().is_empty());
        assert_eq!([3u32, 0].extract().len(), 2);
    }

    #[test]
    fn nested_options_in_sequences() {
        let values = vec![Some(1i32), None, Some(2)];
        assert_eq!(
            values.extract(),
            vec![Scalar::from(1i32), Scalar::from(2i32)]
        );
    }

    #[test]
    fn scalar_keys() {
        assert_eq!(Scalar::from(10i32).key(), "10");
        assert_eq!(Scalar::from(1.5f64).key(), "1.5");
        assert_eq!(Scalar::from("abc").key(), "abc");
        assert_eq!(Scalar::from(true).key(), "true");
    }

    #[test]
    fn f32_keeps_its_decimal_form() {
        assert_eq!(Scalar::from(19.99f32).key(), "19.99");
        assert_eq!(Scalar::from(0.1f32), Scalar::Number(Number::F64(0.1)));
        assert_eq!(
            serde_json::to_value(Scalar::from(19.99f32)).unwrap(),
            serde_json::json!(19.99)
        );
        assert_eq!(19.99f32.extract(), vec![Scalar::from(19.99f64)]);
    }

    #[test]
    fn scalar_json() {
        assert_eq!(
            serde_json::to_value(Scalar::from(-3i64)).unwrap(),
            serde_json::json!(-3)
        );
        assert_eq!(
            serde_json::to_value(Scalar::from("x")).unwrap(),
            serde_json::json!("x")
        );
        assert_eq!(
            serde_json::to_value(Scalar::from(2.5f32)).unwrap(),
            serde_json::json!(2.5)
        );
    }

    #[test]
    fn zero_checks() {
        assert!(Scalar::from("").is_zero());
        assert!(Scalar::from("").is_empty_string());
        assert!(!Scalar::from(0u8).is_empty_string());
        assert!(Scalar::from(0u8).is_zero());
        assert!(!Scalar::from(-1i8).is_zero());
    }
}
