//! Leaf value conversion
//!
//! Scalars are the values that end up as attribute text or as the text of a
//! leaf element. Each scalar type converts to and from a single string.

use crate::error::{Error, Result};
use base64::Engine as _;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use url::Url;

lazy_static::lazy_static! {
    /// Accepted boolean lexical forms
    static ref BOOLEAN_MAP: HashMap<&'static str, bool> = {
        let mut m = HashMap::new();
        m.insert("true", true);
        m.insert("1", true);
        m.insert("false", false);
        m.insert("0", false);
        m
    };
}

/// A value with a stable text form
pub trait Scalar: Sized + Clone + PartialEq + std::fmt::Debug + Send + Sync + 'static {
    /// Convert the value to its external text form
    fn to_text(&self) -> String;

    /// Parse the value from its external text form
    fn from_text(text: &str) -> Result<Self>;
}

impl Scalar for String {
    fn to_text(&self) -> String {
        self.clone()
    }

    fn from_text(text: &str) -> Result<Self> {
        Ok(text.to_string())
    }
}

impl Scalar for bool {
    fn to_text(&self) -> String {
        let text = if *self { "true" } else { "false" };
        text.to_string()
    }

    fn from_text(text: &str) -> Result<Self> {
        BOOLEAN_MAP
            .get(text.trim())
            .copied()
            .ok_or_else(|| Error::Value(format!("'{}' is not a valid boolean value", text)))
    }
}

impl Scalar for char {
    fn to_text(&self) -> String {
        self.to_string()
    }

    fn from_text(text: &str) -> Result<Self> {
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(Error::Value(format!(
                "'{}' is not a single character",
                text
            ))),
        }
    }
}

macro_rules! integer_scalar {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Scalar for $ty {
                fn to_text(&self) -> String {
                    self.to_string()
                }

                fn from_text(text: &str) -> Result<Self> {
                    text.trim().parse::<$ty>().map_err(|_| {
                        Error::Value(format!(
                            "'{}' is not a valid {} value",
                            text,
                            stringify!($ty)
                        ))
                    })
                }
            }
        )+
    };
}

integer_scalar!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

macro_rules! float_scalar {
    ($($ty:ident),+ $(,)?) => {
        $(
            impl Scalar for $ty {
                fn to_text(&self) -> String {
                    if self.is_nan() {
                        "NaN".to_string()
                    } else if *self == $ty::INFINITY {
                        "INF".to_string()
                    } else if *self == $ty::NEG_INFINITY {
                        "-INF".to_string()
                    } else {
                        self.to_string()
                    }
                }

                fn from_text(text: &str) -> Result<Self> {
                    match text.trim() {
                        "NaN" => Ok($ty::NAN),
                        "INF" => Ok($ty::INFINITY),
                        "-INF" => Ok($ty::NEG_INFINITY),
                        value => value.parse::<$ty>().map_err(|_| {
                            Error::Value(format!(
                                "'{}' is not a valid {} value",
                                text,
                                stringify!($ty)
                            ))
                        }),
                    }
                }
            }
        )+
    };
}

float_scalar!(f32, f64);

impl Scalar for Decimal {
    fn to_text(&self) -> String {
        self.to_string()
    }

    fn from_text(text: &str) -> Result<Self> {
        text.trim()
            .parse::<Decimal>()
            .map_err(|_| Error::Value(format!("'{}' is not a valid decimal value", text)))
    }
}

impl Scalar for NaiveDate {
    fn to_text(&self) -> String {
        self.format("%Y-%m-%d").to_string()
    }

    fn from_text(text: &str) -> Result<Self> {
        NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
            .map_err(|e| Error::Value(format!("'{}' is not a valid date: {}", text, e)))
    }
}

impl Scalar for NaiveDateTime {
    fn to_text(&self) -> String {
        self.format("%Y-%m-%dT%H:%M:%S%.f").to_string()
    }

    fn from_text(text: &str) -> Result<Self> {
        NaiveDateTime::parse_from_str(text.trim(), "%Y-%m-%dT%H:%M:%S%.f")
            .map_err(|e| Error::Value(format!("'{}' is not a valid date-time: {}", text, e)))
    }
}

impl Scalar for DateTime<Utc> {
    fn to_text(&self) -> String {
        self.to_rfc3339()
    }

    fn from_text(text: &str) -> Result<Self> {
        DateTime::parse_from_rfc3339(text.trim())
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| Error::Value(format!("'{}' is not a valid timestamp: {}", text, e)))
    }
}

impl Scalar for Url {
    fn to_text(&self) -> String {
        self.as_str().to_string()
    }

    fn from_text(text: &str) -> Result<Self> {
        Url::parse(text.trim())
            .map_err(|e| Error::Value(format!("'{}' is not a valid URL: {}", text, e)))
    }
}

/// Binary data, carried as base64 text
impl Scalar for Vec<u8> {
    fn to_text(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(self)
    }

    fn from_text(text: &str) -> Result<Self> {
        let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        base64::engine::general_purpose::STANDARD
            .decode(cleaned)
            .map_err(|_| Error::Value("not a valid base64 encoding".to_string()))
    }
}

/// Implement [`Scalar`] for a fieldless enum using its variant names
///
/// Each variant is written as its symbolic name, independent of any
/// `Display` implementation the enum may carry.
///
/// ```
/// #[derive(Debug, Clone, Copy, PartialEq, Default)]
/// enum Priority {
///     #[default]
///     Low,
///     High,
/// }
///
/// xmlbind::symbolic!(Priority { Low, High });
///
/// use xmlbind::Scalar;
/// assert_eq!(Priority::High.to_text(), "High");
/// assert_eq!(Priority::from_text("Low").unwrap(), Priority::Low);
/// ```
#[macro_export]
macro_rules! symbolic {
    ($ty:ident { $($variant:ident),+ $(,)? }) => {
        impl $crate::Scalar for $ty {
            fn to_text(&self) -> ::std::string::String {
                match self {
                    $($ty::$variant => stringify!($variant).to_string(),)+
                }
            }

            fn from_text(text: &str) -> $crate::Result<Self> {
                match text.trim() {
                    $(stringify!($variant) => Ok($ty::$variant),)+
                    other => Err($crate::Error::Value(format!(
                        "'{}' is not a variant of {}",
                        other,
                        stringify!($ty)
                    ))),
                }
            }
        }
    };
}
