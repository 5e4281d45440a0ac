use serde::ser::{Error as _, Serialize, Serializer};
use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// Error value that knows how to render itself as structured JSON.
///
/// Plain errors are emitted as their `Display` string. Errors implementing
/// this trait are emitted as whatever [`marshal_json`](Self::marshal_json)
/// returns instead.
pub trait MarshalJson: Error + Send + Sync {
    fn marshal_json(&self) -> Result<serde_json::Value, serde_json::Error>;
}

/// Value attached to a record field.
#[derive(Clone)]
pub enum FieldValue {
    /// Any JSON value, emitted unchanged.
    Value(serde_json::Value),
    /// Error-like value, emitted as its human-readable message.
    Error(Arc<dyn Error + Send + Sync>),
    /// Error with its own JSON form, emitted as that form.
    StructuredError(Arc<dyn MarshalJson>),
}

impl FieldValue {
    pub fn error<E>(err: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        FieldValue::Error(Arc::new(err))
    }

    pub fn structured_error<E>(err: E) -> Self
    where
        E: MarshalJson + 'static,
    {
        FieldValue::StructuredError(Arc::new(err))
    }

    /// Serialize any `T` into a plain value.
    pub fn serialized<T: Serialize + ?Sized>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_value(value).map(FieldValue::Value)
    }
}

impl fmt::Debug for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Value(v) => f.debug_tuple("Value").field(v).finish(),
            FieldValue::Error(e) => f.debug_tuple("Error").field(&e.to_string()).finish(),
            FieldValue::StructuredError(e) => {
                f.debug_tuple("StructuredError").field(&e.to_string()).finish()
            }
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Value(v) => v.serialize(serializer),
            FieldValue::Error(e) => serializer.collect_str(e),
            FieldValue::StructuredError(e) => e
                .marshal_json()
                .map_err(S::Error::custom)?
                .serialize(serializer),
        }
    }
}

impl From<serde_json::Value> for FieldValue {
    fn from(value: serde_json::Value) -> Self {
        FieldValue::Value(value)
    }
}

macro_rules! plain_from {
    ($($t:ty),* $(,)?) => {
        $(
            impl From<$t> for FieldValue {
                fn from(value: $t) -> Self {
                    FieldValue::Value(serde_json::Value::from(value))
                }
            }
        )*
    };
}

plain_from!(&str, String, bool, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);
