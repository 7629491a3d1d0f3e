//! Type coercion between wire values and domain values.
//!
//! One transform per `(LogicalType, Direction)` pair; every pair not listed
//! here is the identity. Loaders are lenient: a value they do not recognise
//! passes through unchanged.

mod array;
mod json;

use oradapter_core::error::{Result, TypeError};
use oradapter_core::{Direction, Error, LogicalType, Value};
use uuid::Uuid;

use array::Element;
pub use json::{JsonLibrary, SerdeJson};

/// The coercion table, parameterised by its JSON backend.
#[derive(Debug, Clone, Default)]
pub struct Coercions<J = SerdeJson> {
    json: J,
}

impl Coercions<SerdeJson> {
    pub fn new() -> Self {
        Self { json: SerdeJson }
    }
}

impl<J: JsonLibrary> Coercions<J> {
    /// Use a different JSON backend.
    pub fn with_json(json: J) -> Self {
        Self { json }
    }

    pub fn coerce(&self, direction: Direction, ty: &LogicalType, value: Value) -> Result<Value> {
        match direction {
            Direction::Load => self.load(ty, value),
            Direction::Dump => self.dump(ty, value),
        }
    }

    /// Wire value to domain value.
    pub fn load(&self, ty: &LogicalType, value: Value) -> Result<Value> {
        match ty {
            LogicalType::Boolean => Ok(load_boolean(value)),
            LogicalType::Float => Ok(load_float(value)),
            LogicalType::Map => match value {
                Value::Text(text) => self.json.decode(&text).map(Value::Json),
                other => Ok(other),
            },
            LogicalType::Embedded(shape) => match value {
                Value::Text(text) => {
                    let json = self.json.decode(&text)?;
                    self.shape(shape, json)
                }
                Value::Json(json) => self.shape(shape, json),
                other => Ok(other),
            },
            LogicalType::Array(inner) => match value {
                Value::Text(text) => {
                    let elements = array::parse(&text)?;
                    self.load_elements(inner, elements).map(Value::Array)
                }
                other => Ok(other),
            },
            LogicalType::BinaryId => load_binary_id(value),
            _ => Ok(value),
        }
    }

    /// Domain value to wire value.
    pub fn dump(&self, ty: &LogicalType, value: Value) -> Result<Value> {
        match ty {
            LogicalType::Map | LogicalType::Embedded(_) => match value {
                Value::Null => Ok(Value::Null),
                other => {
                    let json = other.to_json()?;
                    self.json.encode(&json).map(Value::Text)
                }
            },
            LogicalType::BinaryId => dump_binary_id(value),
            _ => Ok(value),
        }
    }

    fn load_elements(&self, ty: &LogicalType, elements: Vec<Element>) -> Result<Vec<Value>> {
        // A nested literal holds elements of the same type one level down.
        let nested_ty = match ty {
            LogicalType::Array(inner) => inner.as_ref(),
            other => other,
        };
        elements
            .into_iter()
            .map(|element| match element {
                Element::Null => Ok(Value::Null),
                Element::Text(text) => self.load(ty, Value::Text(text)),
                Element::Nested(items) => self.load_elements(nested_ty, items).map(Value::Array),
            })
            .collect()
    }
}

/// Load with the default JSON backend.
pub fn load(ty: &LogicalType, value: Value) -> Result<Value> {
    Coercions::new().load(ty, value)
}

/// Dump with the default JSON backend.
pub fn dump(ty: &LogicalType, value: Value) -> Result<Value> {
    Coercions::new().dump(ty, value)
}

fn load_boolean(value: Value) -> Value {
    match value {
        Value::Text(ref s) | Value::Decimal(ref s) if s == "0" => Value::Bool(false),
        Value::Text(ref s) | Value::Decimal(ref s) if s == "1" => Value::Bool(true),
        Value::Int(0) | Value::BigInt(0) => Value::Bool(false),
        Value::Int(1) | Value::BigInt(1) => Value::Bool(true),
        other => other,
    }
}

fn load_float(value: Value) -> Value {
    match value {
        Value::Decimal(s) => match s.trim().parse::<f64>() {
            Ok(f) => Value::Double(f),
            Err(_) => Value::Decimal(s),
        },
        other => other,
    }
}

fn load_binary_id(value: Value) -> Result<Value> {
    match value {
        Value::Null => Ok(Value::Null),
        Value::Uuid(bytes) => Ok(Value::Uuid(bytes)),
        Value::Bytes(bytes) => Uuid::from_slice(&bytes)
            .map(|id| Value::Uuid(id.into_bytes()))
            .map_err(|e| binary_id_error(format!("expected 16 bytes, got {} ({e})", bytes.len()))),
        Value::Text(text) => parse_binary_id(&text).map(Value::Uuid),
        other => Err(binary_id_error(other.type_name().to_string())),
    }
}

fn dump_binary_id(value: Value) -> Result<Value> {
    match value {
        Value::Null => Ok(Value::Null),
        Value::Uuid(bytes) => Ok(Value::Bytes(bytes.to_vec())),
        Value::Text(text) => parse_binary_id(&text).map(|bytes| Value::Bytes(bytes.to_vec())),
        Value::Bytes(bytes) if bytes.len() == 16 => Ok(Value::Bytes(bytes)),
        other => Err(binary_id_error(other.type_name().to_string())),
    }
}

/// Accepts the hyphenated form and the bare 32-hex-digit form.
fn parse_binary_id(text: &str) -> Result<[u8; 16]> {
    Uuid::parse_str(text.trim())
        .map(Uuid::into_bytes)
        .map_err(|e| binary_id_error(format!("invalid value: {text} ({e})")))
}

fn binary_id_error(actual: String) -> Error {
    Error::Type(TypeError {
        expected: "binary_id",
        actual,
        column: None,
    })
}
