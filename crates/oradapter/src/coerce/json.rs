//! JSON backend and embedded document decoding.

use oradapter_core::error::{Result, TypeError};
use oradapter_core::{Cardinality, EmbeddedShape, Error, LogicalType, Value};

use super::Coercions;

/// Pluggable JSON encoder/decoder used for map and embedded columns.
pub trait JsonLibrary: Send + Sync {
    fn decode(&self, text: &str) -> Result<serde_json::Value>;
    fn encode(&self, value: &serde_json::Value) -> Result<String>;
}

/// The default backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerdeJson;

impl JsonLibrary for SerdeJson {
    fn decode(&self, text: &str) -> Result<serde_json::Value> {
        serde_json::from_str(text).map_err(|e| {
            Error::Type(TypeError {
                expected: "JSON text",
                actual: format!("invalid value: {e}"),
                column: None,
            })
        })
    }

    fn encode(&self, value: &serde_json::Value) -> Result<String> {
        serde_json::to_string(value).map_err(|e| {
            Error::Type(TypeError {
                expected: "JSON-encodable value",
                actual: format!("invalid value: {e}"),
                column: None,
            })
        })
    }
}

impl<J: JsonLibrary> Coercions<J> {
    /// Decode a JSON value into the embedded shape.
    pub(crate) fn shape(&self, shape: &EmbeddedShape, json: serde_json::Value) -> Result<Value> {
        match (shape.cardinality, json) {
            (_, serde_json::Value::Null) => Ok(Value::Null),
            (Cardinality::One, serde_json::Value::Object(map)) => self.document(shape, map),
            (Cardinality::Many, serde_json::Value::Array(items)) => items
                .into_iter()
                .map(|item| match item {
                    serde_json::Value::Object(map) => self.document(shape, map),
                    other => Err(structure_error("embedded document", &other)),
                })
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            (Cardinality::One, other) => Err(structure_error("embedded document", &other)),
            (Cardinality::Many, other) => Err(structure_error("list of embedded documents", &other)),
        }
    }

    fn document(
        &self,
        shape: &EmbeddedShape,
        mut map: serde_json::Map<String, serde_json::Value>,
    ) -> Result<Value> {
        let mut fields = Vec::with_capacity(shape.fields.len());
        for (name, ty) in &shape.fields {
            let value = match map.remove(name) {
                Some(json) => self.field(ty, json)?,
                None => Value::Null,
            };
            fields.push((name.clone(), value));
        }
        Ok(Value::Document(fields))
    }

    /// Load one field from its JSON form.
    fn field(&self, ty: &LogicalType, json: serde_json::Value) -> Result<Value> {
        match (ty, json) {
            (_, serde_json::Value::Null) => Ok(Value::Null),
            (LogicalType::Embedded(shape), json) => self.shape(shape, json),
            (LogicalType::Array(inner), serde_json::Value::Array(items)) => items
                .into_iter()
                .map(|item| self.field(inner, item))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            (LogicalType::Array(_), other) => Err(structure_error("JSON array", &other)),
            (LogicalType::Float, serde_json::Value::Number(n)) => {
                Ok(n.as_f64().map_or(Value::Json(serde_json::Value::Number(n)), Value::Double))
            }
            (ty, json) => self.load(ty, from_json(json)),
        }
    }
}

/// The wire-like value a JSON scalar corresponds to.
fn from_json(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::BigInt(i),
            None => n
                .as_f64()
                .map_or(Value::Json(serde_json::Value::Number(n)), Value::Double),
        },
        serde_json::Value::String(s) => Value::Text(s),
        other => Value::Json(other),
    }
}

fn structure_error(expected: &'static str, found: &serde_json::Value) -> Error {
    let kind = match found {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    };
    Error::Type(TypeError {
        expected,
        actual: kind.to_string(),
        column: None,
    })
}
