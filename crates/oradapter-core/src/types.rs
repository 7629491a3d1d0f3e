//! Logical type tags.
//!
//! The framework tags every field with a [`LogicalType`]; loaders and dumpers
//! are selected by `(LogicalType, Direction)`.

/// Which way a value is being marshalled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Wire value to domain value
    Load,
    /// Domain value to wire value
    Dump,
}

/// Domain-level type tags the framework selects coercions by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogicalType {
    // Scalars
    Boolean,
    Integer,
    Float,
    Decimal,
    String,
    Binary,

    // Date/time
    Date,
    Timestamp,

    /// Opaque 16-byte identifier stored as RAW(16)
    BinaryId,

    /// Free-form map stored as JSON text
    Map,

    /// Embedded document(s) stored as JSON text
    Embedded(EmbeddedShape),

    /// Ordered sequence stored as an array literal
    Array(Box<LogicalType>),

    /// Any other framework type name
    Custom(&'static str),
}

impl LogicalType {
    /// Get the framework-facing name of this type.
    pub fn name(&self) -> String {
        match self {
            LogicalType::Boolean => "boolean".to_string(),
            LogicalType::Integer => "integer".to_string(),
            LogicalType::Float => "float".to_string(),
            LogicalType::Decimal => "decimal".to_string(),
            LogicalType::String => "string".to_string(),
            LogicalType::Binary => "binary".to_string(),
            LogicalType::Date => "date".to_string(),
            LogicalType::Timestamp => "timestamp".to_string(),
            LogicalType::BinaryId => "binary_id".to_string(),
            LogicalType::Map => "map".to_string(),
            LogicalType::Embedded(shape) => match shape.cardinality {
                Cardinality::One => "embed_one".to_string(),
                Cardinality::Many => "embed_many".to_string(),
            },
            LogicalType::Array(inner) => format!("{{array, {}}}", inner.name()),
            LogicalType::Custom(name) => (*name).to_string(),
        }
    }
}

/// How many documents an embedded field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cardinality {
    #[default]
    One,
    Many,
}

/// The shape an embedded document is decoded into.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EmbeddedShape {
    pub cardinality: Cardinality,
    /// Declared fields, in declaration order
    pub fields: Vec<(String, LogicalType)>,
}

impl EmbeddedShape {
    /// A single embedded document.
    pub fn one() -> Self {
        Self {
            cardinality: Cardinality::One,
            fields: Vec::new(),
        }
    }

    /// A list of embedded documents.
    pub fn many() -> Self {
        Self {
            cardinality: Cardinality::Many,
            fields: Vec::new(),
        }
    }

    /// Declare a field.
    pub fn field(mut self, name: impl Into<String>, ty: LogicalType) -> Self {
        self.fields.push((name.into(), ty));
        self
    }
}
