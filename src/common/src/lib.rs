#[macro_use]
extern crate serde;

use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};
use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::io;

pub mod ids;
pub mod ops;
pub mod storage_trait;
pub mod testutil;
pub use ops::{AggOp, PredicateOp};

// Default method for how to return string results
pub const QUERY_RESULT_TYPE: QueryResultType = QueryResultType::Csv(false);

pub mod prelude {
    pub use crate::ids::TransactionId;
    pub use crate::ShaleError;
    pub use crate::{AggOp, PredicateOp};
    pub use crate::{DataType, Field, TableSchema, Tuple};
}

/// Custom error type.
#[derive(Debug, Clone, PartialEq)]
pub enum ShaleError {
    /// IO Errors.
    IOError(String),
    /// A tuple does not conform to its schema.
    SchemaMismatch(String),
    /// An operation applied to a value type that does not support it.
    UnsupportedOperation(String),
    /// An iterator method invoked outside its valid state.
    IllegalState(String),
    /// Execution errors.
    ExecutionError(String),
    /// Transaction aborted.
    TransactionAbortedError,
}

impl fmt::Display for ShaleError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                ShaleError::SchemaMismatch(s) => format!("Schema Mismatch Error: {}", s),
                ShaleError::UnsupportedOperation(s) =>
                    format!("Unsupported Operation Error: {}", s),
                ShaleError::IllegalState(s) => format!("Illegal State Error: {}", s),
                ShaleError::ExecutionError(s) => format!("Execution Error: {}", s),
                ShaleError::IOError(s) => s.to_string(),
                ShaleError::TransactionAbortedError => String::from("Transaction Aborted Error"),
            }
        )
    }
}

impl From<io::Error> for ShaleError {
    fn from(error: io::Error) -> Self {
        ShaleError::IOError(error.to_string())
    }
}

impl Error for ShaleError {}

/// Return type for a query result.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct QueryResult {
    pub result: String,
}

impl QueryResult {
    /// Return an empty result.
    pub fn empty() -> Self {
        Self {
            result: String::from(""),
        }
    }

    /// Return a result with string.
    ///
    /// # Arguments
    ///
    /// * `result` - Result to return.
    pub fn new(result: &str) -> Self {
        Self {
            result: result.to_string(),
        }
    }

    /// Get the result.
    pub fn result(&self) -> &str {
        &self.result
    }
}

/// How to render tuples when a query result is stringified.
pub enum QueryResultType {
    /// Comma separated values; the bool toggles a header row.
    Csv(bool),
    /// Fixed width columns; header toggle and default column width.
    Width(bool, usize),
}

/// Handle schemas.
#[derive(PartialEq, Clone, Debug)]
pub struct TableSchema {
    /// Attributes of the schema.
    attributes: Vec<Attribute>,
    /// Mapping from attribute name to order in the schema.
    name_map: HashMap<String, usize>,
}

impl Serialize for TableSchema {
    /// Custom serialize to avoid serializing name_map.
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.attributes.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for TableSchema {
    /// Custom deserialize to avoid serializing name_map.
    fn deserialize<D>(deserializer: D) -> Result<TableSchema, D::Error>
    where
        D: Deserializer<'de>,
    {
        let attrs = Vec::deserialize(deserializer)?;
        Ok(TableSchema::new(attrs))
    }
}

impl TableSchema {
    /// Create a new schema.
    ///
    /// # Arguments
    ///
    /// * `attributes` - Attributes of the schema in the order that they are in the schema.
    pub fn new(attributes: Vec<Attribute>) -> Self {
        let mut name_map = HashMap::new();
        for (i, attr) in attributes.iter().enumerate() {
            name_map.insert(attr.name().to_string(), i);
        }
        Self {
            attributes,
            name_map,
        }
    }

    /// Create a new schema with the given names and dtypes.
    ///
    /// # Arguments
    ///
    /// * `names` - Names of the new schema.
    /// * `dtypes` - Dtypes of the new schema.
    pub fn from_vecs(names: Vec<&str>, dtypes: Vec<DataType>) -> Self {
        let mut attrs = Vec::new();
        for (name, dtype) in names.iter().zip(dtypes.iter()) {
            attrs.push(Attribute::new(name.to_string(), dtype.clone()));
        }
        TableSchema::new(attrs)
    }

    /// Get the attribute from the given index.
    ///
    /// # Arguments
    ///
    /// * `i` - Index of the attribute to look for.
    pub fn get_attribute(&self, i: usize) -> Option<&Attribute> {
        self.attributes.get(i)
    }

    /// Get the index of the attribute.
    ///
    /// # Arguments
    ///
    /// * `name` - Name of the attribute to get the index for.
    pub fn get_field_index(&self, name: &str) -> Option<&usize> {
        self.name_map.get(name)
    }

    /// Check if the attribute name is in the schema.
    ///
    /// # Arguments
    ///
    /// * `name` - Name of the attribute to look for.
    pub fn contains(&self, name: &str) -> bool {
        self.name_map.contains_key(name)
    }

    /// Get an iterator of the attributes.
    pub fn attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.iter()
    }

    /// Merge two schemas into one.
    ///
    /// The other schema is appended to the current schema.
    ///
    /// # Arguments
    ///
    /// * `other` - Other schema to add to current schema.
    pub fn merge(&self, other: &Self) -> Self {
        let mut attrs = self.attributes.clone();
        attrs.append(&mut other.attributes.clone());
        Self::new(attrs)
    }

    /// Check that a tuple conforms to this schema in arity and per-position
    /// field types.
    ///
    /// # Arguments
    ///
    /// * `tuple` - Tuple to validate against the schema.
    pub fn check_tuple(&self, tuple: &Tuple) -> Result<(), ShaleError> {
        if tuple.size() != self.size() {
            return Err(ShaleError::SchemaMismatch(format!(
                "tuple has {} fields, schema has {}",
                tuple.size(),
                self.size()
            )));
        }
        for (i, attr) in self.attributes.iter().enumerate() {
            let field = tuple.get_field(i).ok_or_else(|| {
                ShaleError::SchemaMismatch(format!("tuple has no field at index {}", i))
            })?;
            if field.dtype() != *attr.dtype() {
                return Err(ShaleError::SchemaMismatch(format!(
                    "field {} is a {:?}, schema expects {:?}",
                    i,
                    field.dtype(),
                    attr.dtype()
                )));
            }
        }
        Ok(())
    }

    /// Returns the length of the schema.
    pub fn size(&self) -> usize {
        self.attributes.len()
    }
}

/// Handle attributes. Pairs the name with the dtype.
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
pub struct Attribute {
    /// Attribute name.
    pub name: String,
    /// Attribute dtype.
    pub dtype: DataType,
}

impl Attribute {
    /// Create a new attribute with the given name and dtype.
    ///
    /// # Arguments
    ///
    /// * `name` - Name of the attribute.
    /// * `dtype` - Dtype of the attribute.
    pub fn new(name: String, dtype: DataType) -> Self {
        Self { name, dtype }
    }

    /// Returns the name of the attribute.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the dtype of the attribute.
    pub fn dtype(&self) -> &DataType {
        &self.dtype
    }
}

/// Enumerate the supported dtypes.
#[derive(PartialEq, Serialize, Deserialize, Clone, Debug)]
pub enum DataType {
    Int,
    String,
}

/// For each of the dtypes, make sure that there is a corresponding field type.
#[derive(Debug, Serialize, Deserialize, Eq, PartialEq, PartialOrd, Ord, Clone, Hash)]
pub enum Field {
    IntField(i32),
    StringField(String),
}

impl Field {
    /// The dtype this field value belongs to.
    pub fn dtype(&self) -> DataType {
        match self {
            Field::IntField(_) => DataType::Int,
            Field::StringField(_) => DataType::String,
        }
    }

    /// Unwraps integer fields.
    pub fn unwrap_int_field(&self) -> i32 {
        match self {
            Field::IntField(i) => *i,
            _ => panic!("Expected i32"),
        }
    }

    /// Unwraps string fields.
    pub fn unwrap_string_field(&self) -> &str {
        match self {
            Field::StringField(s) => s,
            _ => panic!("Expected String"),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::IntField(x) => write!(f, "{}", x),
            Field::StringField(x) => write!(f, "{}", x),
        }
    }
}

/// Tuple type.
#[derive(Debug, Serialize, Deserialize, Eq, PartialEq, Clone, Hash)]
pub struct Tuple {
    /// Tuple data.
    pub field_vals: Vec<Field>,
}

impl Tuple {
    /// Create a new tuple with the given data.
    ///
    /// # Arguments
    ///
    /// * `field_vals` - Field values of the tuple.
    pub fn new(field_vals: Vec<Field>) -> Self {
        Self { field_vals }
    }

    /// Get the field at index.
    ///
    /// # Arguments
    ///
    /// * `i` - Index of the field.
    pub fn get_field(&self, i: usize) -> Option<&Field> {
        self.field_vals.get(i)
    }

    /// Update the index at field.
    ///
    /// # Arguments
    ///
    /// * `i` - Index of the value to insert.
    /// * `f` - Value to add.
    ///
    /// # Panics
    ///
    /// Panics if the index is out-of-bounds.
    pub fn set_field(&mut self, i: usize, f: Field) {
        self.field_vals[i] = f;
    }

    /// Returns an iterator over the field values.
    pub fn field_vals(&self) -> impl Iterator<Item = &Field> {
        self.field_vals.iter()
    }

    /// Return the length of the tuple.
    pub fn size(&self) -> usize {
        self.field_vals.len()
    }

    /// Append another tuple with self.
    ///
    /// # Arguments
    ///
    /// * `other` - Other tuple to append.
    pub fn merge(&self, other: &Self) -> Self {
        let mut fields = self.field_vals.clone();
        fields.append(&mut other.field_vals.clone());
        Self::new(fields)
    }

    pub fn get_bytes(&self) -> Vec<u8> {
        serde_cbor::to_vec(&self).unwrap()
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        serde_cbor::from_slice(bytes).unwrap()
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut res = String::new();
        for field in &self.field_vals {
            res.push_str(&field.to_string());
            res.push('\t');
        }
        write!(f, "{}", res)
    }
}
