use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::error::Fault;
use crate::writer::Writer;

/// Ordered sequence of values
pub type Array = Vec<Value>;
/// Raw byte payload
pub type Binary = Vec<u8>;
/// Calendar date and time without timezone
pub type DateTime = NaiveDateTime;
/// Named members; keys are unique and emitted in sorted order
pub type Struct = BTreeMap<String, Value>;

/// Type tags for every [`Value`] variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Array,
    Binary,
    Boolean,
    DateTime,
    Double,
    Integer32,
    Integer64,
    Nil,
    String,
    Struct,
}

impl ValueType {
    /// XML-RPC element name for this type, as used by introspection
    pub fn name(&self) -> &'static str {
        match self {
            ValueType::Array => "array",
            ValueType::Binary => "base64",
            ValueType::Boolean => "boolean",
            ValueType::DateTime => "dateTime.iso8601",
            ValueType::Double => "double",
            ValueType::Integer32 => "i4",
            ValueType::Integer64 => "i8",
            ValueType::Nil => "nil",
            ValueType::String => "string",
            ValueType::Struct => "struct",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors raised when indexing into a [`Value`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        expected: ValueType,
        found: ValueType,
    },

    #[error("index {index} out of range for array of length {len}")]
    OutOfRange { index: usize, len: usize },

    #[error("key not found: {0}")]
    KeyNotFound(String),
}

/// Any datum that can travel in an RPC call
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    Array(Array),
    Binary(Binary),
    Boolean(bool),
    DateTime(DateTime),
    Double(f64),
    Integer32(i32),
    Integer64(i64),
    #[default]
    Nil,
    String(String),
    Struct(Struct),
}

impl Value {
    pub fn type_of(&self) -> ValueType {
        match self {
            Value::Array(_) => ValueType::Array,
            Value::Binary(_) => ValueType::Binary,
            Value::Boolean(_) => ValueType::Boolean,
            Value::DateTime(_) => ValueType::DateTime,
            Value::Double(_) => ValueType::Double,
            Value::Integer32(_) => ValueType::Integer32,
            Value::Integer64(_) => ValueType::Integer64,
            Value::Nil => ValueType::Nil,
            Value::String(_) => ValueType::String,
            Value::Struct(_) => ValueType::Struct,
        }
    }

    /// Move the payload out, leaving `Nil` behind
    pub fn take(&mut self) -> Value {
        std::mem::take(self)
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, Value::Binary(_))
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Value::Boolean(_))
    }

    pub fn is_datetime(&self) -> bool {
        matches!(self, Value::DateTime(_))
    }

    pub fn is_double(&self) -> bool {
        matches!(self, Value::Double(_))
    }

    pub fn is_i32(&self) -> bool {
        matches!(self, Value::Integer32(_))
    }

    pub fn is_i64(&self) -> bool {
        matches!(self, Value::Integer64(_))
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    pub fn is_struct(&self) -> bool {
        matches!(self, Value::Struct(_))
    }

    pub fn as_array(&self) -> Result<&Array, Fault> {
        match self {
            Value::Array(array) => Ok(array),
            _ => Err(Fault::invalid_parameters()),
        }
    }

    pub fn as_binary(&self) -> Result<&[u8], Fault> {
        match self {
            Value::Binary(binary) => Ok(binary),
            _ => Err(Fault::invalid_parameters()),
        }
    }

    pub fn as_bool(&self) -> Result<bool, Fault> {
        match self {
            Value::Boolean(value) => Ok(*value),
            _ => Err(Fault::invalid_parameters()),
        }
    }

    pub fn as_datetime(&self) -> Result<&DateTime, Fault> {
        match self {
            Value::DateTime(value) => Ok(value),
            _ => Err(Fault::invalid_parameters()),
        }
    }

    pub fn as_double(&self) -> Result<f64, Fault> {
        match self {
            Value::Double(value) => Ok(*value),
            _ => Err(Fault::invalid_parameters()),
        }
    }

    pub fn as_i32(&self) -> Result<i32, Fault> {
        match self {
            Value::Integer32(value) => Ok(*value),
            _ => Err(Fault::invalid_parameters()),
        }
    }

    pub fn as_i64(&self) -> Result<i64, Fault> {
        match self {
            Value::Integer64(value) => Ok(*value),
            _ => Err(Fault::invalid_parameters()),
        }
    }

    pub fn as_str(&self) -> Result<&str, Fault> {
        match self {
            Value::String(value) => Ok(value),
            _ => Err(Fault::invalid_parameters()),
        }
    }

    pub fn as_struct(&self) -> Result<&Struct, Fault> {
        match self {
            Value::Struct(members) => Ok(members),
            _ => Err(Fault::invalid_parameters()),
        }
    }

    /// Numeric view accepting both integer widths as well as doubles
    pub fn as_f64(&self) -> Result<f64, Fault> {
        match self {
            Value::Double(value) => Ok(*value),
            Value::Integer32(value) => Ok(f64::from(*value)),
            Value::Integer64(value) => Ok(*value as f64),
            _ => Err(Fault::invalid_parameters()),
        }
    }

    /// Element `index` of an array value
    pub fn at(&self, index: usize) -> Result<&Value, ValueError> {
        match self {
            Value::Array(array) => array.get(index).ok_or(ValueError::OutOfRange {
                index,
                len: array.len(),
            }),
            other => Err(ValueError::TypeMismatch {
                expected: ValueType::Array,
                found: other.type_of(),
            }),
        }
    }

    /// Member `key` of a struct value
    pub fn get(&self, key: &str) -> Result<&Value, ValueError> {
        match self {
            Value::Struct(members) => members
                .get(key)
                .ok_or_else(|| ValueError::KeyNotFound(key.to_string())),
            other => Err(ValueError::TypeMismatch {
                expected: ValueType::Struct,
                found: other.type_of(),
            }),
        }
    }

    /// Emit this value through the primitive operations of `writer`
    pub fn write(&self, writer: &mut dyn Writer) {
        match self {
            Value::Array(array) => {
                writer.start_array();
                for element in array {
                    element.write(writer);
                }
                writer.end_array();
            }
            Value::Binary(binary) => writer.write_binary(binary),
            Value::Boolean(value) => writer.write_bool(*value),
            Value::DateTime(value) => writer.write_datetime(value),
            Value::Double(value) => writer.write_double(*value),
            Value::Integer32(value) => writer.write_i32(*value),
            Value::Integer64(value) => writer.write_i64(*value),
            Value::Nil => writer.write_null(),
            Value::String(value) => writer.write_string(value),
            Value::Struct(members) => {
                writer.start_struct();
                for (name, member) in members {
                    writer.start_struct_element(name);
                    member.write(writer);
                    writer.end_struct_element();
                }
                writer.end_struct();
            }
        }
    }
}

impl From<Array> for Value {
    fn from(value: Array) -> Self {
        Value::Array(value)
    }
}

impl From<Binary> for Value {
    fn from(value: Binary) -> Self {
        Value::Binary(value)
    }
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Value::Binary(value.to_vec())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<DateTime> for Value {
    fn from(value: DateTime) -> Self {
        Value::DateTime(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Double(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer32(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer64(value)
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Nil
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<Struct> for Value {
    fn from(value: Struct) -> Self {
        Value::Struct(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Nil, Into::into)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Array(array) => {
                f.write_str("[")?;
                for (i, element) in array.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", element)?;
                }
                f.write_str("]")
            }
            Value::Binary(binary) => write!(f, "<{} bytes>", binary.len()),
            Value::Boolean(value) => write!(f, "{}", value),
            Value::DateTime(value) => write!(f, "{}", crate::util::format_iso8601(value)),
            Value::Double(value) => write!(f, "{}", value),
            Value::Integer32(value) => write!(f, "{}", value),
            Value::Integer64(value) => write!(f, "{}", value),
            Value::Nil => f.write_str("nil"),
            Value::String(value) => write!(f, "{:?}", value),
            Value::Struct(members) => {
                f.write_str("{")?;
                for (i, (name, member)) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", name, member)?;
                }
                f.write_str("}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FaultCode;
    use chrono::NaiveDate;

    fn every_variant() -> Vec<Value> {
        let dt = NaiveDate::from_ymd_opt(1998, 7, 17)
            .unwrap()
            .and_hms_opt(14, 8, 55)
            .unwrap();
        let mut members = Struct::new();
        members.insert("a".to_string(), Value::from(1));
        vec![
            Value::Array(vec![Value::from(1), Value::from("two")]),
            Value::Binary(b"bytes".to_vec()),
            Value::Boolean(true),
            Value::DateTime(dt),
            Value::Double(1.5),
            Value::Integer32(32),
            Value::Integer64(1 << 40),
            Value::Nil,
            Value::String("text".to_string()),
            Value::Struct(members),
        ]
    }

    #[test]
    fn test_wrong_accessor_is_invalid_parameters() {
        for value in every_variant() {
            let checks: Vec<(ValueType, Option<Fault>)> = vec![
                (ValueType::Array, value.as_array().err()),
                (ValueType::Binary, value.as_binary().err()),
                (ValueType::Boolean, value.as_bool().err()),
                (ValueType::DateTime, value.as_datetime().err()),
                (ValueType::Double, value.as_double().err()),
                (ValueType::Integer32, value.as_i32().err()),
                (ValueType::Integer64, value.as_i64().err()),
                (ValueType::String, value.as_str().err()),
                (ValueType::Struct, value.as_struct().err()),
            ];
            for (ty, result) in checks {
                if ty == value.type_of() {
                    assert!(result.is_none(), "{} accessor failed on its own type", ty);
                } else {
                    let fault = result.expect("mismatched accessor must fail");
                    assert_eq!(fault.code(), FaultCode::InvalidParameters.code());
                }
            }
        }
    }

    #[test]
    fn test_binary_and_string_are_distinct() {
        let binary = Value::from(b"abc".to_vec());
        assert!(binary.is_binary());
        assert!(!binary.is_string());

        let string = Value::from("abc");
        assert!(string.is_string());
        assert!(!string.is_binary());
        assert!(string.as_binary().is_err());
    }

    #[test]
    fn test_integer_widths_do_not_mix() {
        let small = Value::from(7i32);
        let large = Value::from(7i64);
        assert!(small.as_i64().is_err());
        assert!(large.as_i32().is_err());
        assert_eq!(small.as_f64().unwrap(), 7.0);
        assert_eq!(large.as_f64().unwrap(), 7.0);
        assert!(Value::from("7").as_f64().is_err());
    }

    #[test]
    fn test_indexing_errors() {
        let array = Value::from(vec![Value::from(1), Value::from(2)]);
        assert_eq!(array.at(1).unwrap(), &Value::from(2));
        assert_eq!(
            array.at(2).unwrap_err(),
            ValueError::OutOfRange { index: 2, len: 2 }
        );
        assert!(matches!(
            array.get("x").unwrap_err(),
            ValueError::TypeMismatch { .. }
        ));

        let mut members = Struct::new();
        members.insert("x".to_string(), Value::Nil);
        let object = Value::from(members);
        assert!(object.get("x").unwrap().is_nil());
        assert_eq!(
            object.get("y").unwrap_err(),
            ValueError::KeyNotFound("y".to_string())
        );
        assert!(matches!(
            object.at(0).unwrap_err(),
            ValueError::TypeMismatch { .. }
        ));

        let fault: Fault = ValueError::KeyNotFound("y".to_string()).into();
        assert_eq!(fault.code(), FaultCode::InvalidParameters.code());
    }

    #[test]
    fn test_clone_is_deep_and_take_leaves_nil() {
        let mut original = Value::from(vec![Value::from(vec![Value::from("inner")])]);
        let copy = original.clone();
        if let Value::Array(outer) = &mut original {
            outer.push(Value::from(1));
        }
        assert_ne!(original, copy);

        let moved = original.take();
        assert!(original.is_nil());
        assert_eq!(moved.as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_type_names() {
        assert_eq!(ValueType::Binary.name(), "base64");
        assert_eq!(ValueType::DateTime.to_string(), "dateTime.iso8601");
        assert_eq!(Value::from(1i64).type_of().name(), "i8");
    }

    #[test]
    fn test_display() {
        let value = Value::from(vec![Value::from(12), Value::from("foobar"), Value::Nil]);
        assert_eq!(value.to_string(), "[12, \"foobar\", nil]");
    }
}
