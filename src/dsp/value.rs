//! Value types carried by value endpoints.
//!
//! Defines the scalar and array values that flow along value connections.

use std::sync::Arc;

/// The type of value an endpoint holds.
///
/// - **Float**: audio samples and continuous control values
/// - **Int**: indices, counts, seeds and selectors
/// - **Bool**: switches such as "looping" or "clamped"
/// - **FloatArray** / **IntArray**: shared, immutable arrays
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueType {
    Float,
    Int,
    Bool,
    FloatArray,
    IntArray,
}

impl ValueType {
    /// Checks if a connection from this value type to another is valid.
    ///
    /// Connection rules:
    /// - Same type to same type: Always allowed
    /// - Float <-> Int: Allowed (converted when read)
    /// - Bool -> Float / Int: Allowed (0 or 1)
    /// - Arrays only connect to the identical array type
    pub fn can_connect_to(&self, target: ValueType) -> bool {
        match (self, target) {
            (a, b) if *a == b => true,

            (ValueType::Float, ValueType::Int) => true,
            (ValueType::Int, ValueType::Float) => true,

            (ValueType::Bool, ValueType::Float) => true,
            (ValueType::Bool, ValueType::Int) => true,

            _ => false,
        }
    }

    /// Returns a human-readable name for the value type.
    pub fn name(&self) -> &'static str {
        match self {
            ValueType::Float => "Float",
            ValueType::Int => "Int",
            ValueType::Bool => "Bool",
            ValueType::FloatArray => "Float Array",
            ValueType::IntArray => "Int Array",
        }
    }

    /// Returns the zero value of this type. Arrays default to empty.
    pub fn default_value(&self) -> Value {
        match self {
            ValueType::Float => Value::Float(0.0),
            ValueType::Int => Value::Int(0),
            ValueType::Bool => Value::Bool(false),
            ValueType::FloatArray => Value::FloatArray(Arc::from(Vec::new())),
            ValueType::IntArray => Value::IntArray(Arc::from(Vec::new())),
        }
    }

    /// Returns true for the array types.
    pub fn is_array(&self) -> bool {
        matches!(self, ValueType::FloatArray | ValueType::IntArray)
    }
}

/// A value held by a value endpoint.
///
/// Scalars are stored inline. Arrays are reference-counted handles, so
/// copying a value along a connection never copies array contents.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Float(f32),
    Int(i32),
    Bool(bool),
    FloatArray(Arc<[f32]>),
    IntArray(Arc<[i32]>),
}

impl Value {
    /// Returns the type of this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Float(_) => ValueType::Float,
            Value::Int(_) => ValueType::Int,
            Value::Bool(_) => ValueType::Bool,
            Value::FloatArray(_) => ValueType::FloatArray,
            Value::IntArray(_) => ValueType::IntArray,
        }
    }

    /// Reads the value as a float. Arrays read as 0.
    #[inline]
    pub fn as_f32(&self) -> f32 {
        match self {
            Value::Float(v) => *v,
            Value::Int(v) => *v as f32,
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::FloatArray(_) | Value::IntArray(_) => 0.0,
        }
    }

    /// Reads the value as an integer.
    ///
    /// Floats truncate toward zero and saturate, NaN reads as 0.
    #[inline]
    pub fn as_i32(&self) -> i32 {
        match self {
            Value::Float(v) => *v as i32,
            Value::Int(v) => *v,
            Value::Bool(b) => *b as i32,
            Value::FloatArray(_) | Value::IntArray(_) => 0,
        }
    }

    /// Reads the value as a boolean (non-zero is true).
    #[inline]
    pub fn as_bool(&self) -> bool {
        match self {
            Value::Float(v) => *v != 0.0,
            Value::Int(v) => *v != 0,
            Value::Bool(b) => *b,
            Value::FloatArray(a) => !a.is_empty(),
            Value::IntArray(a) => !a.is_empty(),
        }
    }

    /// Returns the float array, or an empty slice for any other value.
    #[inline]
    pub fn float_array(&self) -> &[f32] {
        match self {
            Value::FloatArray(a) => a,
            _ => &[],
        }
    }

    /// Returns the int array, or an empty slice for any other value.
    #[inline]
    pub fn int_array(&self) -> &[i32] {
        match self {
            Value::IntArray(a) => a,
            _ => &[],
        }
    }

    /// Converts a scalar to the requested type.
    ///
    /// Returns `None` when no conversion exists, e.g. between an array
    /// and a scalar. Scalar conversions never allocate.
    pub fn coerce_to(&self, target: ValueType) -> Option<Value> {
        if self.value_type() == target {
            return Some(self.clone());
        }
        if !self.value_type().can_connect_to(target) {
            return None;
        }
        match target {
            ValueType::Float => Some(Value::Float(self.as_f32())),
            ValueType::Int => Some(Value::Int(self.as_i32())),
            ValueType::Bool => Some(Value::Bool(self.as_bool())),
            ValueType::FloatArray | ValueType::IntArray => None,
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Float(0.0)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v)
    }
}

/// Unsuffixed float literals default to `f64`, so they convert too.
impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v as f32)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<Vec<f32>> for Value {
    fn from(v: Vec<f32>) -> Self {
        Value::FloatArray(v.into())
    }
}

impl From<Vec<i32>> for Value {
    fn from(v: Vec<i32>) -> Self {
        Value::IntArray(v.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_type_connections() {
        assert!(ValueType::Float.can_connect_to(ValueType::Float));
        assert!(ValueType::IntArray.can_connect_to(ValueType::IntArray));
    }

    #[test]
    fn test_numeric_cross_connections() {
        assert!(ValueType::Float.can_connect_to(ValueType::Int));
        assert!(ValueType::Int.can_connect_to(ValueType::Float));
        assert!(ValueType::Bool.can_connect_to(ValueType::Float));
        assert!(!ValueType::Float.can_connect_to(ValueType::Bool));
    }

    #[test]
    fn test_arrays_are_strict() {
        assert!(!ValueType::FloatArray.can_connect_to(ValueType::IntArray));
        assert!(!ValueType::Float.can_connect_to(ValueType::FloatArray));
        assert!(!ValueType::IntArray.can_connect_to(ValueType::Int));
    }

    #[test]
    fn test_lenient_reads() {
        assert_eq!(Value::Int(3).as_f32(), 3.0);
        assert_eq!(Value::Float(2.9).as_i32(), 2);
        assert_eq!(Value::Float(-2.9).as_i32(), -2);
        assert_eq!(Value::Float(f32::NAN).as_i32(), 0);
        assert_eq!(Value::Bool(true).as_f32(), 1.0);
        assert!(Value::Int(5).as_bool());
        assert_eq!(Value::from(vec![1.0_f32]).as_f32(), 0.0);
    }

    #[test]
    fn test_array_access() {
        let v = Value::from(vec![1, 2, 3]);
        assert_eq!(v.int_array(), &[1, 2, 3]);
        assert!(v.float_array().is_empty());
        assert_eq!(v.value_type(), ValueType::IntArray);
    }

    #[test]
    fn test_coerce() {
        assert_eq!(Value::Int(4).coerce_to(ValueType::Float), Some(Value::Float(4.0)));
        assert_eq!(Value::Float(1.5).coerce_to(ValueType::Int), Some(Value::Int(1)));
        assert_eq!(Value::Float(1.0).coerce_to(ValueType::FloatArray), None);
    }

    #[test]
    fn test_default_values() {
        assert_eq!(ValueType::Float.default_value(), Value::Float(0.0));
        assert!(ValueType::FloatArray.default_value().float_array().is_empty());
    }
}
