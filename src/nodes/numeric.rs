//! Numeric element types for the generic node families.
//!
//! Nodes such as `Add<T>` or `Random<T>` are written once over
//! [`NodeValue`] and registered for `f32` and `i32`. Every operation here
//! is total: integer arithmetic wraps, division by zero yields zero and
//! non-finite float operands and results collapse to zero.

use std::fmt::Debug;

use crate::dsp::{FastRandom, Value, ValueType};

/// A scalar type a node family can be instantiated over.
pub trait NodeValue: Copy + PartialOrd + Default + Debug + Send + Sync + 'static {
    /// Endpoint type of a scalar of this type.
    const VALUE_TYPE: ValueType;
    /// Endpoint type of an array of this type.
    const ARRAY_TYPE: ValueType;
    /// Upper bound used as the default for range endpoints.
    const RANGE_MAX: Self;

    fn read(value: &Value) -> Self;
    fn read_array(value: &Value) -> &[Self];
    fn into_value(self) -> Value;

    fn add(self, rhs: Self) -> Self;
    fn sub(self, rhs: Self) -> Self;
    fn mul(self, rhs: Self) -> Self;
    /// Division with a zero result for a zero divisor.
    fn div(self, rhs: Self) -> Self;

    fn to_f32(self) -> f32;
    /// Converts back from `f32`. Integers truncate and saturate.
    fn from_f32(value: f32) -> Self;

    /// Lossless widening, used where `i32` must survive float math.
    fn to_f64(self) -> f64;
    /// Converts back from `f64`. Integers truncate and saturate, floats
    /// that overflow become zero.
    fn from_f64(value: f64) -> Self;

    /// Draws a value between `min` and `max`.
    fn random_in_range(rng: &mut FastRandom, min: Self, max: Self) -> Self;

    /// Replaces values no node may output (NaN, infinities) with zero.
    fn sanitize(self) -> Self;

    #[inline]
    fn min_of(self, other: Self) -> Self {
        let (a, b) = (self.sanitize(), other.sanitize());
        if b < a {
            b
        } else {
            a
        }
    }

    #[inline]
    fn max_of(self, other: Self) -> Self {
        let (a, b) = (self.sanitize(), other.sanitize());
        if b > a {
            b
        } else {
            a
        }
    }
}

/// Replaces NaN and infinities with zero.
#[inline]
pub fn finite_or_zero(value: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

impl NodeValue for f32 {
    const VALUE_TYPE: ValueType = ValueType::Float;
    const ARRAY_TYPE: ValueType = ValueType::FloatArray;
    const RANGE_MAX: Self = 1.0;

    #[inline]
    fn read(value: &Value) -> Self {
        value.as_f32()
    }

    #[inline]
    fn read_array(value: &Value) -> &[Self] {
        value.float_array()
    }

    #[inline]
    fn into_value(self) -> Value {
        Value::Float(self)
    }

    #[inline]
    fn add(self, rhs: Self) -> Self {
        finite_or_zero(self + rhs)
    }

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        finite_or_zero(self - rhs)
    }

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        finite_or_zero(self * rhs)
    }

    #[inline]
    fn div(self, rhs: Self) -> Self {
        if rhs == 0.0 {
            0.0
        } else {
            finite_or_zero(self / rhs)
        }
    }

    #[inline]
    fn to_f32(self) -> f32 {
        self
    }

    #[inline]
    fn from_f32(value: f32) -> Self {
        value
    }

    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }

    #[inline]
    fn from_f64(value: f64) -> Self {
        finite_or_zero(value as f32)
    }

    #[inline]
    fn random_in_range(rng: &mut FastRandom, min: Self, max: Self) -> Self {
        rng.f32_in_range(min, max)
    }

    #[inline]
    fn sanitize(self) -> Self {
        finite_or_zero(self)
    }
}

impl NodeValue for i32 {
    const VALUE_TYPE: ValueType = ValueType::Int;
    const ARRAY_TYPE: ValueType = ValueType::IntArray;
    const RANGE_MAX: Self = 100;

    #[inline]
    fn read(value: &Value) -> Self {
        value.as_i32()
    }

    #[inline]
    fn read_array(value: &Value) -> &[Self] {
        value.int_array()
    }

    #[inline]
    fn into_value(self) -> Value {
        Value::Int(self)
    }

    #[inline]
    fn add(self, rhs: Self) -> Self {
        self.wrapping_add(rhs)
    }

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        self.wrapping_sub(rhs)
    }

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        self.wrapping_mul(rhs)
    }

    #[inline]
    fn div(self, rhs: Self) -> Self {
        if rhs == 0 {
            0
        } else {
            self.wrapping_div(rhs)
        }
    }

    #[inline]
    fn to_f32(self) -> f32 {
        self as f32
    }

    #[inline]
    fn from_f32(value: f32) -> Self {
        value as i32
    }

    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }

    #[inline]
    fn from_f64(value: f64) -> Self {
        value as i32
    }

    #[inline]
    fn random_in_range(rng: &mut FastRandom, min: Self, max: Self) -> Self {
        rng.i32_in_range(min, max)
    }

    #[inline]
    fn sanitize(self) -> Self {
        self
    }
}
