use std::fmt::Display;

use serde_json::{Number, Value};

/// A numeric operand for increments.
///
/// Every primitive width converts into one of the two variants, so the
/// update operations take a single `impl Into<Amount>` instead of one
/// overload per width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Amount {
    Int(i64),
    Float(f64),
}

impl Amount {
    /// Absolute value. `i64::MIN` has no `i64` absolute value and is
    /// widened to a float.
    pub fn abs(self) -> Amount {
        match self {
            Amount::Int(i) => i
                .checked_abs()
                .map(Amount::Int)
                .unwrap_or(Amount::Float((i as f64).abs())),
            Amount::Float(f) => Amount::Float(f.abs()),
        }
    }

    /// Negation, widened to a float on `i64::MIN`.
    pub fn neg(self) -> Amount {
        match self {
            Amount::Int(i) => i
                .checked_neg()
                .map(Amount::Int)
                .unwrap_or(Amount::Float(-(i as f64))),
            Amount::Float(f) => Amount::Float(-f),
        }
    }

    pub fn as_f64(self) -> f64 {
        match self {
            Amount::Int(i) => i as f64,
            Amount::Float(f) => f,
        }
    }

    /// Converts into a JSON value. Non-finite floats have no JSON
    /// representation and become `null`.
    pub fn to_value(self) -> Value {
        match self {
            Amount::Int(i) => Value::from(i),
            Amount::Float(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        }
    }

    pub fn from_number(n: &Number) -> Option<Amount> {
        if let Some(i) = n.as_i64() {
            Some(Amount::Int(i))
        } else {
            n.as_f64().map(Amount::Float)
        }
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Amount::Int(i) => write!(f, "{i}"),
            Amount::Float(x) => write!(f, "{x}"),
        }
    }
}

impl From<Amount> for Value {
    fn from(value: Amount) -> Self {
        value.to_value()
    }
}

macro_rules! int_amount {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Amount {
                fn from(value: $t) -> Self {
                    Amount::Int(value as i64)
                }
            }
        )*
    };
}

int_amount!(i8, i16, i32, i64, isize, u8, u16, u32);

// widths that may not fit an i64 fall back to a float
macro_rules! wide_amount {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Amount {
                fn from(value: $t) -> Self {
                    i64::try_from(value)
                        .map(Amount::Int)
                        .unwrap_or(Amount::Float(value as f64))
                }
            }
        )*
    };
}

wide_amount!(u64, usize, i128, u128);

impl From<f32> for Amount {
    fn from(value: f32) -> Self {
        Amount::Float(value as f64)
    }
}

impl From<f64> for Amount {
    fn from(value: f64) -> Self {
        Amount::Float(value)
    }
}
