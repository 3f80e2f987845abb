//! Whole-unit monetary amounts
//!
//! Itemized claim reports carry billed values as whole currency units.
//! Values arriving from loosely-typed sources (model output, JSON strings)
//! are coerced through `Decimal` and floored, never rounded, so that
//! `80000.99` becomes `80000`.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur while coercing a monetary value
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmountError {
    #[error("Value is not a number: {0}")]
    NotNumeric(String),

    #[error("Value out of range for a whole amount: {0}")]
    OutOfRange(String),
}

/// A monetary value in whole currency units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WholeAmount(i64);

impl WholeAmount {
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    pub const fn zero() -> Self {
        Self(0)
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    /// Floors a decimal to whole units
    pub fn floor_of(amount: Decimal) -> Result<Self, AmountError> {
        amount
            .floor()
            .to_i64()
            .map(Self)
            .ok_or_else(|| AmountError::OutOfRange(amount.to_string()))
    }

    /// Parses a textual amount (`"1500.75"`, `"1.5e3"`) and floors it
    pub fn parse_floor(raw: &str) -> Result<Self, AmountError> {
        let trimmed = raw.trim();
        let decimal = Decimal::from_str(trimmed)
            .or_else(|_| Decimal::from_scientific(trimmed))
            .map_err(|_| AmountError::NotNumeric(trimmed.to_string()))?;
        Self::floor_of(decimal)
    }

    /// Coerces an arbitrary JSON value
    ///
    /// Numbers and numeric strings are floored; `null` is zero. Anything else
    /// is rejected.
    pub fn from_json(value: &Value) -> Result<Self, AmountError> {
        match value {
            Value::Null => Ok(Self::zero()),
            Value::Number(number) => {
                if let Some(int) = number.as_i64() {
                    return Ok(Self(int));
                }
                Self::parse_floor(&number.to_string())
            }
            Value::String(text) => Self::parse_floor(text),
            other => Err(AmountError::NotNumeric(other.to_string())),
        }
    }
}

impl From<i64> for WholeAmount {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl fmt::Display for WholeAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
