use std::{
    fmt::Display,
    iter::Sum,
    ops::Add,
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const RUPIAH_CURRENCY_CODE: &str = "IDR";

//--------------------------------------       Rupiah        ---------------------------------------------------------
/// An amount of Indonesian Rupiah in whole currency units. The rupiah has no minor unit in practice, so every price,
/// total and ledger amount in the system is an integer.
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct Rupiah(i64);

op!(binary Rupiah, Add, add);
op!(binary Rupiah, Sub, sub);
op!(inplace Rupiah, AddAssign, add_assign);
op!(inplace Rupiah, SubAssign, sub_assign);
op!(unary Rupiah, Neg, neg);

impl Sum for Rupiah {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in Rupiah: {0}")]
pub struct RupiahConversionError(String);

impl From<i64> for Rupiah {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Display for Rupiah {
    /// Formats with Indonesian digit grouping, e.g. `Rp 1.250.000`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(c);
        }
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{sign}Rp {grouped}")
    }
}

impl FromStr for Rupiah {
    type Err = RupiahConversionError;

    /// Parses plain decimal amounts as sent by payment providers, e.g. `"52000"` or `"52000.00"`. Fractional parts
    /// are rounded to the nearest whole rupiah.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(v) = s.parse::<i64>() {
            return Ok(Self(v));
        }
        let v = s.parse::<f64>().map_err(|e| RupiahConversionError(format!("{s} is not a number. {e}")))?;
        Self::round_from(v)
    }
}

impl Rupiah {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// `self * rhs`, or `None` if the result does not fit.
    pub fn checked_mul(self, rhs: i64) -> Option<Self> {
        self.0.checked_mul(rhs).map(Self)
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// Sums an iterator of amounts, or returns `None` on overflow.
    pub fn checked_sum<I: IntoIterator<Item = Self>>(iter: I) -> Option<Self> {
        iter.into_iter().try_fold(Self::default(), Self::checked_add)
    }

    /// Rounds a floating point amount to the nearest whole rupiah.
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    pub fn round_from(value: f64) -> Result<Self, RupiahConversionError> {
        if !value.is_finite() {
            return Err(RupiahConversionError(format!("{value} is not a finite amount")));
        }
        let rounded = value.round();
        if rounded > i64::MAX as f64 || rounded < i64::MIN as f64 {
            return Err(RupiahConversionError(format!("{value} is out of range")));
        }
        Ok(Self(rounded as i64))
    }
}
