use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A non-negative amount of money, stored as integer cents so sums stay exact.
/// For MAD/EUR/USD, 1 unit = 100 cents, so 50.00 = 5000 cents.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount(u64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    pub const fn cents(self) -> u64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// `self - other` as signed cents. Used for remaining budget and net totals.
    /// Saturates at the `i64` bounds.
    pub fn signed_diff(self, other: Amount) -> i64 {
        let diff = i128::from(self.0) - i128::from(other.0);
        i64::try_from(diff).unwrap_or(if diff < 0 { i64::MIN } else { i64::MAX })
    }

    /// Subtraction clamped at zero.
    pub fn saturating_sub(self, other: Amount) -> Amount {
        Amount(self.0.saturating_sub(other.0))
    }

    /// `self` as a percentage of `whole`; zero when `whole` is zero.
    pub fn percent_of(self, whole: Amount) -> f64 {
        if whole.is_zero() {
            return 0.0;
        }
        self.0 as f64 / whole.0 as f64 * 100.0
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Amount) -> Amount {
        Amount(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Amount) {
        *self = *self + rhs;
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Amount {
        iter.fold(Amount::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Amount>>(iter: I) -> Amount {
        iter.copied().sum()
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

/// Format signed cents, e.g. a remaining budget: -1234 -> "-12.34".
pub fn format_signed_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    format!("{}{}", sign, Amount(cents.unsigned_abs()))
}

impl FromStr for Amount {
    type Err = ParseAmountError;

    /// Parse a decimal string: "50.00" -> 5000, "12.5" -> 1250, "100" -> 10000.
    /// Extra decimal places are truncated. Negative amounts are rejected.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let input = input.trim();
        if input.starts_with('-') {
            return Err(ParseAmountError::Negative);
        }

        let (units, decimals) = match input.split_once('.') {
            Some((units, decimals)) => (units, decimals),
            None => (input, ""),
        };
        if units.is_empty() && decimals.is_empty() {
            return Err(ParseAmountError::InvalidFormat);
        }
        if !units.chars().all(|c| c.is_ascii_digit())
            || !decimals.chars().all(|c| c.is_ascii_digit())
        {
            return Err(ParseAmountError::InvalidFormat);
        }

        let units: u64 = if units.is_empty() {
            0
        } else {
            units.parse().map_err(|_| ParseAmountError::InvalidFormat)?
        };
        let fraction: u64 = match decimals.len() {
            0 => 0,
            1 => decimals.parse::<u64>().map_err(|_| ParseAmountError::InvalidFormat)? * 10,
            _ => decimals[..2]
                .parse()
                .map_err(|_| ParseAmountError::InvalidFormat)?,
        };

        units
            .checked_mul(100)
            .and_then(|c| c.checked_add(fraction))
            .map(Amount)
            .ok_or(ParseAmountError::InvalidFormat)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseAmountError {
    InvalidFormat,
    Negative,
}

impl fmt::Display for ParseAmountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseAmountError::InvalidFormat => write!(f, "invalid money format"),
            ParseAmountError::Negative => write!(f, "amounts cannot be negative"),
        }
    }
}

impl std::error::Error for ParseAmountError {}
