use std::{
    fmt,
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};

/// Signed money amount represented as **integer cents**.
///
/// Backend payloads carry amounts as JSON numbers or locale-formatted
/// strings; once normalized every amount, total and balance is a
/// `MoneyCents` so sums never drift.
///
/// The value is signed:
/// - positive = credit
/// - negative = debit
///
/// # Examples
///
/// ```rust
/// use engine::MoneyCents;
///
/// let amount = MoneyCents::new(123_45);
/// assert_eq!(amount.to_string(), "123.45");
/// assert_eq!(MoneyCents::new(-3050).format_brl(), "-R$ 30,50");
/// ```
///
/// Lenient parsing (first `,` becomes the decimal mark):
///
/// ```rust
/// use engine::MoneyCents;
///
/// assert_eq!(MoneyCents::parse_lenient("45,90"), Some(MoneyCents::new(4590)));
/// assert_eq!(MoneyCents::parse_lenient(""), Some(MoneyCents::ZERO));
/// assert_eq!(MoneyCents::parse_lenient("abc"), None);
/// ```
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
#[repr(transparent)]
pub struct MoneyCents(i64);

/// Decimal mark used when rendering an amount without currency symbol.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecimalMark {
    Dot,
    Comma,
}

impl MoneyCents {
    pub const ZERO: MoneyCents = MoneyCents(0);

    /// Creates a new amount from integer cents.
    #[must_use]
    pub const fn new(cents: i64) -> Self {
        Self(cents)
    }

    /// Returns the raw value in cents.
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Returns `true` if the amount is 0.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if the amount is positive.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Magnitude of the amount; `i64::MIN` saturates to `i64::MAX`.
    #[must_use]
    pub const fn abs(self) -> Self {
        Self(self.0.saturating_abs())
    }

    /// Returns `true` if the amount is negative.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Converts a major-unit float (e.g. `123.45`) rounding to the nearest
    /// cent. Non-finite values become zero.
    #[must_use]
    pub fn from_major_lossy(value: f64) -> Self {
        if !value.is_finite() {
            return Self::ZERO;
        }
        Self((value * 100.0).round() as i64)
    }

    /// Parses a decimal string the way the statement payloads need it.
    ///
    /// Only the first `,` is turned into `.`, so `"1.234,56"` is rejected
    /// rather than silently misread. An empty string is zero.
    #[must_use]
    pub fn parse_lenient(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Some(Self::ZERO);
        }
        let value = trimmed.replacen(',', ".", 1).parse::<f64>().ok()?;
        if !value.is_finite() {
            return None;
        }
        Some(Self::from_major_lossy(value))
    }

    /// Renders the amount without currency symbol nor grouping.
    #[must_use]
    pub fn format_decimal(self, mark: DecimalMark) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let sep = match mark {
            DecimalMark::Dot => '.',
            DecimalMark::Comma => ',',
        };
        format!("{sign}{}{sep}{:02}", abs / 100, abs % 100)
    }

    /// Renders the amount as Brazilian currency: `R$ 1.234,56`.
    #[must_use]
    pub fn format_brl(self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let units = (abs / 100).to_string();

        let mut grouped = String::with_capacity(units.len() + units.len() / 3);
        for (idx, ch) in units.chars().enumerate() {
            if idx > 0 && (units.len() - idx) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }

        format!("{sign}R$ {grouped},{:02}", abs % 100)
    }
}

impl fmt::Display for MoneyCents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_decimal(DecimalMark::Dot))
    }
}

impl From<i64> for MoneyCents {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<MoneyCents> for i64 {
    fn from(value: MoneyCents) -> Self {
        value.0
    }
}

impl Add for MoneyCents {
    type Output = MoneyCents;

    fn add(self, rhs: MoneyCents) -> Self::Output {
        MoneyCents(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for MoneyCents {
    fn add_assign(&mut self, rhs: MoneyCents) {
        *self = *self + rhs;
    }
}

impl Sub for MoneyCents {
    type Output = MoneyCents;

    fn sub(self, rhs: MoneyCents) -> Self::Output {
        MoneyCents(self.0.saturating_sub(rhs.0))
    }
}

impl SubAssign for MoneyCents {
    fn sub_assign(&mut self, rhs: MoneyCents) {
        *self = *self - rhs;
    }
}

impl Neg for MoneyCents {
    type Output = MoneyCents;

    fn neg(self) -> Self::Output {
        MoneyCents(self.0.saturating_neg())
    }
}

impl Sum for MoneyCents {
    fn sum<I: Iterator<Item = MoneyCents>>(iter: I) -> Self {
        iter.fold(MoneyCents::ZERO, Add::add)
    }
}
