use std::{
    fmt::{Debug, Display},
    iter::Sum,
    str::FromStr,
};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

const DECIMALS: u32 = 2;
const SCALE: i64 = 10i64.pow(DECIMALS);

/// Fixed point number with two fractional digits, stored as an integer
/// count of hundredths.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Decimal(i64);

impl Decimal {
    pub fn int(value: i64) -> Decimal {
        Decimal(value.saturating_mul(SCALE))
    }

    pub const fn from_cents(cents: i64) -> Decimal {
        Decimal(cents)
    }

    pub fn zero() -> Decimal {
        Decimal(0)
    }

    pub fn cents(&self) -> i64 {
        self.0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn abs(&self) -> Decimal {
        Decimal(self.0.abs())
    }

    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / SCALE as f64
    }

    /// Rounds half away from zero to the nearest hundredth.
    /// `None` for NaN, infinities and values that do not fit.
    pub fn try_from_f64(value: f64) -> Option<Decimal> {
        if !value.is_finite() {
            return None;
        }
        let scaled = (value * SCALE as f64).round();
        if scaled.abs() >= i64::MAX as f64 {
            return None;
        }
        Some(Decimal(scaled as i64))
    }

    pub fn checked_add(self, other: Decimal) -> Option<Decimal> {
        self.0.checked_add(other.0).map(Decimal)
    }

    pub fn checked_mul(self, other: Decimal) -> Option<Decimal> {
        let product = div_round(self.0 as i128 * other.0 as i128, SCALE as i128);
        i64::try_from(product).ok().map(Decimal)
    }

    pub fn checked_div(self, other: Decimal) -> Option<Decimal> {
        if other.0 == 0 {
            return None;
        }
        let quotient = div_round(self.0 as i128 * SCALE as i128, other.0 as i128);
        i64::try_from(quotient).ok().map(Decimal)
    }

    /// Arithmetic mean, zero for an empty input.
    pub fn average<I: IntoIterator<Item = Decimal>>(values: I) -> Decimal {
        let (sum, count) = values
            .into_iter()
            .fold((0i128, 0i128), |(sum, count), value| {
                (sum + value.0 as i128, count + 1)
            });
        if count == 0 {
            return Decimal::zero();
        }
        // a mean never leaves the range of its inputs
        Decimal(div_round(sum, count) as i64)
    }
}

fn div_round(numerator: i128, denominator: i128) -> i128 {
    let quotient = numerator / denominator;
    let remainder = numerator % denominator;
    let rounded = if remainder.abs() * 2 >= denominator.abs() {
        if (numerator < 0) != (denominator < 0) {
            quotient - 1
        } else {
            quotient + 1
        }
    } else {
        quotient
    };
    rounded
}

impl Debug for Decimal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl Display for Decimal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(
            f,
            "{}{}.{:02}",
            sign,
            abs / SCALE as u64,
            abs % SCALE as u64
        )
    }
}

impl From<u32> for Decimal {
    fn from(value: u32) -> Self {
        Decimal::int(value as i64)
    }
}

impl TryFrom<f64> for Decimal {
    type Error = ParseDecimalError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Decimal::try_from_f64(value).ok_or(ParseDecimalError)
    }
}

impl TryFrom<&str> for Decimal {
    type Error = ParseDecimalError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let value = value.trim().replace(',', ".");
        let val = value.parse::<f64>().map_err(|_| ParseDecimalError)?;
        Decimal::try_from(val)
    }
}

impl FromStr for Decimal {
    type Err = ParseDecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::try_from(s)
    }
}

impl std::ops::AddAssign for Decimal {
    fn add_assign(&mut self, other: Decimal) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl std::ops::SubAssign for Decimal {
    fn sub_assign(&mut self, other: Decimal) {
        self.0 = self.0.saturating_sub(other.0);
    }
}

impl std::ops::Add for Decimal {
    type Output = Decimal;

    fn add(self, other: Decimal) -> Decimal {
        Decimal(self.0.saturating_add(other.0))
    }
}

impl std::ops::Sub for Decimal {
    type Output = Decimal;

    fn sub(self, other: Decimal) -> Decimal {
        Decimal(self.0.saturating_sub(other.0))
    }
}

impl std::ops::Mul for Decimal {
    type Output = Decimal;

    fn mul(self, other: Decimal) -> Decimal {
        let product = div_round(self.0 as i128 * other.0 as i128, SCALE as i128);
        Decimal(product.clamp(i64::MIN as i128, i64::MAX as i128) as i64)
    }
}

impl std::ops::Neg for Decimal {
    type Output = Decimal;

    fn neg(self) -> Decimal {
        Decimal(self.0.saturating_neg())
    }
}

impl Sum for Decimal {
    fn sum<I: Iterator<Item = Decimal>>(iter: I) -> Decimal {
        iter.fold(Decimal::zero(), |acc, x| acc + x)
    }
}

impl<'a> Sum<&'a Decimal> for Decimal {
    fn sum<I: Iterator<Item = &'a Decimal>>(iter: I) -> Decimal {
        iter.copied().sum()
    }
}

#[derive(Debug)]
pub struct ParseDecimalError;

impl std::fmt::Display for ParseDecimalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Failed to parse decimal value")
    }
}

impl std::error::Error for ParseDecimalError {}

impl Serialize for Decimal {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(self.0)
    }
}

impl<'de> Deserialize<'de> for Decimal {
    fn deserialize<D>(deserializer: D) -> Result<Decimal, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = i64::deserialize(deserializer)?;
        Ok(Decimal(value))
    }
}
