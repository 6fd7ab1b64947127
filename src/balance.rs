use std::{
    fmt,
    ops::{Add, AddAssign},
    str::FromStr,
};

use num_bigint::BigUint;
use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{self, Visitor},
};
use thiserror::Error;

/// Unsigned token amount of arbitrary size.
///
/// Ledger balances routinely exceed `u64` (and may exceed what a decimal
/// type can hold), so they are kept as big integers and travel as decimal
/// strings both ways.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Balance(BigUint);

#[derive(Debug, Error, PartialEq, Eq)]
#[error("`{input}` is not a non-negative decimal integer")]
pub struct ParseBalanceError {
    input: String,
}

impl Balance {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn is_zero(&self) -> bool {
        self.0.bits() == 0
    }

    /// Multiplies a per-unit price by a unit count, e.g. cost per byte by bytes used.
    pub fn times(&self, units: u64) -> Self {
        Self(&self.0 * units)
    }

    pub fn checked_sub(&self, rhs: &Balance) -> Option<Self> {
        if self.0 >= rhs.0 {
            Some(Self(&self.0 - &rhs.0))
        } else {
            None
        }
    }
}

impl From<u64> for Balance {
    fn from(value: u64) -> Self {
        Self(BigUint::from(value))
    }
}

impl From<u128> for Balance {
    fn from(value: u128) -> Self {
        Self(BigUint::from(value))
    }
}

impl FromStr for Balance {
    type Err = ParseBalanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // BigUint alone would also accept a leading `+` or `_` separators
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseBalanceError {
                input: s.to_owned(),
            });
        }
        BigUint::from_str(s).map(Self).map_err(|_| ParseBalanceError {
            input: s.to_owned(),
        })
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add<&Balance> for &Balance {
    type Output = Balance;

    fn add(self, rhs: &Balance) -> Balance {
        Balance(&self.0 + &rhs.0)
    }
}

impl AddAssign<&Balance> for Balance {
    fn add_assign(&mut self, rhs: &Balance) {
        self.0 += &rhs.0;
    }
}

impl Serialize for Balance {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&self.0)
    }
}

struct BalanceVisitor;

impl Visitor<'_> for BalanceVisitor {
    type Value = Balance;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a decimal string or an unsigned integer")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        v.parse().map_err(E::custom)
    }

    fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Balance::from(v))
    }
}

impl<'de> Deserialize<'de> for Balance {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(BalanceVisitor)
    }
}
