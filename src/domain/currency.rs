use std::fmt;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

use num_bigint::BigUint;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// Arbitrary-precision, non-negative currency amount in base units
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Currency(BigUint);

impl Currency {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn is_zero(&self) -> bool {
        self.0 == BigUint::default()
    }
}

impl From<u64> for Currency {
    fn from(value: u64) -> Self {
        Self(BigUint::from(value))
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error returned when a currency string is not a plain decimal integer
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid currency amount: {0:?}")]
pub struct ParseCurrencyError(String);

impl FromStr for Currency {
    type Err = ParseCurrencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // BigUint accepts a leading '+', amounts on disk never carry one
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseCurrencyError(s.to_string()));
        }

        BigUint::from_str(s)
            .map(Self)
            .map_err(|_| ParseCurrencyError(s.to_string()))
    }
}

impl<'a> Add<&'a Currency> for Currency {
    type Output = Currency;

    fn add(self, rhs: &'a Currency) -> Currency {
        Currency(self.0 + &rhs.0)
    }
}

impl<'a> AddAssign<&'a Currency> for Currency {
    fn add_assign(&mut self, rhs: &'a Currency) {
        self.0 += &rhs.0;
    }
}

// Amounts travel as decimal strings: JSON numbers lose precision past 2^53.
impl Serialize for Currency {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Currency {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CurrencyVisitor;

        impl de::Visitor<'_> for CurrencyVisitor {
            type Value = Currency;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a non-negative integer amount as a decimal string")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Currency, E> {
                v.parse().map_err(E::custom)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Currency, E> {
                Ok(Currency::from(v))
            }
        }

        deserializer.deserialize_any(CurrencyVisitor)
    }
}
