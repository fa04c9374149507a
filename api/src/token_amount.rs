//! Provides an exact, arbitrary-precision type for token amounts typed by a user.

use std::fmt;
use std::str::FromStr;

use num_bigint::BigUint;
use num_traits::Zero;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

/// An error that can occur when parsing a string into a `TokenAmount`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseTokenAmountError {
    /// The string is not a plain non-negative decimal (e.g., "abc", "1.2.3", "-4").
    #[error("invalid token amount format")]
    InvalidFormat,
}

/// An error converting a human amount into base units.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    /// The amount has more fractional digits than the asset supports.
    #[error("amount has {scale} decimal places but the asset only supports {decimals}")]
    TooManyDecimals { scale: u32, decimals: u8 },
}

/// A non-negative decimal amount of some token, in human units (e.g. "1.5" ZRX).
///
/// Internally the value is `digits / 10^scale`, held as a `BigUint` so that no
/// floating-point rounding can ever occur. Trailing fractional zeros are dropped on
/// construction, so `"1.50"` and `"1.5"` compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenAmount {
    digits: BigUint,
    scale: u32,
}

impl TokenAmount {
    /// Creates an amount from a whole number of tokens.
    pub fn whole(tokens: u64) -> Self {
        Self {
            digits: BigUint::from(tokens),
            scale: 0,
        }
    }

    /// Creates an amount from a base-unit integer and the asset's decimals.
    ///
    /// # Example
    /// ```
    /// use api::token_amount::TokenAmount;
    /// use num_bigint::BigUint;
    ///
    /// // 1500 base units of a 3-decimal token is 1.5 tokens
    /// let amount = TokenAmount::from_base_units(BigUint::from(1500u32), 3);
    /// assert_eq!(amount.to_string(), "1.5");
    /// ```
    pub fn from_base_units(units: BigUint, decimals: u8) -> Self {
        Self::normalized(units, decimals as u32)
    }

    fn normalized(mut digits: BigUint, mut scale: u32) -> Self {
        let ten = BigUint::from(10u8);
        while scale > 0 && !digits.is_zero() && (&digits % &ten).is_zero() {
            digits /= &ten;
            scale -= 1;
        }
        if digits.is_zero() {
            scale = 0;
        }
        Self { digits, scale }
    }

    pub fn is_zero(&self) -> bool {
        self.digits.is_zero()
    }

    /// Converts to an integer amount of base units, scaled by `decimals`.
    ///
    /// This is exact. An amount with more fractional digits than `decimals` is an
    /// error rather than being rounded.
    ///
    /// # Examples
    /// ```
    /// use api::token_amount::TokenAmount;
    /// use num_bigint::BigUint;
    ///
    /// let ten: TokenAmount = "10".parse().unwrap();
    /// let expected = BigUint::from(10u32) * BigUint::from(10u32).pow(18);
    /// assert_eq!(ten.to_base_units(18).unwrap(), expected);
    /// ```
    pub fn to_base_units(&self, decimals: u8) -> Result<BigUint, ConversionError> {
        let decimals_u32 = decimals as u32;
        if self.scale > decimals_u32 {
            return Err(ConversionError::TooManyDecimals {
                scale: self.scale,
                decimals,
            });
        }
        let multiplier = BigUint::from(10u8).pow(decimals_u32 - self.scale);
        Ok(&self.digits * multiplier)
    }
}

impl FromStr for TokenAmount {
    type Err = ParseTokenAmountError;

    /// Parses a plain decimal such as `"10"`, `"0.25"`, `".5"` or `"3."`.
    ///
    /// Signs, exponents, separators and surrounding whitespace are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('.');
        let whole_str = parts.next().unwrap_or("");
        let frac_str = parts.next().unwrap_or("");

        if parts.next().is_some() || (whole_str.is_empty() && frac_str.is_empty()) {
            return Err(ParseTokenAmountError::InvalidFormat);
        }

        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(whole_str) || !all_digits(frac_str) {
            return Err(ParseTokenAmountError::InvalidFormat);
        }

        let combined = format!("{whole_str}{frac_str}");
        let digits = BigUint::parse_bytes(combined.as_bytes(), 10)
            .ok_or(ParseTokenAmountError::InvalidFormat)?;
        let scale =
            u32::try_from(frac_str.len()).map_err(|_| ParseTokenAmountError::InvalidFormat)?;

        Ok(Self::normalized(digits, scale))
    }
}

/// Formats the amount as a plain decimal string with no trailing fractional zeros.
impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scale == 0 {
            return write!(f, "{}", self.digits);
        }

        let divisor = BigUint::from(10u8).pow(self.scale);
        let whole = &self.digits / &divisor;
        let frac = &self.digits % &divisor;

        write!(
            f,
            "{}.{:0>width$}",
            whole,
            frac.to_string(),
            width = self.scale as usize
        )
    }
}
