use alloy::primitives::U256;
use bigdecimal::num_bigint::{BigInt, Sign};
use bigdecimal::BigDecimal;
use std::str::FromStr;

use crate::error::{PipelineError, PipelineResult};

/// Decimal digits in `U256::MAX`.
const MAX_RAW_DIGITS: i64 = 78;

/// Shift a raw token amount by `decimals` places for display.
pub fn to_display(amount: U256, decimals: u8) -> BigDecimal {
    let digits = BigInt::from_bytes_be(Sign::Plus, &amount.to_be_bytes::<32>());
    BigDecimal::new(digits, i64::from(decimals))
}

/// Parse a user-entered decimal amount into raw token units.
///
/// Digits beyond `decimals` places are dropped, so the result is the floor
/// of `text * 10^decimals`.
pub fn parse_amount(text: &str, decimals: u8) -> PipelineResult<U256> {
    let invalid = |reason: &str| PipelineError::InvalidAmount {
        input: text.to_string(),
        reason: reason.to_string(),
    };

    let value = BigDecimal::from_str(text.trim()).map_err(|_| invalid("not a decimal number"))?;
    let (mantissa, scale) = value.into_bigint_and_exponent();
    match mantissa.sign() {
        Sign::Minus => return Err(invalid("amount must not be negative")),
        Sign::NoSign => return Ok(U256::ZERO),
        Sign::Plus => {}
    }

    // Digits left of the point once scaled to raw units. Checked before
    // rescaling so an extreme exponent never materializes.
    let mantissa_digits = i64::try_from(mantissa.magnitude().to_string().len()).unwrap_or(i64::MAX);
    let raw_digits = mantissa_digits
        .saturating_sub(scale)
        .saturating_add(i64::from(decimals));
    if raw_digits > MAX_RAW_DIGITS {
        return Err(invalid("amount exceeds uint256"));
    }
    if raw_digits <= 0 {
        return Ok(U256::ZERO);
    }

    let (raw, _) = BigDecimal::new(mantissa, scale)
        .with_scale(i64::from(decimals))
        .into_bigint_and_exponent();
    U256::from_str(&raw.to_string()).map_err(|_| invalid("amount exceeds uint256"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_display() {
        let one_and_half = U256::from(1_500_000_000_000_000_000u64);
        assert_eq!(to_display(one_and_half, 18), BigDecimal::from_str("1.5").unwrap());
        assert_eq!(to_display(U256::from(42), 0), BigDecimal::from(42));
        assert_eq!(to_display(U256::ZERO, 18), BigDecimal::from(0));
    }

    #[test]
    fn test_to_display_max_supply() {
        let display = to_display(U256::MAX, 18);
        assert!(display > BigDecimal::from_str("1e59").unwrap());
    }

    #[test]
    fn test_parse_amount_scales_and_floors() {
        assert_eq!(parse_amount("1.5", 2).unwrap(), U256::from(150));
        assert_eq!(parse_amount("1.239", 2).unwrap(), U256::from(123));
        assert_eq!(parse_amount(" 100 ", 18).unwrap(), U256::from(100u64) * U256::from(10u64).pow(U256::from(18)));
        assert_eq!(parse_amount("0.0000001", 6).unwrap(), U256::ZERO);
    }

    #[test]
    fn test_parse_amount_rejects_bad_input() {
        assert!(matches!(
            parse_amount("ten", 18),
            Err(PipelineError::InvalidAmount { .. })
        ));
        assert!(matches!(
            parse_amount("-1", 18),
            Err(PipelineError::InvalidAmount { .. })
        ));
        assert!(parse_amount("1e80", 18).is_err());
    }

    #[test]
    fn test_parse_amount_extreme_exponents_are_cheap() {
        let start = std::time::Instant::now();
        assert!(matches!(
            parse_amount("1e10000000", 18),
            Err(PipelineError::InvalidAmount { .. })
        ));
        assert_eq!(parse_amount("1e-10000000", 18).unwrap(), U256::ZERO);
        assert_eq!(parse_amount("0e10000000", 18).unwrap(), U256::ZERO);
        assert!(start.elapsed() < std::time::Duration::from_secs(1));
    }

    #[test]
    fn test_parse_amount_digit_limit_boundary() {
        // 60 integer digits + 18 decimals = 78 raw digits, still below U256::MAX
        assert!(parse_amount("1e59", 18).is_ok());
        assert!(parse_amount("1e60", 18).is_err());
        assert_eq!(parse_amount("1e-18", 18).unwrap(), U256::from(1));
        assert_eq!(parse_amount("9e-19", 18).unwrap(), U256::ZERO);
    }
}
