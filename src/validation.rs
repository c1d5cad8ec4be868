//! Input checks run before any transaction is submitted

use std::str::FromStr;

use alloy_primitives::{Address, U256};

use crate::core::format::format_ether;
use crate::detail::ContractReader;
use crate::error::ValidationError;

/// Parse a `0x` address; mixed-case input must carry a valid EIP-55 checksum
pub fn parse_address(input: &str) -> Result<Address, ValidationError> {
    let trimmed = input.trim();
    let invalid = || ValidationError::InvalidAddress(input.to_string());
    let hex = trimmed.strip_prefix("0x").ok_or_else(invalid)?;

    let has_upper = hex.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = hex.chars().any(|c| c.is_ascii_lowercase());
    if has_upper && has_lower {
        Address::parse_checksummed(trimmed, None).map_err(|_| invalid())
    } else {
        Address::from_str(trimmed).map_err(|_| invalid())
    }
}

/// Parse a decimal amount ("1.5") into base units of a `decimals` token
pub fn parse_amount(input: &str, decimals: u8) -> Result<U256, ValidationError> {
    let value = input.trim();
    let invalid = || ValidationError::InvalidAmount(input.to_string());

    if value.is_empty() || value.starts_with('-') || value.starts_with('+') {
        return Err(invalid());
    }

    let (integer_part, fraction_part) = match value.split_once('.') {
        Some((int, frac)) => (int, frac),
        None => (value, ""),
    };
    if integer_part.is_empty() && fraction_part.is_empty() {
        return Err(invalid());
    }
    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if !all_digits(integer_part) || !all_digits(fraction_part) {
        return Err(invalid());
    }

    // Extra fraction digits are only acceptable when they are zeros
    let fraction = fraction_part.trim_end_matches('0');
    if fraction.len() > decimals as usize {
        return Err(invalid());
    }

    let digits = format!(
        "{}{:0<width$}",
        integer_part,
        fraction,
        width = decimals as usize
    );
    let digits = digits.trim_start_matches('0');
    let amount = if digits.is_empty() {
        U256::ZERO
    } else {
        U256::from_str_radix(digits, 10).map_err(|_| invalid())?
    };

    if amount.is_zero() {
        return Err(ValidationError::ZeroAmount);
    }
    Ok(amount)
}

/// Re-read the account's native balance and reject amounts above it
///
/// The session balance is display-only; this is the check to run right
/// before submitting a value-carrying transaction.
pub async fn ensure_spendable(
    reader: &ContractReader,
    account: Address,
    amount: U256,
) -> Result<U256, ValidationError> {
    let balance = reader
        .native_balance(account)
        .await
        .map_err(ValidationError::BalanceUnavailable)?;
    if amount > balance {
        return Err(ValidationError::InsufficientBalance {
            balance: format_ether(balance),
        });
    }
    Ok(balance)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_address() {
        let addr = parse_address(" 0xabcdef0123456789abcdef0123456789abcdef01 ").unwrap();
        assert_eq!(format!("{:#x}", addr), "0xabcdef0123456789abcdef0123456789abcdef01");
        let upper = parse_address("0xABCDEF0123456789ABCDEF0123456789ABCDEF01").unwrap();
        assert_eq!(upper, addr);
        assert!(parse_address("0x1234").is_err());
        assert!(parse_address("abcdef0123456789abcdef0123456789abcdef01").is_err());
        assert!(parse_address("0xzzcdef0123456789abcdef0123456789abcdef01").is_err());
    }

    #[test]
    fn test_parse_address_checks_mixed_case_checksum() {
        let checksummed = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
        let addr = parse_address(checksummed).unwrap();
        assert_eq!(addr.to_checksum(None), checksummed);

        // Same address with one letter's case flipped
        let typo = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAeD";
        assert_eq!(
            parse_address(typo),
            Err(ValidationError::InvalidAddress(typo.to_string()))
        );
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(
            parse_amount("1.5", 18).unwrap(),
            U256::from(1_500_000_000_000_000_000u128)
        );
        assert_eq!(parse_amount("42", 0).unwrap(), U256::from(42u64));
        assert_eq!(parse_amount(".25", 2).unwrap(), U256::from(25u64));
        assert_eq!(parse_amount("1.500", 1).unwrap(), U256::from(15u64));
    }

    #[test]
    fn test_parse_amount_rejections() {
        assert_eq!(parse_amount("0", 18), Err(ValidationError::ZeroAmount));
        assert_eq!(parse_amount("0.000", 18), Err(ValidationError::ZeroAmount));
        assert!(matches!(parse_amount("-1", 18), Err(ValidationError::InvalidAmount(_))));
        assert!(matches!(parse_amount("1.2.3", 18), Err(ValidationError::InvalidAmount(_))));
        assert!(matches!(parse_amount("0.001", 2), Err(ValidationError::InvalidAmount(_))));
        assert!(matches!(parse_amount("", 18), Err(ValidationError::InvalidAmount(_))));
        assert!(matches!(parse_amount("1e18", 18), Err(ValidationError::InvalidAmount(_))));
    }
}
