//! Fixed-point amount conversion.
//!
//! On-chain amounts are integers scaled by `10^decimals`; the UI works with
//! human-decimal strings. Conversion goes through alloy's unit parser so
//! rounding and overflow behave exactly like the contract tooling.

use alloy_primitives::U256;
use alloy_primitives::utils::{ParseUnits, Unit};

use crate::error::WalletError;

fn unit(decimals: u8) -> Result<Unit, WalletError> {
    Unit::new(decimals)
        .ok_or_else(|| WalletError::InvalidAmount(format!("unsupported decimal count {decimals}")))
}

/// Convert a human-decimal string (`"100.5"`) into its fixed-point integer.
///
/// Negative amounts and amounts with more fractional digits than `decimals`
/// are rejected.
pub fn parse_amount(amount: &str, decimals: u8) -> Result<U256, WalletError> {
    let trimmed = amount.trim();
    if trimmed.is_empty() {
        return Err(WalletError::MissingParameter("amount"));
    }
    // The parser truncates excess precision; refuse it instead.
    if let Some((_, fraction)) = trimmed.split_once('.')
        && fraction.len() > usize::from(decimals)
    {
        return Err(WalletError::InvalidAmount(format!(
            "{trimmed} has more than {decimals} decimal places"
        )));
    }

    match ParseUnits::parse_units(trimmed, unit(decimals)?) {
        Ok(ParseUnits::U256(value)) => Ok(value),
        Ok(ParseUnits::I256(_)) => Err(WalletError::InvalidAmount(format!(
            "{trimmed} is negative"
        ))),
        Err(e) => Err(WalletError::InvalidAmount(format!("{trimmed}: {e}"))),
    }
}

/// Convert a fixed-point integer back into a human-decimal string.
///
/// Trailing fractional zeros are trimmed, keeping at least one digit after
/// the separator (`100.5`, `100.0`).
pub fn format_amount(value: U256, decimals: u8) -> String {
    let Ok(unit) = unit(decimals) else {
        return value.to_string();
    };

    let formatted = ParseUnits::U256(value).format_units(unit);
    match formatted.split_once('.') {
        Some((whole, fraction)) => {
            let fraction = fraction.trim_end_matches('0');
            if fraction.is_empty() {
                format!("{whole}.0")
            } else {
                format!("{whole}.{fraction}")
            }
        }
        None => formatted,
    }
}
