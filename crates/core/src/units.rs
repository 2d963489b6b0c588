//! Conversions between integer token amounts and decimal display strings.

use primitive_types::U256;

use crate::errors::CoreError;

/// `10^decimals`, i.e. one whole unit of a token with the given precision.
/// `None` when it does not fit in 256 bits.
pub fn one_unit(decimals: u8) -> Option<U256> {
    U256::from(10u8).checked_pow(U256::from(decimals))
}

/// Render an integer amount as a decimal string with `decimals` fraction digits.
///
/// Trailing fraction zeros are dropped, and so is the dot when nothing is
/// left after it: `1500000` with 6 decimals is `"1.5"`, zero is `"0"`.
pub fn format_units(value: U256, decimals: u8) -> String {
    let digits = value.to_string();
    let scale = decimals as usize;
    if scale == 0 {
        return digits;
    }

    let padded = if digits.len() <= scale {
        format!("{}{digits}", "0".repeat(scale - digits.len() + 1))
    } else {
        digits
    };
    let (whole, fraction) = padded.split_at(padded.len() - scale);
    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
        whole.to_string()
    } else {
        format!("{whole}.{fraction}")
    }
}

/// Lossy conversion used for chart values.
pub fn to_f64(value: U256, decimals: u8) -> f64 {
    format_units(value, decimals).parse().unwrap_or(0.0)
}

/// Parse a user-entered decimal string into an integer amount.
///
/// Rejects empty, signed, non-numeric input and input with more fraction
/// digits than the token supports.
pub fn parse_units(text: &str, decimals: u8) -> Result<U256, CoreError> {
    let invalid = |reason: &str| CoreError::InvalidAmount {
        input: text.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(invalid("amount is empty"));
    }
    if trimmed.starts_with('-') || trimmed.starts_with('+') {
        return Err(invalid("amount must be unsigned"));
    }

    let (whole, fraction) = match trimmed.split_once('.') {
        Some((w, f)) => (w, f),
        None => (trimmed, ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid("amount has no digits"));
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid("amount must be a decimal number"));
    }
    if fraction.len() > decimals as usize {
        return Err(invalid(&format!("at most {decimals} fraction digits allowed")));
    }

    let combined = format!("{whole}{fraction:0<width$}", width = decimals as usize);
    let combined = combined.trim_start_matches('0');
    if combined.is_empty() {
        return Ok(U256::zero());
    }
    U256::from_dec_str(combined).map_err(|_| invalid("amount is too large"))
}
