//! Native token amounts (18 decimals)

use crate::error::UnitsError;
use crate::types::U256;

/// Decimals of the native token
pub const DECIMALS: usize = 18;

fn ten_pow(exp: usize) -> U256 {
    U256::from(10u64).pow(U256::from(exp))
}

/// Parse a decimal string such as `"1.5"` into wei
pub fn parse_native(amount: &str) -> Result<U256, UnitsError> {
    parse_units(amount, DECIMALS)
}

/// Parse a decimal string with `decimals` fractional digits into base units
pub fn parse_units(amount: &str, decimals: usize) -> Result<U256, UnitsError> {
    let amount = amount.trim();
    if amount.is_empty() {
        return Err(UnitsError::Empty);
    }

    let (whole, frac) = match amount.split_once('.') {
        Some((w, f)) => (w, f),
        None => (amount, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(UnitsError::Invalid(amount.to_string()));
    }
    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if !all_digits(whole) || !all_digits(frac) {
        return Err(UnitsError::Invalid(amount.to_string()));
    }

    let frac = frac.trim_end_matches('0');
    if frac.len() > decimals {
        return Err(UnitsError::TooManyDecimals(decimals));
    }

    let whole_value = if whole.is_empty() {
        U256::ZERO
    } else {
        U256::from_str_radix(whole, 10).map_err(|_| UnitsError::Overflow)?
    };
    let frac_value = if frac.is_empty() {
        U256::ZERO
    } else {
        U256::from_str_radix(frac, 10).map_err(|_| UnitsError::Overflow)?
            * ten_pow(decimals - frac.len())
    };

    whole_value
        .checked_mul(ten_pow(decimals))
        .and_then(|w| w.checked_add(frac_value))
        .ok_or(UnitsError::Overflow)
}

/// Format wei as a trimmed decimal string (`1500000000000000000` → `"1.5"`)
pub fn format_native(wei: U256) -> String {
    format_units(wei, DECIMALS)
}

pub fn format_units(value: U256, decimals: usize) -> String {
    let unit = ten_pow(decimals);
    let whole = value / unit;
    let frac = value % unit;
    if frac.is_zero() {
        return whole.to_string();
    }
    let frac = format!("{:0>width$}", frac.to_string(), width = decimals);
    format!("{}.{}", whole, frac.trim_end_matches('0'))
}

/// Lossy conversion for ratio math (ELO, Kelly sizing)
pub fn to_f64(value: U256) -> f64 {
    format_native(value).parse().unwrap_or(f64::MAX)
}

/// Inverse of [`to_f64`], truncated to whole wei
pub fn from_f64(amount: f64) -> U256 {
    if !amount.is_finite() || amount <= 0.0 {
        return U256::ZERO;
    }
    parse_native(&format!("{:.18}", amount)).unwrap_or(U256::ZERO)
}
