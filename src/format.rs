use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};

/// Render a floating point amount without binary float artifacts.
///
/// - The shortest round-trip representation of the `f64` is parsed into a
///   `Decimal`, so `90.0` renders as `90` and `0.1 + 0.2` as `0.3` once rounded.
/// - When `decimals` is set the value is rounded (half away from zero).
/// - Trailing zeros are stripped.
pub fn format_amount(value: f64, decimals: Option<u32>) -> String {
    let Ok(decimal) = Decimal::from_str(&value.to_string()) else {
        // NaN, infinities and magnitudes beyond Decimal's range.
        return value.to_string();
    };

    let rounded = match decimals {
        Some(dp) => decimal.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero),
        None => decimal,
    };
    rounded.normalize().to_string()
}

/// Render a confidence interval as `"lower - upper"`.
pub fn format_range(lower: f64, upper: f64, decimals: Option<u32>) -> String {
    format!(
        "{} - {}",
        format_amount(lower, decimals),
        format_amount(upper, decimals)
    )
}
