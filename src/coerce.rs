use crate::models::RawValue;

/// Counts and capacities. Strings parse as floats; anything unusable is 0.
pub fn to_count_or_zero(value: Option<&RawValue>) -> f64 {
    to_float_or_zero(value)
}

/// Cycle times and fuel rate. Same policy as counts.
pub fn to_rate_or_zero(value: Option<&RawValue>) -> f64 {
    to_float_or_zero(value)
}

/// Climb levels and defense ratings, parsed as integers.
pub fn to_level_or_zero(value: Option<&RawValue>) -> f64 {
    let level = match value {
        Some(RawValue::Int(n)) => *n as f64,
        Some(RawValue::Float(x)) => x.trunc(),
        Some(RawValue::Text(s)) => leading_integer(s).map(|n| n as f64).unwrap_or(0.0),
        None => 0.0,
    };
    finite_or_zero(level)
}

fn to_float_or_zero(value: Option<&RawValue>) -> f64 {
    let number = match value {
        Some(RawValue::Int(n)) => *n as f64,
        Some(RawValue::Float(x)) => *x,
        Some(RawValue::Text(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
        None => 0.0,
    };
    finite_or_zero(number)
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

// "3 (high rung)" -> 3, "-1" -> -1, "2.9" -> 2, "high" -> None
fn leading_integer(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let digits = &digits[..end];
    if digits.is_empty() {
        return None;
    }
    // Only overflow can fail here; saturate instead of dropping to zero.
    Some(match digits.parse::<i64>() {
        Ok(n) => sign * n,
        Err(_) if sign < 0 => i64::MIN,
        Err(_) => i64::MAX,
    })
}
