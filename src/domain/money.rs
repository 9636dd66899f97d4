use thiserror::Error;

/// Money is represented as integer milli-units to avoid floating-point precision issues.
/// Amounts carry at most 3 fractional digits, so 1 unit = 1000 millis and 50.125 = 50125.
/// Percentages use the same scale: 33.33% = 33330.
pub type Millis = i64;

/// One whole unit (or one whole percent) in millis.
pub const MILLIS_PER_UNIT: Millis = 1_000;

/// 100% in millis.
pub const FULL_PERCENT: Millis = 100 * MILLIS_PER_UNIT;

const MAX_INTEGER_DIGITS: usize = 10;
const MAX_FRACTION_DIGITS: usize = 3;

/// Format millis as a decimal string with three fractional digits.
/// Example: 50125 -> "50.125", -1 -> "-0.001"
pub fn format_millis(millis: Millis) -> String {
    let sign = if millis < 0 { "-" } else { "" };
    let abs = millis.unsigned_abs();
    let units = abs / MILLIS_PER_UNIT as u64;
    let remainder = abs % MILLIS_PER_UNIT as u64;
    format!("{}{}.{:03}", sign, units, remainder)
}

/// Parse a non-negative decimal string into millis.
///
/// The input must have 1 to 10 integer digits, optionally followed by a dot and
/// 1 to 3 fractional digits. Signs, exponents, surrounding whitespace and a bare
/// trailing dot are rejected rather than normalized.
/// Example: "50" -> 50000, "12.5" -> 12500, "0.001" -> 1
pub fn parse_millis(input: &str) -> Result<Millis, ParseMillisError> {
    let (units, fraction) = match input.split_once('.') {
        Some((units, fraction)) => (units, Some(fraction)),
        None => (input, None),
    };

    if !is_digits(units, 1, MAX_INTEGER_DIGITS) {
        return Err(ParseMillisError::InvalidFormat(input.to_string()));
    }

    let fraction_millis = match fraction {
        None => 0,
        Some(fraction) => {
            if !is_digits(fraction, 1, MAX_FRACTION_DIGITS) {
                return Err(ParseMillisError::InvalidFormat(input.to_string()));
            }
            // "5" means 500 millis, "05" means 50
            let padding = MAX_FRACTION_DIGITS - fraction.len();
            let value: Millis = fraction
                .parse()
                .map_err(|_| ParseMillisError::InvalidFormat(input.to_string()))?;
            value * 10_i64.pow(padding as u32)
        }
    };

    let units: Millis = units
        .parse()
        .map_err(|_| ParseMillisError::InvalidFormat(input.to_string()))?;

    Ok(units * MILLIS_PER_UNIT + fraction_millis)
}

fn is_digits(s: &str, min: usize, max: usize) -> bool {
    (min..=max).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_digit())
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseMillisError {
    #[error("invalid amount '{0}': expected up to 10 digits and up to 3 decimal places")]
    InvalidFormat(String),
}
