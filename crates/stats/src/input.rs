/// Validation failure for a raw `nums` list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    /// The list was absent or empty.
    Missing,
    /// A token did not form a finite decimal number. Holds the token as sent.
    NotANumber(String),
}

impl std::fmt::Display for InputError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputError::Missing => write!(f, "nums are required."),
            InputError::NotANumber(token) => write!(f, "{token} is not a number."),
        }
    }
}

impl std::error::Error for InputError {}

/// Parses a comma-separated list of numbers, preserving order.
///
/// Tokens are trimmed and must then be complete decimal literals
/// (`-1`, `2.5`, `.5`, `3.`, `1e-3`). Empty tokens, non-finite values and
/// non-decimal forms such as `0x10` are rejected; the first offending token
/// is reported verbatim.
pub fn parse_nums(raw: Option<&str>) -> Result<Vec<f64>, InputError> {
    let raw = match raw {
        Some(s) if !s.is_empty() => s,
        _ => return Err(InputError::Missing),
    };

    raw.split(',')
        .map(|token| parse_number(token).ok_or_else(|| InputError::NotANumber(token.to_string())))
        .collect()
}

/// Parses a single decimal literal, surrounding whitespace allowed.
pub fn parse_number(token: &str) -> Option<f64> {
    let trimmed = token.trim();
    if !is_decimal_literal(trimmed) {
        return None;
    }
    let value = trimmed.parse::<f64>().ok()?;
    value.is_finite().then_some(value)
}

fn is_decimal_literal(s: &str) -> bool {
    let bytes = s.as_bytes();
    let mut i = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        i += 1;
    }

    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let mut mantissa_digits = i - int_start;

    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        let frac_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        mantissa_digits += i - frac_start;
    }

    if mantissa_digits == 0 {
        return false;
    }

    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        i += 1;
        if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
            i += 1;
        }
        let exp_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == exp_start {
            return false;
        }
    }

    i == bytes.len()
}
