//! # Durations
//!
//! Parsing of user supplied durations such as `1d12h` or `10m-30s`.

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeParseError {
    #[error("Invalid character encountered during time parsing.")]
    InvalidCharacter(char),
    #[error("Invalid number encountered during time parsing: {0}")]
    InvalidNumber(String),
    #[error("Time too short.")]
    TooShort,
    #[error("Time too long.")]
    TooLong,
}

impl TimeParseError {
    /// Whether the input parsed but fell outside the allowed range.
    pub fn is_out_of_range(&self) -> bool {
        matches!(self, TimeParseError::TooShort | TimeParseError::TooLong)
    }
}

fn unit_seconds(c: char) -> Option<i64> {
    match c.to_ascii_lowercase() {
        'w' => Some(604_800),
        'd' => Some(86_400),
        'h' => Some(3_600),
        'm' => Some(60),
        's' => Some(1),
        _ => None,
    }
}

/// Parses a `NwNdNhNmNs` duration into seconds.
///
/// Amounts may be signed. Digits after the last unit are ignored. When a bound is
/// exceeded the call fails, or clamps to the bound if `error_on_exceeded` is false.
pub fn parse_time(
    duration: &str,
    minimum: Option<i64>,
    maximum: Option<i64>,
    error_on_exceeded: bool,
) -> Result<i64, TimeParseError> {
    let mut total: i64 = 0;
    let mut amount = String::new();

    for c in duration.chars() {
        if let Some(unit) = unit_seconds(c) {
            if !amount.is_empty() {
                let value: i64 = amount
                    .parse()
                    .map_err(|_| TimeParseError::InvalidNumber(amount.clone()))?;
                total = total.saturating_add(value.saturating_mul(unit));
                amount.clear();
            }
        } else if c.is_ascii_digit() || c == '+' || c == '-' {
            amount.push(c);
        } else {
            return Err(TimeParseError::InvalidCharacter(c));
        }
    }

    if let Some(min) = minimum
        && total < min
    {
        if error_on_exceeded {
            return Err(TimeParseError::TooShort);
        }
        total = min;
    }
    if let Some(max) = maximum
        && total > max
    {
        if error_on_exceeded {
            return Err(TimeParseError::TooLong);
        }
        total = max;
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_combined_units() {
        assert_eq!(parse_time("1h30m", None, None, true), Ok(5_400));
        assert_eq!(parse_time("1w1d", None, None, true), Ok(691_200));
        assert_eq!(parse_time("2M30S", None, None, true), Ok(150));
    }

    #[test]
    fn test_parse_negative_amounts() {
        assert_eq!(parse_time("10m-30s", None, None, true), Ok(570));
        assert_eq!(parse_time("-5s", None, None, true), Ok(-5));
    }

    #[test]
    fn test_trailing_digits_are_ignored() {
        assert_eq!(parse_time("1m30", None, None, true), Ok(60));
        assert_eq!(parse_time("", None, None, true), Ok(0));
    }

    #[test]
    fn test_invalid_input() {
        assert_eq!(
            parse_time("1x", None, None, true),
            Err(TimeParseError::InvalidCharacter('x'))
        );
        assert!(matches!(
            parse_time("+h", None, None, true),
            Err(TimeParseError::InvalidNumber(_))
        ));
        assert!(matches!(
            parse_time("1-2m", None, None, true),
            Err(TimeParseError::InvalidNumber(_))
        ));
    }

    #[test]
    fn test_bounds() {
        assert_eq!(parse_time("0s", Some(1), None, true), Err(TimeParseError::TooShort));
        assert_eq!(parse_time("2d", Some(0), Some(86_400), true), Err(TimeParseError::TooLong));
        assert_eq!(parse_time("2d", Some(0), Some(86_400), false), Ok(86_400));
        assert_eq!(parse_time("-1m", Some(0), Some(86_400), false), Ok(0));
        assert!(TimeParseError::TooLong.is_out_of_range());
        assert!(!TimeParseError::InvalidCharacter('x').is_out_of_range());
    }
}
