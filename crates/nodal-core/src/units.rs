//! Engineering-notation value parsing.

use crate::error::{Error, Result};

/// Parse a numeric token with an optional engineering suffix.
///
/// Trailing single letters scale the mantissa: k=1e3, m=1e-3, u=1e-6, n=1e-9,
/// p=1e-12, g=1e9, h=1e2, t=1e12 (case-insensitive). Without a suffix the
/// token is parsed as a plain double; scientific notation is accepted.
pub fn parse_value(token: &str) -> Result<f64> {
    let token = token.trim();
    if token.is_empty() {
        return Err(Error::InvalidValue(token.to_string()));
    }

    let last = token.chars().next_back().unwrap();
    let scale = match last.to_ascii_lowercase() {
        'k' => Some(1e3),
        'm' => Some(1e-3),
        'u' => Some(1e-6),
        'n' => Some(1e-9),
        'p' => Some(1e-12),
        'g' => Some(1e9),
        'h' => Some(1e2),
        't' => Some(1e12),
        _ => None,
    };

    let parsed = match scale {
        Some(factor) if last.is_ascii() => token[..token.len() - 1]
            .parse::<f64>()
            .map(|mantissa| mantissa * factor),
        _ => token.parse::<f64>(),
    };

    parsed.map_err(|_| Error::InvalidValue(token.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_numbers() {
        assert_eq!(parse_value("10").unwrap(), 10.0);
        assert_eq!(parse_value("-2.5").unwrap(), -2.5);
        assert_eq!(parse_value("1e-6").unwrap(), 1e-6);
        assert_eq!(parse_value("3.3E3").unwrap(), 3300.0);
    }

    #[test]
    fn test_engineering_suffixes() {
        assert_eq!(parse_value("1k").unwrap(), 1e3);
        assert_eq!(parse_value("10m").unwrap(), 10e-3);
        assert_eq!(parse_value("2.2u").unwrap(), 2.2e-6);
        assert_eq!(parse_value("5n").unwrap(), 5e-9);
        assert_eq!(parse_value("100p").unwrap(), 100e-12);
        assert_eq!(parse_value("1g").unwrap(), 1e9);
        assert_eq!(parse_value("1h").unwrap(), 100.0);
        assert_eq!(parse_value("1t").unwrap(), 1e12);
    }

    #[test]
    fn test_suffixes_are_case_insensitive() {
        assert_eq!(parse_value("1K").unwrap(), 1e3);
        assert_eq!(parse_value("4.7U").unwrap(), 4.7e-6);
        assert_eq!(parse_value("1T").unwrap(), 1e12);
    }

    #[test]
    fn test_invalid_tokens() {
        assert!(matches!(parse_value(""), Err(Error::InvalidValue(_))));
        assert!(matches!(parse_value("abc"), Err(Error::InvalidValue(_))));
        assert!(matches!(parse_value("k"), Err(Error::InvalidValue(_))));
        assert!(matches!(parse_value("1.2.3"), Err(Error::InvalidValue(_))));
        assert!(matches!(parse_value("10kk"), Err(Error::InvalidValue(_))));
    }

    #[test]
    fn test_negative_with_suffix() {
        assert_eq!(parse_value("-3m").unwrap(), -3e-3);
    }
}
