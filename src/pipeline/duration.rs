//! Signed duration text.
//!
//! Durations are written as a sequence of decimal numbers, each with an
//! optional fraction and a unit suffix (`ns`, `us`/`µs`, `ms`, `s`, `m`,
//! `h`), optionally preceded by a sign: `1h30m`, `1.5s`, `-48h`.
//! Rendering uses the canonical form: `48h0m0s`, `1m30s`, `300ms`, `0s`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SECOND: u128 = 1_000_000_000;

/// Duration parsing errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DurationError {
    /// The text is not a duration
    #[error("invalid duration {0:?}")]
    Invalid(String),

    /// A number is not followed by a unit
    #[error("missing unit in duration {0:?}")]
    MissingUnit(String),

    /// A unit suffix is not recognized
    #[error("unknown unit {unit:?} in duration {text:?}")]
    UnknownUnit {
        /// Offending unit
        unit: String,
        /// Full duration text
        text: String,
    },

    /// The value does not fit in 64-bit nanoseconds
    #[error("duration {0:?} out of range")]
    Overflow(String),
}

fn unit_nanos(unit: &str) -> Option<i128> {
    let nanos = match unit {
        "ns" => 1,
        "us" | "µs" | "μs" => 1_000,
        "ms" => 1_000_000,
        "s" => 1_000_000_000,
        "m" => 60_000_000_000,
        "h" => 3_600_000_000_000,
        _ => return None,
    };
    Some(nanos)
}

/// Parses signed duration text
///
/// # Errors
///
/// Returns a [`DurationError`] if the text is malformed, uses an unknown
/// unit or overflows 64-bit nanoseconds.
pub fn parse_duration(text: &str) -> Result<chrono::Duration, DurationError> {
    let invalid = || DurationError::Invalid(text.to_string());
    let overflow = || DurationError::Overflow(text.to_string());

    let (negative, mut rest) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    if rest == "0" {
        return Ok(chrono::Duration::zero());
    }
    if rest.is_empty() {
        return Err(invalid());
    }

    let mut total: i128 = 0;
    while !rest.is_empty() {
        let (whole, after) = split_digits(rest);
        let (fraction, after) = match after.strip_prefix('.') {
            Some(tail) => split_digits(tail),
            None => ("", after),
        };
        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }

        let unit_len = after
            .find(|c: char| c == '.' || c.is_ascii_digit())
            .unwrap_or(after.len());
        let (unit, tail) = after.split_at(unit_len);
        if unit.is_empty() {
            return Err(DurationError::MissingUnit(text.to_string()));
        }
        let scale = unit_nanos(unit).ok_or_else(|| DurationError::UnknownUnit {
            unit: unit.to_string(),
            text: text.to_string(),
        })?;

        let whole_value: i128 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| overflow())?
        };
        total = whole_value
            .checked_mul(scale)
            .and_then(|v| v.checked_add(fraction_nanos(fraction, scale)))
            .and_then(|v| total.checked_add(v))
            .ok_or_else(overflow)?;
        rest = tail;
    }

    let signed = if negative { -total } else { total };
    let nanos = i64::try_from(signed).map_err(|_| overflow())?;
    Ok(chrono::Duration::nanoseconds(nanos))
}

fn split_digits(text: &str) -> (&str, &str) {
    let len = text.bytes().take_while(u8::is_ascii_digit).count();
    text.split_at(len)
}

// Digits past 18 cannot contribute a whole nanosecond.
fn fraction_nanos(digits: &str, scale: i128) -> i128 {
    let mut value = 0i128;
    let mut denominator = 1i128;
    for digit in digits.bytes().take(18) {
        value = value * 10 + i128::from(digit - b'0');
        denominator *= 10;
    }
    value * scale / denominator
}

/// Renders a duration in canonical text form
#[must_use]
pub fn format_duration(duration: chrono::Duration) -> String {
    let nanos = i128::from(duration.num_seconds()) * 1_000_000_000
        + i128::from(duration.subsec_nanos());
    let magnitude = format_magnitude(nanos.unsigned_abs());
    if nanos < 0 {
        format!("-{magnitude}")
    } else {
        magnitude
    }
}

fn format_magnitude(nanos: u128) -> String {
    if nanos == 0 {
        return "0s".to_string();
    }
    if nanos < NANOS_PER_SECOND {
        let (scale, unit) = if nanos < NANOS_PER_MICRO {
            (1, "ns")
        } else if nanos < NANOS_PER_MILLI {
            (NANOS_PER_MICRO, "µs")
        } else {
            (NANOS_PER_MILLI, "ms")
        };
        return format!("{}{unit}", with_fraction(nanos, scale));
    }

    let total_seconds = nanos / NANOS_PER_SECOND;
    let seconds = with_fraction(
        total_seconds % 60 * NANOS_PER_SECOND + nanos % NANOS_PER_SECOND,
        NANOS_PER_SECOND,
    );
    let minutes = total_seconds / 60 % 60;
    let hours = total_seconds / 3600;
    if hours > 0 {
        format!("{hours}h{minutes}m{seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m{seconds}s")
    } else {
        format!("{seconds}s")
    }
}

fn with_fraction(value: u128, scale: u128) -> String {
    let whole = value / scale;
    let fraction = value % scale;
    if fraction == 0 {
        return whole.to_string();
    }
    let width = scale.ilog10() as usize;
    let digits = format!("{fraction:0width$}");
    format!("{whole}.{}", digits.trim_end_matches('0'))
}

/// Maximum run time of a task, (de)serialized as duration text
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timeout(pub chrono::Duration);

impl Timeout {
    /// Timeout from whole seconds
    #[must_use]
    pub fn seconds(seconds: i64) -> Self {
        Self(chrono::Duration::seconds(seconds))
    }

    /// Timeout from whole hours
    #[must_use]
    pub fn hours(hours: i64) -> Self {
        Self(chrono::Duration::hours(hours))
    }

    /// Returns true for durations below zero
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.0 < chrono::Duration::zero()
    }

    /// Returns the underlying duration
    #[must_use]
    pub fn as_duration(&self) -> chrono::Duration {
        self.0
    }
}

impl From<chrono::Duration> for Timeout {
    fn from(duration: chrono::Duration) -> Self {
        Self(duration)
    }
}

impl FromStr for Timeout {
    type Err = DurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_duration(s).map(Self)
    }
}

impl fmt::Display for Timeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_duration(self.0))
    }
}

impl Serialize for Timeout {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timeout {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case("0", Duration::zero())]
    #[case("0s", Duration::zero())]
    #[case("-48h", Duration::hours(-48))]
    #[case("+5m", Duration::minutes(5))]
    #[case("1h30m", Duration::minutes(90))]
    #[case("1.5s", Duration::milliseconds(1500))]
    #[case(".5s", Duration::milliseconds(500))]
    #[case("300ms", Duration::milliseconds(300))]
    #[case("2us", Duration::microseconds(2))]
    #[case("2µs", Duration::microseconds(2))]
    #[case("7ns", Duration::nanoseconds(7))]
    #[case("1h1m1s1ms", Duration::milliseconds(3_661_001))]
    fn test_parse(#[case] text: &str, #[case] expected: Duration) {
        assert_eq!(parse_duration(text), Ok(expected));
    }

    #[rstest]
    #[case("")]
    #[case("-")]
    #[case("h")]
    #[case(".s")]
    #[case("1h.m")]
    fn test_parse_invalid(#[case] text: &str) {
        assert_eq!(parse_duration(text), Err(DurationError::Invalid(text.to_string())));
    }

    #[test]
    fn test_parse_unit_errors() {
        assert_eq!(
            parse_duration("10"),
            Err(DurationError::MissingUnit("10".to_string()))
        );
        assert_eq!(
            parse_duration("3d"),
            Err(DurationError::UnknownUnit {
                unit: "d".to_string(),
                text: "3d".to_string()
            })
        );
        assert_eq!(
            parse_duration("9999999999h"),
            Err(DurationError::Overflow("9999999999h".to_string()))
        );
    }

    #[rstest]
    #[case(Duration::zero(), "0s")]
    #[case(Duration::hours(-48), "-48h0m0s")]
    #[case(Duration::hours(1), "1h0m0s")]
    #[case(Duration::seconds(90), "1m30s")]
    #[case(Duration::milliseconds(1500), "1.5s")]
    #[case(Duration::milliseconds(300), "300ms")]
    #[case(Duration::microseconds(1500), "1.5ms")]
    #[case(Duration::nanoseconds(1500), "1.5µs")]
    #[case(Duration::nanoseconds(42), "42ns")]
    #[case(Duration::milliseconds(3_661_001), "1h1m1.001s")]
    fn test_format(#[case] duration: Duration, #[case] expected: &str) {
        assert_eq!(format_duration(duration), expected);
    }

    #[test]
    fn test_timeout_serde() {
        let timeout: Timeout = serde_json::from_str(r#""1h30m""#).unwrap();
        assert_eq!(timeout, Timeout::seconds(5400));
        assert_eq!(serde_json::to_string(&timeout).unwrap(), r#""1h30m0s""#);
        assert!(serde_json::from_str::<Timeout>(r#""soon""#).is_err());
    }

    #[test]
    fn test_timeout_sign() {
        assert!(Timeout::hours(-48).is_negative());
        assert!(!Timeout::seconds(0).is_negative());
        assert_eq!(Timeout::hours(-48).to_string(), "-48h0m0s");
    }

    proptest! {
        #[test]
        fn prop_format_then_parse(nanos in -1_000_000_000_000_000i64..1_000_000_000_000_000) {
            let duration = Duration::nanoseconds(nanos);
            prop_assert_eq!(parse_duration(&format_duration(duration)), Ok(duration));
        }
    }
}
