/// Codec for PBS duration attribute values, eg "01:30:00", "90".
///
/// The input is `[HH:][MM:]SS` with fields right-aligned to seconds, or a
/// plain digit string counting seconds.  The value is stored as a whole
/// number of seconds; the canonical encoding is `H:MM:SS` regardless of how
/// many fields the input had.  A total outside the i64 range is a format
/// error, never a panic; arithmetic saturates at the ends of the range.

use crate::error::FormatError;

use anyhow::Result;
use std::fmt;
use std::ops;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct DurationValue {
    total_seconds: i64,
}

impl DurationValue {
    pub fn parse(s: &str) -> Result<DurationValue> {
        if s.contains(':') {
            let fields = s.split(':').collect::<Vec<&str>>();
            if fields.len() > 3 {
                return Err(FormatError(format!("Too many fields in duration '{}'", s)).into());
            }
            // Right-align the fields to seconds, minutes, hours.
            let mut total = 0i64;
            for (i, field) in fields.iter().rev().enumerate() {
                let n = field.parse::<i64>().map_err(|_| {
                    FormatError(format!("Non-numeric field '{}' in duration '{}'", field, s))
                })?;
                total = n
                    .checked_mul(60i64.pow(i as u32))
                    .and_then(|v| total.checked_add(v))
                    .ok_or_else(|| FormatError(format!("Duration '{}' out of range", s)))?;
            }
            Ok(DurationValue::from_seconds(total))
        } else if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
            let total = s
                .parse::<i64>()
                .map_err(|_| FormatError(format!("Duration '{}' out of range", s)))?;
            Ok(DurationValue::from_seconds(total))
        } else {
            Err(FormatError(format!("Invalid duration '{}'", s)).into())
        }
    }

    pub fn from_seconds(total_seconds: i64) -> DurationValue {
        DurationValue { total_seconds }
    }

    pub fn total_seconds(&self) -> i64 {
        self.total_seconds
    }
}

/// Canonical `H:MM:SS`, hours unpadded, sign in front for negative totals.

impl fmt::Display for DurationValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let sign = if self.total_seconds < 0 { "-" } else { "" };
        // unsigned_abs: i64::MIN has no i64 absolute value.
        let t = self.total_seconds.unsigned_abs();
        write!(f, "{}{}:{:02}:{:02}", sign, t / 3600, (t % 3600) / 60, t % 60)
    }
}

impl ops::Add for DurationValue {
    type Output = DurationValue;
    fn add(self, rhs: DurationValue) -> DurationValue {
        DurationValue {
            total_seconds: self.total_seconds.saturating_add(rhs.total_seconds),
        }
    }
}

impl ops::Sub for DurationValue {
    type Output = DurationValue;
    fn sub(self, rhs: DurationValue) -> DurationValue {
        DurationValue {
            total_seconds: self.total_seconds.saturating_sub(rhs.total_seconds),
        }
    }
}

#[test]
fn test_duration_parse() {
    assert!(DurationValue::parse("01:30:00").unwrap().total_seconds() == 5400);
    assert!(DurationValue::parse("90").unwrap().total_seconds() == 90);
    assert!(DurationValue::parse("30:00").unwrap().total_seconds() == 1800);
    assert!(DurationValue::parse("0:0:5").unwrap().total_seconds() == 5);
}

#[test]
fn test_duration_parse_errors() {
    assert!(DurationValue::parse("1:2:3:4").is_err());
    assert!(DurationValue::parse("1:xx:00").is_err());
    assert!(DurationValue::parse("ninety").is_err());
    assert!(DurationValue::parse("").is_err());
    assert!(DurationValue::parse("-90").is_err());
}

// Any i64 total is representable, and totals beyond i64 are errors, not
// panics.

#[test]
fn test_duration_range() {
    assert!(
        DurationValue::parse("9300000000000000").unwrap().total_seconds() == 9300000000000000
    );
    assert!(DurationValue::parse("99999999999999999999").is_err());
    assert!(DurationValue::parse("9223372036854775807:00:00").is_err());

    let big = DurationValue::from_seconds(i64::MAX);
    assert!((big + big).total_seconds() == i64::MAX);
    assert!(format!("{}", DurationValue::from_seconds(i64::MIN)).starts_with('-'));
}

#[test]
fn test_duration_encode() {
    assert!(format!("{}", DurationValue::parse("01:30:00").unwrap()) == "1:30:00");
    assert!(format!("{}", DurationValue::parse("90").unwrap()) == "0:01:30");
    assert!(format!("{}", DurationValue::from_seconds(-90)) == "-0:01:30");
    assert!(format!("{}", DurationValue::from_seconds(100 * 3600)) == "100:00:00");
}

#[test]
fn test_duration_arith() {
    let a = DurationValue::parse("30:00").unwrap();
    let b = DurationValue::parse("01:00:00").unwrap();
    assert!((a + a).total_seconds() == b.total_seconds());
    assert!((b - a) == a);
    assert!((a - b).total_seconds() == -1800);
    assert!(a < b);
}
