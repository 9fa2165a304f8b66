/// Codec for PBS size attribute values, eg "1048576kb", "4gb", "512b".
///
/// A size is stored canonically as a kibibyte magnitude.  The unit seen in
/// the input is kept for provenance only; it never affects comparisons or
/// arithmetic.  The multiplier table is powers of 1024 in both directions
/// (parse and encode), see DESIGN.md for the rationale.
///
/// Arithmetic returns new values rather than mutating in place.  A plain
/// integer operand is interpreted as a kibibyte count.

use crate::error::{FormatError, UnitError};

use anyhow::Result;
use std::cmp::Ordering;
use std::fmt;
use std::ops;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SizeUnit {
    B,
    Kb,
    Mb,
    Gb,
    Tb,
    Pb,
}

// Largest first, for encode().
const UNITS_DESC: [SizeUnit; 6] = [
    SizeUnit::Pb,
    SizeUnit::Tb,
    SizeUnit::Gb,
    SizeUnit::Mb,
    SizeUnit::Kb,
    SizeUnit::B,
];

impl SizeUnit {
    fn from_suffix(s: &str) -> Option<SizeUnit> {
        match s {
            "kb" => Some(SizeUnit::Kb),
            "mb" => Some(SizeUnit::Mb),
            "gb" => Some(SizeUnit::Gb),
            "tb" => Some(SizeUnit::Tb),
            "pb" => Some(SizeUnit::Pb),
            _ => None,
        }
    }

    fn bytes(self) -> u64 {
        match self {
            SizeUnit::B => 1,
            SizeUnit::Kb => 1 << 10,
            SizeUnit::Mb => 1 << 20,
            SizeUnit::Gb => 1 << 30,
            SizeUnit::Tb => 1 << 40,
            SizeUnit::Pb => 1 << 50,
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            SizeUnit::B => "b",
            SizeUnit::Kb => "kb",
            SizeUnit::Mb => "mb",
            SizeUnit::Gb => "gb",
            SizeUnit::Tb => "tb",
            SizeUnit::Pb => "pb",
        }
    }
}

#[derive(Debug, Copy, Clone)]
pub struct SizeValue {
    magnitude_kb: u64,
    unit: SizeUnit,
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

impl SizeValue {
    /// Parse a size string.  A bare byte count ("2048b") is floored to whole
    /// kibibytes; otherwise the last two characters must name a unit from kb
    /// up to pb, case-insensitively.

    pub fn parse(s: &str) -> Result<SizeValue> {
        if !s.is_ascii() || s.len() < 2 {
            return Err(FormatError(format!("Invalid size '{}'", s)).into());
        }
        let (prefix, last) = s.split_at(s.len() - 1);
        if (last == "b" || last == "B") && is_digits(prefix) {
            let bytes = prefix
                .parse::<u64>()
                .map_err(|_| FormatError(format!("Size '{}' out of range", s)))?;
            return Ok(SizeValue {
                magnitude_kb: bytes / 1024,
                unit: SizeUnit::B,
            });
        }
        let (prefix, suffix) = s.split_at(s.len() - 2);
        let unit = match SizeUnit::from_suffix(&suffix.to_ascii_lowercase()) {
            Some(u) => u,
            None => return Err(UnitError(format!("Bad unit in size '{}'", s)).into()),
        };
        if !is_digits(prefix) {
            return Err(FormatError(format!("Non-numeric magnitude in size '{}'", s)).into());
        }
        let magnitude = prefix
            .parse::<u64>()
            .map_err(|_| FormatError(format!("Size '{}' out of range", s)))?;
        let magnitude_kb = magnitude
            .checked_mul(unit.bytes() / 1024)
            .ok_or_else(|| FormatError(format!("Size '{}' out of range", s)))?;
        Ok(SizeValue { magnitude_kb, unit })
    }

    pub fn from_kb(magnitude_kb: u64) -> SizeValue {
        SizeValue {
            magnitude_kb,
            unit: SizeUnit::Kb,
        }
    }

    pub fn magnitude_kb(&self) -> u64 {
        self.magnitude_kb
    }

    /// The unit seen in the input, provenance only.

    pub fn unit(&self) -> SizeUnit {
        self.unit
    }

    /// Human-oriented encoding: scale to bytes, then use the largest unit in
    /// which the magnitude is at least 1.

    pub fn encode(&self, precision: usize) -> String {
        // Scale in floating point; a u64 multiply can overflow here.
        let bytes = self.magnitude_kb as f64 * 1024.0;
        for u in UNITS_DESC {
            if bytes >= u.bytes() as f64 {
                return format!("{:.*}{}", precision, bytes / u.bytes() as f64, u.suffix());
            }
        }
        format!("{:.*}b", precision, bytes)
    }

    /// Encode in a specific unit.

    pub fn encode_in(&self, unit: SizeUnit, precision: usize) -> String {
        let bytes = self.magnitude_kb as f64 * 1024.0;
        format!("{:.*}{}", precision, bytes / unit.bytes() as f64, unit.suffix())
    }
}

/// The `Display` form is the exact kibibyte count, which is always accepted
/// on the wire and loses nothing to float formatting.

impl fmt::Display for SizeValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}kb", self.magnitude_kb)
    }
}

impl PartialEq for SizeValue {
    fn eq(&self, other: &SizeValue) -> bool {
        self.magnitude_kb == other.magnitude_kb
    }
}

impl Eq for SizeValue {}

impl PartialOrd for SizeValue {
    fn partial_cmp(&self, other: &SizeValue) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SizeValue {
    fn cmp(&self, other: &SizeValue) -> Ordering {
        self.magnitude_kb.cmp(&other.magnitude_kb)
    }
}

// Arithmetic saturates at the ends of the u64 range rather than wrapping;
// magnitudes are unsigned, so in particular subtraction saturates at zero.

impl ops::Add for SizeValue {
    type Output = SizeValue;
    fn add(self, rhs: SizeValue) -> SizeValue {
        SizeValue {
            magnitude_kb: self.magnitude_kb.saturating_add(rhs.magnitude_kb),
            unit: self.unit,
        }
    }
}

impl ops::Add<u64> for SizeValue {
    type Output = SizeValue;
    fn add(self, rhs: u64) -> SizeValue {
        SizeValue {
            magnitude_kb: self.magnitude_kb.saturating_add(rhs),
            unit: self.unit,
        }
    }
}

impl ops::Sub for SizeValue {
    type Output = SizeValue;
    fn sub(self, rhs: SizeValue) -> SizeValue {
        SizeValue {
            magnitude_kb: self.magnitude_kb.saturating_sub(rhs.magnitude_kb),
            unit: self.unit,
        }
    }
}

impl ops::Sub<u64> for SizeValue {
    type Output = SizeValue;
    fn sub(self, rhs: u64) -> SizeValue {
        SizeValue {
            magnitude_kb: self.magnitude_kb.saturating_sub(rhs),
            unit: self.unit,
        }
    }
}

impl ops::Mul<u64> for SizeValue {
    type Output = SizeValue;
    fn mul(self, rhs: u64) -> SizeValue {
        SizeValue {
            magnitude_kb: self.magnitude_kb.saturating_mul(rhs),
            unit: self.unit,
        }
    }
}

/// Dividing two sizes gives a dimensionless ratio.

impl ops::Div for SizeValue {
    type Output = f64;
    fn div(self, rhs: SizeValue) -> f64 {
        self.magnitude_kb as f64 / rhs.magnitude_kb as f64
    }
}

#[test]
fn test_size_parse() {
    assert!(SizeValue::parse("1048576kb").unwrap().magnitude_kb() == 1048576);
    assert!(SizeValue::parse("4gb").unwrap().magnitude_kb() == 4 * 1024 * 1024);
    assert!(SizeValue::parse("1PB").unwrap().magnitude_kb() == 1 << 40);
    assert!(SizeValue::parse("10MB").unwrap().magnitude_kb() == 10240);

    // A bare byte count is floored to whole kb.
    assert!(SizeValue::parse("2048b").unwrap().magnitude_kb() == 2);
    assert!(SizeValue::parse("100b").unwrap().magnitude_kb() == 0);
    assert!(SizeValue::parse("100B").unwrap().magnitude_kb() == 0);
}

#[test]
fn test_size_parse_errors() {
    // Too short
    assert!(SizeValue::parse("1").is_err());
    assert!(SizeValue::parse("").is_err());

    // Unknown unit suffix
    let e = SizeValue::parse("10zb").unwrap_err();
    assert!(e.downcast_ref::<crate::error::UnitError>().is_some());
    assert!(SizeValue::parse("12").is_err());

    // Non-numeric magnitude with a good unit
    let e = SizeValue::parse("1.5gb").unwrap_err();
    assert!(e.downcast_ref::<crate::error::FormatError>().is_some());
    assert!(SizeValue::parse("kb").is_err());
    assert!(SizeValue::parse("-4gb").is_err());
}

#[test]
fn test_size_encode() {
    assert!(SizeValue::parse("1048576kb").unwrap().encode(1) == "1.0gb");
    assert!(SizeValue::parse("10mb").unwrap().encode(1) == "10.0mb");
    assert!(SizeValue::parse("1536kb").unwrap().encode(1) == "1.5mb");
    assert!(SizeValue::from_kb(0).encode(1) == "0.0b");

    // Directed-unit encoding round-trips the magnitude.
    let v = SizeValue::parse("10mb").unwrap();
    let r = SizeValue::parse(&v.encode_in(SizeUnit::Mb, 0)).unwrap();
    assert!(r.magnitude_kb() == v.magnitude_kb());

    // The Display form is the exact kb count and parses back equal.
    assert!(format!("{}", v) == "10240kb");
    assert!(SizeValue::parse(&format!("{}", v)).unwrap() == v);
}

// Magnitudes near or beyond the u64 range must surface as errors or
// saturate, never panic or wrap.

#[test]
fn test_size_overflow() {
    let e = SizeValue::parse("99999999999pb").unwrap_err();
    assert!(e.downcast_ref::<crate::error::FormatError>().is_some());
    let e = SizeValue::parse("18446744073709551616kb").unwrap_err();
    assert!(e.downcast_ref::<crate::error::FormatError>().is_some());

    let big = SizeValue::from_kb(u64::MAX);
    assert!(big.encode(1).ends_with("pb"));
    assert!((big + big).magnitude_kb() == u64::MAX);
    assert!((big + 1).magnitude_kb() == u64::MAX);
    assert!((big * 2).magnitude_kb() == u64::MAX);
}

#[test]
fn test_size_arith() {
    let a = SizeValue::parse("1mb").unwrap();
    let b = SizeValue::parse("2mb").unwrap();
    assert!(a + a == b);
    assert!(b - a == a);
    assert!(a * 2 == b);
    assert!(a + 1024 == b);
    assert!((a - a).magnitude_kb() == 0);
    assert!((a - b).magnitude_kb() == 0); // saturates
    assert!(b / a == 2.0);
    assert!(a < b && b > a && a == a);
}
