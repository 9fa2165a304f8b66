/// Codec for job resource-request strings (the `select` and `schedselect`
/// attributes), eg "2:ncpus=2:mem=4gb+1:ncpus=8".
///
/// Grammar:
///
///   select    ::= chunkspec ('+' chunkspec)*
///   chunkspec ::= mult (':' key '=' value)*
///
/// Parsing keeps three views of the request:
///
///  - the canonical string, extended with '+' when chunkspecs are appended;
///  - the flattened chunk-copy list, one entry per unit of multiplicity, all
///    copies of a chunkspec sharing one `Rc<ResourceMap>`;
///  - the aggregate, mapping each resource name to a multiplicity-weighted
///    numeric sum, a single scalar, or the list of conflicting raw values.
///
/// A value under a key containing "mem" is converted to kibibytes through the
/// size codec before the numeric test; if that parse fails the raw string is
/// kept (fail-soft, by contract with the external system).

use crate::error::FormatError;
use crate::resources::ResourceMap;
use crate::size::SizeValue;

use anyhow::Result;
use std::fmt;
use std::rc::Rc;
use ustr::Ustr;

/// Aggregate value for one resource name across all chunkspecs.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AggValue {
    /// Sum of mult * value over chunkspecs with a numeric value for this key.
    Numeric(i64),
    /// A non-numeric value on which all chunkspecs agree.
    Scalar(String),
    /// Disagreeing raw values in encounter order; duplicates possible, since
    /// a value is appended whenever the entry is already a conflict.  When a
    /// Numeric entry meets a non-numeric value, the list opens with the
    /// string form of the multiplicity-weighted running sum, which is not
    /// itself a value that appeared on the wire.
    Conflict(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct SelectSpec {
    text: String,
    chunks: Vec<Rc<ResourceMap>>,
    aggregate: Vec<(Ustr, AggValue)>,
    num_chunks: u64,
}

impl SelectSpec {
    pub fn parse(s: &str) -> Result<SelectSpec> {
        let mut sel = SelectSpec {
            text: s.to_string(),
            chunks: vec![],
            aggregate: vec![],
            num_chunks: 0,
        };
        sel.ingest(s)?;
        Ok(sel)
    }

    /// Append one or more chunkspecs to the request.  The new chunkspecs run
    /// through the same parse/aggregate step and the canonical string is
    /// extended with '+'.

    pub fn append(&mut self, chunkspec: &str) -> Result<()> {
        self.ingest(chunkspec)?;
        self.text.push('+');
        self.text.push_str(chunkspec);
        Ok(())
    }

    fn ingest(&mut self, s: &str) -> Result<()> {
        for chunkspec in s.split('+') {
            let mut fields = chunkspec.split(':');
            let multstr = fields.next().unwrap_or("");
            let mult = multstr.parse::<u64>().map_err(|_| {
                FormatError(format!(
                    "Non-numeric chunk multiplicity '{}' in select '{}'",
                    multstr, s
                ))
            })?;
            let mut resources = ResourceMap::new();
            for field in fields {
                // Only the first '=' separates key from value.
                let (key, value) = field.split_once('=').ok_or_else(|| {
                    FormatError(format!("Expected 'key=value' but got '{}'", field))
                })?;
                resources.insert(Ustr::from(key), value.to_string());
                self.accumulate(key, value, mult);
            }
            self.num_chunks += mult;
            let shared = Rc::new(resources);
            for _ in 0..mult {
                self.chunks.push(Rc::clone(&shared));
            }
        }
        Ok(())
    }

    fn accumulate(&mut self, key: &str, raw: &str, mult: u64) {
        let numeric = if key.contains("mem") {
            match SizeValue::parse(raw) {
                Ok(sz) => Some(sz.magnitude_kb() as i64),
                // Fail-soft: a mem value that is not a size falls through to
                // the ordinary numeric-or-scalar treatment of its raw string.
                Err(_) => raw.parse::<i64>().ok(),
            }
        } else {
            raw.parse::<i64>().ok()
        };
        let key = Ustr::from(key);
        match self.aggregate.iter_mut().find(|(k, _)| *k == key) {
            None => {
                let v = match numeric {
                    Some(n) => AggValue::Numeric(mult as i64 * n),
                    None => AggValue::Scalar(raw.to_string()),
                };
                self.aggregate.push((key, v));
            }
            Some((_, v)) => {
                let agree = match (&mut *v, numeric) {
                    (AggValue::Numeric(t), Some(n)) => {
                        *t += mult as i64 * n;
                        true
                    }
                    (AggValue::Conflict(vals), _) => {
                        vals.push(raw.to_string());
                        true
                    }
                    (AggValue::Scalar(s), _) => s.as_str() == raw,
                    _ => false,
                };
                if !agree {
                    let first = match v {
                        AggValue::Numeric(n) => n.to_string(),
                        AggValue::Scalar(s) => std::mem::take(s),
                        AggValue::Conflict(_) => unreachable!(),
                    };
                    *v = AggValue::Conflict(vec![first, raw.to_string()]);
                }
            }
        }
    }

    /// Total chunk count, ie the sum of the multiplicities.

    pub fn num_chunks(&self) -> u64 {
        self.num_chunks
    }

    /// The flattened chunk-copy list.  Copies originating from one chunkspec
    /// share the same map.

    pub fn chunks(&self) -> &[Rc<ResourceMap>] {
        &self.chunks
    }

    pub fn aggregate(&self, name: &str) -> Option<&AggValue> {
        self.aggregate
            .iter()
            .find(|(k, _)| k.as_str() == name)
            .map(|(_, v)| v)
    }
}

impl fmt::Display for SelectSpec {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

#[test]
fn test_select_aggregate_numeric() {
    let s = SelectSpec::parse("2:ncpus=2:mem=4gb").unwrap();
    assert!(s.num_chunks() == 2);
    assert!(s.aggregate("ncpus") == Some(&AggValue::Numeric(4)));
    // mem is size-converted to kb before weighting: 2 * 4gb.
    assert!(s.aggregate("mem") == Some(&AggValue::Numeric(2 * 4 * 1024 * 1024)));
    assert!(s.aggregate("nope") == None);

    let s = SelectSpec::parse("1:ncpus=2+3:ncpus=4").unwrap();
    assert!(s.num_chunks() == 4);
    assert!(s.aggregate("ncpus") == Some(&AggValue::Numeric(14)));
}

#[test]
fn test_select_aggregate_scalar_and_conflict() {
    let s = SelectSpec::parse("1:a=x+1:a=x").unwrap();
    assert!(s.aggregate("a") == Some(&AggValue::Scalar("x".to_string())));

    let s = SelectSpec::parse("1:a=x+1:a=y").unwrap();
    assert!(
        s.aggregate("a")
            == Some(&AggValue::Conflict(vec!["x".to_string(), "y".to_string()]))
    );

    // Once an entry is a conflict every further value is appended, so
    // duplicates are possible.
    let s = SelectSpec::parse("1:a=x+1:a=y+1:a=y").unwrap();
    assert!(
        s.aggregate("a")
            == Some(&AggValue::Conflict(vec![
                "x".to_string(),
                "y".to_string(),
                "y".to_string()
            ]))
    );
}

#[test]
fn test_select_numeric_meets_scalar() {
    // A non-numeric value under a key that has been accumulating numerically
    // demotes the entry to a conflict whose first element is the running sum.
    let s = SelectSpec::parse("2:ncpus=2+1:ncpus=x").unwrap();
    assert!(
        s.aggregate("ncpus")
            == Some(&AggValue::Conflict(vec!["4".to_string(), "x".to_string()]))
    );

    // The reverse order conflicts as well.
    let s = SelectSpec::parse("1:ncpus=x+2:ncpus=2").unwrap();
    assert!(
        s.aggregate("ncpus")
            == Some(&AggValue::Conflict(vec!["x".to_string(), "2".to_string()]))
    );
}

#[test]
fn test_select_mem_failsoft() {
    // A mem value that is neither a size nor a number stays a raw scalar.
    let s = SelectSpec::parse("1:mem=lots").unwrap();
    assert!(s.aggregate("mem") == Some(&AggValue::Scalar("lots".to_string())));

    // A bare-integer mem value is still numeric.
    let s = SelectSpec::parse("2:mem=1024").unwrap();
    assert!(s.aggregate("mem") == Some(&AggValue::Numeric(2048)));
}

#[test]
fn test_select_chunk_copies() {
    let s = SelectSpec::parse("2:ncpus=2+1:ncpus=8").unwrap();
    assert!(s.chunks().len() == 3);
    assert!(s.chunks()[0].get("ncpus") == Some("2"));
    assert!(s.chunks()[2].get("ncpus") == Some("8"));
    // Copies of one chunkspec share the map.
    assert!(Rc::ptr_eq(&s.chunks()[0], &s.chunks()[1]));
    assert!(!Rc::ptr_eq(&s.chunks()[1], &s.chunks()[2]));
}

#[test]
fn test_select_append() {
    let mut s = SelectSpec::parse("2:ncpus=2").unwrap();
    s.append("1:ncpus=8:mem=1mb").unwrap();
    assert!(format!("{}", s) == "2:ncpus=2+1:ncpus=8:mem=1mb");
    assert!(s.num_chunks() == 3);
    assert!(s.aggregate("ncpus") == Some(&AggValue::Numeric(12)));
    assert!(s.chunks().len() == 3);
}

#[test]
fn test_select_parse_errors() {
    // The first field of every chunkspec must be an integer multiplicity.
    assert!(SelectSpec::parse("ncpus=2").is_err());
    assert!(SelectSpec::parse("x:ncpus=2").is_err());
    assert!(SelectSpec::parse("2:ncpus=2+:ncpus=1").is_err());
    // Resource fields must be key=value.
    assert!(SelectSpec::parse("2:ncpus").is_err());
}
