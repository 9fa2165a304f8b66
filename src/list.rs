/// Generic separator-based list and key/value-list codecs, and their two
/// fixed-separator specializations:
///
///  - license counts, eg "Avail_Global:95 Avail_Local:95 Used:5 High_Use:10"
///    (space-separated, ':' between key and value)
///  - variable lists, eg "PBS_O_HOME=/home/u,PBS_O_WORKDIR=/scratch"
///    (comma-separated, '=' between key and value)
///
/// Insertion order is preserved so that re-encoding reproduces the order the
/// external system sent.

use crate::error::FormatError;

use anyhow::Result;
use itertools::Itertools;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelimitedList {
    sep: char,
    tokens: Vec<String>,
}

impl DelimitedList {
    pub fn parse(s: &str, sep: char) -> DelimitedList {
        DelimitedList {
            sep,
            tokens: s.split(sep).map(|t| t.to_string()).collect(),
        }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }
}

impl fmt::Display for DelimitedList {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.tokens.iter().join(&self.sep.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValueList {
    sep: char,
    kvsep: char,
    items: Vec<(String, String)>,
}

impl KeyValueList {
    /// Split on `sep`, then each token on `kvsep`.  A token that does not
    /// split into exactly a key and a value is an error.

    pub fn parse(s: &str, sep: char, kvsep: char) -> Result<KeyValueList> {
        let mut items = vec![];
        for token in s.split(sep) {
            let parts = token.split(kvsep).collect::<Vec<&str>>();
            if parts.len() != 2 {
                return Err(FormatError(format!(
                    "Expected 'key{}value' but got '{}'",
                    kvsep, token
                ))
                .into());
            }
            items.push((parts[0].to_string(), parts[1].to_string()));
        }
        Ok(KeyValueList { sep, kvsep, items })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.items
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Overwrite an existing key in place (keeping its position) or append a
    /// new one at the end.

    pub fn set(&mut self, key: &str, value: &str) {
        if let Some((_, v)) = self.items.iter_mut().find(|(k, _)| k == key) {
            *v = value.to_string();
        } else {
            self.items.push((key.to_string(), value.to_string()));
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.items.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl fmt::Display for KeyValueList {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = self
            .items
            .iter()
            .map(|(k, v)| format!("{}{}{}", k, self.kvsep, v))
            .join(&self.sep.to_string());
        write!(f, "{}", s)
    }
}

/// License-count attribute: space-separated "name:count" pairs.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicenseCounts(KeyValueList);

impl LicenseCounts {
    pub fn parse(s: &str) -> Result<LicenseCounts> {
        Ok(LicenseCounts(KeyValueList::parse(s, ' ', ':')?))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key)
    }

    /// The counts are numeric on the wire.

    pub fn count(&self, key: &str) -> Result<i64> {
        let v = self
            .0
            .get(key)
            .ok_or_else(|| FormatError(format!("No license count '{}'", key)))?;
        v.parse::<i64>()
            .map_err(|_| FormatError(format!("Non-numeric license count '{}'", v)).into())
    }
}

impl fmt::Display for LicenseCounts {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Variable-list attribute: comma-separated "name=value" pairs.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableList(KeyValueList);

impl VariableList {
    pub fn parse(s: &str) -> Result<VariableList> {
        Ok(VariableList(KeyValueList::parse(s, ',', '=')?))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key)
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.0.set(key, value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter()
    }
}

impl fmt::Display for VariableList {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[test]
fn test_delimited_list() {
    let l = DelimitedList::parse("a,b,,c", ',');
    assert!(l.tokens().to_vec() == ["a", "b", "", "c"]);
    assert!(format!("{}", l) == "a,b,,c");
}

#[test]
fn test_keyvalue_list() {
    let mut l = KeyValueList::parse("a=1,b=2,c=x", ',', '=').unwrap();
    assert!(l.len() == 3);
    assert!(l.get("b") == Some("2"));
    assert!(l.get("z") == None);
    assert!(format!("{}", l) == "a=1,b=2,c=x");

    // set() keeps the position of an existing key and appends new ones.
    l.set("b", "9");
    l.set("d", "4");
    assert!(format!("{}", l) == "a=1,b=9,c=x,d=4");

    // A token with zero or more than one kvsep is malformed.
    assert!(KeyValueList::parse("a=1,b", ',', '=').is_err());
    assert!(KeyValueList::parse("a=1=2", ',', '=').is_err());
}

#[test]
fn test_license_counts() {
    let l = LicenseCounts::parse("Avail_Global:95 Avail_Local:95 Used:5 High_Use:10").unwrap();
    assert!(l.count("Used").unwrap() == 5);
    assert!(l.get("Avail_Global") == Some("95"));
    assert!(l.count("Nope").is_err());
    assert!(
        format!("{}", l) == "Avail_Global:95 Avail_Local:95 Used:5 High_Use:10"
    );
}

#[test]
fn test_variable_list() {
    let mut v = VariableList::parse("PBS_O_HOME=/home/u,PBS_O_LANG=en_US").unwrap();
    assert!(v.get("PBS_O_LANG") == Some("en_US"));
    v.set("PBS_O_LANG", "C");
    assert!(format!("{}", v) == "PBS_O_HOME=/home/u,PBS_O_LANG=C");

    // Values with their own '=' do not round-trip through this grammar.
    assert!(VariableList::parse("A=x=y").is_err());
}
