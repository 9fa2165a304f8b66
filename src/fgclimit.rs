/// Codec for fine-grained-limit attributes, which arrive as a name/value
/// pair, eg:
///
///   name:  "max_run_res.ncpus"      (limit type, optional dotted resource)
///   value: "[u:PBS_GENERIC=2]"      (entity type, name, and limit value)
///
/// Two independent regexes are applied, one per side.  A non-match is not an
/// error: it leaves the corresponding fields `None`, and callers must
/// null-check.  This leniency is a contract with dependent logic.

use anyhow::Result;
use regex::Regex;
use std::fmt;
use ustr::Ustr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FgcLimit {
    pub limit_type: Option<Ustr>,
    pub resource: Option<Ustr>,
    pub entity_type: Option<Ustr>,
    pub entity_name: Option<Ustr>,
    pub entity_value: Option<i64>,
}

impl FgcLimit {
    pub fn parse(name: &str, value: &str) -> Result<FgcLimit> {
        let name_re = Regex::new(r"^(?P<ltype>[a-z_]+)(?:\.(?P<resource>[\w-]+))?$")?;
        let value_re = Regex::new(r#"\[(?P<etype>[a-z]+):(?P<ename>[\w"'-]+)=(?P<eval>\d+)\]"#)?;

        let mut lim = FgcLimit {
            limit_type: None,
            resource: None,
            entity_type: None,
            entity_name: None,
            entity_value: None,
        };
        if let Some(caps) = name_re.captures(name) {
            lim.limit_type = caps.name("ltype").map(|m| Ustr::from(m.as_str()));
            lim.resource = caps.name("resource").map(|m| Ustr::from(m.as_str()));
        }
        if let Some(caps) = value_re.captures(value) {
            lim.entity_type = caps.name("etype").map(|m| Ustr::from(m.as_str()));
            lim.entity_name = caps.name("ename").map(|m| Ustr::from(m.as_str()));
            // The digits-only pattern can still overflow i64; treat that as
            // a non-match too.
            lim.entity_value = caps.name("eval").and_then(|m| m.as_str().parse::<i64>().ok());
        }
        Ok(lim)
    }

    /// Rebuild the value side, when all of its fields are present.

    pub fn encode_value(&self) -> Option<String> {
        match (self.entity_type, self.entity_name, self.entity_value) {
            (Some(et), Some(en), Some(ev)) => Some(format!("[{}:{}={}]", et, en, ev)),
            _ => None,
        }
    }
}

impl fmt::Display for FgcLimit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.limit_type {
            Some(lt) => write!(f, "{}", lt)?,
            None => {}
        }
        if let Some(r) = &self.resource {
            write!(f, ".{}", r)?;
        }
        if let Some(v) = self.encode_value() {
            write!(f, " = {}", v)?;
        }
        Ok(())
    }
}

#[test]
fn test_fgc_parse() {
    let l = FgcLimit::parse("max_run_res.ncpus", "[u:PBS_GENERIC=2]").unwrap();
    assert!(l.limit_type == Some(Ustr::from("max_run_res")));
    assert!(l.resource == Some(Ustr::from("ncpus")));
    assert!(l.entity_type == Some(Ustr::from("u")));
    assert!(l.entity_name == Some(Ustr::from("PBS_GENERIC")));
    assert!(l.entity_value == Some(2));
    assert!(l.encode_value().unwrap() == "[u:PBS_GENERIC=2]");

    let l = FgcLimit::parse("max_run", "[g:devteam=4]").unwrap();
    assert!(l.limit_type == Some(Ustr::from("max_run")));
    assert!(l.resource == None);
    assert!(l.entity_name == Some(Ustr::from("devteam")));
}

#[test]
fn test_fgc_failsoft() {
    // A name the grammar does not recognize leaves the name-side fields None
    // but still parses the value side.
    let l = FgcLimit::parse("Max-Run", "[u:bob=1]").unwrap();
    assert!(l.limit_type == None);
    assert!(l.resource == None);
    assert!(l.entity_type == Some(Ustr::from("u")));
    assert!(l.entity_value == Some(1));

    // And vice versa.
    let l = FgcLimit::parse("max_queued", "whatever").unwrap();
    assert!(l.limit_type == Some(Ustr::from("max_queued")));
    assert!(l.entity_type == None);
    assert!(l.entity_name == None);
    assert!(l.entity_value == None);
    assert!(l.encode_value() == None);

    // Neither side matching is still not an error.
    let l = FgcLimit::parse("", "").unwrap();
    assert!(l.limit_type == None && l.entity_type == None);
}
