/// Codec for the legacy host allocation string, the `exec_host` attribute,
/// eg "h1/0*4+h2/1": one entry per host, each naming the task slot and,
/// optionally after '*', the cpu count (default 1).

use crate::error::FormatError;

use anyhow::Result;
use itertools::Itertools;
use std::fmt;
use ustr::Ustr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostSlot {
    pub host: Ustr,
    pub task: String,
    pub ncpus: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecHost {
    slots: Vec<HostSlot>,
}

impl ExecHost {
    pub fn parse(s: &str) -> Result<ExecHost> {
        let mut slots = vec![];
        for entry in s.split('+') {
            let (host, rest) = entry.split_once('/').ok_or_else(|| {
                FormatError(format!("Missing '/' in exec_host entry '{}'", entry))
            })?;
            let parts = rest.split('*').collect::<Vec<&str>>();
            let (task, ncpus) = match parts.len() {
                1 => (parts[0].to_string(), 1),
                2 => {
                    let n = parts[1].parse::<i64>().map_err(|_| {
                        FormatError(format!("Non-numeric ncpus in exec_host entry '{}'", entry))
                    })?;
                    (parts[0].to_string(), n)
                }
                // Fail-soft, by contract: an unexpected segment count
                // defaults to task slot 0 with one cpu.
                _ => ("0".to_string(), 1),
            };
            slots.push(HostSlot {
                host: Ustr::from(host),
                task,
                ncpus,
            });
        }
        Ok(ExecHost { slots })
    }

    pub fn slots(&self) -> &[HostSlot] {
        &self.slots
    }

    pub fn total_ncpus(&self) -> i64 {
        self.slots.iter().map(|s| s.ncpus).sum()
    }
}

/// Re-encode in input order; "*1" is implied and omitted.

impl fmt::Display for ExecHost {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = self
            .slots
            .iter()
            .map(|s| {
                if s.ncpus == 1 {
                    format!("{}/{}", s.host, s.task)
                } else {
                    format!("{}/{}*{}", s.host, s.task, s.ncpus)
                }
            })
            .join("+");
        write!(f, "{}", s)
    }
}

#[test]
fn test_exechost_parse() {
    let eh = ExecHost::parse("h1/0*4+h2/1").unwrap();
    assert!(eh.slots().len() == 2);
    assert!(eh.slots()[0].host.as_str() == "h1");
    assert!(eh.slots()[0].task == "0");
    assert!(eh.slots()[0].ncpus == 4);
    assert!(eh.slots()[1].host.as_str() == "h2");
    assert!(eh.slots()[1].task == "1");
    assert!(eh.slots()[1].ncpus == 1);
    assert!(eh.total_ncpus() == 5);
}

#[test]
fn test_exechost_failsoft() {
    // Too many '*' segments falls back to (task 0, 1 cpu) instead of failing.
    let eh = ExecHost::parse("h1/3*4*9").unwrap();
    assert!(eh.slots()[0].task == "0");
    assert!(eh.slots()[0].ncpus == 1);
}

#[test]
fn test_exechost_errors() {
    assert!(ExecHost::parse("h1").is_err());
    assert!(ExecHost::parse("h1/0*x").is_err());
    assert!(ExecHost::parse("h1/0*4+h2").is_err());
}

#[test]
fn test_exechost_roundtrip() {
    for s in ["h1/0*4+h2/1", "h1/0", "a/0*2+b/1*2+c/7"] {
        let eh = ExecHost::parse(s).unwrap();
        assert!(format!("{}", eh) == s);
        assert!(ExecHost::parse(&format!("{}", eh)).unwrap() == eh);
    }
}
