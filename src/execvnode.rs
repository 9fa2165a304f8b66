/// Codec for the scheduler's node-allocation solution string, the
/// `exec_vnode` attribute, eg:
///
///   (n1:ncpus=2:mem=1048576kb)+(n2:ncpus=1+n2b:ncpus=1)
///
/// Each parenthesized group is one chunk of the allocation.  Inside a group,
/// '+' does NOT separate chunks: it introduces a *virtual chunk* (vchunk), an
/// additional vnode drafted in because no single vnode could satisfy the
/// logical request on its own.  A naive split of the whole string on '+'
/// would therefore misparse any group with vchunks; top-level splitting must
/// track parenthesis depth character by character.

use crate::error::FormatError;
use crate::resources::ResourceMap;

use anyhow::Result;
use itertools::Itertools;
use std::collections::HashSet;
use std::fmt;
use ustr::Ustr;

/// One vnode-and-resources bundle.  When a group contains vchunks, the first
/// vnode in the group is the primary one and the rest land in `vchunk`; every
/// vnode is counted once (see DESIGN.md for why the primary vnode is not also
/// registered as a vchunk).

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub vnode: Ustr,
    pub resources: ResourceMap,
    pub vchunk: Vec<Chunk>,
}

fn parse_leaf(s: &str) -> Result<(Ustr, ResourceMap)> {
    let mut fields = s.split(':');
    let vnode = match fields.next() {
        Some(v) if !v.is_empty() => v,
        _ => return Err(FormatError(format!("Missing vnode name in chunk '{}'", s)).into()),
    };
    let mut resources = ResourceMap::new();
    for field in fields {
        let (k, v) = field
            .split_once('=')
            .ok_or_else(|| FormatError(format!("Expected 'key=value' but got '{}'", field)))?;
        resources.insert(Ustr::from(k), v.to_string());
    }
    Ok((Ustr::from(vnode), resources))
}

impl Chunk {
    /// Parse the '+'-joined interior of one parenthesized group.

    pub fn parse(s: &str) -> Result<Chunk> {
        let parts = s.split('+').collect::<Vec<&str>>();
        let (vnode, resources) = parse_leaf(parts[0])?;
        let mut chunk = Chunk {
            vnode,
            resources,
            vchunk: vec![],
        };
        for part in &parts[1..] {
            let (vn, resc) = parse_leaf(part)?;
            chunk.vchunk.push(Chunk {
                vnode: vn,
                resources: resc,
                vchunk: vec![],
            });
        }
        Ok(chunk)
    }

    /// Look up the resources of any vnode in this chunk, the primary one or a
    /// vchunk's.

    pub fn get(&self, vnode: &str) -> Option<&ResourceMap> {
        if self.vnode.as_str() == vnode {
            return Some(&self.resources);
        }
        self.vchunk
            .iter()
            .find(|c| c.vnode.as_str() == vnode)
            .map(|c| &c.resources)
    }

    /// Merge resources into the named vnode: into the primary vnode if the
    /// name matches, else into a matching vchunk, else as a new vchunk.  On a
    /// key collision the incoming value wins.

    pub fn add(&mut self, vnode: Ustr, resources: &ResourceMap) {
        if self.vnode == vnode {
            self.resources.merge(resources);
            return;
        }
        if let Some(c) = self.vchunk.iter_mut().find(|c| c.vnode == vnode) {
            c.resources.merge(resources);
            return;
        }
        self.vchunk.push(Chunk {
            vnode,
            resources: resources.clone(),
            vchunk: vec![],
        });
    }
}

fn write_leaf(f: &mut fmt::Formatter, vnode: Ustr, resources: &ResourceMap) -> fmt::Result {
    write!(f, "{}", vnode)?;
    for (k, v) in resources.iter() {
        write!(f, ":{}={}", k, v)?;
    }
    Ok(())
}

impl fmt::Display for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write_leaf(f, self.vnode, &self.resources)?;
        for c in &self.vchunk {
            write!(f, "+")?;
            write_leaf(f, c.vnode, &c.resources)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecVnode {
    chunks: Vec<Chunk>,
}

impl ExecVnode {
    /// Parse "(chunk)+(chunk)+..." by scanning the character stream with a
    /// nesting counter.  A '+' is a chunk separator only at depth 0.

    pub fn parse(s: &str) -> Result<ExecVnode> {
        let mut chunks = vec![];
        let mut depth = 0usize;
        let mut start = 0usize;
        // At depth 0 we alternate between expecting a group and expecting a
        // '+' separator.
        let mut expect_group = true;
        for (i, c) in s.char_indices() {
            if depth == 0 {
                match c {
                    '(' => {
                        if !expect_group {
                            return Err(FormatError(format!(
                                "Expected '+' before '(' in exec_vnode '{}'",
                                s
                            ))
                            .into());
                        }
                        start = i + 1;
                        depth = 1;
                    }
                    '+' => {
                        if expect_group {
                            return Err(FormatError(format!(
                                "Misplaced '+' in exec_vnode '{}'",
                                s
                            ))
                            .into());
                        }
                        expect_group = true;
                    }
                    _ => {
                        return Err(FormatError(format!(
                            "Unexpected character '{}' outside parentheses in exec_vnode '{}'",
                            c, s
                        ))
                        .into());
                    }
                }
            } else {
                match c {
                    '(' => depth += 1,
                    ')' => {
                        depth -= 1;
                        if depth == 0 {
                            chunks.push(Chunk::parse(&s[start..i])?);
                            expect_group = false;
                        }
                    }
                    _ => {}
                }
            }
        }
        if depth != 0 {
            return Err(FormatError(format!("Unbalanced parentheses in exec_vnode '{}'", s)).into());
        }
        if expect_group {
            // Empty input or a trailing '+'.
            return Err(FormatError(format!("Incomplete exec_vnode '{}'", s)).into());
        }
        Ok(ExecVnode { chunks })
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Every vnode name in the allocation, primary vnodes and vchunks alike.

    pub fn vnodes(&self) -> HashSet<Ustr> {
        let mut set = HashSet::new();
        for c in &self.chunks {
            set.insert(c.vnode);
            for vc in &c.vchunk {
                set.insert(vc.vnode);
            }
        }
        set
    }

    /// Sum the named resource over every vnode that carries it.  The values
    /// must be integral; sizes and other non-numeric values are an error.

    pub fn resource(&self, name: &str) -> Result<i64> {
        let mut total = 0i64;
        for c in &self.chunks {
            for resources in
                std::iter::once(&c.resources).chain(c.vchunk.iter().map(|vc| &vc.resources))
            {
                if let Some(v) = resources.get(name) {
                    total += v.parse::<i64>().map_err(|_| {
                        FormatError(format!(
                            "Non-numeric value '{}' for resource '{}' in exec_vnode",
                            v, name
                        ))
                    })?;
                }
            }
        }
        Ok(total)
    }
}

impl fmt::Display for ExecVnode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}",
            self.chunks.iter().map(|c| format!("({})", c)).join("+")
        )
    }
}

// The internal '+' in the second group must not be treated as a top-level
// separator.

#[test]
fn test_execvnode_depth_scan() {
    let ev = ExecVnode::parse("(n1:ncpus=2)+(n2:ncpus=1+n2b:ncpus=1)").unwrap();
    assert!(ev.chunks().len() == 2);
    assert!(ev.chunks()[0].vnode.as_str() == "n1");
    assert!(ev.chunks()[0].vchunk.is_empty());
    assert!(ev.chunks()[1].vnode.as_str() == "n2");
    assert!(ev.chunks()[1].vchunk.len() == 1);
    assert!(ev.chunks()[1].vchunk[0].vnode.as_str() == "n2b");

    let names = ev
        .vnodes()
        .iter()
        .map(|u| u.to_string())
        .collect::<HashSet<String>>();
    let expected = ["n1", "n2", "n2b"]
        .iter()
        .map(|s| s.to_string())
        .collect::<HashSet<String>>();
    assert!(names == expected);
}

#[test]
fn test_execvnode_resource_sum() {
    let ev = ExecVnode::parse("(n1:ncpus=2)+(n2:ncpus=1+n2b:ncpus=1)").unwrap();
    assert!(ev.resource("ncpus").unwrap() == 4);
    // Absent everywhere sums to zero.
    assert!(ev.resource("ngpus").unwrap() == 0);
    // Size-valued resources are not integral.
    let ev = ExecVnode::parse("(n1:mem=1048576kb)").unwrap();
    assert!(ev.resource("mem").is_err());
}

#[test]
fn test_execvnode_roundtrip() {
    for s in [
        "(n1:ncpus=2)",
        "(n1:ncpus=2:mem=1048576kb)+(n2:ncpus=1+n2b:ncpus=1)",
        "(a:ncpus=1)+(b:ncpus=2)+(c:ncpus=3+d:ncpus=4+e:ncpus=5)",
    ] {
        let ev = ExecVnode::parse(s).unwrap();
        assert!(format!("{}", ev) == s);
        assert!(ExecVnode::parse(&format!("{}", ev)).unwrap() == ev);
    }
}

#[test]
fn test_execvnode_parse_errors() {
    assert!(ExecVnode::parse("").is_err());
    assert!(ExecVnode::parse("(n1:ncpus=2").is_err());
    assert!(ExecVnode::parse("n1:ncpus=2").is_err());
    assert!(ExecVnode::parse("(n1:ncpus=2)+").is_err());
    assert!(ExecVnode::parse("+(n1:ncpus=2)").is_err());
    assert!(ExecVnode::parse("(n1:ncpus=2)(n2:ncpus=1)").is_err());
    assert!(ExecVnode::parse("()").is_err());
    assert!(ExecVnode::parse("(n1:ncpus)").is_err());
}

#[test]
fn test_chunk_get_and_add() {
    let mut c = Chunk::parse("n2:ncpus=1+n2b:ncpus=1").unwrap();
    assert!(c.get("n2").unwrap().get("ncpus") == Some("1"));
    assert!(c.get("n2b").unwrap().get("ncpus") == Some("1"));
    assert!(c.get("n3") == None);

    let mut more = ResourceMap::new();
    more.insert(Ustr::from("ncpus"), "4".to_string());
    more.insert(Ustr::from("mem"), "1mb".to_string());

    // Merge into the primary vnode: collision overwrites.
    c.add(Ustr::from("n2"), &more);
    assert!(c.resources.get("ncpus") == Some("4"));
    assert!(c.resources.get("mem") == Some("1mb"));

    // Merge into an existing vchunk.
    c.add(Ustr::from("n2b"), &more);
    assert!(c.get("n2b").unwrap().get("ncpus") == Some("4"));

    // Unknown vnode appends a new vchunk.
    c.add(Ustr::from("n2c"), &more);
    assert!(c.vchunk.len() == 2);
    assert!(c.get("n2c").unwrap().get("mem") == Some("1mb"));

    // The string form tracks the structure.
    assert!(
        format!("{}", c) == "n2:ncpus=4:mem=1mb+n2b:ncpus=4:mem=1mb+n2c:ncpus=4:mem=1mb"
    );
}
