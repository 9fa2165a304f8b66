/// Insertion-ordered map from resource name to raw string value, shared by
/// the select-spec and exec_vnode codecs.  The maps are tiny (a handful of
/// resources per chunk) so a vector with linear search beats a hash map, and
/// it keeps the order needed for faithful re-encoding.

use ustr::Ustr;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceMap {
    items: Vec<(Ustr, String)>,
}

impl ResourceMap {
    pub fn new() -> ResourceMap {
        ResourceMap { items: vec![] }
    }

    /// Insert or overwrite; an existing key keeps its position.

    pub fn insert(&mut self, name: Ustr, value: String) {
        if let Some((_, v)) = self.items.iter_mut().find(|(k, _)| *k == name) {
            *v = value;
        } else {
            self.items.push((name, value));
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.items
            .iter()
            .find(|(k, _)| k.as_str() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Merge `other` into `self`; on key collision the incoming value wins.

    pub fn merge(&mut self, other: &ResourceMap) {
        for (k, v) in &other.items {
            self.insert(*k, v.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Ustr, &str)> {
        self.items.iter().map(|(k, v)| (*k, v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[test]
fn test_resource_map() {
    let mut m = ResourceMap::new();
    m.insert(Ustr::from("ncpus"), "2".to_string());
    m.insert(Ustr::from("mem"), "4gb".to_string());
    assert!(m.get("ncpus") == Some("2"));
    assert!(m.get("nope") == None);

    // Overwrite keeps position.
    m.insert(Ustr::from("ncpus"), "8".to_string());
    let keys = m.iter().map(|(k, _)| k.to_string()).collect::<Vec<String>>();
    assert!(keys == ["ncpus", "mem"]);
    assert!(m.get("ncpus") == Some("8"));

    let mut n = ResourceMap::new();
    n.insert(Ustr::from("mem"), "8gb".to_string());
    n.insert(Ustr::from("arch"), "linux".to_string());
    m.merge(&n);
    assert!(m.len() == 3);
    assert!(m.get("mem") == Some("8gb"));
    assert!(m.get("arch") == Some("linux"));
}
