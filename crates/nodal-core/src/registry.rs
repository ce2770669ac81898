//! Node bookkeeping: labels, integer ids, and the union-find behind shorts.
//!
//! Node id 0 is reserved for ground and is pinned as the absolute root of its
//! union-find class: a union between ground and anything else always leaves 0
//! as the representative. The tokens `0`, `gnd` and `GND` resolve to ground.

use indexmap::IndexMap;
use std::collections::HashMap;

use crate::error::{Error, Result};

/// The reserved ground node id.
pub const GROUND: u32 = 0;

const GROUND_ALIASES: [&str; 3] = ["0", "gnd", "GND"];

/// Label <-> id mapping plus a union-find over node ids.
///
/// Merges are monotonic: once two nodes are shorted they stay shorted until
/// the registry is rebuilt from scratch.
#[derive(Debug, Clone)]
pub struct NodeRegistry {
    labels: IndexMap<String, u32>,
    names: HashMap<u32, String>,
    parent: HashMap<u32, u32>,
    rank: HashMap<u32, u32>,
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeRegistry {
    /// Create a registry with ground pre-installed.
    pub fn new() -> Self {
        let mut registry = Self {
            labels: IndexMap::new(),
            names: HashMap::new(),
            parent: HashMap::new(),
            rank: HashMap::new(),
        };
        registry.ensure(GROUND);
        registry.names.insert(GROUND, "GND".to_string());
        for alias in GROUND_ALIASES {
            registry.labels.insert(alias.to_string(), GROUND);
        }
        registry
    }

    /// Resolve a node token to a canonical id, creating the node on first
    /// reference.
    ///
    /// `0`/`gnd`/`GND` resolve to ground; a purely numeric token is taken as
    /// that node id; any other token is a user label, assigned the smallest
    /// unused positive id when new.
    pub fn resolve(&mut self, token: &str) -> Result<u32> {
        let token = token.trim();
        if token.is_empty() {
            return Err(Error::InvalidLabel);
        }
        if GROUND_ALIASES.contains(&token) {
            return Ok(GROUND);
        }
        if let Ok(id) = token.parse::<u32>() {
            self.ensure(id);
            return Ok(self.canonical(id));
        }
        if let Some(&id) = self.labels.get(token) {
            return Ok(self.canonical(id));
        }

        let id = self.next_free_id();
        self.ensure(id);
        self.labels.insert(token.to_string(), id);
        self.names.entry(id).or_insert_with(|| token.to_string());
        Ok(id)
    }

    /// Resolve a token without creating anything. Returns the canonical id
    /// when the token names a known node.
    pub fn lookup(&self, token: &str) -> Option<u32> {
        let token = token.trim();
        if GROUND_ALIASES.contains(&token) {
            return Some(GROUND);
        }
        if let Ok(id) = token.parse::<u32>() {
            return self.parent.contains_key(&id).then(|| self.find(id));
        }
        self.labels.get(token).map(|&id| self.find(id))
    }

    /// Attach a label to a node. If the label already names a different
    /// class, the two classes are united.
    pub fn label(&mut self, label: &str, id: Option<u32>) -> Result<u32> {
        let label = label.trim();
        if label.is_empty() {
            return Err(Error::InvalidLabel);
        }

        let canonical = match self.labels.get(label).copied() {
            Some(existing) => match id {
                Some(id) => {
                    self.ensure(id);
                    self.union(existing, id)
                }
                None => self.canonical(existing),
            },
            None => {
                let id = match id {
                    Some(id) => id,
                    None => self.next_free_id(),
                };
                self.ensure(id);
                let id = self.canonical(id);
                self.labels.insert(label.to_string(), id);
                self.names.entry(id).or_insert_with(|| label.to_string());
                id
            }
        };
        self.rebuild_labels();
        Ok(self.canonical(canonical))
    }

    /// Short two nodes, returning the surviving representative. Ground wins
    /// any union it takes part in.
    pub fn connect(&mut self, a: &str, b: &str) -> Result<u32> {
        let ra = self.resolve(a)?;
        let rb = self.resolve(b)?;
        let root = self.union(ra, rb);
        self.rebuild_labels();
        Ok(root)
    }

    /// Path-compressed find.
    pub fn canonical(&mut self, id: u32) -> u32 {
        let root = self.find(id);
        let mut current = id;
        while current != root {
            let next = self.parent[&current];
            self.parent.insert(current, root);
            current = next;
        }
        root
    }

    /// Non-compressing find, for read-only contexts.
    pub fn find(&self, id: u32) -> u32 {
        let mut current = id;
        while let Some(&up) = self.parent.get(&current) {
            if up == current {
                return current;
            }
            current = up;
        }
        current
    }

    /// The display label for a node, if one was ever attached.
    pub fn name_of(&self, id: u32) -> Option<&str> {
        self.names.get(&self.find(id)).map(String::as_str)
    }

    /// Whether an id has been materialized in the union-find.
    pub fn contains(&self, id: u32) -> bool {
        self.parent.contains_key(&id)
    }

    /// All known labels with their canonical ids, in insertion order.
    pub fn known_labels(&self) -> impl Iterator<Item = (&str, u32)> {
        self.labels
            .iter()
            .map(|(label, &id)| (label.as_str(), self.find(id)))
    }

    /// Rewrite the label table so every entry points at a canonical
    /// representative, and re-install the ground aliases.
    pub fn rebuild_labels(&mut self) {
        let entries: Vec<(String, u32)> = self
            .labels
            .iter()
            .map(|(label, &id)| (label.clone(), id))
            .collect();
        for (label, id) in entries {
            let canonical = self.canonical(id);
            self.labels.insert(label.clone(), canonical);
            self.names.entry(canonical).or_insert(label);
        }
        for alias in GROUND_ALIASES {
            self.labels.insert(alias.to_string(), GROUND);
        }
    }

    fn ensure(&mut self, id: u32) {
        self.parent.entry(id).or_insert(id);
        self.rank.entry(id).or_insert(0);
    }

    /// Smallest positive id not yet in the union-find.
    fn next_free_id(&self) -> u32 {
        (1..).find(|id| !self.parent.contains_key(id)).unwrap()
    }

    /// Union by rank, with ground pinned as absolute root.
    fn union(&mut self, a: u32, b: u32) -> u32 {
        let ra = self.canonical(a);
        let rb = self.canonical(b);
        if ra == rb {
            return ra;
        }
        if ra == GROUND {
            self.parent.insert(rb, GROUND);
            return GROUND;
        }
        if rb == GROUND {
            self.parent.insert(ra, GROUND);
            return GROUND;
        }

        let rank_a = self.rank[&ra];
        let rank_b = self.rank[&rb];
        if rank_a < rank_b {
            self.parent.insert(ra, rb);
            rb
        } else if rank_a > rank_b {
            self.parent.insert(rb, ra);
            ra
        } else {
            self.parent.insert(rb, ra);
            self.rank.insert(ra, rank_a + 1);
            ra
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ground_aliases_resolve_to_zero() {
        let mut registry = NodeRegistry::new();
        assert_eq!(registry.resolve("0").unwrap(), 0);
        assert_eq!(registry.resolve("gnd").unwrap(), 0);
        assert_eq!(registry.resolve("GND").unwrap(), 0);
    }

    #[test]
    fn test_labels_get_fresh_smallest_ids() {
        let mut registry = NodeRegistry::new();
        let a = registry.resolve("in").unwrap();
        let b = registry.resolve("out").unwrap();
        assert_eq!(a, 1);
        assert_eq!(b, 2);
        // Re-resolving is stable
        assert_eq!(registry.resolve("in").unwrap(), 1);
    }

    #[test]
    fn test_numeric_tokens_materialize_their_id() {
        let mut registry = NodeRegistry::new();
        assert_eq!(registry.resolve("7").unwrap(), 7);
        assert!(registry.contains(7));
        // Fresh labels skip materialized numeric ids
        assert_eq!(registry.resolve("a").unwrap(), 1);
        registry.resolve("1").unwrap();
        assert_eq!(registry.resolve("b").unwrap(), 2);
    }

    #[test]
    fn test_canonical_is_idempotent() {
        let mut registry = NodeRegistry::new();
        registry.resolve("a").unwrap();
        registry.resolve("b").unwrap();
        registry.connect("a", "b").unwrap();
        let a = registry.lookup("a").unwrap();
        let once = registry.canonical(a);
        let twice = registry.canonical(once);
        assert_eq!(once, twice);
        assert_eq!(registry.canonical(GROUND), GROUND);
    }

    #[test]
    fn test_ground_wins_any_union() {
        let mut registry = NodeRegistry::new();
        registry.resolve("a").unwrap();
        let root = registry.connect("a", "0").unwrap();
        assert_eq!(root, GROUND);
        assert_eq!(registry.lookup("a"), Some(GROUND));

        // The other operand order too
        registry.resolve("b").unwrap();
        let root = registry.connect("gnd", "b").unwrap();
        assert_eq!(root, GROUND);
    }

    #[test]
    fn test_connect_is_idempotent() {
        let mut registry = NodeRegistry::new();
        let first = registry.connect("x", "y").unwrap();
        let second = registry.connect("x", "y").unwrap();
        assert_eq!(first, second);
        assert_eq!(registry.lookup("x"), registry.lookup("y"));
    }

    #[test]
    fn test_label_table_rewritten_after_merge() {
        let mut registry = NodeRegistry::new();
        registry.resolve("a").unwrap();
        registry.resolve("b").unwrap();
        registry.connect("a", "b").unwrap();
        let canon = registry.lookup("a").unwrap();
        for (_, id) in registry.known_labels() {
            if id != GROUND {
                assert_eq!(id, canon, "label table entry not canonical");
            }
        }
    }

    #[test]
    fn test_label_aliasing_unites_classes() {
        let mut registry = NodeRegistry::new();
        let a = registry.resolve("a").unwrap();
        registry.resolve("b").unwrap();
        // Attach the existing label "b" onto a's class
        registry.label("b", Some(a)).unwrap();
        assert_eq!(registry.lookup("a"), registry.lookup("b"));
    }

    #[test]
    fn test_empty_label_rejected() {
        let mut registry = NodeRegistry::new();
        assert_eq!(registry.resolve(""), Err(Error::InvalidLabel));
        assert_eq!(registry.label("  ", None), Err(Error::InvalidLabel));
    }

    #[test]
    fn test_name_of() {
        let mut registry = NodeRegistry::new();
        let id = registry.resolve("vin").unwrap();
        assert_eq!(registry.name_of(id), Some("vin"));
        assert_eq!(registry.name_of(GROUND), Some("GND"));
        assert_eq!(registry.name_of(99), None);
    }
}
