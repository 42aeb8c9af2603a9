//! Character trie for prefix search over road labels.
//!
//! Values are stored at the node reached by their full key.  A key may carry
//! any number of values; inserting under an existing key appends.

use std::collections::BTreeMap;

struct TrieNode<T> {
    children: BTreeMap<char, TrieNode<T>>,
    values:   Vec<T>,
}

impl<T> TrieNode<T> {
    fn new() -> Self {
        Self { children: BTreeMap::new(), values: Vec::new() }
    }
}

/// Prefix trie keyed by `char`.
///
/// Children are ordered, so [`find_all`](Self::find_all) yields values in a
/// stable order for a given set of inserts: keys in lexicographic `char`
/// order, values under one key in insertion order.
pub struct PrefixTrie<T> {
    root: TrieNode<T>,
    len:  usize,
}

impl<T> PrefixTrie<T> {
    pub fn new() -> Self {
        Self { root: TrieNode::new(), len: 0 }
    }

    /// Total number of stored values.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn insert(&mut self, key: &str, value: T) {
        let mut node = &mut self.root;
        for c in key.chars() {
            node = node.children.entry(c).or_insert_with(TrieNode::new);
        }
        node.values.push(value);
        self.len += 1;
    }

    /// Every value whose key starts with `prefix`.
    ///
    /// An unmatched prefix returns an empty `Vec` without allocating.  The
    /// empty prefix returns every value in the trie.
    pub fn find_all(&self, prefix: &str) -> Vec<&T> {
        let Some(start) = self.descend(prefix) else {
            return Vec::new();
        };

        let mut out = Vec::new();
        let mut stack = vec![start];
        while let Some(node) = stack.pop() {
            out.extend(node.values.iter());
            // Reversed so the smallest child is popped first.
            stack.extend(node.children.values().rev());
        }
        out
    }

    fn descend(&self, prefix: &str) -> Option<&TrieNode<T>> {
        let mut node = &self.root;
        for c in prefix.chars() {
            node = node.children.get(&c)?;
        }
        Some(node)
    }
}

impl<T> Default for PrefixTrie<T> {
    fn default() -> Self {
        Self::new()
    }
}
