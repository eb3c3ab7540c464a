use std::collections::HashMap;

/// Which side of the true score a stored value bounds
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Bound {
    /// The true score is at least the stored value
    Lower,
    /// The true score is at most the stored value
    Upper,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct TableKey {
    /// `Board::canonical_key` or `Board::mirror_key` of the position
    pub position: u64,
    /// remaining search depth the bound was proven at
    pub depth: u32,
    /// whether the player to move is the one the root search is playing for
    pub maximizing: bool,
    pub bound: Bound,
}

/// Score bounds proven by earlier searches
///
/// Entries are never evicted, the table lives as long as the engine that
/// owns it.
#[derive(Clone, Default, Debug)]
pub struct TranspositionTable {
    entries: HashMap<TableKey, i32>,
}

impl TranspositionTable {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
    pub fn set(&mut self, key: TableKey, value: i32) {
        self.entries.insert(key, value);
    }
    pub fn get(&self, key: &TableKey) -> Option<i32> {
        self.entries.get(key).copied()
    }
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
