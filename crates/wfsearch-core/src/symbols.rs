// String interner: label-to-index and index-to-label mapping.
//
// Automata refer to states and symbols through dense integer ids; the
// interner owns the display strings. Anonymous entries (generated states)
// get a display name but are never returned by a label lookup, so they can
// not collide with a named entry.

use hashbrown::HashMap;

/// Bidirectional mapping between labels and dense `u32` ids.
#[derive(Debug, Clone, Default)]
pub struct Interner {
    /// Maps id to its display string.
    names: Vec<String>,
    /// Maps a named label to its id. Anonymous entries are absent.
    lookup: HashMap<String, u32>,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the id for `label`, inserting it if unseen.
    pub fn intern(&mut self, label: &str) -> u32 {
        if let Some(&id) = self.lookup.get(label) {
            return id;
        }
        let id = self.names.len() as u32;
        self.names.push(label.to_string());
        self.lookup.insert(label.to_string(), id);
        id
    }

    /// Allocate a fresh id whose display name is `display`, without making it
    /// reachable by [`get`](Self::get).
    pub fn fresh(&mut self, display: impl Into<String>) -> u32 {
        let id = self.names.len() as u32;
        self.names.push(display.into());
        id
    }

    /// Look up an existing named label.
    pub fn get(&self, label: &str) -> Option<u32> {
        self.lookup.get(label).copied()
    }

    /// Display string for an id. Unknown ids render as an empty string.
    pub fn name(&self, id: u32) -> &str {
        self.names.get(id as usize).map(String::as_str).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_is_idempotent() {
        let mut table = Interner::new();
        let a = table.intern("q0");
        let b = table.intern("q1");
        assert_eq!(table.intern("q0"), a);
        assert_ne!(a, b);
        assert_eq!(table.len(), 2);
        assert_eq!(table.name(b), "q1");
    }

    #[test]
    fn fresh_ids_are_not_looked_up() {
        let mut table = Interner::new();
        let named = table.intern("q0a");
        let anon = table.fresh("q0a");
        assert_ne!(named, anon);
        assert_eq!(table.get("q0a"), Some(named));
        assert_eq!(table.name(anon), "q0a");
    }

    #[test]
    fn unknown_id_has_empty_name() {
        let table = Interner::new();
        assert_eq!(table.name(42), "");
        assert!(table.is_empty());
    }
}
