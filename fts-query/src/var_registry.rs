//! Variable registry
//!
//! Maps SPARQL variable names to compact `VarId` indices. `?x`, `$x` and a
//! bare `x` all name the same variable; the registry stores the `?x` form.

use std::collections::HashMap;
use std::sync::Arc;

/// Compact variable identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(pub u16);

impl VarId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Registry mapping variable names to `VarId`s
#[derive(Debug, Default, Clone)]
pub struct VarRegistry {
    name_to_id: HashMap<Arc<str>, VarId>,
    id_to_name: Vec<Arc<str>>,
}

impl VarRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the VarId for a variable, registering it if new
    pub fn get_or_insert(&mut self, name: &str) -> VarId {
        let canonical = canonical_name(name);
        if let Some(&id) = self.name_to_id.get(canonical.as_str()) {
            return id;
        }

        // VarId is u16; wrapping would silently alias two variables.
        if self.id_to_name.len() >= (u16::MAX as usize) {
            panic!(
                "VarRegistry capacity exceeded ({}). VarId is u16; refusing to wrap.",
                self.id_to_name.len()
            );
        }

        let id = VarId(self.id_to_name.len() as u16);
        let arc_name: Arc<str> = Arc::from(canonical);
        self.name_to_id.insert(arc_name.clone(), id);
        self.id_to_name.push(arc_name);
        id
    }

    pub fn get(&self, name: &str) -> Option<VarId> {
        self.name_to_id.get(canonical_name(name).as_str()).copied()
    }

    /// Name with its `?` sigil, e.g. `?score`
    ///
    /// # Panics
    ///
    /// Panics if the VarId did not come from this registry.
    pub fn name(&self, id: VarId) -> &str {
        &self.id_to_name[id.index()]
    }

    /// Name without the sigil, as used in SPARQL result documents
    pub fn bare_name(&self, id: VarId) -> &str {
        let name = self.name(id);
        name.strip_prefix('?').unwrap_or(name)
    }

    pub fn try_name(&self, id: VarId) -> Option<&str> {
        self.id_to_name.get(id.index()).map(|s| s.as_ref())
    }

    pub fn len(&self) -> usize {
        self.id_to_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_to_name.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, VarId)> {
        self.id_to_name
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_ref(), VarId(i as u16)))
    }
}

fn canonical_name(name: &str) -> String {
    let bare = name
        .strip_prefix('?')
        .or_else(|| name.strip_prefix('$'))
        .unwrap_or(name);
    format!("?{bare}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_or_insert_dedupes() {
        let mut reg = VarRegistry::new();
        let r = reg.get_or_insert("?r");
        let score = reg.get_or_insert("?score");
        assert_eq!(r, VarId(0));
        assert_eq!(score, VarId(1));
        assert_eq!(reg.get_or_insert("?r"), r);
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn test_sigils_name_the_same_variable() {
        let mut reg = VarRegistry::new();
        let a = reg.get_or_insert("$snippet");
        assert_eq!(reg.get_or_insert("snippet"), a);
        assert_eq!(reg.get("?snippet"), Some(a));
        assert_eq!(reg.name(a), "?snippet");
        assert_eq!(reg.bare_name(a), "snippet");
    }

    #[test]
    fn test_unknown() {
        let reg = VarRegistry::new();
        assert_eq!(reg.get("?x"), None);
        assert_eq!(reg.try_name(VarId(3)), None);
        assert!(reg.is_empty());
    }
}
