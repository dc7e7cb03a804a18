use crate::device::EntityKey;
use std::collections::{HashMap, HashSet};

/// Name → key map, following each device to the key it is displayed under.
///
/// Devices without a name never share a key: each one gets a fresh key.
#[derive(Debug, Default)]
pub struct IdentityMap {
    keys: HashMap<String, EntityKey>,
    next: u64,
}

impl IdentityMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Key for `name`, assigning a fresh one on first sight
    pub fn key_for(&mut self, name: &str) -> EntityKey {
        if name.is_empty() {
            return self.fresh();
        }
        if let Some(key) = self.keys.get(name) {
            return *key;
        }
        let key = self.fresh();
        self.keys.insert(name.to_string(), key);
        key
    }

    /// Point `name` at the key it is currently displayed under.
    ///
    /// Any other name still holding `key` is forgotten, so each key maps
    /// back to at most one name.
    pub fn bind(&mut self, name: &str, key: EntityKey) {
        self.next = self.next.max(key.get());
        if name.is_empty() {
            return;
        }
        self.keys.retain(|n, k| *k != key || n == name);
        self.keys.insert(name.to_string(), key);
    }

    /// Assign keys for a whole snapshot, keeping keys unique within it
    pub fn assign<'a>(&mut self, names: impl IntoIterator<Item = &'a str>) -> Vec<EntityKey> {
        let mut used = HashSet::new();
        names
            .into_iter()
            .map(|name| {
                let key = self.key_for(name);
                if used.insert(key) {
                    key
                } else {
                    let fresh = self.fresh();
                    used.insert(fresh);
                    fresh
                }
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    fn fresh(&mut self) -> EntityKey {
        self.next += 1;
        EntityKey::new(self.next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_assigned_once_per_name() {
        let mut ids = IdentityMap::new();
        let a = ids.key_for("living room");
        let b = ids.key_for("bedroom");
        assert_ne!(a, b);
        assert_eq!(ids.key_for("living room"), a);
        assert_eq!(ids.len(), 2);
    }

    #[test]
    fn test_unnamed_devices_get_distinct_keys() {
        let mut ids = IdentityMap::new();
        assert_ne!(ids.key_for(""), ids.key_for(""));
        assert!(ids.is_empty());
    }

    #[test]
    fn test_assign_deduplicates_within_snapshot() {
        let mut ids = IdentityMap::new();
        let keys = ids.assign(["twin", "twin", "solo"]);
        assert_eq!(keys.len(), 3);
        assert_ne!(keys[0], keys[1]);
        assert_ne!(keys[1], keys[2]);
        assert_eq!(ids.key_for("twin"), keys[0]);
    }

    #[test]
    fn test_bind_repoints_name_and_drops_stale_holder() {
        let mut ids = IdentityMap::new();
        let a = ids.key_for("a");
        let b = ids.key_for("b");

        // Swapped positions: each name now lives under the other's key
        ids.bind("b", a);
        ids.bind("a", b);
        assert_eq!(ids.key_for("b"), a);
        assert_eq!(ids.key_for("a"), b);
        assert_eq!(ids.len(), 2);

        ids.bind("attic", EntityKey::new(42));
        assert_eq!(ids.key_for("attic"), EntityKey::new(42));
        // Fresh keys never collide with a bound one
        assert!(ids.key_for("cellar").get() > 42);
    }

    #[test]
    fn test_renamed_device_keeps_key_under_new_name() {
        let mut ids = IdentityMap::new();
        let key = ids.key_for("hall");
        ids.bind("hallway", key);
        assert_eq!(ids.key_for("hallway"), key);
        assert_eq!(ids.len(), 1);
        assert_ne!(ids.key_for("hall"), key);
    }
}
