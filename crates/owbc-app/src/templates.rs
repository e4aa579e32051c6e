//! Creation templates for new lists and profiles.
//!
//! Templates live under the backend's example path, so they are only
//! valid for the endpoint they were fetched from. Each entry is stamped
//! with the endpoint generation it was fetched under; a reader holding
//! a newer generation treats the entry as a miss. No external clearer
//! has to remember to reset this cache on endpoint change.

use std::collections::HashMap;

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateKind {
    List,
    Profile,
}

impl TemplateKind {
    pub const ALL: [TemplateKind; 2] = [TemplateKind::List, TemplateKind::Profile];
}

#[derive(Debug, Clone, Default)]
pub struct TemplateCache {
    entries: HashMap<TemplateKind, (u64, Value)>,
}

impl TemplateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a template valid for the given endpoint generation.
    pub fn get(&self, kind: TemplateKind, generation: u64) -> Option<&Value> {
        match self.entries.get(&kind) {
            Some((stamp, value)) if *stamp == generation => Some(value),
            _ => None,
        }
    }

    pub fn insert(&mut self, kind: TemplateKind, generation: u64, value: Value) {
        self.entries.insert(kind, (generation, value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fresh_entry_hits() {
        let mut cache = TemplateCache::new();
        cache.insert(TemplateKind::List, 3, json!({"name": ""}));
        assert!(cache.get(TemplateKind::List, 3).is_some());
    }

    #[test]
    fn test_generation_mismatch_misses() {
        let mut cache = TemplateCache::new();
        cache.insert(TemplateKind::List, 3, json!({"name": ""}));
        // Endpoint changed since the fetch: stale, regardless of order.
        assert!(cache.get(TemplateKind::List, 4).is_none());
        assert!(cache.get(TemplateKind::List, 2).is_none());
    }

    #[test]
    fn test_kinds_are_independent() {
        let mut cache = TemplateCache::new();
        cache.insert(TemplateKind::Profile, 1, json!({}));
        assert!(cache.get(TemplateKind::List, 1).is_none());
        assert!(cache.get(TemplateKind::Profile, 1).is_some());
    }

    #[test]
    fn test_insert_overwrites_stale_entry() {
        let mut cache = TemplateCache::new();
        cache.insert(TemplateKind::List, 1, json!({"old": true}));
        cache.insert(TemplateKind::List, 2, json!({"new": true}));
        assert!(cache.get(TemplateKind::List, 1).is_none());
        assert_eq!(cache.get(TemplateKind::List, 2).unwrap()["new"], true);
    }
}
