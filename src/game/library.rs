use crate::game::difficulty::DifficultyTable;
use crate::graph::{Layout, LayoutError, LayoutHandle, LayoutSpec, validate};

use log::{debug, info, warn};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

const LAYOUTS_JSON: &str = include_str!("../../assets/layouts.json");

/// Source of layouts for the puzzle generator.
///
/// Every layout is acquired before a puzzle is built from it and released
/// once that puzzle is discarded, whatever backs the store.
pub trait LayoutStore {
    fn acquire(&mut self, name: &str) -> Result<LayoutHandle, LayoutError>;
    fn release(&mut self, handle: LayoutHandle);
}

/// How the library hands out a layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Residency {
    /// One shared instance, built on first acquire
    Resident,
    /// A fresh instance per acquire
    Template,
}

#[derive(Debug, Deserialize)]
struct LayoutEntry {
    #[serde(flatten)]
    spec: LayoutSpec,
    #[serde(default)]
    resident: bool,
}

#[derive(Debug, Deserialize)]
struct LayoutFile {
    layouts: Vec<LayoutEntry>,
}

#[derive(Debug)]
struct StoredLayout {
    spec: LayoutSpec,
    residency: Residency,
    shared: Option<Arc<Layout>>,
}

/// Layout store backed by authored layout specs
#[derive(Debug, Default)]
pub struct LayoutLibrary {
    layouts: HashMap<String, StoredLayout>,
    leases: HashMap<u64, String>,
    next_lease: u64,
}

impl LayoutLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the bundled layouts
    pub fn load() -> Result<Self, LayoutError> {
        Self::from_json(LAYOUTS_JSON)
    }

    /// Parse a layout file.
    ///
    /// Malformed layouts are kept and reported; they fail again when acquired,
    /// so an asset fixed on disk is picked up by the next load.
    pub fn from_json(json: &str) -> Result<Self, LayoutError> {
        let file: LayoutFile =
            serde_json::from_str(json).map_err(|e| LayoutError::Parse(e.to_string()))?;

        if file.layouts.is_empty() {
            return Err(LayoutError::Parse("No layouts in file".to_string()));
        }

        let mut library = LayoutLibrary::new();
        for entry in file.layouts {
            if let Err(e) = validate(&entry.spec) {
                warn!("Loaded malformed layout: {}", e);
            }
            let residency = if entry.resident {
                Residency::Resident
            } else {
                Residency::Template
            };
            library.insert(entry.spec, residency);
        }

        info!("Layout library loaded: {} layouts", library.len());
        Ok(library)
    }

    /// Add or replace a layout
    pub fn insert(&mut self, spec: LayoutSpec, residency: Residency) {
        self.layouts.insert(
            spec.name.clone(),
            StoredLayout {
                spec,
                residency,
                shared: None,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.layouts.contains_key(name)
    }

    /// Layout names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.layouts.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn spec(&self, name: &str) -> Option<&LayoutSpec> {
        self.layouts.get(name).map(|stored| &stored.spec)
    }

    pub fn residency(&self, name: &str) -> Option<Residency> {
        self.layouts.get(name).map(|stored| stored.residency)
    }

    /// Number of handles acquired and not yet released
    pub fn outstanding_leases(&self) -> usize {
        self.leases.len()
    }

    /// Check every pool entry of a difficulty table against this library.
    ///
    /// Returns one diagnostic per problem, empty when the assets agree.
    pub fn audit(&self, table: &DifficultyTable) -> Vec<String> {
        let mut problems = Vec::new();

        for tier in table.tiers() {
            if tier.layout_pool.is_empty() {
                problems.push(format!("tier '{}': empty layout pool", tier.name));
            }
            for name in &tier.layout_pool {
                let Some(spec) = self.spec(name) else {
                    problems.push(format!("tier '{}': unknown layout '{}'", tier.name, name));
                    continue;
                };
                if let Err(e) = validate(spec) {
                    problems.push(format!("tier '{}': {}", tier.name, e));
                } else if spec.nodes.len() != tier.node_count {
                    problems.push(format!(
                        "tier '{}': layout '{}' has {} nodes, expected {}",
                        tier.name,
                        name,
                        spec.nodes.len(),
                        tier.node_count
                    ));
                }
            }
        }

        problems
    }
}

impl LayoutStore for LayoutLibrary {
    fn acquire(&mut self, name: &str) -> Result<LayoutHandle, LayoutError> {
        let stored = self
            .layouts
            .get_mut(name)
            .ok_or_else(|| LayoutError::UnknownLayout(name.to_string()))?;

        // Validation runs on every acquire, even for an already built resident
        validate(&stored.spec)?;

        let layout = match (stored.residency, &stored.shared) {
            (Residency::Resident, Some(shared)) => shared.clone(),
            (Residency::Resident, None) => {
                let shared = Arc::new(Layout::from_spec(&stored.spec)?);
                stored.shared = Some(shared.clone());
                shared
            }
            (Residency::Template, _) => Arc::new(Layout::from_spec(&stored.spec)?),
        };

        let lease = self.next_lease;
        self.next_lease += 1;
        self.leases.insert(lease, name.to_string());

        debug!("Acquired layout '{}' (lease {})", name, lease);
        Ok(LayoutHandle::new(layout, lease))
    }

    fn release(&mut self, handle: LayoutHandle) {
        match self.leases.remove(&handle.lease()) {
            Some(name) => debug!("Released layout '{}' (lease {})", name, handle.lease()),
            None => warn!(
                "Release of unknown lease {} for layout '{}'",
                handle.lease(),
                handle.name()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::difficulty::test_tier;

    const TEST_JSON: &str = r#"{
        "layouts": [
            { "name": "triangle", "nodes": [0, 1, 2], "connections": [[0, 1], [1, 2], [2, 0]] },
            { "name": "pair", "resident": true, "nodes": [0, 1], "connections": [[0, 1]] },
            { "name": "broken", "nodes": [0, 1, 2], "connections": [[0, 1]] }
        ]
    }"#;

    #[test]
    fn test_load_from_json() {
        let library = LayoutLibrary::from_json(TEST_JSON).unwrap();

        assert_eq!(library.len(), 3);
        assert_eq!(library.names(), vec!["broken", "pair", "triangle"]);
        assert_eq!(library.residency("pair"), Some(Residency::Resident));
        assert_eq!(library.residency("triangle"), Some(Residency::Template));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            LayoutLibrary::from_json("[1, 2"),
            Err(LayoutError::Parse(_))
        ));
        assert!(matches!(
            LayoutLibrary::from_json(r#"{ "layouts": [] }"#),
            Err(LayoutError::Parse(_))
        ));
    }

    #[test]
    fn test_resident_layout_is_shared() {
        let mut library = LayoutLibrary::from_json(TEST_JSON).unwrap();

        let first = library.acquire("pair").unwrap();
        let second = library.acquire("pair").unwrap();
        assert!(Arc::ptr_eq(first.layout(), second.layout()));
        assert_ne!(first.lease(), second.lease());

        library.release(first);
        library.release(second);
        assert_eq!(library.outstanding_leases(), 0);
    }

    #[test]
    fn test_template_layout_is_fresh() {
        let mut library = LayoutLibrary::from_json(TEST_JSON).unwrap();

        let first = library.acquire("triangle").unwrap();
        let second = library.acquire("triangle").unwrap();
        assert!(!Arc::ptr_eq(first.layout(), second.layout()));
        assert_eq!(**first.layout(), **second.layout());
        assert_eq!(library.outstanding_leases(), 2);
    }

    #[test]
    fn test_acquire_rejects_malformed_and_unknown() {
        let mut library = LayoutLibrary::from_json(TEST_JSON).unwrap();

        assert!(matches!(
            library.acquire("broken"),
            Err(LayoutError::IsolatedNode(_, _))
        ));
        assert_eq!(
            library.acquire("missing").unwrap_err(),
            LayoutError::UnknownLayout("missing".to_string())
        );
        assert_eq!(library.outstanding_leases(), 0);
    }

    #[test]
    fn test_acquire_revalidates_replaced_layout() {
        let mut library = LayoutLibrary::from_json(TEST_JSON).unwrap();
        let handle = library.acquire("pair").unwrap();
        library.release(handle);

        // The asset changes between sessions
        library.insert(LayoutSpec::new("pair", 2, &[]), Residency::Resident);
        assert!(library.acquire("pair").is_err());
    }

    #[test]
    fn test_double_release_is_harmless() {
        let mut library = LayoutLibrary::from_json(TEST_JSON).unwrap();
        let handle = library.acquire("triangle").unwrap();

        library.release(handle.clone());
        library.release(handle);
        assert_eq!(library.outstanding_leases(), 0);
    }

    #[test]
    fn test_bundled_assets_agree() {
        let library = LayoutLibrary::load().unwrap();
        let table = DifficultyTable::load().unwrap();

        assert!(library.audit(&table).is_empty(), "{:?}", library.audit(&table));
    }

    #[test]
    fn test_audit_reports_problems() {
        let library = LayoutLibrary::from_json(TEST_JSON).unwrap();
        let table = DifficultyTable::new(vec![
            test_tier("ok", 1, 2, &["triangle"]),
            test_tier("bad", 3, 4, &["pair", "broken", "ghost"]),
            test_tier("bare", 5, 6, &[]),
        ])
        .unwrap();

        let problems = library.audit(&table);
        assert_eq!(problems.len(), 4);
        assert!(problems.iter().any(|p| p.contains("'pair' has 2 nodes")));
        assert!(problems.iter().any(|p| p.contains("unknown layout 'ghost'")));
        assert!(problems.iter().any(|p| p.contains("empty layout pool")));
    }
}
