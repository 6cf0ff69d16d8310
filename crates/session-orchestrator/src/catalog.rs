//! Package list of the selected device with client-side filtering.

use bridge_client::{Debuggable, PackageEntry};

/// Fetched packages plus the search box and debuggable-only toggle.
#[derive(Debug, Clone)]
pub struct PackageCatalog {
    packages: Vec<PackageEntry>,
    search: String,
    only_debuggable: bool,
    render_limit: usize,
}

impl PackageCatalog {
    pub fn new(render_limit: usize) -> Self {
        Self {
            packages: Vec::new(),
            search: String::new(),
            only_debuggable: false,
            render_limit,
        }
    }

    /// Replace the list after a fetch. Filters are kept.
    pub fn replace(&mut self, packages: Vec<PackageEntry>) {
        self.packages = packages;
    }

    pub fn clear(&mut self) {
        self.packages.clear();
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search = term.into();
    }

    pub fn set_only_debuggable(&mut self, only_debuggable: bool) {
        self.only_debuggable = only_debuggable;
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn only_debuggable(&self) -> bool {
        self.only_debuggable
    }

    pub fn all(&self) -> &[PackageEntry] {
        &self.packages
    }

    pub fn contains(&self, name: &str) -> bool {
        self.packages.iter().any(|p| p.name == name)
    }

    /// Matches of the current filters in catalog order, capped at the render limit.
    pub fn visible(&self) -> Vec<&PackageEntry> {
        let term = self.search.to_lowercase();
        self.packages
            .iter()
            .filter(|p| p.name.to_lowercase().contains(&term))
            .filter(|p| !self.only_debuggable || p.debuggable == Debuggable::Yes)
            .take(self.render_limit)
            .collect()
    }

    /// Visible packages whose debuggable flag has not been resolved yet.
    pub fn unresolved_visible(&self) -> Vec<String> {
        self.visible()
            .into_iter()
            .filter(|p| p.debuggable == Debuggable::Unknown)
            .map(|p| p.name.clone())
            .collect()
    }

    /// Record a resolved flag. Returns false when the package is not listed.
    pub fn set_debuggable(&mut self, name: &str, debuggable: bool) -> bool {
        match self.packages.iter_mut().find(|p| p.name == name) {
            Some(entry) => {
                entry.debuggable = debuggable.into();
                true
            }
            None => false,
        }
    }
}
