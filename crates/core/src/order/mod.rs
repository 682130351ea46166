//! Ordered, duplicate-free collection of search-path roots.
//!
//! A [`RootOrder`] is populated by one writer during path discovery, then
//! [frozen](RootOrder::freeze) into a [`FrozenOrder`] that scan workers share
//! read-only. Insertion order is scan priority: the first loader to report a
//! root owns it, later reports of the same root change nothing.

pub mod reserved;
pub mod value;

pub use reserved::ReservedRoots;
pub use value::PathValue;

use crate::path::{PATH_LIST_DELIMITER, RootFilter, passes_filters_both, resolve, split_path_list};
use indexmap::IndexMap;
use indexmap::map::Entry;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Opaque identifier of the discovery mechanism that surfaced a root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LoaderId(Arc<str>);

impl LoaderId {
    pub fn new(name: &str) -> Self {
        Self(Arc::from(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for LoaderId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for LoaderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The loader contexts that discovered a root, in discovery order.
pub type LoaderHandles = Arc<[LoaderId]>;

/// Build a [`LoaderHandles`] list from loader names.
pub fn loader_handles<'a>(names: impl IntoIterator<Item = &'a str>) -> LoaderHandles {
    names.into_iter().map(LoaderId::new).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootOrigin {
    Ordinary,
    /// A reserved runtime root added on purpose through `add_system_root`.
    System,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Root {
    pub path: String,
    pub handles: LoaderHandles,
    pub origin: RootOrigin,
}

enum RootSpec<'a> {
    Plain(&'a str),
    Wildcard { base: &'a str },
    MalformedWildcard,
}

fn classify(raw: &str) -> RootSpec<'_> {
    let Some(prefix) = raw.strip_suffix('*') else {
        return RootSpec::Plain(raw);
    };
    if prefix.is_empty() {
        return RootSpec::Wildcard { base: "" };
    }
    let base = prefix
        .strip_suffix('/')
        .or_else(|| cfg!(windows).then(|| prefix.strip_suffix('\\')).flatten());
    match base {
        Some("") => RootSpec::Wildcard { base: "/" },
        Some(base) => RootSpec::Wildcard { base },
        None => RootSpec::MalformedWildcard,
    }
}

/// Builder of the unique, ordered roots of one scan session.
pub struct RootOrder {
    base_dir: String,
    delimiter: char,
    reserved: Arc<ReservedRoots>,
    filters: Vec<Arc<dyn RootFilter>>,
    roots: IndexMap<String, Root>,
}

impl RootOrder {
    /// `base_dir` anchors relative roots.
    pub fn new(base_dir: impl Into<String>, reserved: Arc<ReservedRoots>) -> Self {
        Self {
            base_dir: base_dir.into(),
            delimiter: PATH_LIST_DELIMITER,
            reserved,
            filters: Vec::new(),
            roots: IndexMap::new(),
        }
    }

    /// Anchor relative roots at the process working directory.
    pub fn from_current_dir(reserved: Arc<ReservedRoots>) -> crate::Result<Self> {
        let cwd = std::env::current_dir()?;
        Ok(Self::new(cwd.to_string_lossy(), reserved))
    }

    pub fn with_filter(mut self, filter: impl RootFilter + 'static) -> Self {
        self.filters.push(Arc::new(filter));
        self
    }

    pub fn with_filters(mut self, filters: impl IntoIterator<Item = Arc<dyn RootFilter>>) -> Self {
        self.filters.extend(filters);
        self
    }

    /// Override the path-list delimiter used by [`add_delimited_roots`](Self::add_delimited_roots).
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn base_dir(&self) -> &str {
        &self.base_dir
    }

    /// Add one raw root, expanding a trailing `*` wildcard segment.
    ///
    /// Returns false for empty input, filtered-out roots, duplicates and
    /// malformed wildcards. A wildcard returns true when its base directory
    /// could be listed, even if every entry turned out to be a duplicate.
    pub fn add_root(&mut self, raw: &str, handles: &LoaderHandles) -> bool {
        let raw = raw.trim();
        if raw.is_empty() {
            return false;
        }
        match classify(raw) {
            RootSpec::Plain(path) => self.add_plain(path, handles),
            RootSpec::Wildcard { base } => self.add_wildcard(raw, base, handles),
            RootSpec::MalformedWildcard => {
                warn!(
                    "Wildcard roots can only end with a leaf of \"*\", can't have a partial name and then a wildcard: {}",
                    raw
                );
                false
            }
        }
    }

    fn add_plain(&mut self, path: &str, handles: &LoaderHandles) -> bool {
        let resolved = resolve(&self.base_dir, path);
        if !passes_filters_both(path, &resolved, &self.filters) {
            debug!("Root did not match filter criterion, skipping: {} -> {}", path, resolved);
            return false;
        }
        if self.add_resolved(&resolved, handles) {
            debug!("Found root: {} -> {}", path, resolved);
            true
        } else {
            debug!("Ignoring duplicate root: {} -> {}", path, resolved);
            false
        }
    }

    fn add_wildcard(&mut self, raw: &str, base: &str, handles: &LoaderHandles) -> bool {
        let resolved_base = resolve(&self.base_dir, base);
        if !passes_filters_both(base, &resolved_base, &self.filters) {
            debug!("Root did not match filter criterion, skipping: {}", raw);
            return false;
        }

        let dir = Path::new(&resolved_base);
        if !dir.exists() {
            warn!("Directory does not exist for wildcard root: {}", raw);
            return false;
        }
        if !dir.is_dir() {
            warn!("Wildcard is appended to something other than a directory: {}", raw);
            return false;
        }
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Cannot read directory for wildcard root {}: {}", raw, e);
                return false;
            }
        };

        debug!("Adding roots from wildcarded directory: {}", raw);
        for entry in entries.flatten() {
            let name = entry.file_name();
            if name == "." || name == ".." {
                continue;
            }
            let entry_path = entry.path().to_string_lossy().into_owned();
            let resolved = resolve(&self.base_dir, &entry_path);
            if self.add_resolved(&resolved, handles) {
                debug!("Found root: {}", resolved);
            } else {
                debug!("Ignoring duplicate root: {}", resolved);
            }
        }
        true
    }

    /// Insert an already-canonical root. Reserved system roots are rejected.
    pub(crate) fn add_resolved(&mut self, canonical: &str, handles: &LoaderHandles) -> bool {
        if self.reserved.contains(canonical) {
            debug!("Ignoring reserved system root: {}", canonical);
            return false;
        }
        self.insert(canonical, handles, RootOrigin::Ordinary)
    }

    /// Insert a reserved runtime root, bypassing the reserved-set rejection.
    pub fn add_system_root(&mut self, canonical: &str, handles: &LoaderHandles) -> bool {
        self.insert(canonical, handles, RootOrigin::System)
    }

    fn insert(&mut self, canonical: &str, handles: &LoaderHandles, origin: RootOrigin) -> bool {
        match self.roots.entry(canonical.to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(Root {
                    path: canonical.to_string(),
                    handles: handles.clone(),
                    origin,
                });
                true
            }
        }
    }

    /// Add every root of a delimited path list.
    ///
    /// Returns false only when the list is empty or splits into nothing.
    pub fn add_delimited_roots(&mut self, list: &str, handles: &LoaderHandles) -> bool {
        let pieces = split_path_list(list, self.delimiter);
        if pieces.is_empty() {
            return false;
        }
        for piece in &pieces {
            self.add_root(piece, handles);
        }
        true
    }

    /// Add roots from a dynamically-typed discovery value.
    pub fn add_dynamic(&mut self, value: &PathValue, handles: &LoaderHandles) -> bool {
        match value {
            PathValue::Path(list) => self.add_delimited_roots(list, handles),
            PathValue::Sequence(items) => {
                let mut valid = false;
                for item in items {
                    valid |= self.add_dynamic(item, handles);
                }
                valid
            }
            PathValue::Opaque(value) => self.add_delimited_roots(&value.to_string(), handles),
        }
    }

    /// Append the roots of `other`, in its order, after this order's roots.
    ///
    /// Each root keeps the handles recorded in `other`. Returns true if at
    /// least one root was not already present.
    pub fn merge(&mut self, other: &RootOrder) -> bool {
        let mut added = false;
        for root in other.roots.values() {
            added |= match root.origin {
                RootOrigin::Ordinary => self.add_resolved(&root.path, &root.handles),
                RootOrigin::System => self.add_system_root(&root.path, &root.handles),
            };
        }
        added
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn contains(&self, canonical: &str) -> bool {
        self.roots.contains_key(canonical)
    }

    pub fn get(&self, canonical: &str) -> Option<&Root> {
        self.roots.get(canonical)
    }

    pub fn handles(&self, canonical: &str) -> Option<&LoaderHandles> {
        self.roots.get(canonical).map(|root| &root.handles)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Root> {
        self.roots.values()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.roots.keys().map(String::as_str)
    }

    /// End population. The snapshot is shared read-only with scan workers.
    pub fn freeze(self) -> FrozenOrder {
        FrozenOrder {
            roots: Arc::new(self.roots),
        }
    }
}

impl fmt::Debug for RootOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RootOrder")
            .field("base_dir", &self.base_dir)
            .field("filters", &self.filters.len())
            .field("roots", &self.roots.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Immutable snapshot of a [`RootOrder`].
#[derive(Debug, Clone)]
pub struct FrozenOrder {
    roots: Arc<IndexMap<String, Root>>,
}

impl FrozenOrder {
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn get(&self, canonical: &str) -> Option<&Root> {
        self.roots.get(canonical)
    }

    /// Position of a root in scan priority order.
    pub fn position(&self, canonical: &str) -> Option<usize> {
        self.roots.get_index_of(canonical)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Root> {
        self.roots.values()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.roots.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order() -> RootOrder {
        RootOrder::new("/work", Arc::new(ReservedRoots::new())).with_delimiter(':')
    }

    #[test]
    fn test_classify_wildcards() {
        assert!(matches!(classify("*"), RootSpec::Wildcard { base: "" }));
        assert!(matches!(classify("lib/*"), RootSpec::Wildcard { base: "lib" }));
        assert!(matches!(classify("/*"), RootSpec::Wildcard { base: "/" }));
        assert!(matches!(classify("lib/foo*"), RootSpec::MalformedWildcard));
        assert!(matches!(classify("lib/a.jar"), RootSpec::Plain("lib/a.jar")));
    }

    #[test]
    fn test_duplicate_keeps_first_handles() {
        let mut order = order();
        let app = loader_handles(["app"]);
        let ext = loader_handles(["ext"]);

        assert!(order.add_root("lib/a.jar", &app));
        assert!(!order.add_root("/work/lib/./a.jar", &ext));

        assert_eq!(order.len(), 1);
        assert_eq!(order.handles("/work/lib/a.jar").unwrap()[0].as_str(), "app");
    }

    #[test]
    fn test_reserved_roots_rejected_unless_system() {
        let reserved = Arc::new(ReservedRoots::from_canonical(["/jre/lib/rt.jar"]));
        let mut order = RootOrder::new("/work", reserved);
        let handles = loader_handles(["boot"]);

        assert!(!order.add_root("/jre/lib/rt.jar", &handles));
        assert!(order.is_empty());

        assert!(order.add_system_root("/jre/lib/rt.jar", &handles));
        assert_eq!(order.get("/jre/lib/rt.jar").unwrap().origin, RootOrigin::System);
    }

    #[test]
    fn test_malformed_wildcard_adds_nothing() {
        let mut order = order();
        assert!(!order.add_root("/work/lib/foo*", &loader_handles(["app"])));
        assert!(order.is_empty());
    }

    #[test]
    fn test_empty_input() {
        let mut order = order();
        let handles = loader_handles(["app"]);
        assert!(!order.add_root("", &handles));
        assert!(!order.add_root("   ", &handles));
        assert!(!order.add_delimited_roots("", &handles));
        assert!(!order.add_delimited_roots("::", &handles));
    }
}
