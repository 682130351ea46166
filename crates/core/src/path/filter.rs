use std::sync::Arc;

/// User-supplied predicate deciding whether a root takes part in the scan.
pub trait RootFilter: Send + Sync {
    fn include_root(&self, path: &str) -> bool;
}

impl<F> RootFilter for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn include_root(&self, path: &str) -> bool {
        self(path)
    }
}

/// A path passes only if every filter accepts it. No filters accepts everything.
pub fn passes_filters(path: &str, filters: &[Arc<dyn RootFilter>]) -> bool {
    filters.iter().all(|filter| filter.include_root(path))
}

/// Check the raw form, and the resolved form when it differs. Filters may be
/// written against either representation, so either rejection rejects.
pub fn passes_filters_both(raw: &str, resolved: &str, filters: &[Arc<dyn RootFilter>]) -> bool {
    passes_filters(raw, filters) && (raw == resolved || passes_filters(resolved, filters))
}
