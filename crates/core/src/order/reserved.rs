use std::collections::HashSet;

/// Canonical roots owned by the runtime itself (JRE `rt.jar`, `lib/ext` jars).
///
/// Built once per scan session and handed to every [`RootOrder`](super::RootOrder)
/// of that session. Reserved roots are surfaced through
/// [`RootOrder::add_system_root`](super::RootOrder::add_system_root) only, so
/// loaders that also report them do not duplicate them.
#[derive(Debug, Clone, Default)]
pub struct ReservedRoots {
    roots: HashSet<String>,
}

impl ReservedRoots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_canonical<I, S>(roots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
        }
    }

    pub fn insert(&mut self, canonical: impl Into<String>) -> bool {
        self.roots.insert(canonical.into())
    }

    pub fn contains(&self, canonical: &str) -> bool {
        self.roots.contains(canonical)
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.roots.iter().map(String::as_str)
    }
}
