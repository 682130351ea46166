//! Whitelist/blacklist policy applied to resource paths inside containers.
//!
//! Directory-level rules ([`ScanPolicy::dir_match`]) decide which resources are
//! accepted. Whole-path resource rules ([`PathRules`]) decide whether a
//! container is trusted at all.

pub mod rules;

pub use rules::PathRules;

use std::collections::HashSet;

/// Match status of a directory, as `a/b/` or `/` for the container root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathMatch {
    /// The directory or one of its ancestors is blacklisted.
    BlacklistedPrefix,
    /// The directory lies under a whitelisted path.
    WhitelistedPrefix,
    /// The directory is itself a whitelisted path.
    AtWhitelistedPath,
    /// The directory is the package of a specifically whitelisted class.
    AtWhitelistedClassPackage,
    Unmatched,
}

/// Parent directory of a resource path: `a/b/` for `a/b/c.class`, `/` for `c.class`.
pub fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..=idx],
        None => "/",
    }
}

fn to_dir_prefix(path: &str) -> String {
    let trimmed = path.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{trimmed}/")
    }
}

fn package_to_dir_prefix(package: &str) -> String {
    to_dir_prefix(&package.replace('.', "/"))
}

#[derive(Debug, Clone, Default)]
pub struct ScanPolicy {
    accept_prefixes: Vec<String>,
    reject_prefixes: Vec<String>,
    class_packages: HashSet<String>,
    accepted_classfiles: HashSet<String>,
    resource_rules: PathRules,
}

impl ScanPolicy {
    /// Accepts every resource of every container.
    pub fn accept_all() -> Self {
        Self::default()
    }

    /// Accept resources under a `/`-separated directory path.
    pub fn accept_path(mut self, path: &str) -> Self {
        self.accept_prefixes.push(to_dir_prefix(path));
        self
    }

    /// Exclude resources under a `/`-separated directory path.
    pub fn reject_path(mut self, path: &str) -> Self {
        self.reject_prefixes.push(to_dir_prefix(path));
        self
    }

    pub fn accept_package(mut self, package: &str) -> Self {
        self.accept_prefixes.push(package_to_dir_prefix(package));
        self
    }

    pub fn reject_package(mut self, package: &str) -> Self {
        self.reject_prefixes.push(package_to_dir_prefix(package));
        self
    }

    /// Accept one class without accepting the rest of its package.
    pub fn accept_class(mut self, class_name: &str) -> Self {
        let (package, simple) = match class_name.rfind('.') {
            Some(idx) => (&class_name[..idx], &class_name[idx + 1..]),
            None => ("", class_name),
        };
        let package_dir = package_to_dir_prefix(package);
        self.accepted_classfiles
            .insert(format!("{package_dir}{simple}.class"));
        self.class_packages.insert(package_dir);
        self
    }

    pub fn with_resource_rules(mut self, rules: PathRules) -> Self {
        self.resource_rules = rules;
        self
    }

    pub fn resource_rules(&self) -> &PathRules {
        &self.resource_rules
    }

    /// Match status of a directory (`a/b/`, or `/` for the root).
    pub fn dir_match(&self, dir: &str) -> PathMatch {
        let dir = if dir == "/" { "" } else { dir };

        if self.reject_prefixes.iter().any(|p| dir.starts_with(p.as_str())) {
            return PathMatch::BlacklistedPrefix;
        }
        if self.accept_prefixes.is_empty() && self.class_packages.is_empty() {
            // Nothing whitelisted: everything is
            return if dir.is_empty() {
                PathMatch::AtWhitelistedPath
            } else {
                PathMatch::WhitelistedPrefix
            };
        }
        if self.accept_prefixes.iter().any(|p| p == dir) {
            return PathMatch::AtWhitelistedPath;
        }
        if self.class_packages.contains(dir) {
            return PathMatch::AtWhitelistedClassPackage;
        }
        if self.accept_prefixes.iter().any(|p| dir.starts_with(p.as_str())) {
            return PathMatch::WhitelistedPrefix;
        }
        PathMatch::Unmatched
    }

    pub fn classfile_is_specifically_whitelisted(&self, path: &str) -> bool {
        self.accepted_classfiles.contains(path)
    }

    /// Whether a resource whose parent directory has `status` is accepted.
    pub fn accepts(&self, status: PathMatch, path: &str) -> bool {
        match status {
            PathMatch::WhitelistedPrefix | PathMatch::AtWhitelistedPath => true,
            PathMatch::AtWhitelistedClassPackage => self.classfile_is_specifically_whitelisted(path),
            PathMatch::BlacklistedPrefix | PathMatch::Unmatched => false,
        }
    }
}
