use crate::policy::{PathRules, ScanPolicy};
use crate::pool::ReaderPool;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Scan settings, loadable from JSON. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Dotted package names whose resources are accepted.
    pub accept_packages: Vec<String>,
    pub reject_packages: Vec<String>,
    /// `/`-separated directory paths whose resources are accepted.
    pub accept_paths: Vec<String>,
    pub reject_paths: Vec<String>,
    /// Fully qualified class names accepted without their whole package.
    pub accept_classes: Vec<String>,
    /// Whole resource paths, `*` as wildcard. A container holding a
    /// rejected one is skipped entirely.
    pub accept_resource_paths: Vec<String>,
    pub reject_resource_paths: Vec<String>,
    /// Upper bound on containers held open by the reader pool.
    pub max_containers: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            accept_packages: Vec::new(),
            reject_packages: Vec::new(),
            accept_paths: Vec::new(),
            reject_paths: Vec::new(),
            accept_classes: Vec::new(),
            accept_resource_paths: Vec::new(),
            reject_resource_paths: Vec::new(),
            max_containers: ReaderPool::DEFAULT_CAPACITY,
        }
    }
}

impl ScanConfig {
    pub fn from_json_str(json: &str) -> crate::Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    fn validate(&self) -> crate::Result<()> {
        if self.max_containers == 0 {
            return Err(crate::RootscopeError::Config(
                "max_containers must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Build the policy these settings describe.
    pub fn policy(&self) -> crate::Result<ScanPolicy> {
        let rules = PathRules::new(
            self.accept_resource_paths.iter().map(String::as_str),
            self.reject_resource_paths.iter().map(String::as_str),
        )?;

        let mut policy = ScanPolicy::default().with_resource_rules(rules);
        for package in &self.accept_packages {
            policy = policy.accept_package(package);
        }
        for package in &self.reject_packages {
            policy = policy.reject_package(package);
        }
        for path in &self.accept_paths {
            policy = policy.accept_path(path);
        }
        for path in &self.reject_paths {
            policy = policy.reject_path(path);
        }
        for class_name in &self.accept_classes {
            policy = policy.accept_class(class_name);
        }
        Ok(policy)
    }
}
