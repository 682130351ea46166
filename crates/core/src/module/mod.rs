//! Per-container resource scanning.
//!
//! A [`ModuleScanner`] walks the listing of one container exactly once,
//! applies the [`ScanPolicy`] to every resource path and reports the accepted
//! resources to a [`ScanSink`] as [`ModuleResource`] handles.

pub mod resource;

pub use resource::{ModuleResource, ResourceStream};

use crate::error::{ContainerError, UsageError};
use crate::path::sanitize_entry_path;
use crate::policy::{PathMatch, ScanPolicy, parent_dir};
use crate::pool::ReaderPool;
use crate::reader::{ContainerKey, ModuleRef};
use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::SystemTime;
use tracing::{debug, warn};

/// Why a container contributed nothing.
#[derive(Debug, Clone)]
pub enum SkipReason {
    /// The reader could not be created or the listing failed.
    Failed(Arc<ContainerError>),
    /// A resource path matched the resource blacklist.
    BlacklistedResource(String),
}

impl SkipReason {
    /// Failures are errors; blacklisting is a policy decision.
    pub fn is_failure(&self) -> bool {
        matches!(self, SkipReason::Failed(_))
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Failed(e) => write!(f, "container failed: {}", e),
            SkipReason::BlacklistedResource(path) => {
                write!(f, "contains blacklisted resource {}", path)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub enum ScanState {
    Unscanned,
    Scanning,
    Scanned,
    Skipped(SkipReason),
}

impl ScanState {
    pub fn is_scanned(&self) -> bool {
        matches!(self, ScanState::Scanned)
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, ScanState::Skipped(_))
    }
}

/// An accepted resource path and the match status of its directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedPath {
    pub path: String,
    pub status: PathMatch,
}

/// Receives the results of a scan.
pub trait ScanSink {
    fn resource_accepted(&mut self, resource: ModuleResource, status: PathMatch);

    fn container_skipped(&mut self, _module: &ModuleRef, _reason: &SkipReason) {}
}

/// Sink that keeps everything it is given.
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub accepted: Vec<(ModuleResource, PathMatch)>,
    pub skipped: Vec<(ModuleRef, SkipReason)>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accepted_paths(&self) -> Vec<&str> {
        self.accepted.iter().map(|(res, _)| res.path()).collect()
    }
}

impl ScanSink for CollectingSink {
    fn resource_accepted(&mut self, resource: ModuleResource, status: PathMatch) {
        self.accepted.push((resource, status));
    }

    fn container_skipped(&mut self, module: &ModuleRef, reason: &SkipReason) {
        self.skipped.push((module.clone(), reason.clone()));
    }
}

#[derive(Debug, Default)]
struct Walk {
    accepted: Vec<AcceptedPath>,
    known: HashSet<String>,
    specifically_whitelisted: bool,
    last_modified: Option<SystemTime>,
    directories_matched: usize,
}

#[derive(Debug)]
enum ScanOutcome {
    Scanned(Walk),
    Skipped(SkipReason),
}

/// Scans one module container.
pub struct ModuleScanner {
    module: Arc<ModuleRef>,
    pool: Arc<ReaderPool>,
    policy: Arc<ScanPolicy>,
    scanned: AtomicBool,
    outcome: OnceLock<ScanOutcome>,
}

impl ModuleScanner {
    pub fn new(module: ModuleRef, pool: Arc<ReaderPool>, policy: Arc<ScanPolicy>) -> Self {
        Self {
            module: Arc::new(module),
            pool,
            policy,
            scanned: AtomicBool::new(false),
            outcome: OnceLock::new(),
        }
    }

    pub fn module(&self) -> &ModuleRef {
        &self.module
    }

    pub fn key(&self) -> ContainerKey {
        self.module.key()
    }

    pub fn state(&self) -> ScanState {
        match self.outcome.get() {
            Some(ScanOutcome::Scanned(_)) => ScanState::Scanned,
            Some(ScanOutcome::Skipped(reason)) => ScanState::Skipped(reason.clone()),
            None if self.scanned.load(Ordering::Acquire) => ScanState::Scanning,
            None => ScanState::Unscanned,
        }
    }

    /// Scan the container and report the outcome to `sink`.
    ///
    /// Only the first call scans; any later call fails with
    /// [`UsageError::AlreadyScanned`].
    pub fn scan(&self, sink: &mut dyn ScanSink) -> crate::Result<ScanState> {
        if self.scanned.swap(true, Ordering::AcqRel) {
            return Err(UsageError::AlreadyScanned(self.module.to_string()).into());
        }

        match self.outcome.get_or_init(|| self.walk()) {
            ScanOutcome::Scanned(walk) => {
                debug!(
                    "Scanned {}: {} accepted of {} resources, {} directories matched",
                    self.module,
                    walk.accepted.len(),
                    walk.known.len(),
                    walk.directories_matched
                );
                for accepted in &walk.accepted {
                    sink.resource_accepted(self.handle(&accepted.path), accepted.status);
                }
                Ok(ScanState::Scanned)
            }
            ScanOutcome::Skipped(reason) => {
                sink.container_skipped(&self.module, reason);
                Ok(ScanState::Skipped(reason.clone()))
            }
        }
    }

    fn walk(&self) -> ScanOutcome {
        let listed = self
            .pool
            .acquire_scoped(&self.module)
            .and_then(|reader| reader.list());
        let mut paths = match listed {
            Ok(paths) => paths,
            Err(e) => {
                warn!("Skipping {}: {}", self.module, e);
                return ScanOutcome::Skipped(SkipReason::Failed(Arc::new(e)));
            }
        };
        paths.sort_unstable();

        let rules = self.policy.resource_rules();
        let mut walk = Walk::default();
        let mut prev: Option<(&str, PathMatch)> = None;

        for path in &paths {
            if path.ends_with('/') {
                continue;
            }

            if !rules.is_empty() {
                if rules.is_blacklisted(path) {
                    debug!("Skipping {}: blacklisted resource {}", self.module, path);
                    return ScanOutcome::Skipped(SkipReason::BlacklistedResource(path.clone()));
                }
                if rules.is_specifically_whitelisted(path) {
                    walk.specifically_whitelisted = true;
                }
            }

            let dir = parent_dir(path);
            let status = match prev {
                Some((prev_dir, status)) if prev_dir == dir => status,
                _ => {
                    walk.directories_matched += 1;
                    self.policy.dir_match(dir)
                }
            };
            prev = Some((dir, status));

            walk.known.insert(path.clone());
            if self.policy.accepts(status, path) {
                walk.accepted.push(AcceptedPath {
                    path: path.clone(),
                    status,
                });
            }
        }

        walk.last_modified = self
            .module
            .file()
            .and_then(|file| std::fs::metadata(file).ok())
            .and_then(|meta| meta.modified().ok());
        ScanOutcome::Scanned(walk)
    }

    fn scanned_walk(&self) -> Option<&Walk> {
        match self.outcome.get() {
            Some(ScanOutcome::Scanned(walk)) => Some(walk),
            _ => None,
        }
    }

    fn handle(&self, path: &str) -> ModuleResource {
        ModuleResource::new(path.to_string(), self.module.clone(), self.pool.clone())
    }

    /// Accepted paths in listing order. Empty unless scanned.
    pub fn accepted(&self) -> &[AcceptedPath] {
        self.scanned_walk()
            .map(|walk| walk.accepted.as_slice())
            .unwrap_or_default()
    }

    /// Every resource path seen, accepted or not.
    pub fn known_paths(&self) -> impl Iterator<Item = &str> {
        self.scanned_walk()
            .into_iter()
            .flat_map(|walk| walk.known.iter().map(String::as_str))
    }

    pub fn contains_specifically_whitelisted(&self) -> bool {
        self.scanned_walk()
            .is_some_and(|walk| walk.specifically_whitelisted)
    }

    /// How many times the policy was asked about a directory. Runs of entries
    /// in one directory ask once.
    pub fn directories_matched(&self) -> usize {
        self.scanned_walk().map_or(0, |walk| walk.directories_matched)
    }

    /// Modification time of the backing file, when it has one.
    pub fn last_modified(&self) -> Option<SystemTime> {
        self.scanned_walk().and_then(|walk| walk.last_modified)
    }

    /// Handle for any resource of the container by relative path, accepted or not.
    pub fn resource(&self, relative: &str) -> Option<ModuleResource> {
        if relative.ends_with('/') {
            return None;
        }
        let path = sanitize_entry_path(relative);
        if path.is_empty() {
            return None;
        }
        let walk = self.scanned_walk()?;
        walk.known.contains(&path).then(|| self.handle(&path))
    }

    /// Fresh handles for every accepted resource.
    pub fn accepted_resources(&self) -> Vec<ModuleResource> {
        self.accepted()
            .iter()
            .map(|accepted| self.handle(&accepted.path))
            .collect()
    }
}

impl fmt::Debug for ModuleScanner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleScanner")
            .field("module", &self.module)
            .field("state", &self.state())
            .finish()
    }
}
