//! JDK discovery.
//!
//! Locates a Java home from:
//! - the JAVA_HOME environment variable
//! - the macOS java_home tool
//! - `java -XshowSettings:properties`
//! - common installation paths and SDKMAN
//!
//! and derives from it the reserved system roots of a Java 8 layout, or the
//! platform modules of a Java 9+ layout.

use crate::reader::JimageReader;
use rootscope_core::path::resolve;
use rootscope_core::reader::ModuleRef;
use rootscope_core::{ContainerError, ReservedRoots};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Whether `home` looks like a JDK or JRE installation.
pub fn is_java_home(home: &Path) -> bool {
    home.join("lib").join("modules").exists()
        || home.join("jmods").is_dir()
        || home.join("lib").join("rt.jar").exists()
        || home.join("jre").join("lib").join("rt.jar").exists()
}

pub fn find_java_home() -> Option<PathBuf> {
    // 1. JAVA_HOME
    if let Some(home) = home_from_env(std::env::var_os("JAVA_HOME")) {
        return Some(home);
    }

    // 2. macOS java_home utility
    #[cfg(target_os = "macos")]
    {
        if let Ok(output) = Command::new("/usr/libexec/java_home").output() {
            if output.status.success() {
                let path_str = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !path_str.is_empty() && is_java_home(Path::new(&path_str)) {
                    return Some(PathBuf::from(path_str));
                }
            }
        }
    }

    // 3. Ask the java launcher; properties are printed on stderr
    if let Ok(output) = Command::new("java")
        .arg("-XshowSettings:properties")
        .arg("-version")
        .output()
    {
        let stderr = String::from_utf8_lossy(&output.stderr);
        if let Some(home) = parse_java_home_property(&stderr) {
            if is_java_home(&home) {
                return Some(home);
            }
        }
    }

    // 4. Common installation paths
    search_roots()
        .into_iter()
        .filter(|root| root.exists())
        .find_map(|root| find_in_search_root(&root))
}

/// The `JAVA_HOME` value, when it names a Java home.
fn home_from_env(value: Option<OsString>) -> Option<PathBuf> {
    let home = PathBuf::from(value.filter(|value| !value.is_empty())?);
    is_java_home(&home).then_some(home)
}

fn parse_java_home_property(settings: &str) -> Option<PathBuf> {
    settings.lines().find_map(|line| {
        line.trim()
            .strip_prefix("java.home = ")
            .map(|path| PathBuf::from(path.trim()))
    })
}

fn search_roots() -> Vec<PathBuf> {
    let mut roots = Vec::new();

    #[cfg(target_os = "macos")]
    {
        roots.push(PathBuf::from("/Library/Java/JavaVirtualMachines/"));
        roots.push(PathBuf::from("/opt/homebrew/opt/openjdk/"));
        roots.push(PathBuf::from("/usr/local/opt/openjdk/"));
    }
    #[cfg(target_os = "linux")]
    {
        roots.push(PathBuf::from("/usr/lib/jvm/"));
    }
    #[cfg(target_os = "windows")]
    {
        roots.push(PathBuf::from("C:\\Program Files\\Java\\"));
    }

    if let Some(mut sdkman) = dirs::home_dir() {
        sdkman.push(".sdkman/candidates/java/");
        roots.push(sdkman);
    }
    roots
}

/// The root itself when it is a Java home, else its first child that is one.
fn find_in_search_root(root: &Path) -> Option<PathBuf> {
    if is_java_home(root) {
        return Some(root.to_path_buf());
    }
    let mut children: Vec<PathBuf> = std::fs::read_dir(root)
        .ok()?
        .flatten()
        .map(|entry| entry.path())
        .collect();
    children.sort();
    children.into_iter().find_map(|child| {
        let bundle_home = child.join("Contents/Home");
        let home = if bundle_home.is_dir() { bundle_home } else { child };
        is_java_home(&home).then_some(home)
    })
}

/// `JAVA_VERSION` from the `release` file of a Java home.
pub fn java_version(home: &Path) -> Option<String> {
    let content = std::fs::read_to_string(home.join("release")).ok()?;
    content.lines().find_map(|line| {
        line.strip_prefix("JAVA_VERSION=")
            .map(|version| version.trim_matches('"').to_string())
    })
}

/// Canonical paths of the runtime jars of a Java 8 layout: `rt.jar` and
/// `ext/*.jar`, under both `lib/` and `jre/lib/`.
pub fn system_roots(home: &Path) -> ReservedRoots {
    let base = std::env::current_dir()
        .map(|cwd| cwd.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut reserved = ReservedRoots::new();

    for lib in [home.join("lib"), home.join("jre").join("lib")] {
        let rt = lib.join("rt.jar");
        if rt.is_file() {
            reserved.insert(resolve(&base, &rt.to_string_lossy()));
        }

        let Ok(entries) = std::fs::read_dir(lib.join("ext")) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "jar") {
                reserved.insert(resolve(&base, &path.to_string_lossy()));
            }
        }
    }

    debug!("Found {} system roots under {}", reserved.len(), home.display());
    reserved
}

/// Platform modules of a Java 9+ layout, sorted by name.
///
/// Modules come from `jmods/*.jmod` when present, otherwise from the runtime
/// image `lib/modules`. A Java 8 layout has none.
pub fn system_modules(home: &Path) -> Result<Vec<ModuleRef>, ContainerError> {
    let jmods = home.join("jmods");
    if jmods.is_dir() {
        let mut modules: Vec<ModuleRef> = std::fs::read_dir(&jmods)?
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "jmod"))
            .filter_map(|path| {
                let name = path.file_stem()?.to_string_lossy().into_owned();
                Some(ModuleRef::new(name).with_file(path))
            })
            .collect();
        modules.sort_by(|a, b| a.name().cmp(b.name()));
        return Ok(modules);
    }

    let image = home.join("lib").join("modules");
    if image.is_file() {
        return Ok(JimageReader::module_names(&image)?
            .into_iter()
            .map(|name| ModuleRef::new(name).in_image(&image))
            .collect());
    }

    Ok(Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn make_home(home: &Path) {
        fs::create_dir_all(home.join("jmods")).unwrap();
    }

    #[test]
    fn test_home_from_env() {
        let dir = tempdir().unwrap();
        assert_eq!(home_from_env(Some(dir.path().into())), None);

        make_home(dir.path());
        assert_eq!(
            home_from_env(Some(dir.path().into())),
            Some(dir.path().to_path_buf())
        );
        assert_eq!(home_from_env(Some(OsString::new())), None);
        assert_eq!(home_from_env(None), None);
    }

    #[test]
    fn test_search_root_that_is_a_home() {
        let root = tempdir().unwrap();
        make_home(root.path());
        assert_eq!(
            find_in_search_root(root.path()),
            Some(root.path().to_path_buf())
        );
    }

    #[test]
    fn test_search_root_children_and_bundles() {
        let root = tempdir().unwrap();
        fs::create_dir_all(root.path().join("aaa-not-a-jdk/bin")).unwrap();
        let bundle = root.path().join("jdk-21.jdk/Contents/Home");
        make_home(&bundle);
        make_home(&root.path().join("zulu-17"));

        assert_eq!(find_in_search_root(root.path()), Some(bundle));
    }

    #[test]
    fn test_search_root_without_homes() {
        let root = tempdir().unwrap();
        fs::create_dir_all(root.path().join("docs")).unwrap();
        assert_eq!(find_in_search_root(root.path()), None);
        assert_eq!(find_in_search_root(&root.path().join("missing")), None);
    }

    #[test]
    fn test_parse_java_home_property() {
        let settings = "Property settings:\n    java.class.path = \n    java.home = /opt/jdk-21\n    java.vendor = Acme\n";
        assert_eq!(
            parse_java_home_property(settings),
            Some(PathBuf::from("/opt/jdk-21"))
        );
        assert_eq!(parse_java_home_property("openjdk version \"21\""), None);
    }
}
