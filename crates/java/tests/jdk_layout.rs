use rootscope_core::order::loader_handles;
use rootscope_core::path::resolve;
use rootscope_core::RootOrder;
use rootscope_java::jdk;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;

fn canonical(path: &Path) -> String {
    resolve("/", &path.to_string_lossy())
}

#[test]
fn test_java8_layout_reserves_runtime_jars() {
    let home = tempdir().unwrap();
    let lib = home.path().join("jre/lib");
    fs::create_dir_all(lib.join("ext")).unwrap();
    fs::write(lib.join("rt.jar"), b"").unwrap();
    fs::write(lib.join("ext/localedata.jar"), b"").unwrap();
    fs::write(lib.join("ext/README.txt"), b"").unwrap();
    fs::write(home.path().join("release"), "JAVA_VERSION=\"1.8.0_402\"\n").unwrap();

    assert!(jdk::is_java_home(home.path()));
    assert_eq!(jdk::java_version(home.path()).as_deref(), Some("1.8.0_402"));

    let reserved = jdk::system_roots(home.path());
    assert_eq!(reserved.len(), 2);
    let rt = canonical(&lib.join("rt.jar"));
    assert!(reserved.contains(&rt));

    let boot = loader_handles(["boot"]);
    let mut order = RootOrder::new("/work", Arc::new(reserved));
    assert!(!order.add_root(&rt, &boot));
    assert!(order.add_system_root(&rt, &boot));
    assert!(jdk::system_modules(home.path()).unwrap().is_empty());
}

#[test]
fn test_jmods_become_modules() {
    let home = tempdir().unwrap();
    let jmods = home.path().join("jmods");
    fs::create_dir_all(&jmods).unwrap();
    for name in ["java.sql", "java.base", "notes.txt"] {
        let file = if name.ends_with(".txt") {
            name.to_string()
        } else {
            format!("{}.jmod", name)
        };
        fs::write(jmods.join(file), b"JM\x01\x00").unwrap();
    }

    assert!(jdk::is_java_home(home.path()));
    assert!(jdk::system_roots(home.path()).is_empty());

    let modules = jdk::system_modules(home.path()).unwrap();
    let names: Vec<&str> = modules.iter().map(|module| module.name()).collect();
    assert_eq!(names, vec!["java.base", "java.sql"]);
    assert!(modules[0].file().unwrap().ends_with("java.base.jmod"));
    assert_ne!(modules[0].key(), modules[1].key());
}

#[test]
fn test_empty_directory_is_not_a_java_home() {
    let home = tempdir().unwrap();
    assert!(!jdk::is_java_home(home.path()));
    assert!(jdk::java_version(home.path()).is_none());
}
