use tracing::debug;
use url::Url;

/// Separates an outer archive path from the path of an archive nested inside it.
pub const NESTED_MARKER: &str = "!/";

/// Resolve `raw` against `base` into canonical form.
///
/// Separators are unified to `/`, `.` and `..` segments are collapsed, and
/// relative paths are anchored at `base`. `jar:` prefixes are stripped and
/// `file:` URLs are converted to local paths. Each `!/`-separated segment of a
/// nested archive path is normalized on its own. Any other URI, such as
/// `http:`, `jrt:` or `vfs:`, is returned unchanged.
pub fn resolve(base: &str, raw: &str) -> String {
    let raw = raw.trim();
    let mut rest = raw;
    while let Some(inner) = strip_prefix_ignore_case(rest, "jar:") {
        rest = inner;
    }

    match parse_uri(rest) {
        Some(url) if url.scheme() == "file" => resolve_file_url(base, raw, rest, &url),
        Some(_) => raw.to_string(),
        None => resolve_path(base, rest),
    }
}

/// An absolute URI. One-letter schemes are drive letters, not URIs.
fn parse_uri(s: &str) -> Option<Url> {
    Url::parse(s).ok().filter(|url| url.scheme().len() > 1)
}

fn resolve_file_url(base: &str, raw: &str, spelled: &str, url: &Url) -> String {
    // `file:lib/a.jar` names a relative path, not `/lib/a.jar`
    let after_scheme = &spelled["file:".len()..];
    if !after_scheme.starts_with('/') {
        return resolve_path(base, after_scheme);
    }
    match url.to_file_path() {
        Ok(path) => resolve_path(base, &path.to_string_lossy()),
        Err(()) => {
            debug!("Keeping non-local file URL as is: {}", raw);
            raw.to_string()
        }
    }
}

fn resolve_path(base: &str, path: &str) -> String {
    let unified = path.replace('\\', "/");
    let mut segments = unified.split(NESTED_MARKER);
    let first = segments.next().unwrap_or_default();
    let mut resolved = anchor(base, first);
    for nested in segments {
        let nested = collapse(nested);
        if nested.is_empty() || nested == "." {
            continue;
        }
        resolved.push_str(NESTED_MARKER);
        resolved.push_str(nested.trim_start_matches('/'));
    }
    resolved
}

/// Normalize a path inside a container: `/`-separated, relative, no `.`/`..`
/// segments. Returns an empty string for the container root.
pub fn sanitize_entry_path(path: &str) -> String {
    let collapsed = collapse(&path.replace('\\', "/"));
    match collapsed.trim_start_matches('/') {
        "." => String::new(),
        rest => rest.to_string(),
    }
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &s[prefix.len()..])
}

fn anchor(base: &str, path: &str) -> String {
    if split_root(path).0.is_some() {
        return collapse(path);
    }
    let base = base.replace('\\', "/");
    if base.is_empty() {
        return collapse(path);
    }
    if path.is_empty() {
        return collapse(&base);
    }
    collapse(&format!("{base}/{path}"))
}

/// Returns the root prefix (`/` or `C:/`) and the remainder.
fn split_root(path: &str) -> (Option<String>, &str) {
    if let Some(rest) = path.strip_prefix('/') {
        return (Some("/".to_string()), rest);
    }
    let bytes = path.as_bytes();
    if bytes.len() >= 2
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes.len() == 2 || bytes[2] == b'/')
    {
        let drive = format!("{}:/", (bytes[0] as char).to_ascii_uppercase());
        return (Some(drive), path.get(3..).unwrap_or_default());
    }
    (None, path)
}

fn collapse(path: &str) -> String {
    let (root, rest) = split_root(path);
    let mut parts: Vec<&str> = Vec::new();
    for part in rest.split('/') {
        match part {
            "" | "." => {}
            ".." => match parts.last() {
                Some(last) if *last != ".." => {
                    parts.pop();
                }
                // `..` above an absolute root stays at the root
                _ if root.is_some() => {}
                _ => parts.push(".."),
            },
            part => parts.push(part),
        }
    }

    let joined = parts.join("/");
    match root {
        Some(mut root) => {
            root.push_str(&joined);
            root
        }
        None if joined.is_empty() => ".".to_string(),
        None => joined,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_dot_segments() {
        assert_eq!(resolve("/base", "a/./b/../c"), "/base/a/c");
        assert_eq!(resolve("/base", "/x//y/"), "/x/y");
        assert_eq!(resolve("/b", "../../x"), "/x");
    }

    #[test]
    fn test_unifies_separators() {
        assert_eq!(resolve("/base", "lib\\a.jar"), "/base/lib/a.jar");
        assert_eq!(resolve("/base", "c:\\tools\\x.jar"), "C:/tools/x.jar");
    }

    #[test]
    fn test_empty_path_resolves_to_base() {
        assert_eq!(resolve("/base/dir/", ""), "/base/dir");
        assert_eq!(resolve("", "a/.."), ".");
    }

    #[test]
    fn test_strips_url_schemes() {
        assert_eq!(resolve("/base", "file:/tmp/x%20y.jar"), "/tmp/x y.jar");
        assert_eq!(resolve("/base", "file:///tmp/a.jar"), "/tmp/a.jar");
        assert_eq!(resolve("/base", "file://localhost/tmp/a.jar"), "/tmp/a.jar");
        assert_eq!(resolve("/base", "FILE:/tmp/./b.jar"), "/tmp/b.jar");
        assert_eq!(resolve("/base", "file:lib/a.jar"), "/base/lib/a.jar");
    }

    #[cfg(unix)]
    #[test]
    fn test_file_url_with_host_keeps_authority() {
        let url = "file://fileserver/share/x.jar";
        assert_eq!(resolve("/base", url), url);
    }

    #[test]
    fn test_decodes_nested_segments_of_file_urls() {
        assert_eq!(
            resolve("/base", "jar:file:/my%20app.jar!/lib/dep%201.jar"),
            "/my app.jar!/lib/dep 1.jar"
        );
    }

    #[test]
    fn test_nested_archive_segments() {
        assert_eq!(
            resolve("/base", "jar:file:/a/b.jar!/BOOT-INF/./lib/c.jar"),
            "/a/b.jar!/BOOT-INF/lib/c.jar"
        );
        assert_eq!(resolve("/base", "lib/b.jar!/"), "/base/lib/b.jar");
    }

    #[test]
    fn test_other_uris_untouched() {
        let url = "https://repo.example.com/lib/../a.jar";
        assert_eq!(resolve("/base", url), url);
        assert_eq!(resolve("/work", "jrt:/java.base"), "jrt:/java.base");
        assert_eq!(resolve("/work", "vfs:/content/app.war"), "vfs:/content/app.war");
        assert_eq!(resolve("/work", "jar:jrt:/java.base"), "jar:jrt:/java.base");
    }

    #[test]
    fn test_sanitize_entry_path() {
        assert_eq!(sanitize_entry_path("/com//example/./Foo.class"), "com/example/Foo.class");
        assert_eq!(sanitize_entry_path("a\\..\\b.txt"), "b.txt");
        assert_eq!(sanitize_entry_path("./"), "");
        assert_eq!(sanitize_entry_path("/"), "");
    }
}
