/// Delimiter between entries of a platform path list.
#[cfg(windows)]
pub const PATH_LIST_DELIMITER: char = ';';
#[cfg(not(windows))]
pub const PATH_LIST_DELIMITER: char = ':';

/// URL schemes whose `:` must not be taken for a path-list delimiter.
const PROTECTED_SCHEMES: &[&str] = &[
    "file", "jar", "jrt", "http", "https", "zip", "wsjar", "vfs", "vfszip", "bundle",
    "bundleresource",
];

/// Split a delimited path list.
///
/// The delimiter does not split inside double quotes or `[...]` brackets, nor
/// right after a URL scheme such as `file:` or `jar:file:`, nor inside the
/// `host:port` authority of a URL such as `http://host:8080/`. Quotes are removed,
/// pieces are trimmed and empty pieces are dropped.
pub fn split_path_list(list: &str, delimiter: char) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut bracket_depth = 0usize;

    for c in list.chars() {
        if c == '"' {
            in_quotes = !in_quotes;
            continue;
        }
        if !in_quotes {
            match c {
                '[' => bracket_depth += 1,
                ']' => bracket_depth = bracket_depth.saturating_sub(1),
                _ => {}
            }
        }

        let splits = c == delimiter
            && !in_quotes
            && bracket_depth == 0
            && !(delimiter == ':' && (is_scheme_chain(&current) || in_url_authority(&current)));
        if splits {
            push_piece(&mut pieces, &mut current);
        } else {
            current.push(c);
        }
    }
    push_piece(&mut pieces, &mut current);
    pieces
}

/// True when `piece` consists only of known schemes, e.g. `jar` or `jar:file`.
fn is_scheme_chain(piece: &str) -> bool {
    let piece = piece.trim();
    !piece.is_empty()
        && piece.split(':').all(|scheme| {
            PROTECTED_SCHEMES
                .iter()
                .any(|known| known.eq_ignore_ascii_case(scheme))
        })
}

/// True while `piece` is a known `scheme://` whose authority has not ended.
fn in_url_authority(piece: &str) -> bool {
    let piece = piece.trim();
    let Some(end) = piece.find("://") else {
        return false;
    };
    is_scheme_chain(&piece[..end]) && !piece[end + 3..].contains('/')
}

fn push_piece(pieces: &mut Vec<String>, current: &mut String) {
    let piece = current.trim();
    if !piece.is_empty() {
        pieces.push(piece.to_string());
    }
    current.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_split() {
        assert_eq!(
            split_path_list("/a/x.jar:/b/classes::/c", ':'),
            vec!["/a/x.jar", "/b/classes", "/c"]
        );
    }

    #[test]
    fn test_url_schemes_are_not_delimiters() {
        assert_eq!(
            split_path_list("file:/a/x.jar:jar:file:/b/y.jar!/lib/z.jar:http://host/q.jar", ':'),
            vec![
                "file:/a/x.jar",
                "jar:file:/b/y.jar!/lib/z.jar",
                "http://host/q.jar"
            ]
        );
    }

    #[test]
    fn test_url_ports_are_not_delimiters() {
        assert_eq!(
            split_path_list("http://host:8080/a.jar:/b.jar", ':'),
            vec!["http://host:8080/a.jar", "/b.jar"]
        );
        assert_eq!(
            split_path_list("jar:https://repo:443/x.jar!/y.jar:file:///c.jar", ':'),
            vec!["jar:https://repo:443/x.jar!/y.jar", "file:///c.jar"]
        );
    }

    #[test]
    fn test_quoted_and_bracketed_pieces() {
        assert_eq!(
            split_path_list("\"/odd:dir/a.jar\":/b[1:2]/c:/d", ':'),
            vec!["/odd:dir/a.jar", "/b[1:2]/c", "/d"]
        );
    }

    #[test]
    fn test_semicolon_delimiter() {
        assert_eq!(
            split_path_list("C:\\lib\\a.jar; D:/b.jar;", ';'),
            vec!["C:\\lib\\a.jar", "D:/b.jar"]
        );
    }

    #[test]
    fn test_empty_list() {
        assert!(split_path_list("", ':').is_empty());
        assert!(split_path_list(" : :", ':').is_empty());
    }
}
