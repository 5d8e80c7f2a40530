//! Classpath entries arrive as file paths or URLs and are compared as
//! normalized URL strings ("locators").

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use url::Url;

use crate::error::LocatorError;

/// Turns a raw classpath entry into its normalized locator.
///
/// URLs are parsed and re-serialized, which resolves dot segments. Anything
/// else is a file path: resolved against `base_dir`, cleaned up lexically and
/// turned into a `file:` URL, with a trailing slash for existing directories.
pub fn normalize(base_dir: &Utf8Path, raw: &str) -> Result<String, LocatorError> {
    let raw = raw.trim();

    if looks_like_url(raw) {
        let url = Url::parse(raw).map_err(|e| LocatorError::Malformed(raw.to_string(), e))?;
        return Ok(url.to_string());
    }

    let path = Utf8Path::new(raw);
    let path = match path.is_absolute() {
        true => normalize_path(path),
        false => normalize_path(&base_dir.join(path)),
    };

    let url = match path.is_dir() {
        true => Url::from_directory_path(path.as_std_path()),
        false => Url::from_file_path(path.as_std_path()),
    };

    url.map(String::from)
        .map_err(|()| LocatorError::NotAbsolute(raw.to_string()))
}

/// The file system path behind a `file:` locator.
pub fn to_file_path(locator: &str) -> Option<Utf8PathBuf> {
    let url = Url::parse(locator).ok()?;
    if url.scheme() != "file" {
        return None;
    }
    let path = url.to_file_path().ok()?;
    Utf8PathBuf::from_path_buf(path).ok()
}

/// Single-letter schemes are drive letters, not URLs.
fn looks_like_url(raw: &str) -> bool {
    let Some((scheme, _)) = raw.split_once(':') else {
        return false;
    };

    let mut chars = scheme.chars();
    scheme.len() > 1
        && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Lexically resolves `.` and `..` without touching the file system.
pub(crate) fn normalize_path(path: &Utf8Path) -> Utf8PathBuf {
    let mut components = path.components().peekable();
    let mut ret = match components.peek().cloned() {
        Some(c @ Utf8Component::Prefix(..)) => {
            components.next();
            Utf8PathBuf::from(c.as_str())
        }
        _ => Utf8PathBuf::new(),
    };

    for component in components {
        match component {
            Utf8Component::Prefix(..) => {}
            Utf8Component::RootDir => ret.push(Utf8Component::RootDir),
            Utf8Component::CurDir => {}
            Utf8Component::ParentDir => {
                if ret.ends_with(Utf8Component::ParentDir) || (!ret.pop() && !ret.has_root()) {
                    ret.push(Utf8Component::ParentDir);
                }
            }
            Utf8Component::Normal(c) => ret.push(c),
        }
    }

    ret
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path(Utf8Path::new("/a/./b/../c")), Utf8PathBuf::from("/a/c"));
        assert_eq!(normalize_path(Utf8Path::new("/../a")), Utf8PathBuf::from("/a"));
        assert_eq!(normalize_path(Utf8Path::new("a/../../b")), Utf8PathBuf::from("../b"));
    }

    #[test]
    fn test_url_entries_are_reserialized() {
        let base = Utf8Path::new("/base");
        assert_eq!(
            normalize(base, "http://host/lib/../x.jar").unwrap(),
            "http://host/x.jar"
        );
        assert_eq!(
            normalize(base, "file:///opt/./lib/a.jar").unwrap(),
            "file:///opt/lib/a.jar"
        );
    }

    #[test]
    fn test_relative_paths_use_base_dir() {
        let base = Utf8Path::new("/nonexistent-base");
        assert_eq!(
            normalize(base, "lib/../a.jar").unwrap(),
            "file:///nonexistent-base/a.jar"
        );
        assert_eq!(
            normalize(base, "/abs/b.jar").unwrap(),
            "file:///abs/b.jar"
        );
    }

    #[test]
    fn test_existing_directory_gets_trailing_slash() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8Path::from_path(dir.path()).unwrap();

        let locator = normalize(Utf8Path::new("/"), path.as_str()).unwrap();
        assert!(locator.starts_with("file:///"));
        assert!(locator.ends_with('/'));
    }

    #[test]
    fn test_malformed_url() {
        assert!(matches!(
            normalize(Utf8Path::new("/"), "http://[broken"),
            Err(LocatorError::Malformed(..))
        ));
    }

    #[test]
    fn test_to_file_path() {
        assert_eq!(
            to_file_path("file:///opt/a.jar"),
            Some(Utf8PathBuf::from("/opt/a.jar"))
        );
        assert_eq!(to_file_path("http://host/a.jar"), None);
    }
}
