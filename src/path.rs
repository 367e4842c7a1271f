//! Pure path arithmetic for the session.
//!
//! Nothing in here touches the filesystem: existence and permissions are
//! checked by the directory changer and the handlers after resolution.

use std::path::{Component, MAIN_SEPARATOR_STR, Path, PathBuf};

/// Collapse `.` and `..` segments and rebuild the path with native separators.
///
/// `..` never climbs above a root or drive prefix. Leading `..` segments of a
/// relative path are kept.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(prefix) => out.push(prefix.as_os_str()),
            Component::RootDir => out.push(Component::RootDir.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            Component::Normal(name) => out.push(name),
        }
    }
    out
}

/// Resolve user input against `current_dir` into a normalized absolute path.
pub fn resolve(input: &str, current_dir: &Path) -> PathBuf {
    let input = Path::new(input);
    if input.is_absolute() {
        normalize(input)
    } else {
        normalize(&current_dir.join(input))
    }
}

/// Drive or UNC prefix of `path`, lower-cased. Always `None` on Unix.
pub fn volume_of(path: &Path) -> Option<String> {
    match path.components().next() {
        Some(Component::Prefix(prefix)) => {
            Some(prefix.as_os_str().to_string_lossy().to_lowercase())
        }
        _ => None,
    }
}

pub fn same_volume(a: &Path, b: &Path) -> bool {
    volume_of(a) == volume_of(b)
}

/// The root directory of the volume holding `path`, e.g. `/` or `C:\`.
pub fn volume_root(path: &Path) -> PathBuf {
    let root: PathBuf = path
        .components()
        .take_while(|c| matches!(c, Component::Prefix(_) | Component::RootDir))
        .collect();
    if root.as_os_str().is_empty() {
        PathBuf::from(MAIN_SEPARATOR_STR)
    } else {
        root
    }
}

/// True iff `path` is `boundary` or lies somewhere below it.
///
/// Comparison is component-wise, so `/home2` is not inside `/home`. Volume
/// prefixes compare case-insensitively.
pub fn is_within_boundary(path: &Path, boundary: &Path) -> bool {
    let path = normalize(path);
    let boundary = normalize(boundary);
    if !same_volume(&path, &boundary) {
        return false;
    }

    let without_prefix = |p: &Path| -> Vec<PathBuf> {
        p.components()
            .filter(|c| !matches!(c, Component::Prefix(_)))
            .map(|c| PathBuf::from(c.as_os_str()))
            .collect()
    };
    let path = without_prefix(&path);
    let boundary = without_prefix(&boundary);

    path.len() >= boundary.len() && path.iter().zip(&boundary).all(|(p, b)| p == b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn test_normalize_collapses_dots() {
        assert_eq!(normalize(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
        assert_eq!(normalize(Path::new("/a//b/")), PathBuf::from("/a/b"));
        assert_eq!(normalize(Path::new("/../..")), PathBuf::from("/"));
        assert_eq!(normalize(Path::new("../x/..")), PathBuf::from(".."));
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_relative_and_absolute() {
        let cwd = Path::new("/home/user");
        assert_eq!(resolve("docs", cwd), PathBuf::from("/home/user/docs"));
        assert_eq!(resolve("..", cwd), PathBuf::from("/home"));
        assert_eq!(resolve("./a/../b", cwd), PathBuf::from("/home/user/b"));
        assert_eq!(resolve("/etc/../tmp", cwd), PathBuf::from("/tmp"));
        assert_eq!(resolve("", cwd), PathBuf::from("/home/user"));
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_keeps_embedded_spaces() {
        let cwd = Path::new("/data");
        assert_eq!(
            resolve("my files/old report.txt", cwd),
            PathBuf::from("/data/my files/old report.txt")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_boundary_checks() {
        let root = Path::new("/home");
        assert!(is_within_boundary(root, root));
        assert!(is_within_boundary(Path::new("/home/user/x"), root));
        assert!(is_within_boundary(Path::new("/home/user/.."), root));
        assert!(!is_within_boundary(Path::new("/"), root));
        assert!(!is_within_boundary(Path::new("/home2"), root));
        assert!(!is_within_boundary(Path::new("/home/.."), root));
        assert!(is_within_boundary(Path::new("/anything"), Path::new("/")));
    }

    #[cfg(unix)]
    #[test]
    fn test_unix_has_single_volume() {
        assert_eq!(volume_of(Path::new("/home/user")), None);
        assert!(same_volume(Path::new("/a"), Path::new("/b")));
        assert_eq!(volume_root(Path::new("/home/user")), PathBuf::from("/"));
    }

    #[cfg(windows)]
    #[test]
    fn test_windows_volumes_compare_case_insensitively() {
        assert_eq!(volume_of(Path::new(r"C:\Users")), Some("c:".to_string()));
        assert!(same_volume(Path::new(r"c:\a"), Path::new(r"C:\b")));
        assert!(!same_volume(Path::new(r"C:\a"), Path::new(r"D:\a")));
        assert_eq!(volume_root(Path::new(r"D:\data\x")), PathBuf::from(r"D:\"));
        assert!(is_within_boundary(Path::new(r"c:\Users\me"), Path::new(r"C:\Users")));
    }
}
