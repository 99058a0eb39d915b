use std::path::{Component, Path, PathBuf};

/// Expand a leading `~` to the user's home directory.
///
/// Paths that are not valid UTF-8 are returned unchanged.
pub fn expand_home(path: &Path) -> PathBuf {
    match path.to_str() {
        Some(s) => PathBuf::from(shellexpand::tilde(s).as_ref()),
        None => path.to_path_buf(),
    }
}

/// Make `path` absolute against `cwd` and resolve it as far as the filesystem allows.
///
/// An existing path is canonicalized outright, so `..` after a symlink means what the
/// OS says it means. Otherwise the longest existing prefix is canonicalized and the
/// remaining components are applied lexically. Never fails, so it can be used to
/// report locations that do not exist.
pub fn resolve_lenient(path: &Path, cwd: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    };
    if let Ok(canonical) = joined.canonicalize() {
        return canonical;
    }

    let components: Vec<Component> = joined.components().collect();
    for split in (1..components.len()).rev() {
        let head: PathBuf = components[..split].iter().collect();
        if let Ok(canonical) = head.canonicalize() {
            return apply_lexically(canonical, &components[split..]);
        }
    }
    apply_lexically(PathBuf::new(), &components)
}

fn apply_lexically(mut base: PathBuf, rest: &[Component]) -> PathBuf {
    for component in rest {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                base.pop();
            }
            other => base.push(other.as_os_str()),
        }
    }
    base
}
