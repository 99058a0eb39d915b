//! Finds the benchmarking executable on the search path or in the working directory.

use std::env;
use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};

use crate::paths::{expand_home, resolve_lenient};

/// Where a located executable was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// A directory listed in `PATH`.
    SearchPath,
    /// The working directory fallback.
    WorkingDir,
}

/// An executable file that passed the existence and permission checks.
///
/// The check is a point-in-time check; the file can change before it is run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutableCandidate {
    path: PathBuf,
    origin: Origin,
}

impl ExecutableCandidate {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    /// Bare file name for executables found on the search path, the absolute path otherwise.
    pub fn display_name(&self) -> String {
        match (self.origin, self.path.file_name()) {
            (Origin::SearchPath, Some(name)) => name.to_string_lossy().into_owned(),
            _ => self.path.display().to_string(),
        }
    }
}

/// Ordered directories to search, plus the working directory used as the last resort.
#[derive(Debug, Clone)]
pub struct SearchDirectories {
    entries: Vec<PathBuf>,
    cwd: PathBuf,
}

impl SearchDirectories {
    pub fn from_env() -> io::Result<Self> {
        let cwd = env::current_dir()?;
        Ok(Self::new(env::var_os("PATH").as_deref(), cwd))
    }

    /// Build from a `PATH`-style value. Entries keep their listed order and are not de-duplicated.
    pub fn new(path_var: Option<&OsStr>, cwd: PathBuf) -> Self {
        let entries = path_var
            .map(|value| env::split_paths(value).collect())
            .unwrap_or_default();
        Self { entries, cwd }
    }

    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    pub fn working_dir(&self) -> &Path {
        &self.cwd
    }

    /// Return the first execute-permitted regular file called `name`.
    ///
    /// Missing or unreadable directories and files without execute permission are skipped.
    pub fn find(&self, name: &str) -> Option<ExecutableCandidate> {
        for entry in &self.entries {
            let dir = resolve_lenient(&expand_home(entry), &self.cwd);
            if !dir.is_dir() {
                tracing::trace!(dir = %dir.display(), "skipping search path entry");
                continue;
            }
            let candidate = dir.join(name);
            if is_executable_file(&candidate) {
                tracing::debug!(path = %candidate.display(), "found executable on search path");
                return Some(ExecutableCandidate {
                    path: candidate,
                    origin: Origin::SearchPath,
                });
            }
        }

        let local = self.cwd.join(name);
        if is_executable_file(&local) {
            let path = local.canonicalize().unwrap_or(local);
            tracing::debug!(path = %path.display(), "found executable in working directory");
            return Some(ExecutableCandidate {
                path,
                origin: Origin::WorkingDir,
            });
        }

        tracing::debug!(name, "executable not found");
        None
    }
}

/// Locate `name` using the process `PATH` and working directory.
pub fn find_executable(name: &str) -> Option<ExecutableCandidate> {
    SearchDirectories::from_env().ok()?.find(name)
}

#[cfg(unix)]
fn is_executable_file(path: &Path) -> bool {
    use nix::unistd::{access, AccessFlags};

    path.is_file() && access(path, AccessFlags::X_OK).is_ok()
}

#[cfg(not(unix))]
fn is_executable_file(path: &Path) -> bool {
    path.is_file()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::{tempdir, TempDir};

    fn write_file(dir: &Path, name: &str, mode: u32) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, "#!/bin/sh\nexit 0\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(mode)).unwrap();
        path
    }

    fn scratch() -> (TempDir, PathBuf) {
        let dir = tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        (dir, root)
    }

    fn search<P: AsRef<Path>>(dirs: &[P], cwd: &Path) -> SearchDirectories {
        let joined = env::join_paths(dirs.iter().map(|d| d.as_ref())).unwrap();
        SearchDirectories::new(Some(joined.as_os_str()), cwd.to_path_buf())
    }

    #[test]
    fn test_first_match_in_path_order_wins() {
        let (_guard, root) = scratch();
        let (first, second, cwd) = (root.join("a"), root.join("b"), root.join("cwd"));
        for dir in [&first, &second, &cwd] {
            fs::create_dir(dir).unwrap();
        }
        write_file(&first, "localscore", 0o755);
        write_file(&second, "localscore", 0o755);
        write_file(&cwd, "localscore", 0o755);

        let found = search(&[&first, &second], &cwd).find("localscore").unwrap();
        assert_eq!(found.path(), first.join("localscore"));
        assert_eq!(found.origin(), Origin::SearchPath);
        assert_eq!(found.display_name(), "localscore");
    }

    #[test]
    fn test_skips_missing_dirs_files_and_non_executables() {
        let (_guard, root) = scratch();
        let (plain, good, cwd) = (root.join("plain"), root.join("good"), root.join("cwd"));
        for dir in [&plain, &good, &cwd] {
            fs::create_dir(dir).unwrap();
        }
        let not_a_dir = write_file(&root, "file-entry", 0o755);
        write_file(&plain, "localscore", 0o644);
        write_file(&good, "localscore", 0o700);

        let missing = root.join("does-not-exist");
        let found = search(&[&missing, &not_a_dir, &plain, &good], &cwd)
            .find("localscore")
            .unwrap();
        assert_eq!(found.path(), good.join("localscore"));
    }

    #[test]
    fn test_skips_directory_without_search_permission() {
        let (_guard, root) = scratch();
        let (locked, good, cwd) = (root.join("locked"), root.join("good"), root.join("cwd"));
        for dir in [&locked, &good, &cwd] {
            fs::create_dir(dir).unwrap();
        }
        write_file(&locked, "localscore", 0o755);
        write_file(&good, "localscore", 0o755);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Privileged users bypass directory permissions.
        let privileged = fs::read_dir(&locked).is_ok();
        let found = search(&[&locked, &good], &cwd).find("localscore");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        if privileged {
            return;
        }

        assert_eq!(found.unwrap().path(), good.join("localscore"));
    }

    #[test]
    fn test_directory_with_matching_name_is_not_executable() {
        let (_guard, root) = scratch();
        let (dir, cwd) = (root.join("bin"), root.join("cwd"));
        fs::create_dir_all(dir.join("localscore")).unwrap();
        fs::create_dir(&cwd).unwrap();

        assert_eq!(search(&[&dir], &cwd).find("localscore"), None);
    }

    #[test]
    fn test_falls_back_to_working_dir() {
        let (_guard, root) = scratch();
        let (empty, cwd) = (root.join("empty"), root.join("cwd"));
        fs::create_dir(&empty).unwrap();
        fs::create_dir(&cwd).unwrap();
        write_file(&cwd, "localscore", 0o755);

        let found = search(&[&empty], &cwd).find("localscore").unwrap();
        assert_eq!(found.path(), cwd.join("localscore"));
        assert_eq!(found.origin(), Origin::WorkingDir);
        assert_eq!(
            found.display_name(),
            cwd.join("localscore").display().to_string()
        );
    }

    #[test]
    fn test_not_found_anywhere() {
        let (_guard, root) = scratch();
        let cwd = root.join("cwd");
        fs::create_dir(&cwd).unwrap();
        write_file(&cwd, "localscore", 0o600);

        assert_eq!(search(&[&root], &cwd).find("localscore"), None);
        assert_eq!(
            SearchDirectories::new(None, cwd.clone()).find("localscore"),
            None
        );
    }

    #[test]
    fn test_relative_entries_resolve_against_cwd() {
        let (_guard, root) = scratch();
        fs::create_dir(root.join("tools")).unwrap();
        write_file(&root.join("tools"), "localscore", 0o755);

        let dirs = SearchDirectories::new(Some(OsStr::new("tools")), root.clone());
        assert_eq!(dirs.entries(), &[PathBuf::from("tools")]);
        let found = dirs.find("localscore").unwrap();
        assert_eq!(found.path(), root.join("tools").join("localscore"));
    }

    #[test]
    fn test_find_executable_uses_process_path() {
        let (_guard, root) = scratch();
        write_file(&root, "llm-bench-lookup", 0o755);

        let original = env::var_os("PATH").unwrap_or_default();
        let extended =
            env::join_paths(std::iter::once(root.clone()).chain(env::split_paths(&original)))
                .unwrap();
        let found = temp_env::with_var("PATH", Some(&extended), || {
            find_executable("llm-bench-lookup")
        });

        assert_eq!(
            found.map(|c| c.path().to_path_buf()),
            Some(root.join("llm-bench-lookup"))
        );
    }
}
