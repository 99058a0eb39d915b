//! Resolves a user-supplied model path, retrying relative paths under the model directory.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::paths::resolve_lenient;

/// A model file that exists, with every candidate that was examined on the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedModel {
    pub path: PathBuf,
    pub tried: Vec<PathBuf>,
}

/// No candidate existed. Displays as the user-facing diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelNotFound {
    pub tried: Vec<PathBuf>,
    pub model_dir: PathBuf,
}

impl fmt::Display for ModelNotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Error: Model file not found.")?;
        writeln!(f, "Looked for:")?;
        for path in &self.tried {
            writeln!(f, "  - {}", path.display())?;
        }
        write!(f, "\nMODEL_DIR is set to: {}", self.model_dir.display())
    }
}

impl std::error::Error for ModelNotFound {}

/// Pick the model file to benchmark.
///
/// Absolute paths and paths that exist relative to `cwd` are used directly. Any other
/// relative path is also tried under `model_dir`. Candidates are canonicalized and the
/// first that exists wins.
pub fn resolve_model_path(
    user_path: &Path,
    model_dir: &Path,
    cwd: &Path,
) -> Result<ResolvedModel, ModelNotFound> {
    let mut tried = vec![resolve_lenient(user_path, cwd)];
    if !user_path.is_absolute() && !cwd.join(user_path).exists() {
        tried.push(resolve_lenient(&model_dir.join(user_path), cwd));
    }

    match tried.iter().find(|candidate| candidate.exists()).cloned() {
        Some(path) => {
            tracing::debug!(path = %path.display(), candidates = tried.len(), "resolved model path");
            Ok(ResolvedModel { path, tried })
        }
        None => {
            tracing::debug!(?tried, "model path not found");
            Err(ModelNotFound {
                tried,
                model_dir: model_dir.to_path_buf(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    struct Layout {
        _guard: tempfile::TempDir,
        cwd: PathBuf,
        model_dir: PathBuf,
    }

    fn layout() -> Layout {
        let guard = tempdir().unwrap();
        let root = guard.path().canonicalize().unwrap();
        let cwd = root.join("work");
        let model_dir = root.join("models");
        fs::create_dir(&cwd).unwrap();
        fs::create_dir(&model_dir).unwrap();
        Layout {
            _guard: guard,
            cwd,
            model_dir,
        }
    }

    #[test]
    fn test_relative_path_in_cwd_skips_model_dir() {
        let l = layout();
        fs::write(l.cwd.join("llama.gguf"), b"cwd").unwrap();
        fs::write(l.model_dir.join("llama.gguf"), b"dir").unwrap();

        let resolved = resolve_model_path(Path::new("llama.gguf"), &l.model_dir, &l.cwd).unwrap();
        assert_eq!(resolved.path, l.cwd.join("llama.gguf"));
        assert_eq!(resolved.tried, vec![l.cwd.join("llama.gguf")]);
    }

    #[test]
    fn test_relative_path_falls_back_to_model_dir() {
        let l = layout();
        fs::create_dir(l.model_dir.join("q4")).unwrap();
        fs::write(l.model_dir.join("q4").join("llama.gguf"), b"dir").unwrap();

        let resolved =
            resolve_model_path(Path::new("q4/llama.gguf"), &l.model_dir, &l.cwd).unwrap();
        let expected = l.model_dir.join("q4").join("llama.gguf");
        assert_eq!(resolved.path, expected);
        assert_eq!(
            resolved.tried,
            vec![l.cwd.join("q4").join("llama.gguf"), expected]
        );
    }

    #[test]
    fn test_absolute_path_is_used_directly() {
        let l = layout();
        let model = l.model_dir.join("abs.gguf");
        fs::write(&model, b"abs").unwrap();

        let resolved = resolve_model_path(&model, &l.cwd, &l.cwd).unwrap();
        assert_eq!(resolved.path, model);
        assert_eq!(resolved.tried.len(), 1);
    }

    #[test]
    fn test_missing_everywhere_reports_both_candidates() {
        let l = layout();

        let err = resolve_model_path(Path::new("nope.gguf"), &l.model_dir, &l.cwd).unwrap_err();
        assert_eq!(
            err.tried,
            vec![l.cwd.join("nope.gguf"), l.model_dir.join("nope.gguf")]
        );
        assert_eq!(err.model_dir, l.model_dir);

        let report = err.to_string();
        assert!(report.starts_with("Error: Model file not found.\nLooked for:\n"));
        assert!(report.contains(&format!("  - {}", l.cwd.join("nope.gguf").display())));
        assert!(report.contains(&format!("  - {}", l.model_dir.join("nope.gguf").display())));
        assert!(report.ends_with(&format!("MODEL_DIR is set to: {}", l.model_dir.display())));
    }

    #[test]
    fn test_missing_absolute_path_reports_itself() {
        let l = layout();
        let model = l.cwd.join("gone.gguf");

        let err = resolve_model_path(&model, &l.model_dir, &l.cwd).unwrap_err();
        assert_eq!(err.tried, vec![model]);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_model_resolves_to_target() {
        let l = layout();
        let target = l.model_dir.join("real.gguf");
        fs::write(&target, b"gguf").unwrap();
        std::os::unix::fs::symlink(&target, l.cwd.join("link.gguf")).unwrap();

        let resolved = resolve_model_path(Path::new("link.gguf"), &l.model_dir, &l.cwd).unwrap();
        assert_eq!(resolved.path, target);
    }

    #[cfg(unix)]
    #[test]
    fn test_parent_of_symlinked_dir_matches_the_filesystem() {
        let l = layout();
        let elsewhere = l.cwd.parent().unwrap().join("elsewhere");
        fs::create_dir_all(elsewhere.join("sub")).unwrap();
        fs::write(elsewhere.join("model.gguf"), b"gguf").unwrap();
        fs::write(l.cwd.join("model.gguf"), b"decoy").unwrap();
        std::os::unix::fs::symlink(elsewhere.join("sub"), l.cwd.join("link")).unwrap();

        let resolved =
            resolve_model_path(Path::new("link/../model.gguf"), &l.model_dir, &l.cwd).unwrap();
        assert_eq!(resolved.path, elsewhere.join("model.gguf"));
        assert_eq!(resolved.tried, vec![elsewhere.join("model.gguf")]);
    }
}
