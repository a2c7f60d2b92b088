//! Template source discovery.
//!
//! Walks a directory tree and reports every file whose name ends with one of
//! the allowed extensions, named by its path relative to the root with the
//! extension stripped and `/` as the separator.

use std::path::{Path, PathBuf};

use crate::error::RegistryError;

/// A template source file found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateFile {
    /// Registry name, e.g. `"users/show"`.
    pub name: String,
    /// Relative path with extension, e.g. `"users/show.html"`.
    pub name_with_ext: String,
    /// Absolute path for reading the source.
    pub path: PathBuf,
}

/// Index of the first extension in `extensions` that `name` ends with.
///
/// A lower index is a higher priority.
pub fn extension_priority(name: &str, extensions: &[String]) -> Option<usize> {
    extensions.iter().position(|ext| name.ends_with(ext.as_str()))
}

/// Strips the highest-priority matching extension from `name`.
pub fn strip_extension<'a>(name: &'a str, extensions: &[String]) -> Option<&'a str> {
    let idx = extension_priority(name, extensions)?;
    name.strip_suffix(extensions[idx].as_str())
}

/// Lists template files under `root`, recursively.
///
/// Files with no allowed extension are skipped. The order of the result is
/// unspecified.
pub fn walk_dir(root: &Path, extensions: &[String]) -> Result<Vec<TemplateFile>, RegistryError> {
    if !root.is_dir() {
        return Err(RegistryError::DirectoryNotFound {
            path: root.to_path_buf(),
        });
    }
    let root = root.canonicalize().map_err(|source| RegistryError::Io {
        path: root.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    walk_dir_recursive(&root, &root, extensions, &mut files)?;
    Ok(files)
}

fn walk_dir_recursive(
    current: &Path,
    root: &Path,
    extensions: &[String],
    files: &mut Vec<TemplateFile>,
) -> Result<(), RegistryError> {
    let io_err = |source| RegistryError::Io {
        path: current.to_path_buf(),
        source,
    };

    for entry in std::fs::read_dir(current).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        let file_type = entry.file_type().map_err(io_err)?;
        let path = entry.path();

        // Symlinked directories are not followed; symlinked files are read.
        if file_type.is_dir() {
            walk_dir_recursive(&path, root, extensions, files)?;
        } else if path.is_file() {
            if let Some(file) = try_parse_file(&path, root, extensions) {
                files.push(file);
            }
        }
    }

    Ok(())
}

fn try_parse_file(path: &Path, root: &Path, extensions: &[String]) -> Option<TemplateFile> {
    let relative = path.strip_prefix(root).ok()?;
    let name_with_ext = relative
        .to_string_lossy()
        .replace(std::path::MAIN_SEPARATOR, "/");
    let name = strip_extension(&name_with_ext, extensions)?.to_string();

    Some(TemplateFile {
        name,
        name_with_ext,
        path: path.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_file(dir: &Path, relative_path: &str, content: &str) {
        let full_path = dir.join(relative_path);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(full_path, content).unwrap();
    }

    fn exts() -> Vec<String> {
        vec![".html".into(), ".tmpl".into()]
    }

    // =========================================================================
    // Extension helpers
    // =========================================================================

    #[test]
    fn test_extension_priority() {
        assert_eq!(extension_priority("index.html", &exts()), Some(0));
        assert_eq!(extension_priority("index.tmpl", &exts()), Some(1));
        assert_eq!(extension_priority("index.txt", &exts()), None);
    }

    #[test]
    fn test_strip_extension() {
        assert_eq!(strip_extension("users/show.html", &exts()), Some("users/show"));
        assert_eq!(strip_extension("notes.md", &exts()), None);
    }

    // =========================================================================
    // walk_dir tests
    // =========================================================================

    #[test]
    fn test_walk_dir_finds_nested_templates() {
        let temp = TempDir::new().unwrap();
        create_file(temp.path(), "layout.html", "L");
        create_file(temp.path(), "users/show.tmpl", "S");
        create_file(temp.path(), "users/deep/row.html", "R");
        create_file(temp.path(), "README.md", "ignored");

        let mut names: Vec<_> = walk_dir(temp.path(), &exts())
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        names.sort();

        assert_eq!(names, vec!["layout", "users/deep/row", "users/show"]);
    }

    #[test]
    fn test_walk_dir_keeps_relative_path_with_extension() {
        let temp = TempDir::new().unwrap();
        create_file(temp.path(), "users/show.tmpl", "S");

        let files = walk_dir(temp.path(), &exts()).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name_with_ext, "users/show.tmpl");
        assert!(files[0].path.is_absolute());
    }

    #[cfg(unix)]
    #[test]
    fn test_walk_dir_does_not_follow_directory_symlinks() {
        let temp = TempDir::new().unwrap();
        create_file(temp.path(), "pages/index.html", "home");
        create_file(temp.path(), "shared/nav.html", "nav");
        std::os::unix::fs::symlink(temp.path(), temp.path().join("pages/loop")).unwrap();
        std::os::unix::fs::symlink(
            temp.path().join("shared/nav.html"),
            temp.path().join("pages/nav.html"),
        )
        .unwrap();

        let mut names: Vec<_> = walk_dir(temp.path(), &exts())
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        names.sort();

        assert_eq!(names, vec!["pages/index", "pages/nav", "shared/nav"]);
    }

    #[test]
    fn test_walk_dir_missing_directory() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope");

        let err = walk_dir(&missing, &exts()).unwrap_err();
        assert!(matches!(err, RegistryError::DirectoryNotFound { path } if path == missing));
    }

    #[test]
    fn test_walk_dir_empty_directory() {
        let temp = TempDir::new().unwrap();
        assert!(walk_dir(temp.path(), &exts()).unwrap().is_empty());
    }

    // =========================================================================
    // Property tests
    // =========================================================================

    proptest::proptest! {
        #[test]
        fn prop_strip_extension_recovers_name(
            stem in "[a-z0-9_-]{1,12}(/[a-z0-9_-]{1,12}){0,2}",
            ext_idx in 0usize..2,
        ) {
            let exts = exts();
            let file = format!("{stem}{}", exts[ext_idx]);
            proptest::prop_assert_eq!(extension_priority(&file, &exts), Some(ext_idx));
            proptest::prop_assert_eq!(strip_extension(&file, &exts), Some(stem.as_str()));
        }
    }
}
