use crate::areas::CONTROL_DIR;
use crate::errors::{IoResultExt, RepositoryError, Result};
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

const IGNORED_PATHS: [&str; 3] = [CONTROL_DIR, ".", ".."];

/// Working tree rooted at the repository path
#[derive(Debug)]
pub struct Workspace {
    path: Box<Path>,
}

impl Workspace {
    pub fn new(path: Box<Path>) -> Self {
        Workspace { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every file under `root` (the whole working tree when `None`), relative
    /// to the working root and sorted. A file path lists just itself.
    pub fn list_files(&self, root: Option<&Path>) -> Result<Vec<PathBuf>> {
        let root = match root {
            Some(root) => self.path.join(root),
            None => self.path.to_path_buf(),
        };

        if !root.exists() {
            return Err(RepositoryError::NotFound(root.display().to_string()));
        }

        if root.is_file() {
            return Ok(self
                .relative(&root)
                .into_iter()
                .filter(|path| !Self::is_ignored(path))
                .collect());
        }

        let mut files = WalkDir::new(&root)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| self.relative(entry.path()))
            .filter(|path| !Self::is_ignored(path))
            .collect::<Vec<_>>();
        files.sort();

        Ok(files)
    }

    fn relative(&self, path: &Path) -> Option<PathBuf> {
        path.strip_prefix(self.path.as_ref())
            .ok()
            .map(Path::to_path_buf)
    }

    fn is_ignored(path: &Path) -> bool {
        path.components().any(|component| match component {
            Component::Normal(name) => IGNORED_PATHS.contains(&name.to_string_lossy().as_ref()),
            _ => false,
        })
    }

    pub fn read_lines(&self, file_path: &Path) -> Result<Vec<String>> {
        read_lines(&self.path.join(file_path))
    }
}

/// Manifest key for a working-tree path: relative, `/`-separated
pub fn path_key(path: &Path) -> String {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Read a text file as lines, without their terminators.
///
/// Content that is not valid UTF-8 is `NotText`.
pub fn read_lines(path: &Path) -> Result<Vec<String>> {
    let bytes = std::fs::read(path).with_path("read", path)?;
    let content = String::from_utf8(bytes)
        .map_err(|_| RepositoryError::NotText(path.display().to_string()))?;

    let mut lines = content
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
        .collect::<Vec<_>>();
    // "a\nb\n" splits into ["a", "b", ""]
    if lines.last().is_some_and(String::is_empty) {
        lines.pop();
    }

    Ok(lines)
}

/// Create or truncate `path`, writing every line followed by `\n`.
pub fn write_lines<S: AsRef<str>>(path: &Path, lines: &[S]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_path("create directory", parent)?;
    }

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .with_path("open", path)?;

    for line in lines {
        writeln!(file, "{}", line.as_ref()).with_path("write", path)?;
    }

    Ok(())
}

/// Move everything under `src_dir` into `dst_dir`, replacing what is in the way.
///
/// Directories are merged recursively, so files of `dst_dir` that have no
/// counterpart in `src_dir` survive. A file only replaces an empty
/// directory. `src_dir` is left empty.
pub fn move_all(src_dir: &Path, dst_dir: &Path) -> Result<()> {
    if !dst_dir.is_dir() {
        return Err(RepositoryError::NotFound(dst_dir.display().to_string()));
    }

    for entry in std::fs::read_dir(src_dir).with_path("list", src_dir)? {
        let entry = entry.with_path("list", src_dir)?;
        let source = entry.path();
        let target = dst_dir.join(entry.file_name());

        if source.is_dir() {
            if target.is_file() {
                std::fs::remove_file(&target).with_path("remove", &target)?;
            }
            if !target.exists() {
                std::fs::create_dir(&target).with_path("create directory", &target)?;
            }
            move_all(&source, &target)?;
            std::fs::remove_dir(&source).with_path("remove", &source)?;
        } else {
            if target.is_dir() {
                std::fs::remove_dir(&target).with_path("replace directory", &target)?;
            }
            std::fs::rename(&source, &target).with_path("move", &source)?;
        }
    }

    Ok(())
}

/// Remove a file or a whole directory.
pub fn delete(path: &Path) -> Result<()> {
    if path.is_dir() {
        std::fs::remove_dir_all(path).with_path("remove", path)
    } else {
        std::fs::remove_file(path).with_path("remove", path)
    }
}

/// Empty a directory, keeping the directory itself.
pub fn clear_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        return std::fs::create_dir_all(path).with_path("create directory", path);
    }

    for entry in std::fs::read_dir(path).with_path("list", path)? {
        delete(&entry.with_path("list", path)?.path())?;
    }

    Ok(())
}
