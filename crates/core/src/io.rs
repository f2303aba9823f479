//! Font discovery and file I/O.

use std::{
    fs::{read, write},
    io,
    path::{Path, PathBuf},
};

use glob::{Pattern, glob};
use log::debug;

use crate::{config::FONT_EXTENSION, error::BatchError};

#[derive(Debug, Clone)]
pub struct FontFile {
    path: PathBuf,
}

impl FontFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read(&self) -> io::Result<Vec<u8>> {
        read(&self.path)
    }

    pub fn write(&self, data: impl AsRef<[u8]>) -> io::Result<()> {
        write(&self.path, data)
    }
}

impl AsRef<Path> for FontFile {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}

/// Paths matching `pattern` under `dir`.
///
/// `dir` is matched literally, even when its name contains glob
/// metacharacters.
pub fn glob_fonts(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, BatchError> {
    let dir_str = dir.to_str().ok_or_else(|| BatchError::InvalidDirectory(dir.to_path_buf()))?;
    let pattern = Path::new(&Pattern::escape(dir_str)).join(pattern);
    let pattern_str = pattern
        .to_str()
        .ok_or_else(|| BatchError::InvalidDirectory(dir.to_path_buf()))?;
    Ok(glob(pattern_str)
        .map_err(|source| BatchError::Pattern { dir: dir.to_path_buf(), source })?
        .filter_map(Result::ok)
        .collect())
}

/// Absolute paths of every `.ttf` under `dir`, subdirectories included,
/// sorted by their path strings.
///
/// A missing directory yields an empty list.
pub fn locate_fonts(dir: &Path) -> Result<Vec<PathBuf>, BatchError> {
    if !dir.is_dir() {
        debug!("{} is not a directory; no fonts", dir.display());
        return Ok(Vec::new());
    }

    let mut paths: Vec<PathBuf> = glob_fonts(dir, &format!("**/*.{FONT_EXTENSION}"))?
        .into_iter()
        .filter(|p| p.is_file())
        .map(|p| p.canonicalize().unwrap_or(p))
        .collect();
    paths.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));
    Ok(paths)
}
