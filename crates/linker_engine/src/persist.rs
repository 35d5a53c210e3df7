use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use linker_core::{GitignoreTemplate, LinkError, LinkErrorKind};
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("folder missing or not writable: {0}")]
    Folder(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl From<PersistError> for LinkError {
    fn from(err: PersistError) -> Self {
        LinkError::new(LinkErrorKind::Filesystem, err.to_string())
    }
}

/// Ensure `dir` exists, is a directory and accepts new files. Never creates `dir`.
pub fn ensure_writable_dir(dir: &Path) -> Result<(), PersistError> {
    let meta = fs::metadata(dir)
        .map_err(|e| PersistError::Folder(format!("{}: {e}", dir.display())))?;
    if !meta.is_dir() {
        return Err(PersistError::Folder(format!(
            "{}: path is not a directory",
            dir.display()
        )));
    }
    // Basic writability probe: the temp file is removed on drop.
    NamedTempFile::new_in(dir)
        .map_err(|e| PersistError::Folder(format!("{}: {e}", dir.display())))?;
    Ok(())
}

/// Atomically write content to `{dir}/{filename}` by writing a temp file then renaming.
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn write(&self, filename: &str, content: &str) -> Result<PathBuf, PersistError> {
        ensure_writable_dir(&self.dir)?;

        let target = self.dir.join(filename);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;

        tmp.persist(&target).map_err(|e| PersistError::Io(e.error))?;
        Ok(target)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitignoreWrite {
    Written,
    AlreadyPresent,
}

/// Writes the template as `.gitignore` unless the folder already has one.
pub fn write_gitignore(dir: &Path, template: GitignoreTemplate) -> Result<GitignoreWrite, PersistError> {
    if dir.join(".gitignore").exists() {
        return Ok(GitignoreWrite::AlreadyPresent);
    }
    AtomicFileWriter::new(dir.to_path_buf()).write(".gitignore", template.contents())?;
    Ok(GitignoreWrite::Written)
}
