//! Output sinks: where the sanitized tree is written.
//!
//! The copier and the emitter only ever address destination files by their
//! path relative to the destination root. `FsSink` maps those onto a real
//! directory; tests can substitute an in-memory sink.
//!
//! License: GPL-3.0-or-later

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::errors::{Result, StripError};

/// Destination of a run.
pub trait OutputSink {
    /// Creates a directory (and its parents) if it does not exist.
    fn create_dir_all(&mut self, rel: &Path) -> Result<()>;

    /// Copies a source file byte for byte, overwriting any existing file.
    fn copy_file(&mut self, src: &Path, rel: &Path) -> Result<()>;

    /// Writes `content` as the whole file, overwriting any existing file.
    fn write_file(&mut self, rel: &Path, content: &[u8]) -> Result<()>;

    /// Opens a file for streaming writes, overwriting any existing file.
    fn create_file(&mut self, rel: &Path) -> Result<Box<dyn Write + '_>>;

    /// Path reported in errors about the destination file `rel`.
    fn target_path(&self, rel: &Path) -> PathBuf {
        rel.to_path_buf()
    }
}

/// Writes into a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct FsSink {
    root: PathBuf,
}

impl FsSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn ensure_parent(&self, target: &Path) -> Result<()> {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| StripError::io(parent, e))?;
        }
        Ok(())
    }
}

impl OutputSink for FsSink {
    fn create_dir_all(&mut self, rel: &Path) -> Result<()> {
        let target = self.target_path(rel);
        fs::create_dir_all(&target).map_err(|e| StripError::io(&target, e))
    }

    fn copy_file(&mut self, src: &Path, rel: &Path) -> Result<()> {
        let target = self.target_path(rel);
        self.ensure_parent(&target)?;
        fs::copy(src, &target).map_err(|e| {
            // Blame the side that failed.
            let path = if src.is_file() { &target } else { src };
            StripError::io(path, e)
        })?;
        Ok(())
    }

    fn write_file(&mut self, rel: &Path, content: &[u8]) -> Result<()> {
        let target = self.target_path(rel);
        self.ensure_parent(&target)?;
        fs::write(&target, content).map_err(|e| StripError::io(&target, e))
    }

    fn create_file(&mut self, rel: &Path) -> Result<Box<dyn Write + '_>> {
        let target = self.target_path(rel);
        self.ensure_parent(&target)?;
        let file = fs::File::create(&target).map_err(|e| StripError::io(&target, e))?;
        Ok(Box::new(PathWriter {
            inner: BufWriter::new(file),
            path: target,
        }))
    }

    fn target_path(&self, rel: &Path) -> PathBuf {
        self.root.join(rel)
    }
}

/// Buffered file writer whose errors name the file.
struct PathWriter {
    inner: BufWriter<fs::File>,
    path: PathBuf,
}

impl PathWriter {
    fn annotate(&self, e: io::Error) -> io::Error {
        io::Error::new(e.kind(), format!("{}: {}", self.path.display(), e))
    }
}

impl Write for PathWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf).map_err(|e| self.annotate(e))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush().map_err(|e| self.annotate(e))
    }
}
