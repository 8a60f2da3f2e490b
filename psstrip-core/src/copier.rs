//! The tree copier: walks the source repository and dispatches every file.
//!
//! Excluded and hidden directories are pruned together with their subtree,
//! as is the users directory (user records are re-emitted under anonymous
//! paths by the emitter, so original ids never appear in output paths).
//! Every other directory is recreated; every file is classified against the
//! rule table and copied, skipped, replaced or stripped.
//!
//! License: GPL-3.0-or-later

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use walkdir::WalkDir;

use crate::config::RuleSetConfig;
use crate::errors::{Result, StripError};
use crate::rules::{Action, RuleTable};
use crate::sanitizers::stripper::{strip_content, strip_lines, StreamError, Substitution};
use crate::sink::OutputSink;

/// Outcome counters for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub users: usize,
    pub workgroups: usize,
    pub skipped: usize,
    pub stripped: usize,
    pub replaced: usize,
    pub copied: usize,
}

impl Totals {
    /// Number of files dispatched by the walk.
    pub fn files(&self) -> usize {
        self.skipped + self.stripped + self.replaced + self.copied
    }

    fn record(&mut self, action: Action) {
        match action {
            Action::Copy => self.copied += 1,
            Action::Skip => self.skipped += 1,
            Action::Replace => self.replaced += 1,
            Action::Strip => self.stripped += 1,
        }
    }
}

/// State threaded through one run: the throttle setting and the totals.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    pub throttle: Duration,
    pub totals: Totals,
}

impl RunContext {
    pub fn new(throttle: Duration) -> Self {
        Self {
            throttle,
            totals: Totals::default(),
        }
    }

    /// Blocks for the throttle delay; a zero delay returns immediately.
    pub fn pause(&self) {
        if !self.throttle.is_zero() {
            thread::sleep(self.throttle);
        }
    }
}

/// One entry produced by the walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    pub path: PathBuf,
    /// Path relative to the source root; empty for the root itself.
    pub rel_path: PathBuf,
    pub is_dir: bool,
}

impl WalkEntry {
    fn basename(&self) -> String {
        self.rel_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

pub struct TreeCopier<'a> {
    rules: &'a RuleTable,
    placeholder: &'a str,
    users_dir: &'a Path,
    excluded_dirs: HashSet<String>,
    line_oriented: HashSet<String>,
}

impl<'a> TreeCopier<'a> {
    pub fn new(rules: &'a RuleTable, config: &'a RuleSetConfig) -> Self {
        Self {
            rules,
            placeholder: &config.placeholder,
            users_dir: &config.layout.users_dir,
            excluded_dirs: config.excluded_dirs.iter().cloned().collect(),
            line_oriented: config.line_oriented.iter().map(|n| n.to_lowercase()).collect(),
        }
    }

    /// True for directories that must not be visited or created.
    pub fn is_pruned(&self, rel_path: &Path) -> bool {
        if rel_path.as_os_str().is_empty() {
            return false;
        }
        if rel_path == self.users_dir {
            return true;
        }
        let basename = rel_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();
        basename.starts_with('.') || self.excluded_dirs.contains(&*basename)
    }

    /// Walks `source` in file-name order, pruning excluded directories.
    pub fn walk<'s>(&'s self, source: &'s Path) -> Box<dyn Iterator<Item = Result<WalkEntry>> + 's> {
        let entries = WalkDir::new(source)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |e| {
                if !e.file_type().is_dir() {
                    return true;
                }
                let rel = e.path().strip_prefix(source).unwrap_or(e.path());
                let pruned = self.is_pruned(rel);
                if pruned {
                    info!(" - pruned directory {}", rel.display());
                }
                !pruned
            })
            .map(move |entry| -> Result<WalkEntry> {
                let entry = entry?;
                let rel_path = entry
                    .path()
                    .strip_prefix(source)
                    .map(Path::to_path_buf)
                    .unwrap_or_default();
                Ok(WalkEntry {
                    is_dir: entry.file_type().is_dir(),
                    path: entry.into_path(),
                    rel_path,
                })
            });
        Box::new(entries)
    }

    /// Copies the whole tree under `source` into `sink`.
    pub fn copy_tree(&self, source: &Path, sink: &mut dyn OutputSink, ctx: &mut RunContext) -> Result<()> {
        info!("** copying patentsafe repository from {}", source.display());
        for entry in self.walk(source) {
            let entry = entry?;
            ctx.pause();
            self.process_entry(&entry, sink, ctx)?;
        }
        Ok(())
    }

    /// Handles one walk entry that survived pruning.
    pub fn process_entry(&self, entry: &WalkEntry, sink: &mut dyn OutputSink, ctx: &mut RunContext) -> Result<()> {
        if entry.is_dir {
            return sink.create_dir_all(&entry.rel_path);
        }

        let basename = entry.basename();
        if fs::symlink_metadata(&entry.path)
            .map(|m| m.file_type().is_symlink())
            .unwrap_or(false)
        {
            warn!(" - skipped symbolic link {}", entry.rel_path.display());
            ctx.totals.record(Action::Skip);
            return Ok(());
        }

        let classification = self.rules.classify(&basename);
        let action = classification.action();
        match action {
            Action::Copy => {
                sink.copy_file(&entry.path, &entry.rel_path)?;
                info!(" - copied {}", entry.rel_path.display());
            }
            Action::Skip => {
                info!(" - skipped {}", entry.rel_path.display());
            }
            Action::Replace => {
                sink.write_file(&entry.rel_path, self.placeholder.as_bytes())?;
                info!(" - replaced {}", entry.rel_path.display());
            }
            Action::Strip => {
                self.strip_file(entry, &basename, classification.substitutions(), sink)?;
                info!(" - stripped {}", entry.rel_path.display());
            }
        }
        ctx.totals.record(action);
        Ok(())
    }

    fn strip_file(
        &self,
        entry: &WalkEntry,
        basename: &str,
        substitutions: &[Substitution],
        sink: &mut dyn OutputSink,
    ) -> Result<()> {
        if self.line_oriented.contains(&basename.to_lowercase()) {
            let file = fs::File::open(&entry.path).map_err(|e| StripError::io(&entry.path, e))?;
            let target = sink.target_path(&entry.rel_path);
            let mut writer = sink.create_file(&entry.rel_path)?;
            let lines = strip_lines(substitutions, BufReader::new(file), &mut writer).map_err(|e| match e {
                StreamError::Read(e) => StripError::io(&entry.path, e),
                StreamError::Write(e) => StripError::io(&target, e),
            })?;
            debug!("Stripped {} lines of {}", lines, entry.rel_path.display());
            return Ok(());
        }

        let content = fs::read(&entry.path).map_err(|e| StripError::io(&entry.path, e))?;
        let stripped = strip_content(substitutions, &content);
        sink.write_file(&entry.rel_path, &stripped)
    }
}
