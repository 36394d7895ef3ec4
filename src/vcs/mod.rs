//
//  atlas-client
//  vcs/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Version Control Adapters
//!
//! This module detects which version control system governs a directory and
//! asks that system's own command-line tool which files it tracks. The archive
//! builder uses it to package exactly the tracked files of a working tree.
//!
//! ## Overview
//!
//! The [`Vcs`] enum is the static registry of supported systems, searched in
//! order:
//!
//! | System | Marker | Listing command | Metadata |
//! |--------|--------|-----------------|----------|
//! | Git | `.git` | `git ls-files` | branch, commit, remotes |
//! | Mercurial | `.hg` | `hg locate -f --include .` | none |
//! | Subversion | `.svn` | `svn ls -R` | none |
//!
//! ## Usage
//!
//! ```rust,no_run
//! use atlas_client::vcs;
//! use std::path::Path;
//!
//! let dir = Path::new("/path/to/checkout");
//! if let Some(system) = vcs::detect(dir)? {
//!     println!("{} tracks {} files", system.name(), system.tracked_files(dir)?.len());
//! }
//! # Ok::<(), atlas_client::vcs::VcsError>(())
//! ```
//!
//! ## Notes
//!
//! - Detection walks from the target directory up to the filesystem root
//! - Every tool invocation runs synchronously in the target directory
//! - A missing binary and a failing binary are distinct [`VcsError`] variants

mod command;

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised while detecting or querying a version control system.
#[derive(Error, Debug)]
pub enum VcsError {
    /// No registered VCS marker was found in the directory or any parent.
    #[error("no version control system found at or above {}", .path.display())]
    NotDetected {
        /// The directory the search started from
        path: PathBuf,
    },

    /// The VCS command-line tool is not installed or not on `PATH`.
    #[error("`{tool}` was not found on PATH")]
    ToolNotFound {
        /// Name of the missing executable
        tool: String,
    },

    /// The VCS tool ran but exited unsuccessfully.
    #[error("`{command}` failed ({}): {stderr}", exit_label(.status))]
    CommandFailed {
        /// The full command line that was run
        command: String,
        /// Exit code, if the process exited normally
        status: Option<i32>,
        /// Captured standard error
        stderr: String,
    },

    /// A filesystem operation failed during detection or invocation.
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        /// The path being inspected
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

fn exit_label(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("exit {}", code),
        None => "terminated by signal".to_string(),
    }
}

/// A supported version control system.
///
/// Each variant knows its marker paths, how to list tracked files, and which
/// metadata it can report.
///
/// # Example
///
/// ```rust
/// use atlas_client::vcs::Vcs;
///
/// assert_eq!(Vcs::Git.name(), "git");
/// assert_eq!(Vcs::Mercurial.markers(), &[".hg"]);
/// assert_eq!(Vcs::REGISTRY[0], Vcs::Git);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vcs {
    /// Git
    Git,
    /// Mercurial
    Mercurial,
    /// Subversion
    Subversion,
}

impl Vcs {
    /// Detection order. The first system whose marker is found wins.
    pub const REGISTRY: [Vcs; 3] = [Vcs::Git, Vcs::Mercurial, Vcs::Subversion];

    /// Returns the short name of the system, which is also its tool name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Git => "git",
            Self::Mercurial => "hg",
            Self::Subversion => "svn",
        }
    }

    /// Returns the paths whose presence in a directory signals this system.
    pub fn markers(&self) -> &'static [&'static str] {
        match self {
            Self::Git => &[".git"],
            Self::Mercurial => &[".hg"],
            Self::Subversion => &[".svn"],
        }
    }

    /// Checks whether any of this system's markers exist directly in `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`VcsError::Io`] if the existence check itself fails, for
    /// example on a permission error.
    pub fn is_marked(&self, dir: &Path) -> Result<bool, VcsError> {
        for marker in self.markers() {
            let candidate = dir.join(marker);
            let exists = candidate.try_exists().map_err(|e| VcsError::Io {
                path: candidate.clone(),
                source: e,
            })?;
            if exists {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Finds the nearest ancestor of `dir` (inclusive) carrying this system's
    /// marker.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(root))` with the marked directory
    /// - `Ok(None)` if the filesystem root is reached without a match
    pub fn find_root(&self, dir: &Path) -> Result<Option<PathBuf>, VcsError> {
        for ancestor in dir.ancestors() {
            if self.is_marked(ancestor)? {
                return Ok(Some(ancestor.to_path_buf()));
            }
        }
        Ok(None)
    }

    /// Lists the files this system tracks under `dir`.
    ///
    /// Paths are relative to `dir` and use `/` as separator. Files outside
    /// `dir` (possible when `dir` is a subdirectory of the repository) are
    /// dropped.
    ///
    /// # Errors
    ///
    /// Returns [`VcsError::ToolNotFound`] if the tool is not installed,
    /// [`VcsError::CommandFailed`] if it exits unsuccessfully.
    pub fn tracked_files(&self, dir: &Path) -> Result<Vec<String>, VcsError> {
        let dir = absolute(dir)?;
        let files: Vec<String> = match self {
            Self::Git => {
                let output = command::run(&dir, "git", &["-c", "core.quotepath=off", "ls-files"])?;
                command::lines(&output).map(str::to_string).collect()
            }
            Self::Mercurial => {
                let output = command::run(&dir, "hg", &["locate", "-f", "--include", "."])?;
                rebase_paths(&dir, command::lines(&output))
            }
            Self::Subversion => {
                let output = command::run(&dir, "svn", &["ls", "-R"])?;
                svn_files(&output)
            }
        };

        tracing::debug!("{} tracks {} files under {}", self.name(), files.len(), dir.display());
        Ok(files)
    }

    /// Collects descriptive metadata about the checkout at `dir`.
    ///
    /// Git reports `branch`, `commit`, and one `remote.<name>` entry per
    /// fetch remote. The other systems report nothing.
    ///
    /// # Errors
    ///
    /// Any failing tool invocation fails the whole call.
    pub fn metadata(&self, dir: &Path) -> Result<BTreeMap<String, String>, VcsError> {
        let mut metadata = BTreeMap::new();
        if *self != Self::Git {
            return Ok(metadata);
        }

        let dir = absolute(dir)?;

        let branch = command::run(&dir, "git", &["rev-parse", "--abbrev-ref", "HEAD"])?;
        metadata.insert("branch".to_string(), branch.trim().to_string());

        let commit = command::run(&dir, "git", &["rev-parse", "HEAD"])?;
        metadata.insert("commit".to_string(), commit.trim().to_string());

        let remotes = command::run(&dir, "git", &["remote", "-v"])?;
        metadata.extend(parse_remotes(&remotes));

        Ok(metadata)
    }
}

impl std::fmt::Display for Vcs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Detects the version control system governing `path`.
///
/// Each registered system is tried in [`Vcs::REGISTRY`] order, walking from
/// `path` upward through its parents; the first system found anywhere in the
/// ancestry wins.
///
/// # Returns
///
/// - `Ok(Some(vcs))` when a marker was found
/// - `Ok(None)` when the filesystem root was reached with no match
/// - `Err` if the path could not be resolved or inspected
pub fn detect(path: &Path) -> Result<Option<Vcs>, VcsError> {
    let dir = absolute(path)?;

    for vcs in Vcs::REGISTRY {
        if let Some(root) = vcs.find_root(&dir)? {
            tracing::debug!("Detected {} at {}", vcs, root.display());
            return Ok(Some(vcs));
        }
    }

    tracing::debug!("No VCS found at or above {}", dir.display());
    Ok(None)
}

/// Detects the VCS for `path` and lists its tracked files.
///
/// # Errors
///
/// Returns [`VcsError::NotDetected`] if no system governs `path`.
pub fn tracked_files(path: &Path) -> Result<Vec<String>, VcsError> {
    detect_required(path)?.tracked_files(path)
}

/// Detects the VCS for `path` and collects its metadata.
///
/// # Errors
///
/// Returns [`VcsError::NotDetected`] if no system governs `path`.
pub fn metadata(path: &Path) -> Result<BTreeMap<String, String>, VcsError> {
    detect_required(path)?.metadata(path)
}

pub(crate) fn detect_required(path: &Path) -> Result<Vcs, VcsError> {
    detect(path)?.ok_or_else(|| VcsError::NotDetected {
        path: path.to_path_buf(),
    })
}

fn absolute(path: &Path) -> Result<PathBuf, VcsError> {
    fs::canonicalize(path).map_err(|e| VcsError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Re-roots absolute paths printed by a tool onto `dir`, dropping any that
/// fall outside it.
fn rebase_paths<'a>(dir: &Path, lines: impl Iterator<Item = &'a str>) -> Vec<String> {
    lines
        .filter_map(|line| {
            let relative = Path::new(line).strip_prefix(dir).ok()?;
            let joined = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");
            (!joined.is_empty()).then_some(joined)
        })
        .collect()
}

/// Keeps the file entries of an `svn ls -R` listing; directories end in `/`.
fn svn_files(output: &str) -> Vec<String> {
    command::lines(output)
        .filter(|line| !line.ends_with('/'))
        .map(str::to_string)
        .collect()
}

/// Parses `git remote -v` output into `remote.<name>` → fetch URL pairs.
fn parse_remotes(output: &str) -> BTreeMap<String, String> {
    command::lines(output)
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let name = fields.next()?;
            let url = fields.next()?;
            match fields.next() {
                Some("(fetch)") | None => Some((format!("remote.{}", name), url.to_string())),
                _ => None,
            }
        })
        .collect()
}
