//
//  atlas-client
//  archive/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Archive Builder
//!
//! Packages a file or directory tree as a gzipped tarball ready for upload.
//!
//! ## Overview
//!
//! [`create`] returns an [`Archive`], a blocking reader over the compressed
//! bytes. The tarball is produced on a background thread while the caller
//! reads, through a bounded channel, so memory use stays flat regardless of
//! archive size. [`create_spooled`] writes the whole archive to a temporary
//! file first and is useful when the consumer needs the size up front.
//!
//! ## Selection Rules
//!
//! For a directory, each path relative to the root is tested in order:
//!
//! 1. **VCS**: with [`ArchiveOptions::vcs`] set, only files tracked by the
//!    detected VCS (and directories containing them) are kept
//! 2. **Include**: with include patterns, only paths matching one of them
//!    are kept, plus the directories leading to them; a directory no pattern
//!    can reach below is not entered
//! 3. **Exclude**: paths matching any exclude pattern are dropped; an
//!    excluded directory drops its whole subtree
//!
//! Entries from [`ArchiveOptions::extra`] are appended after the tree,
//! unfiltered.
//!
//! A single plain file becomes a one-entry archive named after the file,
//! followed by any extra entries. A gzipped file is passed through as is.
//!
//! ## Example
//!
//! ```rust,no_run
//! use atlas_client::archive::{self, ArchiveOptions};
//! use std::io::Read;
//!
//! let options = ArchiveOptions {
//!     exclude: vec![".terraform".to_string(), ".terraform/*".to_string()],
//!     ..Default::default()
//! };
//!
//! let mut archive = archive::create("./infra".as_ref(), &options)?;
//! let mut bytes = Vec::new();
//! archive.read_to_end(&mut bytes)?;
//! assert_eq!(archive.size(), Some(bytes.len() as u64));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod glob;
mod pipe;

pub use glob::{escape, Glob};

use std::collections::{BTreeMap, HashSet};
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::thread;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use tempfile::NamedTempFile;
use thiserror::Error;
use walkdir::WalkDir;

use crate::vcs::{self, VcsError};

use pipe::{Frame, PipeReader};

/// Buffer between the gzip encoder and a spooled archive's temp file.
const SPOOL_BUFFER_SIZE: usize = 4 * 1024 * 1024;

/// Errors raised while building an archive.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// Filter options were given for a single-file archive.
    #[error("options such as include, exclude, and vcs are not supported when archiving a single file")]
    IncompatibleOptions,

    /// An include or exclude pattern could not be compiled.
    #[error("invalid glob pattern {pattern:?}: {message}")]
    Glob {
        /// The pattern as given
        pattern: String,
        /// What is wrong with it
        message: String,
    },

    /// Reading a source file or writing the archive failed.
    #[error("archive I/O error at {}: {source}", .path.display())]
    Io {
        /// The file being read or written
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// VCS mode was requested and the VCS could not be queried.
    #[error(transparent)]
    Vcs(#[from] VcsError),
}

impl ArchiveError {
    fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Options controlling which files end up in an archive.
///
/// # Example
///
/// ```rust
/// use atlas_client::archive::ArchiveOptions;
/// use std::path::PathBuf;
///
/// let mut options = ArchiveOptions::default();
/// assert!(!options.is_set());
///
/// options.extra.insert("config/app.hcl".to_string(), PathBuf::from("/etc/app.hcl"));
/// assert!(!options.is_set());
///
/// options.include.push("*.tf".to_string());
/// assert!(options.is_set());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ArchiveOptions {
    /// Glob patterns a path must match one of to be included
    pub include: Vec<String>,
    /// Glob patterns that drop a matching path (and, for directories, their subtree)
    pub exclude: Vec<String>,
    /// Archive entry name → source path, added after the tree
    pub extra: BTreeMap<String, PathBuf>,
    /// Restrict the tree to files tracked by the governing VCS
    pub vcs: bool,
}

impl ArchiveOptions {
    /// Returns whether any filtering option is set. Extra entries are not a
    /// filter and do not count.
    pub fn is_set(&self) -> bool {
        !self.include.is_empty() || !self.exclude.is_empty() || self.vcs
    }
}

/// A gzipped tarball being read.
///
/// `Archive` implements [`Read`]. Dropping it at any point releases every
/// resource behind it: a streaming producer stops at its next write, and a
/// spooled temp file is deleted.
pub struct Archive {
    source: Source,
    metadata: BTreeMap<String, String>,
}

enum Source {
    Stream(PipeReader),
    Spooled { file: NamedTempFile, size: u64 },
    Passthrough { file: File, size: u64 },
}

impl Archive {
    /// Size of the archive in bytes.
    ///
    /// Spooled and pass-through archives know their size immediately. A
    /// streamed archive reports `None` until it has been read to the end.
    pub fn size(&self) -> Option<u64> {
        match &self.source {
            Source::Stream(reader) => reader.size(),
            Source::Spooled { size, .. } | Source::Passthrough { size, .. } => Some(*size),
        }
    }

    /// VCS metadata gathered for the archived tree (empty unless VCS mode
    /// was used and the VCS reports metadata).
    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    /// Closes the archive, removing its temp file if it has one.
    ///
    /// # Errors
    ///
    /// Returns the error from removing the temp file. The file handle is
    /// closed and removal attempted regardless.
    pub fn close(self) -> io::Result<()> {
        match self.source {
            Source::Spooled { file, .. } => file.close(),
            Source::Stream(_) | Source::Passthrough { .. } => Ok(()),
        }
    }
}

impl Read for Archive {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.source {
            Source::Stream(reader) => reader.read(buf),
            Source::Spooled { file, .. } => file.read(buf),
            Source::Passthrough { file, .. } => file.read(buf),
        }
    }
}

impl std::fmt::Debug for Archive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.source {
            Source::Stream(_) => "stream",
            Source::Spooled { .. } => "spooled",
            Source::Passthrough { .. } => "passthrough",
        };
        f.debug_struct("Archive")
            .field("kind", &kind)
            .field("size", &self.size())
            .field("metadata", &self.metadata)
            .finish()
    }
}

/// Builds a streamed tar.gz archive of `path`.
///
/// Options are validated, patterns compiled, and VCS queries run before this
/// returns; only the walk and compression happen in the background. Errors
/// hit while producing the stream surface from [`Read::read`] as an
/// [`io::Error`] wrapping the [`ArchiveError`].
///
/// # Errors
///
/// - [`ArchiveError::IncompatibleOptions`] if `path` is a file and options are set
/// - [`ArchiveError::Glob`] for a malformed pattern
/// - [`ArchiveError::Vcs`] if VCS mode is on and no VCS is found or its tool fails
/// - [`ArchiveError::Io`] if `path` cannot be inspected
pub fn create(path: &Path, options: &ArchiveOptions) -> Result<Archive, ArchiveError> {
    let plan = match prepare(path, options)? {
        Prepared::Passthrough(archive) => return Ok(archive),
        Prepared::Tree(plan) => plan,
    };

    tracing::info!("Streaming archive of {}", plan.root.display());

    let (writer, reader) = pipe::pipe();
    let failures = writer.failure_sender();
    let metadata = plan.metadata.clone();

    thread::Builder::new()
        .name("atlas-archive".to_string())
        .spawn(move || {
            let outcome = plan
                .write(writer)
                .and_then(|writer| writer.finish().map_err(|e| ArchiveError::io(&plan.root, e)));

            match outcome {
                Ok(total) => tracing::debug!("Archive stream complete ({})", crate::util::format_size(total)),
                Err(err) => {
                    tracing::debug!("Archive stream aborted: {}", err);
                    let _ = failures.send(Frame::Failed(err));
                }
            }
        })
        .map_err(|e| ArchiveError::io(path, e))?;

    Ok(Archive {
        source: Source::Stream(reader),
        metadata,
    })
}

/// Builds a tar.gz archive of `path` into a temporary file.
///
/// The returned archive has a definite [`Archive::size`] and deletes its
/// file when dropped or [closed](Archive::close). Disk usage equals the
/// archive size.
///
/// # Errors
///
/// Same as [`create`], plus any error writing the temp file.
pub fn create_spooled(path: &Path, options: &ArchiveOptions) -> Result<Archive, ArchiveError> {
    let plan = match prepare(path, options)? {
        Prepared::Passthrough(archive) => return Ok(archive),
        Prepared::Tree(plan) => plan,
    };

    let mut file = NamedTempFile::new().map_err(|e| ArchiveError::io(std::env::temp_dir(), e))?;
    let spool_path = file.path().to_path_buf();

    let writer = plan.write(BufWriter::with_capacity(SPOOL_BUFFER_SIZE, file.as_file_mut()))?;
    writer
        .into_inner()
        .map_err(|e| ArchiveError::io(&spool_path, e.into_error()))?;

    let size = file
        .as_file_mut()
        .seek(SeekFrom::End(0))
        .and_then(|size| file.as_file_mut().seek(SeekFrom::Start(0)).map(|_| size))
        .map_err(|e| ArchiveError::io(&spool_path, e))?;

    tracing::info!(
        "Spooled archive of {} to {} ({})",
        plan.root.display(),
        spool_path.display(),
        crate::util::format_size(size)
    );

    Ok(Archive {
        source: Source::Spooled { file, size },
        metadata: plan.metadata,
    })
}

enum Prepared {
    Passthrough(Archive),
    Tree(Plan),
}

/// Validates the request and resolves everything that can fail up front.
fn prepare(path: &Path, options: &ArchiveOptions) -> Result<Prepared, ArchiveError> {
    let info = fs::metadata(path).map_err(|e| ArchiveError::io(path, e))?;

    if !info.is_dir() {
        if options.is_set() {
            return Err(ArchiveError::IncompatibleOptions);
        }

        let mut file = File::open(path).map_err(|e| ArchiveError::io(path, e))?;
        if is_gzip(&mut file).map_err(|e| ArchiveError::io(path, e))? {
            // A pass-through stream cannot take more entries.
            if !options.extra.is_empty() {
                return Err(ArchiveError::IncompatibleOptions);
            }
            tracing::info!("{} is already gzipped, passing it through", path.display());
            return Ok(Prepared::Passthrough(Archive {
                source: Source::Passthrough {
                    file,
                    size: info.len(),
                },
                metadata: BTreeMap::new(),
            }));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                ArchiveError::io(path, io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))
            })?;
        return Ok(Prepared::Tree(Plan::single(name, path.to_path_buf(), options)));
    }

    Plan::new(path.to_path_buf(), options).map(Prepared::Tree)
}

/// Checks for a gzip header, leaving the file rewound.
fn is_gzip(file: &mut File) -> io::Result<bool> {
    let gzipped = {
        let mut decoder = GzDecoder::new(&mut *file);
        let mut first = [0u8; 1];
        let _ = decoder.read(&mut first);
        decoder.header().is_some()
    };
    file.seek(SeekFrom::Start(0))?;
    Ok(gzipped)
}

/// Files tracked by the VCS plus every directory leading to one.
struct Tracked {
    files: HashSet<String>,
    dirs: HashSet<String>,
}

impl Tracked {
    fn new(files: Vec<String>) -> Self {
        let mut dirs = HashSet::new();
        for file in &files {
            let mut end = 0;
            while let Some(offset) = file[end..].find('/') {
                end += offset;
                dirs.insert(file[..end].to_string());
                end += 1;
            }
        }
        Self {
            files: files.into_iter().collect(),
            dirs,
        }
    }
}

/// Everything the producer needs, resolved ahead of time.
struct Plan {
    root: PathBuf,
    /// Single-file mode: the one entry to write instead of walking `root`
    single: Option<String>,
    include: Vec<Glob>,
    exclude: Vec<Glob>,
    tracked: Option<Tracked>,
    extra: Vec<(String, PathBuf)>,
    metadata: BTreeMap<String, String>,
}

/// Decision for a single walked path.
enum Verdict {
    /// Excluded; for a directory, skip its subtree.
    Skip,
    /// Not selected itself, but a descendant might be.
    Defer,
    /// Selected.
    Keep,
}

impl Plan {
    fn new(root: PathBuf, options: &ArchiveOptions) -> Result<Self, ArchiveError> {
        let include = glob::compile_all(&options.include)?;
        let exclude = glob::compile_all(&options.exclude)?;

        let (tracked, metadata) = if options.vcs {
            let system = vcs::detect_required(&root)?;
            tracing::info!("Archiving files tracked by {} in {}", system, root.display());
            let files = system.tracked_files(&root)?;
            let metadata = system.metadata(&root)?;
            (Some(Tracked::new(files)), metadata)
        } else {
            (None, BTreeMap::new())
        };

        Ok(Self {
            root,
            single: None,
            include,
            exclude,
            tracked,
            extra: collect_extra(options),
            metadata,
        })
    }

    /// A plan holding just the file at `path`, stored as `name`.
    fn single(name: String, path: PathBuf, options: &ArchiveOptions) -> Self {
        Self {
            root: path,
            single: Some(name),
            include: Vec::new(),
            exclude: Vec::new(),
            tracked: None,
            extra: collect_extra(options),
            metadata: BTreeMap::new(),
        }
    }

    fn judge(&self, subpath: &str, is_dir: bool) -> Verdict {
        if self.exclude.iter().any(|g| g.is_match(subpath)) {
            return Verdict::Skip;
        }

        let mut verdict = Verdict::Keep;

        if let Some(tracked) = &self.tracked {
            if is_dir && tracked.dirs.contains(subpath) {
                verdict = Verdict::Defer;
            } else if !tracked.files.contains(subpath) {
                return Verdict::Skip;
            }
        }

        if !self.include.is_empty() && !self.include.iter().any(|g| g.is_match(subpath)) {
            let below = is_dir && self.include.iter().any(|g| g.may_match_below(subpath));
            return if below { Verdict::Defer } else { Verdict::Skip };
        }

        verdict
    }

    /// Writes the whole archive into `sink` and hands the sink back.
    fn write<W: Write>(&self, sink: W) -> Result<W, ArchiveError> {
        let mut builder = tar::Builder::new(GzEncoder::new(sink, Compression::default()));

        self.write_tree(&mut builder)?;
        for (name, source) in &self.extra {
            write_extra(&mut builder, name, source)?;
        }

        let encoder = builder
            .into_inner()
            .map_err(|e| ArchiveError::io(&self.root, e))?;
        encoder.finish().map_err(|e| ArchiveError::io(&self.root, e))
    }

    fn write_tree<W: Write>(&self, builder: &mut tar::Builder<W>) -> Result<(), ArchiveError> {
        if let Some(name) = &self.single {
            return append_path(builder, name, &self.root);
        }

        // Directories seen but not yet written: (depth, subpath, absolute path).
        let mut pending: Vec<(usize, String, PathBuf)> = Vec::new();

        let mut walker = WalkDir::new(&self.root)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter();

        while let Some(entry) = walker.next() {
            let entry = entry.map_err(|e| {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| self.root.clone());
                ArchiveError::io(path, e.into())
            })?;

            let depth = entry.depth();
            pending.retain(|(d, _, _)| *d < depth);

            let subpath = relative_name(&self.root, entry.path())?;
            let is_dir = entry.file_type().is_dir();

            match self.judge(&subpath, is_dir) {
                Verdict::Skip => {
                    if is_dir {
                        walker.skip_current_dir();
                    }
                }
                Verdict::Defer => {
                    pending.push((depth, subpath, entry.path().to_path_buf()));
                }
                Verdict::Keep => {
                    for (_, name, path) in pending.drain(..) {
                        append_path(builder, &format!("{}/", name), &path)?;
                    }
                    if is_dir {
                        append_path(builder, &format!("{}/", subpath), entry.path())?;
                    } else {
                        append_path(builder, &subpath, entry.path())?;
                    }
                }
            }
        }

        Ok(())
    }
}

fn collect_extra(options: &ArchiveOptions) -> Vec<(String, PathBuf)> {
    options
        .extra
        .iter()
        .map(|(name, source)| (name.clone(), source.clone()))
        .collect()
}

fn relative_name(root: &Path, path: &Path) -> Result<String, ArchiveError> {
    let relative = path.strip_prefix(root).map_err(|_| {
        ArchiveError::io(path, io::Error::new(io::ErrorKind::InvalidInput, "path escapes archive root"))
    })?;

    Ok(relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/"))
}

/// Appends one filesystem object under `name`. Directory names must carry a
/// trailing `/`.
fn append_path<W: Write>(builder: &mut tar::Builder<W>, name: &str, path: &Path) -> Result<(), ArchiveError> {
    let info = fs::symlink_metadata(path).map_err(|e| ArchiveError::io(path, e))?;

    let mut header = tar::Header::new_gnu();
    header.set_metadata(&info);

    let written = if info.file_type().is_symlink() {
        header.set_size(0);
        match fs::read_link(path) {
            Ok(target) => builder.append_link(&mut header, name, &target),
            Err(e) => {
                tracing::warn!("Could not read link target of {}: {}", path.display(), e);
                builder.append_data(&mut header, name, io::empty())
            }
        }
    } else if info.is_dir() {
        header.set_size(0);
        builder.append_data(&mut header, name, io::empty())
    } else {
        let file = File::open(path).map_err(|e| ArchiveError::io(path, e))?;
        builder.append_data(&mut header, name, file)
    };

    written.map_err(|e| ArchiveError::io(path, e))
}

/// Appends an extra entry, expanding directories recursively under `name`.
fn write_extra<W: Write>(builder: &mut tar::Builder<W>, name: &str, source: &Path) -> Result<(), ArchiveError> {
    let name = name.trim_end_matches('/');
    let info = fs::metadata(source).map_err(|e| ArchiveError::io(source, e))?;

    if !info.is_dir() {
        return append_path(builder, name, source);
    }

    append_path(builder, &format!("{}/", name), source)?;
    for entry in WalkDir::new(source).min_depth(1).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| source.to_path_buf());
            ArchiveError::io(path, e.into())
        })?;

        let mut entry_name = format!("{}/{}", name, relative_name(source, entry.path())?);
        if entry.file_type().is_dir() {
            entry_name.push('/');
        }
        append_path(builder, &entry_name, entry.path())?;
    }

    Ok(())
}
