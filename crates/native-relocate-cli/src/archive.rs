// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Exploded-archive access: walking the input tree and writing the output tree.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use native_relocate_core::{EmittedResource, ResourceSink};
use tracing::debug;
use walkdir::WalkDir;

/// One regular file of the exploded archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Entry name, `/`-separated and relative to the archive root.
    pub name: String,
    /// Location on disk.
    pub file: PathBuf,
    /// Modification time in milliseconds since the Unix epoch.
    pub modified: i64,
}

/// Every regular file under `root`, sorted by entry name.
///
/// Symbolic links are followed, so a linked file is archived with the
/// content and modification time of its target.
pub fn walk(root: &Path) -> io::Result<Vec<ArchiveEntry>> {
    let mut entries = Vec::new();
    for item in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        let item = item.map_err(map_walkdir_error)?;
        if !item.file_type().is_file() {
            continue;
        }
        let modified = millis_since_epoch(item.metadata().map_err(map_walkdir_error)?.modified()?);
        entries.push(ArchiveEntry {
            name: entry_name(root, item.path())?,
            file: item.into_path(),
            modified,
        });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

fn map_walkdir_error(err: walkdir::Error) -> io::Error {
    match err.io_error() {
        Some(io_err) => io::Error::new(io_err.kind(), err.to_string()),
        None => io::Error::other(err.to_string()),
    }
}

fn entry_name(root: &Path, path: &Path) -> io::Result<String> {
    let relative = path
        .strip_prefix(root)
        .map_err(|_| io::Error::other(format!("{} is outside the archive", path.display())))?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Ok(parts.join("/"))
}

/// Milliseconds since the Unix epoch; earlier times come out negative.
pub fn millis_since_epoch(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(after) => i64::try_from(after.as_millis()).unwrap_or(i64::MAX),
        Err(before) => i64::try_from(before.duration().as_millis()).map_or(i64::MIN, |ms| -ms),
    }
}

/// Inverse of [`millis_since_epoch`], saturating at the epoch on overflow.
pub fn system_time_from_millis(millis: i64) -> SystemTime {
    let offset = Duration::from_millis(millis.unsigned_abs());
    if millis >= 0 {
        UNIX_EPOCH.checked_add(offset)
    } else {
        UNIX_EPOCH.checked_sub(offset)
    }
    .unwrap_or(UNIX_EPOCH)
}

/// Output tree rooted at a directory.
///
/// Entries land at their `/`-separated name below the root with their
/// modification time set to the emitted timestamp.
#[derive(Debug)]
pub struct DirectorySink {
    root: PathBuf,
    written: usize,
}

impl DirectorySink {
    /// Sink writing below `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            written: 0,
        }
    }

    /// Number of entries written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    fn target(&self, name: &str) -> PathBuf {
        name.split('/')
            .fold(self.root.clone(), |path, part| path.join(part))
    }

    /// Copy an input entry verbatim, keeping its modification time.
    pub fn copy_entry(&mut self, entry: &ArchiveEntry) -> io::Result<()> {
        let target = self.target(&entry.name);
        create_parent(&target)?;
        fs::copy(&entry.file, &target)?;
        stamp(&target, entry.modified)?;
        debug!(entry = %entry.name, "copied");
        self.written += 1;
        Ok(())
    }
}

impl ResourceSink for DirectorySink {
    fn put_resource(&mut self, resource: EmittedResource) -> io::Result<()> {
        let target = self.target(&resource.path);
        create_parent(&target)?;
        fs::write(&target, &resource.bytes)?;
        stamp(&target, resource.timestamp)?;
        debug!(entry = %resource.path, timestamp = resource.timestamp, "wrote relocated resource");
        self.written += 1;
        Ok(())
    }
}

fn create_parent(target: &Path) -> io::Result<()> {
    match target.parent() {
        Some(parent) => fs::create_dir_all(parent),
        None => Ok(()),
    }
}

fn stamp(target: &Path, millis: i64) -> io::Result<()> {
    File::options()
        .write(true)
        .open(target)?
        .set_modified(system_time_from_millis(millis))
}
