use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::RecordKind;
use crate::storage::layout::StorageLayout;

/// Fail unless `dest` is missing or empty. Anything inside it is taken as
/// a build in progress or a crashed one.
pub fn ensure_empty(dest: &Path) -> Result<()> {
    match fs::read_dir(dest) {
        Ok(mut entries) => match entries.next() {
            None => Ok(()),
            Some(entry) => {
                let name = entry?.file_name();
                Err(Error::new(
                    ErrorKind::Precondition,
                    format!(
                        "destination {} is not empty (found {}); is another build running?",
                        dest.display(),
                        name.to_string_lossy()
                    ),
                ))
            }
        },
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}

/// Private scratch area for one run, on the destination's filesystem so
/// the final move is a rename. Removed when dropped.
pub struct Staging {
    dir: TempDir,
}

impl Staging {
    pub fn new(dest: &Path) -> Result<Self> {
        let parent = match dest.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent)?;
        let dir = tempfile::Builder::new().prefix(".gnindex-").tempdir_in(&parent)?;
        debug!(staging = %dir.path().display(), "created staging area");
        Ok(Staging { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// `<staging>/<genes|phenotypes>/<chunk>`
    pub fn shard_path(&self, kind: RecordKind, chunk: u64) -> PathBuf {
        self.dir.path().join(kind.shard_dir()).join(format!("{:05}", chunk))
    }

    pub fn combined_path(&self) -> PathBuf {
        self.dir.path().join("combined")
    }
}

/// Move the committed index at `built` into `dest` by renaming its
/// published files. Scratch files such as the writer lock stay behind.
pub fn publish(built: &Path, dest: &Path) -> Result<()> {
    ensure_empty(dest)?;
    fs::create_dir_all(dest)?;

    let source = StorageLayout::new(built);
    for file in source.published_files() {
        let Some(name) = file.file_name() else {
            continue;
        };
        fs::rename(&file, dest.join(name))?;
    }
    sync_dir(dest)?;

    info!(dest = %dest.display(), "published index");
    Ok(())
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> Result<()> {
    File::open(dir)?.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> Result<()> {
    Ok(())
}
