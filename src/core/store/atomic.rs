// src/core/store/atomic.rs

//! Write-temp-then-rename file replacement.

use crate::core::errors::BootstrapError;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{error, warn};

/// Contents fully written and synced to a temporary file next to `target`,
/// waiting to be renamed into place.
///
/// Dropping a `StagedWrite` without calling [`StagedWrite::commit`] removes
/// the temporary file and leaves `target` as it was.
#[derive(Debug)]
pub struct StagedWrite {
    temp_path: PathBuf,
    target: PathBuf,
    committed: bool,
}

impl StagedWrite {
    /// Writes `contents` to a fresh owner-only temporary file beside `target`.
    pub fn stage(target: &Path, contents: &[u8]) -> Result<Self, BootstrapError> {
        let file_name = target
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| {
                BootstrapError::io(
                    "Store path has no file name",
                    target,
                    io::Error::from(io::ErrorKind::InvalidInput),
                )
            })?;
        let temp_path = target.with_file_name(format!(
            "{}.tmp-{}-{}",
            file_name,
            std::process::id(),
            rand::random::<u32>()
        ));

        let mut file = open_owner_only(&temp_path)
            .map_err(|e| BootstrapError::io("Failed to create temporary file", &temp_path, e))?;

        // From here on the temp file exists and is cleaned up on drop.
        let staged = StagedWrite {
            temp_path,
            target: target.to_path_buf(),
            committed: false,
        };

        file.write_all(contents)
            .and_then(|_| file.sync_all())
            .map_err(|e| BootstrapError::io("Failed to write temporary file", &staged.temp_path, e))?;

        Ok(staged)
    }

    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Atomically renames the temporary file over the target.
    pub fn commit(mut self) -> Result<(), BootstrapError> {
        fs::rename(&self.temp_path, &self.target).map_err(|e| {
            BootstrapError::io("Failed to atomically rename into place", &self.target, e)
        })?;
        self.committed = true;

        if let Some(dir) = self.target.parent()
            && let Err(e) = sync_dir(dir)
        {
            warn!("Failed to sync directory '{}': {}", dir.display(), e);
        }
        Ok(())
    }
}

impl Drop for StagedWrite {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        if let Err(e) = fs::remove_file(&self.temp_path)
            && e.kind() != io::ErrorKind::NotFound
        {
            error!(
                "Failed to remove temporary file '{}': {}",
                self.temp_path.display(),
                e
            );
        }
    }
}

fn open_owner_only(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options.open(path)
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    let dir = if dir.as_os_str().is_empty() {
        Path::new(".")
    } else {
        dir
    };
    File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}

/// Creates `dir` and any missing parents, owner-only on Unix.
pub fn create_private_dir(dir: &Path) -> io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder.create(dir)
}
