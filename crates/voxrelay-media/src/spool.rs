//! Run-scoped temporary copy of a recorded clip.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use voxrelay_core::error::Result;
use voxrelay_core::types::AudioClip;

/// A clip written to a uniquely named `.wav` file.
///
/// The file is removed by [`SpooledClip::close`] or, failing that, on drop.
/// The path stays readable afterwards so callers can report which file was used.
pub struct SpooledClip {
    file: Option<NamedTempFile>,
    path: PathBuf,
}

impl SpooledClip {
    /// Write `clip` into `dir`, creating the directory if needed.
    pub fn create(dir: &Path, clip: &AudioClip) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        let mut file = tempfile::Builder::new()
            .prefix("voxrelay-clip-")
            .suffix(".wav")
            .tempfile_in(dir)?;
        file.write_all(&clip.data)?;
        file.flush()?;

        let path = file.path().to_path_buf();
        debug!(path = %path.display(), bytes = clip.len(), "Clip spooled");
        Ok(Self {
            file: Some(file),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the spooled bytes back from disk.
    pub fn read(&self) -> Result<Vec<u8>> {
        Ok(std::fs::read(&self.path)?)
    }

    /// Delete the file now. Safe to call more than once.
    pub fn close(&mut self) -> Result<()> {
        if let Some(file) = self.file.take() {
            file.close()?;
            debug!(path = %self.path.display(), "Spooled clip removed");
        }
        Ok(())
    }
}

impl Drop for SpooledClip {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(path = %self.path.display(), error = %e, "Failed to remove spooled clip");
        }
    }
}
