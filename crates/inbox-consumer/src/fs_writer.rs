//! Filesystem-backed `FileWriter`.

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::Path;

use inbox_core::FileWriter;

/// Writes payloads to local files and syncs them before returning.
#[derive(Debug, Clone, Default)]
pub struct FsFileWriter {
    create_dirs: bool,
}

impl FsFileWriter {
    pub fn new(create_dirs: bool) -> Self {
        Self { create_dirs }
    }

    fn create(&self, path: &Path) -> io::Result<File> {
        if self.create_dirs {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
        }
        File::create(path)
    }
}

impl FileWriter for FsFileWriter {
    fn write_bytes(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        let mut file = self.create(path)?;
        file.write_all(data)?;
        file.sync_all()?;
        tracing::debug!(path = %path.display(), len = data.len(), "payload written");
        Ok(())
    }

    fn write_stream(&self, path: &Path, stream: &mut dyn Read) -> io::Result<()> {
        let mut file = self.create(path)?;
        let n = io::copy(stream, &mut file)?;
        file.sync_all()?;
        tracing::debug!(path = %path.display(), len = n, "payload streamed");
        Ok(())
    }
}
