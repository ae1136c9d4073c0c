//! Output file writer.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use carfeed_core::{AggregateDocument, FeedError, Persist};

/// Writes the document as pretty JSON, replacing the file each run.
pub struct JsonFilePersist {
    path: PathBuf,
}

impl JsonFilePersist {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn error(&self, message: impl ToString) -> FeedError {
        FeedError::Persist {
            path: self.path.display().to_string(),
            message: message.to_string(),
        }
    }
}

impl Persist for JsonFilePersist {
    fn write(&self, document: &AggregateDocument) -> Result<(), FeedError> {
        let json = document.to_json_pretty().map_err(|e| self.error(e))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.error(e))?;
        }

        let file = File::create(&self.path).map_err(|e| self.error(e))?;
        let mut writer = BufWriter::new(file);
        writer
            .write_all(json.as_bytes())
            .and_then(|_| writer.write_all(b"\n"))
            .and_then(|_| writer.flush())
            .map_err(|e| self.error(e))?;

        log::info!("wrote {} vehicles to {}", document.total_count, self.path.display());
        Ok(())
    }
}
