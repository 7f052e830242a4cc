//! File access for the converter.
//!
//! Every failure is reported as `ConvertError::FileProcessing` with the path
//! that caused it.

use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, Read, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::{ConvertError, ConvertResult};

const READ_BUFFER_CAPACITY: usize = 1024 * 1024;

fn file_error(path: &Path) -> impl FnOnce(std::io::Error) -> ConvertError + '_ {
    move |source| ConvertError::FileProcessing {
        path: path.to_path_buf(),
        source,
    }
}

/// Stateless file helper.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileService;

impl FileService {
    pub fn new() -> Self {
        Self
    }

    /// Reads a whole text file.
    pub fn read_text(&self, path: &Path) -> ConvertResult<String> {
        let file = File::open(path).map_err(file_error(path))?;
        let size = file.metadata().map(|m| m.len() as usize).unwrap_or(0);
        let mut reader = BufReader::with_capacity(READ_BUFFER_CAPACITY, file);
        let mut content = String::with_capacity(size);
        reader.read_to_string(&mut content).map_err(file_error(path))?;
        Ok(content)
    }

    /// Creates or truncates `path` and writes `content`.
    pub fn write_text(&self, path: &Path, content: &str) -> ConvertResult<()> {
        fs::write(path, content).map_err(file_error(path))
    }

    /// Appends `content`, creating the file when missing.
    pub fn append(&self, path: &Path, content: &str) -> ConvertResult<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(file_error(path))?;
        file.write_all(content.as_bytes()).map_err(file_error(path))
    }

    /// Creates a temporary file, deleted when the handle is dropped.
    pub fn create_temp(&self) -> ConvertResult<NamedTempFile> {
        NamedTempFile::new().map_err(file_error(&std::env::temp_dir()))
    }

    /// True when the file exists and has no bytes.
    pub fn is_empty(&self, path: &Path) -> ConvertResult<bool> {
        let metadata = fs::metadata(path).map_err(file_error(path))?;
        Ok(metadata.len() == 0)
    }
}
