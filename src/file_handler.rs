use crate::CollectError;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// How `read_lines` treats a file that does not exist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingFile {
    /// Surface the condition as `CollectError::NotFound`
    Fail,
    /// Treat the file as having no lines
    Empty,
}

/// Read a text file into lines, each keeping its terminator
pub fn read_lines(path: &Path, missing: MissingFile) -> Result<Vec<String>, CollectError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return match missing {
                MissingFile::Fail => Err(CollectError::NotFound(path.to_path_buf())),
                MissingFile::Empty => Ok(Vec::new()),
            };
        }
        Err(e) => return Err(CollectError::Io(e)),
    };

    Ok(text.split_inclusive('\n').map(str::to_string).collect())
}

/// Overwrite `path` with the concatenation of `lines`.
///
/// This is a plain truncate-and-write, not a rename: an interrupted run can
/// leave the file half written.
pub fn write_lines(path: &Path, lines: &[String]) -> Result<(), CollectError> {
    if let Some(parent) = path.parent() {
        ensure_directory_exists(parent)?;
    }
    fs::write(path, lines.concat()).map_err(CollectError::Io)
}

pub fn ensure_directory_exists(path: &Path) -> Result<(), CollectError> {
    if path.as_os_str().is_empty() {
        return Ok(());
    }
    fs::create_dir_all(path).map_err(CollectError::Io)
}
