// src/file_manager.rs - Reading G-code programs from disk
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

/// Extensions picked up when a directory is estimated.
pub const GCODE_EXTENSIONS: [&str; 5] = ["gcode", "nc", "ngc", "tap", "gc"];

#[derive(Debug, Error)]
pub enum FileError {
    #[error("File '{0}' not found")]
    NotFound(PathBuf),
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FileError {
    fn from_io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            FileError::NotFound(path.to_path_buf())
        } else {
            FileError::Io { path: path.to_path_buf(), source }
        }
    }
}

#[derive(Debug, Clone)]
pub struct FileManager {
    base_directory: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileInfo {
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
}

impl FileManager {
    pub fn new() -> Self {
        Self::with_base_directory(".")
    }

    /// Relative paths are resolved against `base`.
    pub fn with_base_directory(base: impl Into<PathBuf>) -> Self {
        Self { base_directory: base.into() }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_directory.join(path)
        }
    }

    pub async fn read_gcode_file(&self, path: impl AsRef<Path>) -> Result<String, FileError> {
        let path = self.resolve(path.as_ref());
        tracing::info!("Reading G-code file: {}", path.display());
        fs::read_to_string(&path).await.map_err(|e| FileError::from_io(&path, e))
    }

    /// G-code files directly inside `dir`, sorted by name.
    pub async fn list_gcode_files(&self, dir: impl AsRef<Path>) -> Result<Vec<FileInfo>, FileError> {
        let dir = self.resolve(dir.as_ref());
        let mut entries = fs::read_dir(&dir).await.map_err(|e| FileError::from_io(&dir, e))?;
        let mut files = Vec::new();

        while let Some(entry) = entries.next_entry().await.map_err(|e| FileError::from_io(&dir, e))? {
            let path = entry.path();
            let is_gcode = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| GCODE_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)));
            if !is_gcode {
                continue;
            }
            let metadata = entry.metadata().await.map_err(|e| FileError::from_io(&path, e))?;
            if !metadata.is_file() {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                files.push(FileInfo { name: name.to_string(), size: metadata.len(), path: path.clone() });
            }
        }

        files.sort_by(|a, b| a.name.cmp(&b.name));
        tracing::info!("Found {} G-code files in {}", files.len(), dir.display());
        Ok(files)
    }

    /// Expands directories into their G-code files; other paths pass through.
    pub async fn expand_inputs(&self, inputs: &[PathBuf]) -> Result<Vec<PathBuf>, FileError> {
        let mut paths = Vec::new();
        for input in inputs {
            let resolved = self.resolve(input);
            if fs::metadata(&resolved).await.is_ok_and(|m| m.is_dir()) {
                paths.extend(self.list_gcode_files(&resolved).await?.into_iter().map(|f| f.path));
            } else {
                paths.push(input.clone());
            }
        }
        Ok(paths)
    }
}

impl Default for FileManager {
    fn default() -> Self {
        Self::new()
    }
}
