// src/file/handle.rs

use std::cmp::Ordering;
use std::fmt;
use std::fs::{self, File};
use std::hash::{Hash, Hasher};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::trace;

use crate::errors::{AssetflowError, Result};
use crate::types::Encoding;

/// Reference to a file by `(root, path, encoding)`.
///
/// - `root` is always absolute; relative roots are resolved against the
///   current directory at construction time.
/// - `path` is relative to `root` and always uses forward slashes.
/// - Identity (`Eq`, `Hash`) is `(root, path)` only, so the same file seen
///   through two encodings deduplicates in sets and maps.
///
/// Output handles additionally carry an optional open writer between
/// [`FileHandle::create`] and [`FileHandle::close`]. Cloning never shares
/// the writer.
pub struct FileHandle {
    root: PathBuf,
    path: String,
    encoding: Encoding,
    created: Option<BufWriter<File>>,
}

impl FileHandle {
    /// Handle with the default UTF-8 encoding.
    pub fn new(root: impl Into<PathBuf>, path: impl Into<String>) -> Self {
        Self::with_root_path_encoding(root, path, Encoding::Utf8)
    }

    pub fn with_root_path_encoding(
        root: impl Into<PathBuf>,
        path: impl Into<String>,
        encoding: Encoding,
    ) -> Self {
        Self {
            root: absolute_root(root.into()),
            path: normalize_rel(&path.into()),
            encoding,
            created: None,
        }
    }

    /// Same root and path, different encoding. The original is untouched.
    pub fn with_encoding(&self, encoding: Encoding) -> Self {
        Self {
            root: self.root.clone(),
            path: self.path.clone(),
            encoding,
            created: None,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// `root/path`.
    pub fn fullpath(&self) -> PathBuf {
        self.root.join(&self.path)
    }

    pub fn exists(&self) -> bool {
        self.fullpath().exists()
    }

    /// Read the whole file.
    ///
    /// For UTF-8 handles the bytes are validated and
    /// [`AssetflowError::Encoding`] is returned if they are not valid text.
    /// Binary handles return the bytes as-is.
    pub fn read(&self) -> Result<Vec<u8>> {
        let fullpath = self.fullpath();
        let contents = fs::read(&fullpath)?;

        if !self.encoding.is_binary() && std::str::from_utf8(&contents).is_err() {
            return Err(AssetflowError::Encoding { path: fullpath });
        }

        Ok(contents)
    }

    /// Read the whole file as text. Fails with
    /// [`AssetflowError::Encoding`] whenever the bytes are not UTF-8,
    /// whatever the handle's declared encoding.
    pub fn read_to_string(&self) -> Result<String> {
        let fullpath = self.fullpath();
        let contents = fs::read(&fullpath)?;
        String::from_utf8(contents).map_err(|_| AssetflowError::Encoding { path: fullpath })
    }

    /// Open (truncating) the file for writing, creating parent directories.
    ///
    /// The file stays open until [`FileHandle::close`]; prefer
    /// [`FileHandle::with_created`] unless writes span several calls.
    pub fn create(&mut self) -> Result<()> {
        let fullpath = self.fullpath();
        if let Some(parent) = fullpath.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = File::create(&fullpath)?;
        trace!(path = ?fullpath, "created output file");
        self.created = Some(BufWriter::new(file));
        Ok(())
    }

    /// Append a chunk to a previously created file.
    pub fn write(&mut self, chunk: impl AsRef<[u8]>) -> Result<()> {
        match self.created.as_mut() {
            Some(writer) => {
                writer.write_all(chunk.as_ref())?;
                Ok(())
            }
            None => Err(AssetflowError::UnopenedFile {
                path: self.fullpath(),
            }),
        }
    }

    /// Flush and close the open file.
    pub fn close(&mut self) -> Result<()> {
        match self.created.take() {
            Some(mut writer) => {
                writer.flush()?;
                Ok(())
            }
            None => Err(AssetflowError::UnopenedFile {
                path: self.fullpath(),
            }),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.created.is_none()
    }

    /// Create the file, run `f`, and close the file on every exit path.
    ///
    /// An error from `f` wins over an error from closing.
    pub fn with_created<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut FileHandle) -> Result<T>,
    {
        self.create()?;
        let result = f(self);
        let closed = if self.is_closed() { Ok(()) } else { self.close() };

        let value = result?;
        closed?;
        Ok(value)
    }
}

fn absolute_root(root: PathBuf) -> PathBuf {
    if root.is_absolute() {
        root
    } else {
        std::path::absolute(&root).unwrap_or(root)
    }
}

fn normalize_rel(path: &str) -> String {
    path.replace('\\', "/").trim_start_matches("./").to_string()
}

impl Clone for FileHandle {
    fn clone(&self) -> Self {
        self.with_encoding(self.encoding)
    }
}

impl PartialEq for FileHandle {
    fn eq(&self, other: &Self) -> bool {
        self.root == other.root && self.path == other.path
    }
}

impl Eq for FileHandle {}

impl Hash for FileHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.root.hash(state);
        self.path.hash(state);
    }
}

impl PartialOrd for FileHandle {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FileHandle {
    // Encoding is not compared: two handles that are equal by identity must
    // compare `Equal`.
    fn cmp(&self, other: &Self) -> Ordering {
        (&self.root, &self.path).cmp(&(&other.root, &other.path))
    }
}

impl fmt::Debug for FileHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileHandle")
            .field("root", &self.root)
            .field("path", &self.path)
            .field("encoding", &self.encoding)
            .finish()
    }
}

impl fmt::Display for FileHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fullpath().display())
    }
}
