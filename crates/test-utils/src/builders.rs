#![allow(dead_code)]

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use assetflow::Pipeline;
use tempfile::TempDir;

/// How far in the past freshly written source files are dated. Outputs are
/// created "now", so sources are always strictly older than what a build
/// produces, whatever the filesystem's timestamp granularity.
pub const SOURCE_AGE: Duration = Duration::from_secs(100);

/// A throwaway project directory with helpers for writing sources and
/// controlling their modification times.
pub struct SourceTree {
    dir: TempDir,
}

impl SourceTree {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create temp dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    /// Write `rel` (creating parent dirs) and date it [`SOURCE_AGE`] ago.
    pub fn write(&self, rel: &str, contents: impl AsRef<[u8]>) -> PathBuf {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(&path, contents).expect("write source file");
        self.set_mtime(rel, SystemTime::now() - SOURCE_AGE);
        path
    }

    /// Rewrite `rel` and date it in the future, so it is newer than any
    /// output built so far.
    pub fn modify(&self, rel: &str, contents: impl AsRef<[u8]>) -> PathBuf {
        let path = self.write(rel, contents);
        self.touch(rel);
        path
    }

    /// Move `rel`'s modification time ahead of everything built so far.
    pub fn touch(&self, rel: &str) {
        self.set_mtime(rel, SystemTime::now() + Duration::from_secs(10));
    }

    pub fn set_mtime(&self, rel: &str, time: SystemTime) {
        let file = File::options()
            .write(true)
            .open(self.path(rel))
            .expect("open file to set mtime");
        file.set_modified(time).expect("set mtime");
    }

    pub fn mtime(&self, rel: &str) -> SystemTime {
        fs::metadata(self.path(rel))
            .and_then(|m| m.modified())
            .expect("read mtime")
    }

    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.path(rel)).expect("read file")
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.path(rel).exists()
    }

    pub fn remove(&self, rel: &str) {
        fs::remove_file(self.path(rel)).expect("remove file");
    }

    /// Write an `Assetfile.toml` at the root and return its path. The file
    /// is replaced by a rename, so a concurrent reader sees either the old
    /// or the new config, never a torn one.
    pub fn write_config(&self, source: &str) -> PathBuf {
        let path = self.path("Assetfile.toml");
        let staged = self.path("Assetfile.toml.new");
        fs::write(&staged, source).expect("write config");
        fs::rename(&staged, &path).expect("replace config");
        path
    }

    /// A pipeline reading `input` (every file), writing to `output`, with
    /// its temp files under `tmp/` in this tree.
    pub fn pipeline(&self, input: &str, output: &str) -> Pipeline {
        let mut pipeline = Pipeline::new();
        pipeline
            .add_input(self.path(input), None)
            .set_output_root(self.path(output))
            .set_tmp_root(self.path("tmp"));
        pipeline
    }
}

impl Default for SourceTree {
    fn default() -> Self {
        Self::new()
    }
}
