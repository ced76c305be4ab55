//! Virtual Filesystem
//!
//! Shader documents and stage sources are addressed by [`VfsPath`]s, which are
//! normalized forward-slash paths relative to a mount root. The same path type
//! keys the hotload dependency map, so a path produced by a file watcher and
//! a path produced by a program's include scan must normalize identically.
//!
//! Two readers are provided:
//!
//! | Reader | Backing store | Typical use |
//! |--------|---------------|-------------|
//! | [`DiskVfs`]   | a directory on disk    | desktop builds, hotload |
//! | [`MemoryVfs`] | an in-memory file map  | embedded shader packs, tests |

use std::fmt;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::errors::{Result, ShaderError};

/// A normalized path inside the virtual filesystem.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct VfsPath(String);

impl VfsPath {
    /// Creates a path, normalizing separators and `.`/`..` segments.
    #[must_use]
    pub fn new(path: &str) -> Self {
        Self(normalize(path))
    }

    /// Appends a relative path.
    #[must_use]
    pub fn join(&self, rel: &str) -> Self {
        if self.0.is_empty() {
            return Self::new(rel);
        }
        Self::new(&format!("{}/{}", self.0, rel))
    }

    /// Returns the parent directory, or an empty path at the root.
    #[must_use]
    pub fn parent(&self) -> Self {
        match self.0.rfind('/') {
            Some(idx) => Self(self.0[..idx].to_string()),
            None => Self::default(),
        }
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        let file = self.0.rsplit('/').next()?;
        let (stem, ext) = file.rsplit_once('.')?;
        if stem.is_empty() { None } else { Some(ext) }
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn normalize(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}

impl fmt::Display for VfsPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VfsPath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for VfsPath {
    fn from(path: String) -> Self {
        Self::new(&path)
    }
}

impl AsRef<str> for VfsPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Read access to shader files.
///
/// All reads are synchronous; resolution runs on the thread that owns the
/// rendering context and returns only once the file has been read.
pub trait Vfs: Send + Sync {
    /// Reads a whole file as UTF-8 text.
    fn read_to_string(&self, path: &VfsPath) -> Result<String>;

    /// Returns `true` if the file exists.
    fn exists(&self, path: &VfsPath) -> bool;
}

// ─── DiskVfs ──────────────────────────────────────────────────────────────────

/// Filesystem-backed reader rooted at a directory.
pub struct DiskVfs {
    root_path: PathBuf,
}

impl DiskVfs {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            root_path: path.as_ref().to_path_buf(),
        }
    }

    #[inline]
    #[must_use]
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    /// Resolves a VFS path to its location on disk.
    #[must_use]
    pub fn resolve(&self, path: &VfsPath) -> PathBuf {
        path.as_str()
            .split('/')
            .fold(self.root_path.clone(), |acc, seg| acc.join(seg))
    }

    /// Maps an OS path back into the VFS, or `None` if it lies outside the root.
    #[must_use]
    pub fn to_vfs_path(&self, path: &Path) -> Option<VfsPath> {
        let rel = path.strip_prefix(&self.root_path).ok().or_else(|| {
            // Watchers report canonical paths; the root may have been given
            // relative or through a symlink.
            let root = self.root_path.canonicalize().ok()?;
            path.strip_prefix(root).ok()
        })?;
        let rel = rel.to_str()?;
        Some(VfsPath::new(rel))
    }
}

impl Vfs for DiskVfs {
    fn read_to_string(&self, path: &VfsPath) -> Result<String> {
        std::fs::read_to_string(self.resolve(path)).map_err(|e| ShaderError::DocumentLoad {
            path: path.to_string(),
            reason: e.to_string(),
        })
    }

    fn exists(&self, path: &VfsPath) -> bool {
        self.resolve(path).is_file()
    }
}

// ─── MemoryVfs ────────────────────────────────────────────────────────────────

#[derive(Default)]
struct MemoryFile {
    contents: String,
    reads: usize,
}

/// In-memory reader that also counts how often each file was read.
///
/// Reads of missing files are counted too, which makes failure memoization
/// observable.
#[derive(Default)]
pub struct MemoryVfs {
    files: RwLock<FxHashMap<VfsPath, MemoryFile>>,
    missing_reads: RwLock<FxHashMap<VfsPath, usize>>,
}

impl MemoryVfs {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a file. The read counter of the file is kept.
    pub fn insert(&self, path: impl Into<VfsPath>, contents: impl Into<String>) {
        let mut files = self.files.write();
        files.entry(path.into()).or_default().contents = contents.into();
    }

    /// Removes a file, returning `true` if it existed.
    pub fn remove(&self, path: &VfsPath) -> bool {
        self.files.write().remove(path).is_some()
    }

    /// Number of read attempts for `path`, successful or not.
    #[must_use]
    pub fn read_count(&self, path: impl Into<VfsPath>) -> usize {
        let path = path.into();
        let hits = self.files.read().get(&path).map_or(0, |f| f.reads);
        hits + self.missing_reads.read().get(&path).copied().unwrap_or(0)
    }

    /// Number of read attempts across every path.
    #[must_use]
    pub fn total_reads(&self) -> usize {
        let hits: usize = self.files.read().values().map(|f| f.reads).sum();
        hits + self.missing_reads.read().values().sum::<usize>()
    }
}

impl Vfs for MemoryVfs {
    fn read_to_string(&self, path: &VfsPath) -> Result<String> {
        let mut files = self.files.write();
        if let Some(file) = files.get_mut(path) {
            file.reads += 1;
            return Ok(file.contents.clone());
        }
        drop(files);

        *self.missing_reads.write().entry(path.clone()).or_insert(0) += 1;
        Err(ShaderError::DocumentLoad {
            path: path.to_string(),
            reason: "file not found".to_string(),
        })
    }

    fn exists(&self, path: &VfsPath) -> bool {
        self.files.read().contains_key(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(VfsPath::new("./shaders//glsl\\model.vs").as_str(), "shaders/glsl/model.vs");
        assert_eq!(VfsPath::new("/shaders/a/../b.fs").as_str(), "shaders/b.fs");
        assert_eq!(VfsPath::new("shaders").join("glsl/common.h").as_str(), "shaders/glsl/common.h");
    }

    #[test]
    fn test_parent_and_extension() {
        let path = VfsPath::new("shaders/effects/model.json");
        assert_eq!(path.parent().as_str(), "shaders/effects");
        assert_eq!(path.extension(), Some("json"));
        assert_eq!(VfsPath::new("shaders/.hidden").extension(), None);
        assert!(VfsPath::new("file").parent().is_empty());
    }

    #[test]
    fn test_memory_read_counts() {
        let vfs = MemoryVfs::new();
        vfs.insert("shaders/a.vs", "void main() {}");

        assert!(vfs.read_to_string(&"shaders/a.vs".into()).is_ok());
        assert!(vfs.read_to_string(&"shaders/missing.vs".into()).is_err());
        assert!(vfs.read_to_string(&"shaders/missing.vs".into()).is_err());

        assert_eq!(vfs.read_count("shaders/a.vs"), 1);
        assert_eq!(vfs.read_count("shaders/missing.vs"), 2);
        assert_eq!(vfs.total_reads(), 3);
    }

    #[test]
    fn test_disk_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("shaders")).unwrap();
        std::fs::write(dir.path().join("shaders/a.fs"), "fragment").unwrap();

        let vfs = DiskVfs::new(dir.path());
        let path = VfsPath::new("shaders/a.fs");
        assert!(vfs.exists(&path));
        assert_eq!(vfs.read_to_string(&path).unwrap(), "fragment");

        let os_path = dir.path().join("shaders").join("a.fs");
        assert_eq!(vfs.to_vfs_path(&os_path), Some(path));
        assert!(matches!(
            vfs.read_to_string(&VfsPath::new("shaders/none.fs")),
            Err(ShaderError::DocumentLoad { .. })
        ));
    }
}
