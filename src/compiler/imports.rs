//! Locating and reading imported documents

use crate::error::{CwilError, Result};
use indexmap::IndexSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Source of imported documents.
pub trait ImportLoader {
    /// Resolve an import path as written in a document to a stable key.
    fn resolve(&self, path: &str) -> PathBuf;

    /// Read the source text of a resolved import.
    fn load(&self, path: &Path) -> std::io::Result<String>;
}

/// Reads imports from the filesystem, relative to a fixed base directory
/// (the working directory of the top-level invocation), never relative to
/// the importing file.
#[derive(Debug, Clone)]
pub struct FsLoader {
    base_dir: PathBuf,
}

impl FsLoader {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Resolve against the current working directory.
    pub fn current_dir() -> Self {
        let base_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::new(base_dir)
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

impl ImportLoader for FsLoader {
    fn resolve(&self, path: &str) -> PathBuf {
        let joined = self.base_dir.join(path);
        joined.canonicalize().unwrap_or(joined)
    }

    fn load(&self, path: &Path) -> std::io::Result<String> {
        fs::read_to_string(path)
    }
}

/// The chain of imports currently being compiled.
#[derive(Debug, Default)]
pub(crate) struct ImportStack {
    active: IndexSet<PathBuf>,
}

impl ImportStack {
    /// Enter `path`, failing if it is already being imported further up
    /// the chain.
    pub(crate) fn enter(&mut self, path: PathBuf) -> Result<()> {
        if self.active.contains(&path) {
            return Err(CwilError::CyclicImport { path });
        }
        self.active.insert(path);
        Ok(())
    }

    pub(crate) fn leave(&mut self) {
        self.active.pop();
    }

    pub(crate) fn depth(&self) -> usize {
        self.active.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_stack_detects_repetition() {
        let mut stack = ImportStack::default();
        stack.enter(PathBuf::from("/a.cwil")).unwrap();
        stack.enter(PathBuf::from("/b.cwil")).unwrap();
        let err = stack.enter(PathBuf::from("/a.cwil")).unwrap_err();
        assert!(matches!(err, CwilError::CyclicImport { ref path } if path == Path::new("/a.cwil")));

        stack.leave();
        stack.leave();
        assert_eq!(stack.depth(), 0);
        stack.enter(PathBuf::from("/a.cwil")).unwrap();
    }

    #[test]
    fn test_fs_loader_resolves_against_base_dir() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("lib")).unwrap();
        fs::write(dir.path().join("lib/tool.cwil"), "task t {\n}").unwrap();

        let loader = FsLoader::new(dir.path());
        let resolved = loader.resolve("lib/tool.cwil");
        assert_eq!(loader.load(&resolved).unwrap(), "task t {\n}");
        assert_eq!(loader.resolve("lib/../lib/tool.cwil"), resolved);
        assert!(loader.load(&loader.resolve("missing.cwil")).is_err());
    }
}
