//! Native library handle.

use std::ffi::c_void;
use std::path::{Path, PathBuf};

use crate::error::{RebuildError, Result};

/// Symbol source + close seam for the engine binding.
///
/// `LoadedLibrary` is the production implementation; anything that can hand out
/// C-ABI function addresses (an in-process fake, a statically linked engine)
/// can stand in.
pub trait NativeLibrary: Send {
    /// Resolve an exported symbol to its address.
    fn resolve(&self, name: &str) -> Result<*const c_void>;

    /// Close the handle. Called at most once per library.
    fn close(self: Box<Self>) -> Result<()>;
}

/// A dynamic library opened with `libloading`.
#[derive(Debug)]
pub struct LoadedLibrary {
    path: PathBuf,
    lib: libloading::Library,
}

impl LoadedLibrary {
    /// Open the library at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(RebuildError::EngineLoad(format!(
                "Cannot find library at {}",
                path.display()
            )));
        }

        tracing::debug!(path = %path.display(), "opening engine library");

        // SAFETY: loading runs the library's initialisers; the engine library is
        // trusted deployment content and is not unloaded while bindings exist.
        let lib = unsafe { libloading::Library::new(path) }
            .map_err(|e| RebuildError::EngineLoad(format!("{}: {e}", path.display())))?;

        Ok(Self {
            path: path.to_path_buf(),
            lib,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl NativeLibrary for LoadedLibrary {
    fn resolve(&self, name: &str) -> Result<*const c_void> {
        // SAFETY: the symbol is read as an untyped address; it is only called
        // through an `EntryPointBinding` carrying its declared signature.
        let sym: libloading::Symbol<*const c_void> = unsafe { self.lib.get(name.as_bytes()) }
            .map_err(|e| RebuildError::EngineLoad(format!("symbol {name}: {e}")))?;
        Ok(*sym)
    }

    fn close(self: Box<Self>) -> Result<()> {
        let path = self.path;
        self.lib
            .close()
            .map_err(|e| RebuildError::EngineLoad(format!("close {}: {e}", path.display())))
    }
}
