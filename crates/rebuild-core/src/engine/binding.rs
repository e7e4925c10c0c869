//! Engine binding: one loaded library plus its six entry points.
//!
//! Constructed per request and disposed on every exit path. After `dispose`
//! the bindings and the library handle are gone and every call fails with
//! [`RebuildError::Disposed`].

use std::ffi::c_void;
use std::path::Path;

use super::entry_point::{Arg, EntryPointBinding, ParamKind, ReturnKind};
use super::library::{LoadedLibrary, NativeLibrary};
use super::types::EngineOutcome;
use crate::error::{RebuildError, Result};

pub const GW_FILE_VERSION: &str = "GWFileVersion";
pub const GW_FILE_ERROR_MSG: &str = "GWFileErrorMsg";
pub const GW_DETERMINE_FILE_TYPE: &str = "GWDetermineFileTypeFromFileInMem";
pub const GW_FILE_CONFIG_XML: &str = "GWFileConfigXML";
pub const GW_MEMORY_TO_MEMORY_PROTECT: &str = "GWMemoryToMemoryProtect";
pub const GW_FILE_DONE: &str = "GWFileDone";

/// Result of a memory-to-memory rebuild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectedOutput {
    pub outcome_code: i32,
    /// Present iff `outcome_code` is Success.
    pub protected: Option<Vec<u8>>,
}

struct EntryPoints {
    version: EntryPointBinding,
    error_msg: EntryPointBinding,
    determine_file_type: EntryPointBinding,
    config_xml: EntryPointBinding,
    protect: EntryPointBinding,
    done: EntryPointBinding,
}

impl EntryPoints {
    fn bind(lib: &dyn NativeLibrary) -> Result<Self> {
        use ParamKind::*;

        Ok(Self {
            version: EntryPointBinding::bind(lib, GW_FILE_VERSION, ReturnKind::WideString, &[])?,
            error_msg: EntryPointBinding::bind(lib, GW_FILE_ERROR_MSG, ReturnKind::WideString, &[])?,
            determine_file_type: EntryPointBinding::bind(
                lib,
                GW_DETERMINE_FILE_TYPE,
                ReturnKind::Int,
                &[Pointer, Size],
            )?,
            config_xml: EntryPointBinding::bind(lib, GW_FILE_CONFIG_XML, ReturnKind::Int, &[WideString])?,
            protect: EntryPointBinding::bind(
                lib,
                GW_MEMORY_TO_MEMORY_PROTECT,
                ReturnKind::Int,
                &[Pointer, Size, WideString, OutPointer, OutSize],
            )?,
            done: EntryPointBinding::bind(lib, GW_FILE_DONE, ReturnKind::Int, &[])?,
        })
    }

    fn release_all(&mut self) {
        for ep in [
            &mut self.done,
            &mut self.version,
            &mut self.error_msg,
            &mut self.determine_file_type,
            &mut self.config_xml,
            &mut self.protect,
        ] {
            ep.release();
        }
    }

    fn bound_count(&self) -> usize {
        [
            &self.version,
            &self.error_msg,
            &self.determine_file_type,
            &self.config_xml,
            &self.protect,
            &self.done,
        ]
        .iter()
        .filter(|ep| ep.is_bound())
        .count()
    }
}

/// Loaded engine library with typed entry points.
pub struct EngineBinding {
    library: Option<Box<dyn NativeLibrary>>,
    entry_points: Option<EntryPoints>,
}

// SAFETY: the binding owns its library and function pointers exclusively and
// is never shared between threads; it may move with the task that owns it.
unsafe impl Send for EngineBinding {}

impl std::fmt::Debug for EngineBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineBinding")
            .field("library_open", &self.library.is_some())
            .field("bound_entry_points", &self.bound_entry_points())
            .finish()
    }
}

impl EngineBinding {
    /// Load the engine library at `path` and bind every entry point.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let lib = LoadedLibrary::open(path.as_ref())?;
        let binding = Self::from_library(Box::new(lib))?;
        tracing::info!(path = %path.as_ref().display(), "engine loaded");
        Ok(binding)
    }

    /// Bind every entry point from an already opened library.
    ///
    /// If any symbol fails to bind the library is closed and no instance is returned.
    pub fn from_library(library: Box<dyn NativeLibrary>) -> Result<Self> {
        match EntryPoints::bind(library.as_ref()) {
            Ok(entry_points) => Ok(Self {
                library: Some(library),
                entry_points: Some(entry_points),
            }),
            Err(e) => {
                if let Err(close_err) = library.close() {
                    tracing::warn!(error = %close_err, "closing partially bound engine failed");
                }
                Err(match e {
                    RebuildError::EngineLoad(_) => e,
                    other => RebuildError::EngineLoad(other.to_string()),
                })
            }
        }
    }

    fn entry_points(&self) -> Result<&EntryPoints> {
        self.entry_points.as_ref().ok_or(RebuildError::Disposed)
    }

    /// Version string reported by the engine, `None` if it returned null.
    pub fn query_version(&self) -> Result<Option<String>> {
        let eps = self.entry_points()?;
        // SAFETY: declared as `wchar_t* GWFileVersion(void)`; library still open.
        let value = unsafe { eps.version.invoke(&mut []) }?;
        value.into_wide_string()
    }

    /// Engine's message for the last failure.
    pub fn query_last_error(&self) -> Result<Option<String>> {
        let eps = self.entry_points()?;
        // SAFETY: declared as `wchar_t* GWFileErrorMsg(void)`.
        let value = unsafe { eps.error_msg.invoke(&mut []) }?;
        value.into_wide_string()
    }

    /// Raw file type code for `bytes`.
    pub fn detect_file_type(&self, bytes: &[u8]) -> Result<i32> {
        if bytes.is_empty() {
            return Err(RebuildError::ArgumentNull { argument: "buffer" });
        }
        let eps = self.entry_points()?;
        // SAFETY: declared as `int GWDetermineFileTypeFromFileInMem(void*, size_t)`;
        // `bytes` outlives the call.
        let value = unsafe {
            eps.determine_file_type
                .invoke(&mut [Arg::Pointer(bytes), Arg::Size(bytes.len())])
        }?;
        value.into_int()
    }

    /// Push an XML configuration payload, returning the raw outcome code.
    pub fn push_config(&self, xml_config: &str) -> Result<i32> {
        if xml_config.is_empty() {
            return Err(RebuildError::Argument {
                argument: "xml_config",
                message: "Configuration cannot be empty.".into(),
            });
        }
        let eps = self.entry_points()?;
        // SAFETY: declared as `int GWFileConfigXML(wchar_t*)`.
        let value = unsafe { eps.config_xml.invoke(&mut [Arg::WideString(xml_config)]) }?;
        value.into_int()
    }

    /// Rebuild `bytes` as `file_type_name`.
    ///
    /// On Success the engine-owned output is copied out immediately; the out
    /// cells live on this frame only.
    pub fn rebuild(&self, bytes: &[u8], file_type_name: &str) -> Result<ProtectedOutput> {
        if bytes.is_empty() {
            return Err(RebuildError::Argument {
                argument: "buffer",
                message: "Buffer cannot be empty.".into(),
            });
        }
        if file_type_name.is_empty() {
            return Err(RebuildError::Argument {
                argument: "file_type",
                message: "File type cannot be empty.".into(),
            });
        }
        let eps = self.entry_points()?;

        let mut out_ptr: *mut c_void = std::ptr::null_mut();
        let mut out_len: usize = 0;

        // SAFETY: declared as
        // `int GWMemoryToMemoryProtect(void*, size_t, wchar_t*, void**, size_t*)`.
        let outcome_code = unsafe {
            eps.protect.invoke(&mut [
                Arg::Pointer(bytes),
                Arg::Size(bytes.len()),
                Arg::WideString(file_type_name),
                Arg::OutPointer(&mut out_ptr),
                Arg::OutSize(&mut out_len),
            ])
        }?
        .into_int()?;

        if !EngineOutcome::from_code(outcome_code).is_success() {
            return Ok(ProtectedOutput {
                outcome_code,
                protected: None,
            });
        }

        let protected = if out_len == 0 {
            Vec::new()
        } else if out_ptr.is_null() {
            return Err(RebuildError::Unexpected(format!(
                "engine reported {out_len} output bytes at a null address"
            )));
        } else {
            // SAFETY: on Success the engine guarantees `out_len` readable bytes at
            // `out_ptr`, valid until the next engine call.
            unsafe { std::slice::from_raw_parts(out_ptr as *const u8, out_len) }.to_vec()
        };

        Ok(ProtectedOutput {
            outcome_code,
            protected: Some(protected),
        })
    }

    /// Signal the engine that the session is complete.
    pub fn file_done(&self) -> Result<i32> {
        let eps = self.entry_points()?;
        // SAFETY: declared as `int GWFileDone(void)`.
        let value = unsafe { eps.done.invoke(&mut []) }?;
        value.into_int()
    }

    /// Number of entry points still holding a function pointer.
    pub fn bound_entry_points(&self) -> usize {
        self.entry_points.as_ref().map_or(0, EntryPoints::bound_count)
    }

    pub fn is_disposed(&self) -> bool {
        self.library.is_none() && self.entry_points.is_none()
    }

    /// Complete the engine session, release every binding, then close the library.
    ///
    /// Idempotent: later calls are no-ops.
    pub fn dispose(&mut self) {
        if let Some(mut eps) = self.entry_points.take() {
            // SAFETY: library is still open at this point.
            match unsafe { eps.done.invoke(&mut []) } {
                Ok(code) => tracing::debug!(?code, "engine session done"),
                Err(e) => tracing::warn!(error = %e, "GWFileDone failed"),
            }
            eps.release_all();
        }

        if let Some(library) = self.library.take() {
            if let Err(e) = library.close() {
                tracing::warn!(error = %e, "closing engine library failed");
            }
        }
    }
}

impl Drop for EngineBinding {
    fn drop(&mut self) {
        self.dispose();
    }
}
