//! Native engine binding.
//!
//! - [`library`]: library handle seam (`NativeLibrary`) and its `libloading` implementation.
//! - [`entry_point`]: one typed exported function.
//! - [`wchar`]: platform `wchar_t` codec.
//! - [`binding`]: the six-entry-point engine binding.
//! - [`types`]: coded values the engine reports.

pub mod binding;
pub mod entry_point;
pub mod library;
pub mod types;
pub mod wchar;

pub use binding::{EngineBinding, ProtectedOutput};
pub use entry_point::{Arg, EntryPointBinding, NativeValue, ParamKind, ReturnKind, MAX_ARITY};
pub use library::{LoadedLibrary, NativeLibrary};
pub use types::{EngineOutcome, FileType, UNKNOWN_FILE_TYPE};
pub use wchar::{WideBuffer, WideCodec, WideEncoding};
