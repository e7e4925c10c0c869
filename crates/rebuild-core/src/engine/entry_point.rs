//! Typed binding of one exported engine function.
//!
//! Every parameter kind the engine uses (`void*`, `size_t`, `wchar_t*`,
//! `void**`, `size_t*`) is one machine word, so a call is marshalled into a
//! word list and dispatched through a function pointer of matching arity.

use std::ffi::{c_int, c_void};
use std::mem::transmute;

use super::wchar::{WideBuffer, WideCodec};
use crate::error::{RebuildError, Result};

/// Highest arity an entry point may declare.
pub const MAX_ARITY: usize = 6;

/// Declared parameter type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Raw pointer to caller-owned bytes.
    Pointer,
    /// `size_t` value.
    Size,
    /// NUL-terminated native wide string.
    WideString,
    /// `void**` out cell.
    OutPointer,
    /// `size_t*` out cell.
    OutSize,
}

/// Declared return type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnKind {
    Int,
    WideString,
}

/// A call argument. Out cells borrow caller stack slots, so they cannot
/// outlive the call that fills them.
#[derive(Debug)]
pub enum Arg<'a> {
    Pointer(&'a [u8]),
    Size(usize),
    WideString(&'a str),
    OutPointer(&'a mut *mut c_void),
    OutSize(&'a mut usize),
}

impl Arg<'_> {
    fn kind(&self) -> ParamKind {
        match self {
            Arg::Pointer(_) => ParamKind::Pointer,
            Arg::Size(_) => ParamKind::Size,
            Arg::WideString(_) => ParamKind::WideString,
            Arg::OutPointer(_) => ParamKind::OutPointer,
            Arg::OutSize(_) => ParamKind::OutSize,
        }
    }
}

/// Value produced by a native call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeValue {
    Int(i32),
    WideString(Option<String>),
}

impl NativeValue {
    pub fn into_int(self) -> Result<i32> {
        match self {
            NativeValue::Int(v) => Ok(v),
            NativeValue::WideString(_) => Err(RebuildError::Unexpected(
                "entry point returned a string where an int was declared".into(),
            )),
        }
    }

    pub fn into_wide_string(self) -> Result<Option<String>> {
        match self {
            NativeValue::WideString(s) => Ok(s),
            NativeValue::Int(_) => Err(RebuildError::Unexpected(
                "entry point returned an int where a string was declared".into(),
            )),
        }
    }
}

/// Resolved function pointer plus its declared signature.
#[derive(Debug)]
pub struct EntryPointBinding {
    name: &'static str,
    returns: ReturnKind,
    params: Vec<ParamKind>,
    address: Option<*const c_void>,
    codec: WideCodec,
}

macro_rules! dispatch {
    ($addr:expr, $ret:ty, $w:expr) => {
        match $w.len() {
            0 => {
                let f: extern "C" fn() -> $ret = transmute($addr);
                f()
            }
            1 => {
                let f: extern "C" fn(usize) -> $ret = transmute($addr);
                f($w[0])
            }
            2 => {
                let f: extern "C" fn(usize, usize) -> $ret = transmute($addr);
                f($w[0], $w[1])
            }
            3 => {
                let f: extern "C" fn(usize, usize, usize) -> $ret = transmute($addr);
                f($w[0], $w[1], $w[2])
            }
            4 => {
                let f: extern "C" fn(usize, usize, usize, usize) -> $ret = transmute($addr);
                f($w[0], $w[1], $w[2], $w[3])
            }
            5 => {
                let f: extern "C" fn(usize, usize, usize, usize, usize) -> $ret =
                    transmute($addr);
                f($w[0], $w[1], $w[2], $w[3], $w[4])
            }
            6 => {
                let f: extern "C" fn(usize, usize, usize, usize, usize, usize) -> $ret =
                    transmute($addr);
                f($w[0], $w[1], $w[2], $w[3], $w[4], $w[5])
            }
            n => {
                return Err(RebuildError::Argument {
                    argument: "args",
                    message: format!("arity {n} is not supported"),
                })
            }
        }
    };
}

impl EntryPointBinding {
    /// Resolve `name` in `library` and record its declared signature.
    pub fn bind(
        library: &dyn crate::engine::NativeLibrary,
        name: &'static str,
        returns: ReturnKind,
        params: &[ParamKind],
    ) -> Result<Self> {
        if params.len() > MAX_ARITY {
            return Err(RebuildError::Argument {
                argument: "params",
                message: format!(
                    "{name} declares {} parameters, at most {MAX_ARITY} are supported",
                    params.len()
                ),
            });
        }

        let address = library.resolve(name)?;
        if address.is_null() {
            return Err(RebuildError::EngineLoad(format!("symbol {name} resolved to null")));
        }

        Ok(Self {
            name,
            returns,
            params: params.to_vec(),
            address: Some(address),
            codec: WideCodec::native(),
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn params(&self) -> &[ParamKind] {
        &self.params
    }

    pub fn returns(&self) -> ReturnKind {
        self.returns
    }

    pub fn is_bound(&self) -> bool {
        self.address.is_some()
    }

    /// Drop the function pointer. Later calls fail with `Disposed`.
    pub fn release(&mut self) {
        self.address = None;
    }

    /// Call the native function.
    ///
    /// `args` must match the declared parameter list in count and kind.
    ///
    /// # Safety
    /// The declared signature must describe the native function, and the
    /// library that exported it must still be open.
    pub unsafe fn invoke(&self, args: &mut [Arg<'_>]) -> Result<NativeValue> {
        let addr = self.address.ok_or(RebuildError::Disposed)?;

        if args.len() != self.params.len() {
            return Err(RebuildError::Argument {
                argument: "args",
                message: format!(
                    "{} expects {} arguments, got {}",
                    self.name,
                    self.params.len(),
                    args.len()
                ),
            });
        }
        for (i, (arg, declared)) in args.iter().zip(self.params.iter()).enumerate() {
            if arg.kind() != *declared {
                return Err(RebuildError::Argument {
                    argument: "args",
                    message: format!(
                        "{} argument {i}: expected {declared:?}, got {:?}",
                        self.name,
                        arg.kind()
                    ),
                });
            }
        }

        // Encoded strings must stay alive until the call returns.
        let mut wide: Vec<WideBuffer> = Vec::new();
        for arg in args.iter() {
            if let Arg::WideString(s) = arg {
                wide.push(self.codec.encode(s));
            }
        }

        let mut words: Vec<usize> = Vec::with_capacity(args.len());
        let mut next_wide = wide.iter();
        for arg in args.iter_mut() {
            let word = match arg {
                Arg::Pointer(bytes) => bytes.as_ptr() as usize,
                Arg::Size(n) => *n,
                Arg::WideString(_) => match next_wide.next() {
                    Some(buf) => buf.as_ptr() as usize,
                    None => return Err(RebuildError::Unexpected("wide string not encoded".into())),
                },
                Arg::OutPointer(cell) => &mut **cell as *mut *mut c_void as usize,
                Arg::OutSize(cell) => &mut **cell as *mut usize as usize,
            };
            words.push(word);
        }

        let value = match self.returns {
            ReturnKind::Int => {
                let v: c_int = dispatch!(addr, c_int, words);
                NativeValue::Int(v)
            }
            ReturnKind::WideString => {
                let p: *const c_void = dispatch!(addr, *const c_void, words);
                NativeValue::WideString(self.codec.read(p))
            }
        };

        drop(wide);
        Ok(value)
    }
}
