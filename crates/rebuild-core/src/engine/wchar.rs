//! Native `wchar_t` string codec.
//!
//! The engine speaks `wchar_t*` on every string boundary. Its width follows the
//! platform ABI: 2 bytes (UTF-16LE) on Windows, 4 bytes (UTF-32LE) elsewhere.
//! The codec is picked once per process and shared by every call site.

use std::ffi::c_void;

/// Encoding of a native wide code unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WideEncoding {
    Utf16Le,
    Utf32Le,
}

/// Width + encoding pair for the native `wchar_t`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WideCodec {
    width: usize,
    encoding: WideEncoding,
}

static NATIVE: WideCodec = if cfg!(windows) {
    WideCodec::UTF16LE
} else {
    WideCodec::UTF32LE
};

impl WideCodec {
    pub const UTF16LE: WideCodec = WideCodec {
        width: 2,
        encoding: WideEncoding::Utf16Le,
    };

    pub const UTF32LE: WideCodec = WideCodec {
        width: 4,
        encoding: WideEncoding::Utf32Le,
    };

    /// Codec matching this process's target platform.
    pub fn native() -> WideCodec {
        NATIVE
    }

    /// Bytes per code unit.
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn encoding(&self) -> WideEncoding {
        self.encoding
    }

    /// Encode `s` and append a single NUL code unit.
    pub fn encode(&self, s: &str) -> WideBuffer {
        match self.encoding {
            WideEncoding::Utf16Le => {
                WideBuffer::Utf16(s.encode_utf16().chain(std::iter::once(0)).collect())
            }
            WideEncoding::Utf32Le => WideBuffer::Utf32(
                s.chars()
                    .map(u32::from)
                    .chain(std::iter::once(0))
                    .collect(),
            ),
        }
    }

    /// Decode a run of code units (no terminator). Invalid units become U+FFFD,
    /// a trailing partial unit is ignored.
    pub fn decode_units(&self, bytes: &[u8]) -> String {
        match self.encoding {
            WideEncoding::Utf16Le => {
                let units: Vec<u16> = bytes
                    .chunks_exact(2)
                    .map(|c| u16::from_le_bytes([c[0], c[1]]))
                    .collect();
                String::from_utf16_lossy(&units)
            }
            WideEncoding::Utf32Le => bytes
                .chunks_exact(4)
                .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .map(|u| char::from_u32(u).unwrap_or(char::REPLACEMENT_CHARACTER))
                .collect(),
        }
    }

    /// Read a NUL-terminated wide string from native memory.
    ///
    /// A null pointer is the logical null string.
    ///
    /// # Safety
    /// `ptr` must be null or point to readable memory holding a sequence of
    /// code units of this codec's width terminated by a zero unit.
    pub unsafe fn read(&self, ptr: *const c_void) -> Option<String> {
        if ptr.is_null() {
            return None;
        }

        let base = ptr as *const u8;
        let mut bytes = Vec::new();
        let mut offset = 0usize;
        loop {
            let unit = std::slice::from_raw_parts(base.add(offset), self.width);
            if unit.iter().all(|b| *b == 0) {
                break;
            }
            bytes.extend_from_slice(unit);
            offset += self.width;
        }

        Some(self.decode_units(&bytes))
    }
}

/// Encoded wide string, NUL unit included.
///
/// Stored as whole code units so the pointer handed to native code is
/// aligned for `wchar_t`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WideBuffer {
    Utf16(Vec<u16>),
    Utf32(Vec<u32>),
}

impl WideBuffer {
    pub fn as_ptr(&self) -> *const c_void {
        match self {
            WideBuffer::Utf16(units) => units.as_ptr() as *const c_void,
            WideBuffer::Utf32(units) => units.as_ptr() as *const c_void,
        }
    }

    /// Code units, terminator included.
    pub fn len(&self) -> usize {
        match self {
            WideBuffer::Utf16(units) => units.len(),
            WideBuffer::Utf32(units) => units.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_le_bytes(&self) -> Vec<u8> {
        match self {
            WideBuffer::Utf16(units) => units.iter().flat_map(|u| u.to_le_bytes()).collect(),
            WideBuffer::Utf32(units) => units.iter().flat_map(|u| u.to_le_bytes()).collect(),
        }
    }
}
