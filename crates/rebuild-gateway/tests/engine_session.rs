//! `GlasswallSession` over an in-process fake engine library.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::collections::HashMap;
use std::ffi::{c_int, c_void};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use rebuild_core::engine::binding::{
    GW_DETERMINE_FILE_TYPE, GW_FILE_CONFIG_XML, GW_FILE_DONE, GW_FILE_ERROR_MSG, GW_FILE_VERSION,
    GW_MEMORY_TO_MEMORY_PROTECT,
};
use rebuild_core::engine::{
    EngineBinding, EngineOutcome, FileType, NativeLibrary, WideBuffer, WideCodec,
};
use rebuild_core::error::{RebuildError, Result};
use rebuild_core::policy::{Category, ContentManagementPolicy, DocumentKind};
use rebuild_core::ErrorClass;
use rebuild_gateway::engine::{EngineSession, GlasswallSession, VERSION_UNAVAILABLE};

const ENGINE_ERROR: &str = "Macros are disallowed by the current policy";

static OUTPUT: &[u8] = b"CLEAN";

fn wide(cell: &'static OnceLock<WideBuffer>, s: &str) -> *const c_void {
    cell.get_or_init(|| WideCodec::native().encode(s)).as_ptr()
}

extern "C" fn version() -> *const c_void {
    static V: OnceLock<WideBuffer> = OnceLock::new();
    wide(&V, "1.117.0")
}

extern "C" fn null_version() -> *const c_void {
    std::ptr::null()
}

extern "C" fn error_msg() -> *const c_void {
    static V: OnceLock<WideBuffer> = OnceLock::new();
    wide(&V, ENGINE_ERROR)
}

extern "C" fn detect(ptr: *const u8, len: usize) -> c_int {
    let bytes = unsafe { std::slice::from_raw_parts(ptr, len) };
    match bytes {
        [b'%', b'P', b'D', b'F', ..] => FileType::Pdf.code(),
        [b'P', b'K', ..] => FileType::Docx.code(),
        _ => 12345,
    }
}

/// Accepts a payload only when PDF javascript is left at its default.
extern "C" fn config(xml: *const c_void) -> c_int {
    let xml = unsafe { WideCodec::native().read(xml) }.unwrap_or_default();
    if xml.contains("<javascript>sanitise</javascript>") {
        EngineOutcome::Success.code()
    } else {
        EngineOutcome::Error.code()
    }
}

extern "C" fn protect(
    _ptr: *const u8,
    _len: usize,
    file_type: *const c_void,
    out_ptr: *mut *mut c_void,
    out_len: *mut usize,
) -> c_int {
    let file_type = unsafe { WideCodec::native().read(file_type) };
    if file_type.as_deref() != Some("Pdf") {
        return EngineOutcome::Error.code();
    }
    unsafe {
        *out_ptr = OUTPUT.as_ptr() as *mut c_void;
        *out_len = OUTPUT.len();
    }
    EngineOutcome::Success.code()
}

extern "C" fn done() -> c_int {
    EngineOutcome::Success.code()
}

struct FakeEngine {
    symbols: HashMap<&'static str, usize>,
    closes: Arc<AtomicUsize>,
}

impl FakeEngine {
    fn new() -> Self {
        let mut symbols = HashMap::new();
        symbols.insert(GW_FILE_VERSION, version as usize);
        symbols.insert(GW_FILE_ERROR_MSG, error_msg as usize);
        symbols.insert(GW_DETERMINE_FILE_TYPE, detect as usize);
        symbols.insert(GW_FILE_CONFIG_XML, config as usize);
        symbols.insert(GW_MEMORY_TO_MEMORY_PROTECT, protect as usize);
        symbols.insert(GW_FILE_DONE, done as usize);
        Self {
            symbols,
            closes: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn with(mut self, name: &'static str, address: usize) -> Self {
        self.symbols.insert(name, address);
        self
    }
}

impl NativeLibrary for FakeEngine {
    fn resolve(&self, name: &str) -> Result<*const c_void> {
        self.symbols
            .get(name)
            .map(|addr| *addr as *const c_void)
            .ok_or_else(|| RebuildError::EngineLoad(format!("undefined symbol: {name}")))
    }

    fn close(self: Box<Self>) -> Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn session(engine: FakeEngine) -> (GlasswallSession, Arc<AtomicUsize>) {
    let closes = engine.closes.clone();
    let binding = EngineBinding::from_library(Box::new(engine)).unwrap();
    (GlasswallSession::new(binding), closes)
}

#[test]
fn version_is_read_from_engine() {
    let (session, _) = session(FakeEngine::new());
    assert_eq!(session.library_version(), "1.117.0");
}

#[test]
fn null_version_falls_back() {
    let (session, _) = session(FakeEngine::new().with(GW_FILE_VERSION, null_version as usize));
    assert_eq!(session.library_version(), VERSION_UNAVAILABLE);
}

#[test]
fn detection_maps_codes_and_degrades_to_unknown() {
    let (session, _) = session(FakeEngine::new());

    assert_eq!(session.file_type(b"%PDF-1.7"), FileType::Pdf);
    assert_eq!(session.file_type(b"PK\x03\x04"), FileType::Docx);
    assert_eq!(session.file_type(b"plain text"), FileType::Unknown);
    // empty input fails inside the binding
    assert_eq!(session.file_type(b""), FileType::Unknown);
}

#[test]
fn accepted_configuration_is_ok() {
    let (session, _) = session(FakeEngine::new());
    session
        .set_configuration(&ContentManagementPolicy::default())
        .expect("default policy accepted");
}

#[test]
fn rejected_configuration_carries_engine_error() {
    let (session, _) = session(FakeEngine::new());

    let mut policy = ContentManagementPolicy::default();
    assert!(policy.set_flag(DocumentKind::Pdf, Category::Javascript, 2.into()));

    let err = session.set_configuration(&policy).expect_err("must be rejected");
    match &err {
        RebuildError::EngineConfiguration { outcome, error } => {
            assert_eq!(outcome, "Error");
            assert_eq!(error, ENGINE_ERROR);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.class(), ErrorClass::EngineConfiguration);
    assert_eq!(err.class().http_status(), 500);
}

#[test]
fn successful_rebuild_copies_output() {
    let (session, _) = session(FakeEngine::new());

    let outcome = session.rebuild(b"%PDF-1.7", FileType::Pdf).unwrap();
    assert!(outcome.is_success());
    assert_eq!(outcome.protected(), Some(OUTPUT));
    assert_eq!(outcome.error_message(), None);
}

#[test]
fn failed_rebuild_carries_last_error() {
    let (session, _) = session(FakeEngine::new());

    let outcome = session.rebuild(b"PK\x03\x04", FileType::Docx).unwrap();
    assert!(!outcome.is_success());
    assert_eq!(outcome.outcome(), EngineOutcome::Error);
    assert_eq!(outcome.protected(), None);
    assert_eq!(outcome.error_message(), Some(ENGINE_ERROR));
    assert_eq!(session.error_message().unwrap().as_deref(), Some(ENGINE_ERROR));
}

#[test]
fn dispose_closes_library_once() {
    let (mut session, closes) = session(FakeEngine::new());

    session.dispose();
    session.dispose();
    assert_eq!(closes.load(Ordering::SeqCst), 1);

    assert_eq!(session.library_version(), VERSION_UNAVAILABLE);
    assert_eq!(session.file_type(b"%PDF"), FileType::Unknown);
    assert!(matches!(
        session.rebuild(b"%PDF", FileType::Pdf),
        Err(RebuildError::Disposed)
    ));
    assert!(matches!(
        session.set_configuration(&ContentManagementPolicy::default()),
        Err(RebuildError::Disposed)
    ));

    drop(session);
    assert_eq!(closes.load(Ordering::SeqCst), 1);
}
