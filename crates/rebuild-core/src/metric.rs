//! Metric response headers and elapsed-time formatting.

use std::time::{Duration, Instant};

pub const DETECT_FILE_TYPE_TIME: &str = "gw-metric-detect";
pub const BASE64_DECODE_TIME: &str = "gw-metric-decode-base64";
pub const FILE_SIZE: &str = "gw-metric-filesize";
pub const DOWNLOAD_TIME: &str = "gw-metric-download";
pub const VERSION: &str = "gw-version";
pub const REBUILD_TIME: &str = "gw-metric-rebuild";
pub const FORM_FILE_READ_TIME: &str = "gw-metric-formfileread";
pub const PROTECTED_FILE_SIZE: &str = "gw-metric-protectedfilesize";
pub const UPLOAD_SIZE: &str = "gw-metric-uploadsize";
pub const UPLOAD_TIME: &str = "gw-metric-upload";
pub const UPLOAD_ETAG: &str = "gw-put-file-etag";
pub const FILE_TYPE: &str = "gw-file-type";
pub const ENGINE_LOAD_TIME: &str = "gw-engine-load-time";

/// Value of a metric header whose stage has not completed.
pub const NOT_SET: &str = "NOT SET";

const TICKS_PER_SECOND: u128 = 10_000_000;

/// Render `elapsed` as `HH:MM:SS.fffffff` (100 ns ticks).
pub fn format_elapsed(elapsed: Duration) -> String {
    let ticks = elapsed.as_nanos() / 100;
    let fraction = ticks % TICKS_PER_SECOND;
    let total_seconds = ticks / TICKS_PER_SECOND;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds / 60) % 60;
    let seconds = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}.{fraction:07}")
}

/// Started on creation; read with [`Stopwatch::elapsed`].
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    started: Instant,
}

impl Stopwatch {
    pub fn start_new() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Elapsed time in header format.
    pub fn elapsed_header(&self) -> String {
        format_elapsed(self.elapsed())
    }
}
