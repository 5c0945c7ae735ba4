// Minimal leveled logger. One process-wide level toggled by --debug; lines go
// to stderr with a unix timestamp so they interleave cleanly with progress
// bars being disabled in debug mode.

use std::sync::atomic::{AtomicU8, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

const INFO_LEVEL: u8 = 0;
const DEBUG_LEVEL: u8 = 1;

static LOG_LEVEL: AtomicU8 = AtomicU8::new(INFO_LEVEL);

// Set the global log level based on the --debug flag.
pub fn set_debug(enabled: bool) {
    let level = if enabled { DEBUG_LEVEL } else { INFO_LEVEL };
    LOG_LEVEL.store(level, Ordering::Relaxed);
}

pub fn is_debug() -> bool {
    LOG_LEVEL.load(Ordering::Relaxed) >= DEBUG_LEVEL
}

#[allow(dead_code)]
pub fn info(msg: &str) {
    log_line("INFO", msg);
}

pub fn debug(msg: &str) {
    if is_debug() {
        log_line("DEBUG", msg);
    }
}

pub fn error(msg: &str) {
    log_line("ERROR", msg);
}

fn log_line(level: &str, msg: &str) {
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    eprintln!("[{}] {} {}", level, ts, msg);
}
