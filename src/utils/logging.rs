//! Conditional, tagged logging macros.
//!
//! Every module that logs through these macros defines two consts:
//! ```rust,ignore
//! const ENABLE_LOGS: bool = true;
//! const LOG_TAG: &str = "face_monitor";
//!
//! use crate::{log_info, log_warn, log_error};
//!
//! log_info!("sampler started at {} Hz", 5);
//! // => "[face_monitor] sampler started at 5 Hz"
//! ```
//!
//! Flipping `ENABLE_LOGS` silences a noisy module without touching `RUST_LOG`.

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::debug!("[{}] {}", LOG_TAG, format_args!($($arg)*));
        }
    };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::info!("[{}] {}", LOG_TAG, format_args!($($arg)*));
        }
    };
}

/// Warnings are for recoverable degradation: a dropped sink write, a
/// detector hiccup.
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::warn!("[{}] {}", LOG_TAG, format_args!($($arg)*));
        }
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::error!("[{}] {}", LOG_TAG, format_args!($($arg)*));
        }
    };
}

/// Initialise `env_logger` from `RUST_LOG`, defaulting to `Info`
/// (`Debug` when `PROCTOR_DEBUG` is set). Safe to call more than once.
pub fn init_logging() {
    let debug_mode = std::env::var("PROCTOR_DEBUG")
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    let default_level = if debug_mode {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    let _ = env_logger::Builder::new()
        .filter_level(default_level)
        .parse_default_env()
        .try_init();
}
