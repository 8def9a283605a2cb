//! Per-module switchable logging.
//!
//! Background loops (sync drain, connectivity probe, geofence polling) log on
//! every tick, so each of those modules carries its own switch:
//! ```ignore
//! const ENABLE_LOGS: bool = true;
//! use crate::{log_info, log_warn};
//!
//! log_info!("draining {} queued submission(s)", n);
//! ```
//! Flipping the const to `false` silences that module without touching the
//! global `env_logger` filter.

/// Shared body of the gated macros. `ENABLE_LOGS` resolves in the module
/// that invoked the outer macro. When it is `false` the format arguments are
/// never evaluated.
#[doc(hidden)]
#[macro_export]
macro_rules! gated_log {
    ($level:expr, $($arg:tt)+) => {
        if ENABLE_LOGS {
            ::log::log!(target: module_path!(), $level, $($arg)+);
        }
    };
}

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)+) => { $crate::gated_log!(::log::Level::Debug, $($arg)+) };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)+) => { $crate::gated_log!(::log::Level::Info, $($arg)+) };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)+) => { $crate::gated_log!(::log::Level::Warn, $($arg)+) };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)+) => { $crate::gated_log!(::log::Level::Error, $($arg)+) };
}
