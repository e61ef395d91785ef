//! Structured logging for rowsift.
//!
//! Events use target "rowsift" and carry an `event` field. The library never
//! installs a subscriber; binaries configure `tracing_subscriber`.

pub(crate) const ROWSIFT_TARGET: &str = "rowsift";

macro_rules! log_debug {
    ($($field:tt)*) => {
        ::tracing::debug!(target: $crate::observability::ROWSIFT_TARGET, $($field)*)
    };
}

macro_rules! log_info {
    ($($field:tt)*) => {
        ::tracing::info!(target: $crate::observability::ROWSIFT_TARGET, $($field)*)
    };
}

macro_rules! log_warn {
    ($($field:tt)*) => {
        ::tracing::warn!(target: $crate::observability::ROWSIFT_TARGET, $($field)*)
    };
}

macro_rules! log_error {
    ($($field:tt)*) => {
        ::tracing::error!(target: $crate::observability::ROWSIFT_TARGET, $($field)*)
    };
}

pub(crate) use log_debug;
pub(crate) use log_error;
pub(crate) use log_info;
pub(crate) use log_warn;
