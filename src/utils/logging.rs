//! Logging macro gated by a module-level `ENABLE_LOGS` flag, for modules
//! that would otherwise log on every tick.
//!
//! ```rust,ignore
//! const ENABLE_LOGS: bool = false;
//!
//! use crate::log_info;
//!
//! log_info!("tick {}", n);
//! ```

/// `log::info!` if the calling module's `ENABLE_LOGS` is true.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::info!($($arg)*);
        }
    };
}
