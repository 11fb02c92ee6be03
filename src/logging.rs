//! Logging abstraction layer
//!
//! The controller logs through these macros so the backend is picked at
//! compile time instead of at every call site.
//!
//! # Features
//!
//! - `log` (default) - Uses the standard `log` crate
//! - `tracing` - Uses the `tracing` crate for structured logging
//!
//! Choose one feature at compile time. They are mutually exclusive.
//!
//! # Usage
//!
//! ```ignore
//! use navkeys::{debug_log, trace_log, warn_log};
//!
//! trace_log!("Acknowledged corrective move");
//! debug_log!("Classified notification as back: {}", url);
//! warn_log!("Acknowledgment timed out after {:?}", timeout);
//! ```

/// Forwards a record to whichever backend is enabled.
#[doc(hidden)]
#[macro_export]
macro_rules! __navkeys_log {
    ($level:ident, $($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::$level!($($arg)*);
        #[cfg(feature = "log")]
        ::log::$level!($($arg)*);
    };
}

/// Trace-level logging
///
/// Acknowledgments, dispatch passes and other per-step detail.
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        $crate::__navkeys_log!(trace, $($arg)*)
    };
}

/// Debug-level logging
///
/// Classified notifications, corrective moves and emitted events.
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        $crate::__navkeys_log!(debug, $($arg)*)
    };
}

/// Info-level logging
#[macro_export]
macro_rules! info_log {
    ($($arg:tt)*) => {
        $crate::__navkeys_log!(info, $($arg)*)
    };
}

/// Warn-level logging
///
/// Timeouts and host desynchronization. The controller recovers from both.
#[macro_export]
macro_rules! warn_log {
    ($($arg:tt)*) => {
        $crate::__navkeys_log!(warn, $($arg)*)
    };
}

/// Error-level logging
#[macro_export]
macro_rules! error_log {
    ($($arg:tt)*) => {
        $crate::__navkeys_log!(error, $($arg)*)
    };
}
