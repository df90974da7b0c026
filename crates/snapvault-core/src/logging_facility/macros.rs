//! Canonical logging macros
//!
//! These macros provide a structured, consistent way to log operations.

/// Log the start of an operation
///
/// # Example
///
/// ```
/// # use snapvault_core::log_op_start;
/// log_op_start!("save_snapshot");
/// log_op_start!("save_snapshot", snapshot_id = "snap-1");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr) => {{
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = snapvault_core_types::schema::EVENT_START,
        );
    }};
    ($op:expr, $($field:tt)*) => {{
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = snapvault_core_types::schema::EVENT_START,
            $($field)*
        );
    }};
}

/// Log the successful end of an operation
///
/// # Example
///
/// ```
/// # use snapvault_core::log_op_end;
/// log_op_end!("save_snapshot", duration_ms = 42);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr) => {{
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = snapvault_core_types::schema::EVENT_END,
            duration_ms = $duration,
        );
    }};
    ($op:expr, duration_ms = $duration:expr, $($field:tt)*) => {{
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = snapvault_core_types::schema::EVENT_END,
            duration_ms = $duration,
            $($field)*
        );
    }};
}

/// Log an operation error
///
/// Accepts the error by value or by reference.
///
/// # Example
///
/// ```
/// # use snapvault_core::{log_op_error, errors::SnapshotError};
/// let err = SnapshotError::not_found("snap-1");
/// log_op_error!("get_snapshot", err, duration_ms = 10);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = snapvault_core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?ex_err.kind(),
            err_code = ex_err.code(),
        );
    }};
    ($op:expr, $err:expr, duration_ms = $duration:expr, $($field:tt)*) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = snapvault_core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?ex_err.kind(),
            err_code = ex_err.code(),
            $($field)*
        );
    }};
}
