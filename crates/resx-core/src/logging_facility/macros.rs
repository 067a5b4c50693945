//! Boundary logging macros
//!
//! Each engine operation emits exactly one `start` event and exactly one of
//! `end` or `end_error`. All three share [`__op_event!`] so the `component`,
//! `op` and `event` fields are spelled the same way everywhere.

#[doc(hidden)]
#[macro_export]
macro_rules! __op_event {
    ($level:ident, $op:expr, $event:ident $(, $($field:tt)*)?) => {
        tracing::$level!(
            component = module_path!(),
            op = $op,
            event = $crate::logging_facility::schema::$event
            $(, $($field)*)?
        )
    };
}

/// Log the start of an operation
///
/// ```
/// # use resx_core::log_op_start;
/// log_op_start!("transaction");
/// log_op_start!("transaction", entry_count = 3);
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr $(, $($field:tt)*)?) => {
        $crate::__op_event!(info, $op, EVENT_START $(, $($field)*)?)
    };
}

/// Log the successful end of an operation
///
/// `duration_ms` is mandatory and always comes first.
///
/// ```
/// # use resx_core::log_op_end;
/// log_op_end!("transaction", duration_ms = 12);
/// log_op_end!("transaction", duration_ms = 12, creations = 2);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {
        $crate::__op_event!(info, $op, EVENT_END, duration_ms = $duration $(, $($field)*)?)
    };
}

/// Log an operation failure
///
/// Accepts anything convertible into `ExError` and records its kind and code.
///
/// ```
/// # use resx_core::log_op_error;
/// # use resx_core::errors::ResxError;
/// let err = ResxError::ResourceNotFound { resource_id: "Patient/1".to_string() };
/// log_op_error!("transaction", err, duration_ms = 4);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        $crate::__op_event!(
            error,
            $op,
            EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?ex_err.kind(),
            err_code = ex_err.code()
            $(, $($field)*)?
        )
    }};
}
