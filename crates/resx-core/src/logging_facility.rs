//! Structured logging facility
//!
//! - Single initialization point via `init(profile)`
//! - Boundary macros (`log_op_start!`, `log_op_end!`, `log_op_error!`)
//! - Test capture mode for deterministic assertions
//!
//! Lifecycle events (start/end/end_error) are emitted by the engine layer
//! only. Core and store code log at `debug` with plain `tracing` macros.
//!
//! ```rust
//! use resx_core::logging_facility::{init, Profile};
//!
//! init(Profile::Development);
//! ```

pub mod init;
pub mod macros;
pub mod test_capture;

pub use init::{init, Profile};
pub use resx_core_types::schema;
pub use test_capture::{init_test_capture, CapturedEvent, TestCapture};
