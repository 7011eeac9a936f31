//! I/O layer
//!
//! `info` defines the user-data record every submitted op carries; `ops`
//! are the concrete awaiters built on the engine's submission contract.

pub mod info;
pub mod ops;

pub use info::{resume_callback, IoCallback, IoInfo};
pub use ops::{accept, nop, read, timeout, write};
