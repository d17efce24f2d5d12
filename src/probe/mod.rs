//! Ready-made predicates for the conditions integration tests usually wait on.
//!
//! Each probe distinguishes "not yet" (`Ok(false)`, retried by the waiter)
//! from a broken observation (`Err`, which ends the wait).

pub mod event;
pub mod file;
pub mod http;
pub mod tcp;

pub use event::EventFlag;
pub use file::file_exists;
pub use http::{AsyncHttpProbe, HttpProbe};
pub use tcp::tcp_reachable;
