//! Core definitions (error type, result helpers and change notification),
//! relied upon by all hexdoc-* crates.

pub mod error;
pub mod event;
pub mod result;

pub use error::{Error, ErrorKind};
pub use event::{EventSource, SubscriptionId};
pub use result::Result;
