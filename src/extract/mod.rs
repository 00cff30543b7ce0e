//! Bounded, filtered extraction.
//!
//! One pass over the central directory: normalize each name, resolve and
//! jail its destination, match it against the request's filters, apply the
//! count and size ceilings, and write what survives through a
//! [`FilesystemPort`](crate::fs::FilesystemPort).

mod engine;
mod filter;
mod request;

pub use engine::{extract, extract_with, resolve_destination};
pub use filter::{EntryMatcher, normalize_path};
pub use request::{ExtractionOutcome, ExtractionRequest};
