//! Connection resolution for Koble.
//!
//! Finds an existing authorized account for a user, or walks them through
//! a new authorization handshake with a bounded wait.

mod resolver;

pub use resolver::{lookup, resolve, Lookup, ResolveOptions};
