//! Pipeline module - recorder episode directories to episode archives.

mod converter;

pub use converter::*;
