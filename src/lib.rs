//! nl2bash Guard Library
//!
//! Risk classification for natural-language-to-shell suggestions: the rule
//! engine and sanitizer that decide whether a generated command is safe,
//! needs confirmation, or must be refused, plus the HTTP boundary and
//! configuration around them.

pub mod api;
pub mod config;
pub mod metrics;
pub mod safety;
