//! Rule pipeline: wildcard consolidation followed by formatting

pub mod consolidate;
pub mod format;

pub use consolidate::{consolidate, consolidate_to_strings};
pub use format::{count_rules, format_rules, render_rules};
