//! CLI command implementations.

pub mod export;

pub use export::{ExportCommand, ExportReport};
