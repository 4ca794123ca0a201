//! CLI command implementations.

pub mod plot;
pub mod run;
pub mod sweep;
pub mod version;
