//! Small filesystem helpers shared across modules.
pub mod fs;
