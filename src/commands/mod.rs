//! Top-level command orchestration.
pub mod resolve;
