//! Dependency resolution for trees of Mercurial and Git checkouts.
//!
//! A repository declares the checkouts it needs in a `dependencies` file at
//! its root.  The engine clones missing checkouts, moves existing ones to the
//! pinned revision, and recurses into each of them, picking per-backend
//! sources, roots and revisions from a single manifest.
//!
//! The public API is organised into these layers:
//!
//! - **[`config`]**: manifest parsing and run settings
//! - **[`vcs`]**: the `hg` and `git` backends behind one [`vcs::Backend`] trait
//! - **[`engine`]**: recursive resolution over a manifest tree
//! - **[`commands`]**: run orchestration, including self-update
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod exec;
pub mod helpers;
pub mod logging;
pub mod paths;
pub mod self_update;
pub mod vcs;
