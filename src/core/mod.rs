//! Core building blocks for release-train
//!
//! - **config**: release-train.yaml parsing and validation
//! - **error**: error taxonomy with contextual help messages and exit codes
//! - **vcs**: git operations via the system git executable

pub mod config;
pub mod error;
pub mod vcs;
