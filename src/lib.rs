//! release-train - automated semantic-version release management
//!
//! Classifies conventional commits since the last tag, computes the next
//! version, renders a changelog, bumps version strings in configured files,
//! and reconciles a pull/merge request on GitHub, Azure DevOps, or GitLab.
//! A second workflow tags and publishes the release once that request has
//! been merged.

pub mod analyser;
pub mod bumper;
pub mod changelog;
pub mod commands;
pub mod core;
pub mod host;
pub mod version;
