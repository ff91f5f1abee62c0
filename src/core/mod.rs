//! Core building blocks shared by the pipelines
//!
//! - **config**: deploy.toml parsing and validation
//! - **context**: per-run project context (directory, config, metadata)
//! - **error**: error types with contextual help messages and exit codes
//! - **exec**: external tool seam (`Tool`, `SystemTool`, `Toolchain`)
//! - **progress**: operator progress lines (stdout, or stderr under `--json`)
//! - **vcs**: git operations on the recipe workspace
//! - **version**: ordered version values with the "absent" sentinel

pub mod config;
pub mod context;
pub mod error;
pub mod exec;
pub mod progress;
pub mod vcs;
pub mod version;
