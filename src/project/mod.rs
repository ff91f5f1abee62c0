//! The project being deployed
//!
//! - **metadata**: name/version/description from the build descriptor
//! - **dependencies**: repository dependency set for first-time recipes

pub mod dependencies;
pub mod metadata;

pub use dependencies::{declared_requirements, dependency_set};
pub use metadata::ProjectMetadata;
