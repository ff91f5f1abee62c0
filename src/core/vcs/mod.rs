//! Version control over the recipe workspace
//!
//! All git access goes through the injected git [`Tool`](crate::core::exec::Tool),
//! always with an explicit working directory.

mod recipe_repo;

pub use recipe_repo::RecipeRepo;
