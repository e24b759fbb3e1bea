//! Domains module containing business logic organized by bounded contexts.
//!
//! - **prompts**: markdown prompt files, templates and rendering
//! - **sources**: locating the prompt folder, locally or in a git checkout

pub mod prompts;
pub mod sources;
