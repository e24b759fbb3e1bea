//! Sources domain module.
//!
//! Resolves where prompts are read from: a local folder, or a git
//! repository cloned into a cache directory and optionally kept up to date.

mod error;
pub mod git;
mod resolver;

pub use error::SourceError;
pub use git::{GitCliFetcher, GitRepoRef, RepositoryFetcher, cache_path, parse_git_url};
pub use resolver::{SourceResolver, SourceSpec};
