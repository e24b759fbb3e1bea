//! Git repository fetching with a local cache.
//!
//! Remote repositories are cloned once into
//! `<cache_dir>/git/<owner>/<name>` and reused on later runs. With
//! `auto_pull` the cached checkout is fast-forwarded on startup.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};
use url::Url;

use super::error::SourceError;
use crate::core::security::validate_path_component;

/// Owner and repository name extracted from a git URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitRepoRef {
    pub owner: String,
    pub name: String,
}

/// Extract owner and repository name from a git URL.
///
/// Supports `https://host/owner/repo(.git)`, `ssh://git@host/owner/repo.git`
/// and scp-like `git@host:owner/repo.git`. For nested groups the first path
/// segment is the owner and the last is the name. Both must be safe to use
/// as directory names.
pub fn parse_git_url(git_url: &str) -> Result<GitRepoRef, SourceError> {
    let path = match Url::parse(git_url) {
        Ok(url) if matches!(url.scheme(), "https" | "http" | "ssh" | "git") => {
            url.path().to_string()
        }
        _ => scp_path(git_url)
            .ok_or_else(|| SourceError::invalid_url(git_url))?
            .to_string(),
    };

    let path = path.trim_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    let (Some(owner), Some(name)) = (segments.first(), segments.last()) else {
        return Err(SourceError::invalid_url(git_url));
    };
    if segments.len() < 2 {
        return Err(SourceError::invalid_url(git_url));
    }

    validate_path_component(owner)?;
    validate_path_component(name)?;

    Ok(GitRepoRef {
        owner: owner.to_string(),
        name: name.to_string(),
    })
}

/// Path portion of an scp-like `user@host:path` URL.
fn scp_path(git_url: &str) -> Option<&str> {
    if git_url.contains("://") {
        return None;
    }
    let (host, path) = git_url.split_once(':')?;
    (!host.is_empty() && !host.contains('/')).then_some(path)
}

/// Where `repo` is cached under `cache_dir`.
pub fn cache_path(cache_dir: &Path, repo: &GitRepoRef) -> PathBuf {
    cache_dir.join("git").join(&repo.owner).join(&repo.name)
}

/// Fetches a remote repository into a local directory.
#[async_trait]
pub trait RepositoryFetcher: Send + Sync {
    /// Make `dest` hold a checkout of `url`.
    ///
    /// Clones when `dest` is missing. When it exists, updates it only if
    /// `auto_pull` is set.
    async fn fetch(&self, url: &str, dest: &Path, auto_pull: bool) -> Result<(), SourceError>;
}

/// [`RepositoryFetcher`] that shells out to the `git` executable.
#[derive(Debug, Clone)]
pub struct GitCliFetcher {
    program: String,
}

impl Default for GitCliFetcher {
    fn default() -> Self {
        Self {
            program: "git".to_string(),
        }
    }
}

impl GitCliFetcher {
    async fn run(&self, args: &[&str], cwd: Option<&Path>) -> Result<(), SourceError> {
        let command_line = format!("{} {}", self.program, args.join(" "));
        debug!("Running {}", command_line);

        let mut command = Command::new(&self.program);
        command
            .args(args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null());
        if let Some(cwd) = cwd {
            command.current_dir(cwd);
        }

        let output = command.output().await?;

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(SourceError::git(command_line, stderr.trim()))
        }
    }
}

#[async_trait]
impl RepositoryFetcher for GitCliFetcher {
    async fn fetch(&self, url: &str, dest: &Path, auto_pull: bool) -> Result<(), SourceError> {
        if dest.exists() {
            if auto_pull {
                info!("Updating cached repository {}", dest.display());
                self.run(&["pull", "--ff-only"], Some(dest)).await?;
            } else {
                debug!("Using cached repository {}", dest.display());
            }
            return Ok(());
        }

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        info!("Cloning {} into {}", url, dest.display());
        let dest_str = dest.to_string_lossy();
        self.run(&["clone", "--depth", "1", url, dest_str.as_ref()], None)
            .await
    }
}
