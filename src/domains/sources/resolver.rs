//! Turns configuration into the local folder the scanner reads.

use std::path::PathBuf;

use tracing::info;

use super::error::SourceError;
use super::git::{GitCliFetcher, RepositoryFetcher, cache_path, parse_git_url};
use crate::core::config::SourceConfig;
use crate::core::security::{expand_tilde, validate_safe_path};

/// Where prompts come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSpec {
    /// A directory on the local filesystem.
    Local(PathBuf),
    /// A remote repository, optionally narrowed to a subfolder.
    Git {
        url: String,
        subfolder: Option<String>,
        auto_pull: bool,
    },
}

impl SourceSpec {
    /// Build a spec from configuration.
    ///
    /// A git URL takes precedence; the folder then names a subfolder inside
    /// the checkout.
    pub fn from_config(config: &SourceConfig) -> Result<Self, SourceError> {
        match (&config.git_url, &config.folder) {
            (Some(url), subfolder) => Ok(Self::Git {
                url: url.clone(),
                subfolder: subfolder.clone(),
                auto_pull: config.auto_pull,
            }),
            (None, Some(folder)) => Ok(Self::Local(PathBuf::from(folder))),
            (None, None) => Err(SourceError::NotConfigured),
        }
    }
}

/// Resolves a [`SourceSpec`] to a local directory.
#[derive(Debug, Clone)]
pub struct SourceResolver<F = GitCliFetcher> {
    fetcher: F,
    cache_dir: PathBuf,
}

impl SourceResolver<GitCliFetcher> {
    /// Resolver backed by the `git` executable.
    pub fn with_git(cache_dir: impl Into<PathBuf>) -> Self {
        Self::new(GitCliFetcher::default(), cache_dir)
    }
}

impl<F: RepositoryFetcher> SourceResolver<F> {
    pub fn new(fetcher: F, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            fetcher,
            cache_dir: cache_dir.into(),
        }
    }

    /// Resolve `spec` to the directory to scan.
    ///
    /// Local paths are returned unchanged. Git sources are fetched into the
    /// cache first, and a subfolder must stay inside the checkout.
    pub async fn resolve(&self, spec: &SourceSpec) -> Result<PathBuf, SourceError> {
        match spec {
            SourceSpec::Local(path) => Ok(path.clone()),
            SourceSpec::Git {
                url,
                subfolder,
                auto_pull,
            } => {
                let repo = parse_git_url(url)?;
                let cache_dir = expand_tilde(&self.cache_dir)?;
                let checkout = cache_path(&cache_dir, &repo);

                self.fetcher.fetch(url, &checkout, *auto_pull).await?;

                let root = match subfolder {
                    Some(sub) => validate_safe_path(&checkout.join(sub), Some(&checkout))?,
                    None => checkout,
                };
                info!("Using prompts from {} ({})", root.display(), url);
                Ok(root)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Creates the checkout directory instead of running git.
    #[derive(Default)]
    struct FakeFetcher {
        calls: Mutex<Vec<(String, PathBuf, bool)>>,
    }

    #[async_trait]
    impl RepositoryFetcher for FakeFetcher {
        async fn fetch(&self, url: &str, dest: &Path, auto_pull: bool) -> Result<(), SourceError> {
            std::fs::create_dir_all(dest.join("prompts"))?;
            self.calls
                .lock()
                .unwrap()
                .push((url.to_string(), dest.to_path_buf(), auto_pull));
            Ok(())
        }
    }

    fn git_spec(subfolder: Option<&str>) -> SourceSpec {
        SourceSpec::Git {
            url: "https://github.com/owner/repo.git".into(),
            subfolder: subfolder.map(String::from),
            auto_pull: true,
        }
    }

    #[test]
    fn test_spec_from_config() {
        let mut config = SourceConfig::default();
        assert!(matches!(
            SourceSpec::from_config(&config),
            Err(SourceError::NotConfigured)
        ));

        config.folder = Some("./prompts".into());
        assert_eq!(
            SourceSpec::from_config(&config).unwrap(),
            SourceSpec::Local(PathBuf::from("./prompts"))
        );

        config.git_url = Some("git@github.com:owner/repo.git".into());
        assert_eq!(
            SourceSpec::from_config(&config).unwrap(),
            SourceSpec::Git {
                url: "git@github.com:owner/repo.git".into(),
                subfolder: Some("./prompts".into()),
                auto_pull: false,
            }
        );
    }

    #[tokio::test]
    async fn test_local_spec_passes_through() {
        let resolver = SourceResolver::new(FakeFetcher::default(), "/unused");
        let path = resolver
            .resolve(&SourceSpec::Local(PathBuf::from("~/prompts")))
            .await
            .unwrap();
        assert_eq!(path, PathBuf::from("~/prompts"));
        assert!(resolver.fetcher.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_git_spec_uses_cache_path() {
        let cache = TempDir::new().unwrap();
        let resolver = SourceResolver::new(FakeFetcher::default(), cache.path());

        let root = resolver.resolve(&git_spec(None)).await.unwrap();

        assert_eq!(root, cache.path().join("git/owner/repo"));
        let calls = resolver.fetcher.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].2);
    }

    #[tokio::test]
    async fn test_git_subfolder_is_resolved() {
        let cache = TempDir::new().unwrap();
        let resolver = SourceResolver::new(FakeFetcher::default(), cache.path());

        let root = resolver.resolve(&git_spec(Some("prompts"))).await.unwrap();

        let expected = cache.path().join("git/owner/repo/prompts").canonicalize().unwrap();
        assert_eq!(root, expected);
    }

    #[tokio::test]
    async fn test_git_subfolder_cannot_escape_checkout() {
        let cache = TempDir::new().unwrap();
        let resolver = SourceResolver::new(FakeFetcher::default(), cache.path());

        let err = resolver
            .resolve(&git_spec(Some("../../..")))
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::InvalidPath(_)));
    }

    #[tokio::test]
    async fn test_invalid_url_never_fetches() {
        let resolver = SourceResolver::new(FakeFetcher::default(), "/unused");
        let spec = SourceSpec::Git {
            url: "https://github.com/".into(),
            subfolder: None,
            auto_pull: false,
        };

        assert!(matches!(
            resolver.resolve(&spec).await,
            Err(SourceError::InvalidUrl(_))
        ));
        assert!(resolver.fetcher.calls.lock().unwrap().is_empty());
    }
}
