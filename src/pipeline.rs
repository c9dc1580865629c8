//! Release fetch pipeline: resolve, download, extract.
//!
//! [`Fetcher`] binds a repository, forge settings, and a [`Transport`]
//! chosen at construction time. Every stage fails fast and the originating
//! error is returned unchanged; no partial results are produced.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};

use crate::config::ForgeSettings;
use crate::context::RequestContext;
use crate::error::{FetchError, Result};
use crate::extract::extract;
use crate::forge::{ForgeApi, RepoId, Tag};
use crate::record::FileRecord;
use crate::release::validate_tag;
use crate::transport::native::NativeTransport;
use crate::transport::{Transport, read_body};

/// Fetches tags and release files for one repository.
#[derive(Clone)]
pub struct Fetcher {
    repo: RepoId,
    api: ForgeApi,
    cors_proxy: Option<String>,
    download_timeout: Duration,
    transport: Arc<dyn Transport>,
}

impl Fetcher {
    /// Build a fetcher over an explicit transport.
    #[must_use]
    pub fn new(repo: RepoId, settings: &ForgeSettings, transport: Arc<dyn Transport>) -> Self {
        Self {
            repo,
            api: settings.api(),
            cors_proxy: settings.cors_proxy().map(str::to_owned),
            download_timeout: settings.download_timeout(),
            transport,
        }
    }

    /// Build a fetcher over the blocking HTTP transport.
    #[must_use]
    pub fn native(repo: RepoId, settings: &ForgeSettings) -> Self {
        Self::new(repo, settings, Arc::new(NativeTransport::new()))
    }

    /// The repository this fetcher targets.
    #[must_use]
    pub const fn repo(&self) -> &RepoId {
        &self.repo
    }

    /// List the repository's tags, `nightly` first when present.
    ///
    /// # Errors
    ///
    /// See [`crate::tags::list_tags`].
    pub fn list_tags(&self, ctx: &RequestContext) -> Result<Vec<Tag>> {
        crate::tags::list_tags(self.transport.as_ref(), &self.api, ctx, &self.repo)
    }

    /// Resolve the archive download URL for `tag`.
    ///
    /// # Errors
    ///
    /// See [`crate::release::resolve_release_url`].
    pub fn resolve_release_url(&self, ctx: &RequestContext, tag: &str) -> Result<String> {
        crate::release::resolve_release_url(self.transport.as_ref(), &self.api, ctx, &self.repo, tag)
    }

    /// Fetch the archive attached to `tag` and extract the entries whose
    /// full paths appear in `targets`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidInput`] for an empty tag or target list
    /// before any request is made, [`FetchError::UnexpectedStatus`] when the
    /// download does not answer 200, and otherwise the first error raised by
    /// resolution, download, or extraction.
    pub fn get_files<S: AsRef<str>>(
        &self,
        ctx: &RequestContext,
        tag: &str,
        targets: &[S],
    ) -> Result<Vec<FileRecord>> {
        let wanted = validate_tag(tag)?;
        if targets.is_empty() {
            return Err(FetchError::invalid_input("at least one target file is required"));
        }

        info!("resolving release {wanted} of {}", self.repo);
        let asset_url = self.resolve_release_url(ctx, wanted)?;
        let url = self.download_url(&asset_url);
        let archive = self.download(ctx, &url)?;
        debug!("downloaded {} bytes from {url}", archive.len());
        let records = extract(&archive, targets)?;
        info!("extracted {} files from release {wanted}", records.len());
        Ok(records)
    }

    fn download_url(&self, asset_url: &str) -> String {
        self.cors_proxy
            .as_ref()
            .map_or_else(|| asset_url.to_owned(), |proxy| format!("{proxy}{asset_url}"))
    }

    fn download(&self, ctx: &RequestContext, url: &str) -> Result<Vec<u8>> {
        info!("downloading {url}");
        let download_ctx = ctx.child_with_timeout(self.download_timeout);
        let response = self.transport.fetch(&download_ctx, url)?;
        if response.status != 200 {
            let status = response.status;
            response.body.close();
            return Err(FetchError::UnexpectedStatus {
                url: url.to_owned(),
                status,
            });
        }
        read_body(&download_ctx, url, response.body)
    }
}

impl std::fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fetcher")
            .field("repo", &self.repo)
            .field("api", &self.api)
            .field("cors_proxy", &self.cors_proxy)
            .field("download_timeout", &self.download_timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
