//! Forge API endpoints and the JSON shapes read from them.
//!
//! Only two read-only metadata endpoints are used: the tag list and the
//! release-by-tag lookup. Both are fetched with the short metadata deadline
//! and decoded with `serde_json`.

use std::fmt;
use std::time::Duration;

use serde::Deserialize;

use crate::context::RequestContext;
use crate::error::{FetchError, Result};
use crate::transport::{Transport, read_body};

/// Default GitHub REST API root.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Deadline applied to each metadata request.
pub const DEFAULT_METADATA_TIMEOUT: Duration = Duration::from_secs(5);

/// Page size requested from the tag list endpoint (the forge maximum).
const TAGS_PER_PAGE: u32 = 100;

/// A repository identifier of the form `owner/name`.
///
/// # Examples
///
/// ```
/// use forgefetch::forge::RepoId;
///
/// let repo = RepoId::try_from("owner/proj").expect("valid repository");
/// assert_eq!(repo.owner(), "owner");
/// assert_eq!(repo.name(), "proj");
/// assert!(RepoId::try_from("proj").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoId(String);

impl RepoId {
    /// Return the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The owning user or organisation.
    #[must_use]
    pub fn owner(&self) -> &str {
        self.0.split_once('/').map_or("", |(owner, _)| owner)
    }

    /// The repository name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.0.split_once('/').map_or("", |(_, name)| name)
    }
}

fn validate_repo(value: &str) -> Result<()> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(FetchError::invalid_input("repository must not be empty"));
    }
    match trimmed.split_once('/') {
        Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
            Ok(())
        }
        _ => Err(FetchError::invalid_input(format!(
            "repository \"{value}\" must have the form owner/name"
        ))),
    }
}

impl TryFrom<&str> for RepoId {
    type Error = FetchError;

    fn try_from(value: &str) -> Result<Self> {
        validate_repo(value)?;
        Ok(Self(value.trim().to_owned()))
    }
}

impl TryFrom<String> for RepoId {
    type Error = FetchError;

    fn try_from(value: String) -> Result<Self> {
        Self::try_from(value.as_str())
    }
}

impl AsRef<str> for RepoId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A published tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct Tag {
    /// The tag name, for example `v2.0.0`.
    pub name: String,
}

impl Tag {
    /// Construct a tag from its name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// The tag name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.name
    }
}

/// Release metadata as returned by the release-by-tag endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Release {
    /// Downloadable files attached to the release.
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

/// A downloadable file attached to a release.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReleaseAsset {
    /// Direct download URL for the asset.
    #[serde(rename = "browser_download_url")]
    pub download_url: String,
}

/// Endpoint builder and metadata fetcher for one forge API root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForgeApi {
    base_url: String,
    metadata_timeout: Duration,
}

impl ForgeApi {
    /// An API rooted at `base_url`; trailing slashes are ignored.
    #[must_use]
    pub fn new(base_url: &str, metadata_timeout: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            metadata_timeout,
        }
    }

    /// The tag list endpoint for `repo`.
    ///
    /// # Examples
    ///
    /// ```
    /// use forgefetch::forge::{ForgeApi, RepoId};
    ///
    /// let api = ForgeApi::default();
    /// let repo = RepoId::try_from("owner/proj").expect("valid repository");
    /// assert_eq!(
    ///     api.tags_url(&repo),
    ///     "https://api.github.com/repos/owner/proj/tags?per_page=100"
    /// );
    /// ```
    #[must_use]
    pub fn tags_url(&self, repo: &RepoId) -> String {
        format!(
            "{}/repos/{repo}/tags?per_page={TAGS_PER_PAGE}",
            self.base_url
        )
    }

    /// The release-by-tag endpoint for `repo` and `tag`.
    ///
    /// `tag` is percent-encoded as a single path segment.
    #[must_use]
    pub fn release_url(&self, repo: &RepoId, tag: &str) -> String {
        format!(
            "{}/repos/{repo}/releases/tags/{}",
            self.base_url,
            urlencoding::encode(tag)
        )
    }

    /// Fetch a metadata document under the metadata deadline.
    ///
    /// Returns the status code and the fully buffered body; the body is
    /// released before returning on every path.
    pub(crate) fn get(
        &self,
        transport: &dyn Transport,
        ctx: &RequestContext,
        url: &str,
    ) -> Result<(u16, Vec<u8>)> {
        let request_ctx = ctx.child_with_timeout(self.metadata_timeout);
        let response = transport.fetch(&request_ctx, url)?;
        let status = response.status;
        let body = read_body(&request_ctx, url, response.body)?;
        Ok((status, body))
    }
}

impl Default for ForgeApi {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE, DEFAULT_METADATA_TIMEOUT)
    }
}

/// Decode a JSON metadata body, tagging failures with `what`.
pub(crate) fn decode_json<'a, T: Deserialize<'a>>(what: &'static str, body: &'a [u8]) -> Result<T> {
    serde_json::from_slice(body).map_err(|e| FetchError::Decode {
        what,
        reason: e.to_string(),
    })
}
