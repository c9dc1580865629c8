//! Runtime settings for the fetch pipeline.
//!
//! `ForgeSettings` is deserialised from the `[forge]` table of the CLI
//! configuration file and may be patched by environment overrides before the
//! pipeline is constructed. It is read-only afterwards.

use std::time::Duration;

use serde::Deserialize;

use crate::forge::{DEFAULT_API_BASE, DEFAULT_METADATA_TIMEOUT, ForgeApi};

/// Default deadline for downloading a release archive.
pub const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(20);

/// Forge endpoints, proxy, and request deadlines.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ForgeSettings {
    /// Root of the forge REST API.
    pub api_base: String,
    /// Prefix prepended verbatim to archive download URLs.
    ///
    /// Browser hosts need this because release download redirects do not
    /// carry CORS headers. Whitespace-only values are treated as absent.
    pub cors_proxy: Option<String>,
    /// Deadline for each metadata request, in seconds.
    pub metadata_timeout_secs: u64,
    /// Deadline for the archive download, in seconds.
    pub download_timeout_secs: u64,
}

impl ForgeSettings {
    /// Returns the configured proxy prefix, if present.
    #[must_use]
    pub fn cors_proxy(&self) -> Option<&str> {
        self.cors_proxy
            .as_deref()
            .map(str::trim)
            .filter(|proxy| !proxy.is_empty())
    }

    /// Deadline applied to each metadata request.
    #[must_use]
    pub const fn metadata_timeout(&self) -> Duration {
        Duration::from_secs(self.metadata_timeout_secs)
    }

    /// Deadline applied to the archive download.
    #[must_use]
    pub const fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    /// The forge API described by these settings.
    ///
    /// # Examples
    ///
    /// ```
    /// use forgefetch::config::ForgeSettings;
    /// use forgefetch::forge::RepoId;
    ///
    /// let settings = ForgeSettings {
    ///     api_base: "https://forge.test/api".to_owned(),
    ///     ..ForgeSettings::default()
    /// };
    /// let repo = RepoId::try_from("owner/proj").expect("valid repository");
    /// assert_eq!(
    ///     settings.api().release_url(&repo, "v1"),
    ///     "https://forge.test/api/repos/owner/proj/releases/tags/v1"
    /// );
    /// ```
    #[must_use]
    pub fn api(&self) -> ForgeApi {
        ForgeApi::new(&self.api_base, self.metadata_timeout())
    }
}

impl Default for ForgeSettings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_owned(),
            cors_proxy: None,
            metadata_timeout_secs: DEFAULT_METADATA_TIMEOUT.as_secs(),
            download_timeout_secs: DEFAULT_DOWNLOAD_TIMEOUT.as_secs(),
        }
    }
}
