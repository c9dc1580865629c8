//! Fetch named files out of tagged forge releases.
//!
//! The crate lists a repository's tags, resolves a tag to its first release
//! asset, downloads that archive, and extracts the requested entries into
//! [`FileRecord`]s. Network access goes through the [`Transport`] trait,
//! which has a blocking HTTP implementation and a bridged implementation
//! that drives a host-provided, promise-style fetch primitive from a
//! blocking caller.
//!
//! ```no_run
//! use forgefetch::{Fetcher, ForgeSettings, RepoId, RequestContext};
//!
//! # fn main() -> forgefetch::Result<()> {
//! let repo = RepoId::try_from("owner/proj")?;
//! let fetcher = Fetcher::native(repo, &ForgeSettings::default());
//! let records = fetcher.get_files(&RequestContext::background(), "v2.0.0", &["nhddl.elf"])?;
//! for record in &records {
//!     println!("{} ({} bytes)", record.name(), record.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod extract;
pub mod forge;
pub mod pipeline;
pub mod record;
pub mod release;
pub mod tags;
#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
pub mod transport;

pub use config::ForgeSettings;
pub use context::{CancelHandle, RequestContext};
pub use error::{ErrorKind, FetchError, Result};
pub use forge::{RepoId, Tag};
pub use pipeline::Fetcher;
pub use record::FileRecord;
pub use transport::{FetchResponse, ResponseBody, Transport};
