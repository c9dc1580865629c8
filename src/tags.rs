//! Tag listing with the `nightly` tag pinned to the front.

use log::debug;

use crate::context::RequestContext;
use crate::error::{FetchError, Result};
use crate::forge::{ForgeApi, RepoId, Tag, decode_json};
use crate::transport::Transport;

/// Tag that is always listed first when present.
pub const NIGHTLY_TAG: &str = "nightly";

/// Retrieve the tags of `repo` in forge order, with [`NIGHTLY_TAG`] moved
/// to the front.
///
/// An empty response body decodes to an empty list.
///
/// # Errors
///
/// Returns [`FetchError::NotFound`] when the repository does not exist,
/// [`FetchError::UnexpectedStatus`] for other non-2xx answers, a
/// [`FetchError::Decode`] for malformed JSON, and any transport error
/// unchanged.
pub fn list_tags(
    transport: &dyn Transport,
    api: &ForgeApi,
    ctx: &RequestContext,
    repo: &RepoId,
) -> Result<Vec<Tag>> {
    let url = api.tags_url(repo);
    debug!("listing tags for {repo}");
    let (status, body) = api.get(transport, ctx, &url)?;
    match status {
        200..=299 => {}
        404 => return Err(FetchError::not_found(format!("repository {repo}"))),
        _ => return Err(FetchError::UnexpectedStatus { url, status }),
    }

    let mut tags: Vec<Tag> = if body.trim_ascii().is_empty() {
        Vec::new()
    } else {
        decode_json("tag list", &body)?
    };
    move_nightly_to_front(&mut tags);
    debug!("found {} tags for {repo}", tags.len());
    Ok(tags)
}

/// Move the first [`NIGHTLY_TAG`] to index 0, keeping every other tag in
/// its original relative order. Leaves the list untouched otherwise.
///
/// # Examples
///
/// ```
/// use forgefetch::forge::Tag;
/// use forgefetch::tags::move_nightly_to_front;
///
/// let mut tags: Vec<Tag> = ["v3", "v2", "nightly", "v1"].map(Tag::new).into();
/// move_nightly_to_front(&mut tags);
/// let names: Vec<&str> = tags.iter().map(Tag::as_str).collect();
/// assert_eq!(names, ["nightly", "v3", "v2", "v1"]);
/// ```
pub fn move_nightly_to_front(tags: &mut [Tag]) {
    if let Some(index) = tags.iter().position(|tag| tag.name == NIGHTLY_TAG)
        && let Some(prefix) = tags.get_mut(..=index)
    {
        prefix.rotate_right(1);
    }
}
