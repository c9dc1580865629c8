//! Release lookup by tag.

use log::debug;

use crate::context::RequestContext;
use crate::error::{FetchError, Result};
use crate::forge::{ForgeApi, Release, RepoId, decode_json};
use crate::transport::Transport;

/// Trim `tag` and reject it when nothing is left.
///
/// # Errors
///
/// Returns [`FetchError::InvalidInput`] for an empty or blank tag.
pub(crate) fn validate_tag(tag: &str) -> Result<&str> {
    let trimmed = tag.trim();
    if trimmed.is_empty() {
        return Err(FetchError::invalid_input("release tag must not be empty"));
    }
    Ok(trimmed)
}

/// Resolve the download URL of the first asset of the release tagged `tag`.
///
/// Surrounding whitespace in `tag` is ignored.
///
/// # Errors
///
/// Returns [`FetchError::InvalidInput`] for a blank tag before any request
/// is made, [`FetchError::NotFound`] when the tag has no release or the
/// release has no assets, [`FetchError::UnexpectedStatus`] for other
/// non-2xx answers, [`FetchError::Decode`] for malformed JSON, and any
/// transport error unchanged.
pub fn resolve_release_url(
    transport: &dyn Transport,
    api: &ForgeApi,
    ctx: &RequestContext,
    repo: &RepoId,
    tag: &str,
) -> Result<String> {
    let wanted = validate_tag(tag)?;
    let url = api.release_url(repo, wanted);
    debug!("resolving release {wanted} of {repo}");
    let (status, body) = api.get(transport, ctx, &url)?;
    match status {
        200..=299 => {}
        404 => return Err(FetchError::not_found(format!("release for tag {wanted}"))),
        _ => return Err(FetchError::UnexpectedStatus { url, status }),
    }

    let release: Release = decode_json("release metadata", &body)?;
    let asset = release
        .assets
        .into_iter()
        .next()
        .filter(|asset| !asset.download_url.is_empty())
        .ok_or_else(|| FetchError::not_found(format!("release asset for tag {wanted}")))?;
    debug!("release {wanted} resolves to {}", asset.download_url);
    Ok(asset.download_url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::transport::{FetchResponse, MockTransport, ResponseBody};
    use rstest::rstest;

    const RELEASE_URL: &str = "https://api.github.com/repos/owner/proj/releases/tags/v2.0.0";

    fn resolve(status: u16, body: &'static str) -> Result<String> {
        let mut transport = MockTransport::new();
        transport
            .expect_fetch()
            .withf(|_, url| url == RELEASE_URL)
            .times(1)
            .returning(move |_, _| {
                Ok(FetchResponse::new(
                    status,
                    ResponseBody::from_bytes(body.as_bytes().to_vec()),
                ))
            });
        let repo = RepoId::try_from("owner/proj").expect("valid repository");
        resolve_release_url(
            &transport,
            &ForgeApi::default(),
            &RequestContext::background(),
            &repo,
            "v2.0.0",
        )
    }

    #[test]
    fn returns_first_asset_url() {
        let url = resolve(
            200,
            r#"{"assets":[
                {"browser_download_url":"https://dl.test/first.zip"},
                {"browser_download_url":"https://dl.test/second.zip"}
            ]}"#,
        )
        .expect("resolve release");
        assert_eq!(url, "https://dl.test/first.zip");
    }

    #[rstest]
    #[case::empty_assets(200, r#"{"assets":[]}"#)]
    #[case::missing_assets(200, r#"{"name":"v2.0.0"}"#)]
    #[case::blank_url(200, r#"{"assets":[{"browser_download_url":""}]}"#)]
    #[case::unknown_tag(404, r#"{"message":"Not Found"}"#)]
    fn missing_release_or_asset_is_not_found(#[case] status: u16, #[case] body: &'static str) {
        let err = resolve(status, body).expect_err("no usable asset");
        assert_eq!(err.kind(), ErrorKind::NotFound, "got {err:?}");
    }

    #[test]
    fn server_error_is_unexpected_status() {
        let err = resolve(502, "bad gateway").expect_err("server error");
        assert_eq!(
            err,
            FetchError::UnexpectedStatus {
                url: RELEASE_URL.to_owned(),
                status: 502
            }
        );
    }

    #[test]
    fn malformed_json_is_decode_error() {
        let err = resolve(200, r#"{"assets": "#).expect_err("truncated JSON");
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[rstest]
    #[case::empty("")]
    #[case::blank(" \t ")]
    fn blank_tag_is_rejected_without_a_request(#[case] tag: &str) {
        let mut transport = MockTransport::new();
        transport.expect_fetch().never();
        let repo = RepoId::try_from("owner/proj").expect("valid repository");
        let err = resolve_release_url(
            &transport,
            &ForgeApi::default(),
            &RequestContext::background(),
            &repo,
            tag,
        )
        .expect_err("blank tag");
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn tag_with_reserved_characters_stays_one_path_segment() {
        let mut transport = MockTransport::new();
        transport
            .expect_fetch()
            .withf(|_, url| {
                url == "https://api.github.com/repos/owner/proj/releases/tags/feature%2Fx%3Fy%23z"
            })
            .times(1)
            .returning(|_, _| Ok(FetchResponse::new(404, ResponseBody::from_bytes(Vec::new()))));
        let repo = RepoId::try_from("owner/proj").expect("valid repository");
        let err = resolve_release_url(
            &transport,
            &ForgeApi::default(),
            &RequestContext::background(),
            &repo,
            "feature/x?y#z",
        )
        .expect_err("no such release");
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn transport_errors_propagate_unchanged() {
        let mut transport = MockTransport::new();
        transport
            .expect_fetch()
            .returning(|_, _| Err(FetchError::DeadlineExceeded));
        let repo = RepoId::try_from("owner/proj").expect("valid repository");
        let err = resolve_release_url(
            &transport,
            &ForgeApi::default(),
            &RequestContext::background(),
            &repo,
            "v2.0.0",
        )
        .expect_err("timeout");
        assert_eq!(err, FetchError::DeadlineExceeded);
    }
}
