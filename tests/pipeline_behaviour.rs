//! Behaviour-driven tests for the release fetch pipeline.
//!
//! Scenarios run the full pipeline over the bridged transport against the
//! scripted fake host, so every request crosses a real thread hand-off.

use std::cell::{Cell, RefCell};
use std::convert::Infallible;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use forgefetch::test_utils::release_bundle;
use forgefetch::transport::bridged::BridgedTransport;
use forgefetch::transport::bridged::fake::{FakeHost, FakeHostLog, FakeReply};
use forgefetch::{ErrorKind, FetchError, Fetcher, FileRecord, ForgeSettings, RepoId, RequestContext, Tag};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

const API: &str = "https://api.github.com";

#[derive(Default)]
struct PipelineWorld {
    repo: RefCell<Option<RepoId>>,
    host: RefCell<Option<FakeHost>>,
    log: RefCell<Option<Arc<FakeHostLog>>>,
    expired: Cell<bool>,
    tags: RefCell<Option<Result<Vec<Tag>, FetchError>>>,
    records: RefCell<Option<Result<Vec<FileRecord>, FetchError>>>,
}

#[fixture]
fn pipeline_world() -> PipelineWorld {
    PipelineWorld::default()
}

/// A comma-separated list in a step argument.
#[derive(Debug)]
struct NameList(Vec<String>);

impl FromStr for NameList {
    type Err = Infallible;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim().trim_matches('"');
        Ok(Self(
            trimmed
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_owned)
                .collect(),
        ))
    }
}

fn set_repo(world: &PipelineWorld, name: &str) -> RepoId {
    let repo = RepoId::try_from(name).expect("valid repository");
    world.repo.replace(Some(repo.clone()));
    repo
}

fn script(world: &PipelineWorld, url: String, reply: FakeReply) {
    let host = world.host.take().unwrap_or_default().reply(url, reply);
    world.host.replace(Some(host));
}

fn fetcher(world: &PipelineWorld) -> Fetcher {
    let host = world.host.take().expect("host should be scripted");
    world.log.replace(Some(host.log()));
    let repo = world.repo.borrow().clone().expect("repository should be set");
    Fetcher::new(repo, &ForgeSettings::default(), Arc::new(BridgedTransport::new(host)))
}

fn context(world: &PipelineWorld) -> RequestContext {
    if world.expired.get() {
        RequestContext::background().child_with_deadline(Instant::now())
    } else {
        RequestContext::background()
    }
}

fn fetched_records(world: &PipelineWorld) -> std::cell::Ref<'_, Vec<FileRecord>> {
    std::cell::Ref::map(world.records.borrow(), |outcome| match outcome {
        Some(Ok(records)) => records,
        Some(Err(error)) => panic!("expected the fetch to succeed: {error}"),
        None => panic!("files should be fetched"),
    })
}

fn fetch_error(world: &PipelineWorld) -> FetchError {
    match world.records.borrow().as_ref() {
        Some(Err(error)) => error.clone(),
        Some(Ok(records)) => panic!("expected the fetch to fail but got {records:?}"),
        None => panic!("files should be fetched"),
    }
}

#[given("the repository \"{repo}\" has tags \"{tags}\"")]
fn repository_has_tags(pipeline_world: &PipelineWorld, repo: String, tags: NameList) {
    let repo_id = set_repo(pipeline_world, &repo);
    let body = serde_json::to_vec(
        &tags
            .0
            .iter()
            .map(|name| serde_json::json!({ "name": name }))
            .collect::<Vec<_>>(),
    )
    .expect("serialise tag list");
    script(
        pipeline_world,
        format!("{API}/repos/{repo_id}/tags?per_page=100"),
        FakeReply::buffered(200, &body),
    );
}

#[given("release \"{tag}\" of \"{repo}\" ships the standard bundle")]
fn release_ships_bundle(pipeline_world: &PipelineWorld, tag: String, repo: String) {
    let repo_id = set_repo(pipeline_world, &repo);
    let asset = format!("https://dl.test/{repo_id}/{tag}/bundle.zip");
    let release = serde_json::json!({
        "tag_name": tag,
        "assets": [{ "browser_download_url": asset }],
    });
    script(
        pipeline_world,
        format!("{API}/repos/{repo_id}/releases/tags/{tag}"),
        FakeReply::buffered(200, release.to_string().as_bytes()),
    );
    script(pipeline_world, asset, FakeReply::streamed(200, &release_bundle(), 1024));
}

#[given("release \"{tag}\" of \"{repo}\" has no assets")]
fn release_has_no_assets(pipeline_world: &PipelineWorld, tag: String, repo: String) {
    let repo_id = set_repo(pipeline_world, &repo);
    script(
        pipeline_world,
        format!("{API}/repos/{repo_id}/releases/tags/{tag}"),
        FakeReply::buffered(200, br#"{"assets":[]}"#),
    );
}

#[given("the caller's deadline has already passed")]
fn deadline_passed(pipeline_world: &PipelineWorld) {
    pipeline_world.expired.set(true);
}

#[when("the tags are listed")]
fn list_tags(pipeline_world: &PipelineWorld) {
    let fetcher = fetcher(pipeline_world);
    let outcome = fetcher.list_tags(&context(pipeline_world));
    pipeline_world.tags.replace(Some(outcome));
}

#[when("the files \"{targets}\" are fetched from \"{tag}\"")]
fn fetch_files(pipeline_world: &PipelineWorld, targets: NameList, tag: String) {
    let fetcher = fetcher(pipeline_world);
    let outcome = fetcher.get_files(&context(pipeline_world), &tag, &targets.0);
    pipeline_world.records.replace(Some(outcome));
}

#[then("the tags are \"{expected}\"")]
fn tags_are(pipeline_world: &PipelineWorld, expected: NameList) {
    let borrow = pipeline_world.tags.borrow();
    let tags = match borrow.as_ref() {
        Some(Ok(tags)) => tags,
        Some(Err(error)) => panic!("expected tag listing to succeed: {error}"),
        None => panic!("tags should be listed"),
    };
    let names: Vec<&str> = tags.iter().map(Tag::as_str).collect();
    assert_eq!(names, expected.0);
}

#[then("{count} file is returned")]
fn one_file_returned(pipeline_world: &PipelineWorld, count: usize) {
    assert_eq!(fetched_records(pipeline_world).len(), count);
}

#[then("{count} files are returned")]
fn files_returned(pipeline_world: &PipelineWorld, count: usize) {
    assert_eq!(fetched_records(pipeline_world).len(), count);
}

#[then("the file names are \"{expected}\"")]
fn file_names_are(pipeline_world: &PipelineWorld, expected: NameList) {
    let records = fetched_records(pipeline_world);
    let names: Vec<&str> = records.iter().map(FileRecord::name).collect();
    assert_eq!(names, expected.0);
}

#[then("file \"{name}\" has {size} bytes")]
fn file_has_size(pipeline_world: &PipelineWorld, name: String, size: usize) {
    let records = fetched_records(pipeline_world);
    let record = records
        .iter()
        .find(|record| record.name() == name)
        .unwrap_or_else(|| panic!("expected a record named {name}"));
    assert_eq!(record.len(), size);
    assert_eq!(record.created_at(), record.modified_at());
}

#[then("the fetch fails with a not found error")]
fn fails_not_found(pipeline_world: &PipelineWorld) {
    let error = fetch_error(pipeline_world);
    assert_eq!(error.kind(), ErrorKind::NotFound, "unexpected error: {error}");
}

#[then("the fetch fails because the deadline was exceeded")]
fn fails_deadline(pipeline_world: &PipelineWorld) {
    assert_eq!(fetch_error(pipeline_world), FetchError::DeadlineExceeded);
}

#[then("the host saw no requests")]
fn host_saw_no_requests(pipeline_world: &PipelineWorld) {
    let slot = pipeline_world.log.borrow();
    let log = slot.as_ref().expect("fetcher should have been built");
    assert_eq!(log.fetches(), 0);
}

// Bindings are index-based; keep them in feature file order.
#[scenario(path = "tests/features/pipeline.feature", index = 0)]
fn scenario_tags_nightly_first(pipeline_world: PipelineWorld) {
    let _ = pipeline_world;
}

#[scenario(path = "tests/features/pipeline.feature", index = 1)]
fn scenario_single_file(pipeline_world: PipelineWorld) {
    let _ = pipeline_world;
}

#[scenario(path = "tests/features/pipeline.feature", index = 2)]
fn scenario_several_files(pipeline_world: PipelineWorld) {
    let _ = pipeline_world;
}

#[scenario(path = "tests/features/pipeline.feature", index = 3)]
fn scenario_missing_file(pipeline_world: PipelineWorld) {
    let _ = pipeline_world;
}

#[scenario(path = "tests/features/pipeline.feature", index = 4)]
fn scenario_release_without_assets(pipeline_world: PipelineWorld) {
    let _ = pipeline_world;
}

#[scenario(path = "tests/features/pipeline.feature", index = 5)]
fn scenario_expired_deadline(pipeline_world: PipelineWorld) {
    let _ = pipeline_world;
}
