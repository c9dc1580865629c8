//! Unit tests for CLI argument parsing.

use super::*;
use rstest::rstest;

const CLI_ENV: [(&str, Option<&str>); 4] = [
    ("TARGET_REPO", None),
    ("TARGET_FILES", None),
    ("RELEASE_TAG", None),
    ("FORGEFETCH_CONFIG", None),
];

fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
    temp_env::with_vars(CLI_ENV, || {
        Cli::try_parse_from(std::iter::once("forgefetch").chain(args.iter().copied()))
    })
}

fn files_args(cli: Cli) -> FilesArgs {
    match cli.command {
        Command::Files(args) => args,
        Command::Tags(_) => panic!("expected the files command"),
    }
}

#[test]
fn tags_requires_a_repository() {
    assert!(parse(&["tags"]).is_err());
}

#[test]
fn tags_reads_repository_flag() {
    let cli = parse(&["tags", "--repo", "owner/proj"]).expect("parse tags");
    match cli.command {
        Command::Tags(args) => assert_eq!(args.repo, "owner/proj"),
        Command::Files(_) => panic!("expected the tags command"),
    }
}

#[test]
fn files_defaults_to_out_dir_and_nightly() {
    let args = files_args(parse(&["files", "--file", "nhddl.elf"]).expect("parse files"));

    assert_eq!(args.out_dir, "out");
    assert_eq!(args.tag, "nightly");
    assert!(args.repo.is_none());
    assert_eq!(args.files, ["nhddl.elf"]);
}

#[rstest]
#[case::repeated(&["files", "-f", "a/b.elf", "--file", "c.txt"])]
#[case::comma_separated(&["files", "--file", "a/b.elf,c.txt"])]
fn files_accepts_several_targets(#[case] args: &[&str]) {
    let args = files_args(parse(args).expect("parse files"));
    assert_eq!(args.files, ["a/b.elf", "c.txt"]);
}

#[test]
fn files_requires_at_least_one_target() {
    assert!(parse(&["files"]).is_err());
}

#[test]
fn files_reads_environment_fallbacks() {
    let cli = temp_env::with_vars(
        [
            ("TARGET_REPO", Some("owner/proj")),
            ("TARGET_FILES", Some("nhddl.elf,nhddl-standalone.elf")),
            ("RELEASE_TAG", Some("v2.0.0")),
            ("FORGEFETCH_CONFIG", None),
        ],
        || Cli::try_parse_from(["forgefetch", "files", "dist"]),
    )
    .expect("parse files from environment");
    let args = files_args(cli);

    assert_eq!(args.out_dir, "dist");
    assert_eq!(args.repo.as_deref(), Some("owner/proj"));
    assert_eq!(args.tag, "v2.0.0");
    assert_eq!(args.files, ["nhddl.elf", "nhddl-standalone.elf"]);
}

#[test]
fn global_flags_follow_the_subcommand() {
    let cli = parse(&["tags", "--repo", "owner/proj", "-vv", "--config", "forge.toml"])
        .expect("parse global flags");

    assert_eq!(cli.verbosity, 2);
    assert_eq!(cli.config.as_deref().map(camino::Utf8Path::as_str), Some("forge.toml"));
}

#[test]
fn quiet_conflicts_with_verbose() {
    assert!(parse(&["-q", "-v", "tags", "--repo", "owner/proj"]).is_err());
}
