//! CLI argument definitions for `forgefetch`.

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};

/// Fetch files from tagged forge releases.
#[derive(Parser, Debug)]
#[command(name = "forgefetch")]
#[command(version, about)]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  List the tags of a repository:\n",
    "    $ forgefetch tags --repo pcm720/nhddl\n\n",
    "  Fetch two files from the nightly release into ./out:\n",
    "    $ forgefetch files --repo pcm720/nhddl --file nhddl.elf --file nhddl-standalone.elf\n\n",
    "  Copy local files and directories instead of fetching:\n",
    "    $ forgefetch files staging --file assets/ --file README.md",
))]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Read forge settings from this TOML file.
    #[arg(long, global = true, value_name = "FILE", env = "FORGEFETCH_CONFIG")]
    pub config: Option<Utf8PathBuf>,

    /// Increase log verbosity (repeatable: -v, -vv).
    #[arg(
        short,
        long = "verbose",
        global = true,
        action = clap::ArgAction::Count,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Suppress progress output (errors still shown).
    #[arg(short, long, global = true, conflicts_with = "verbosity")]
    pub quiet: bool,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List release tags, `nightly` first.
    Tags(TagsArgs),

    /// Fetch files from a release, or collect local files, into a directory.
    Files(FilesArgs),
}

/// Arguments for the `tags` command.
#[derive(Args, Debug, Clone)]
pub struct TagsArgs {
    /// Repository to list tags from, as `owner/name`.
    #[arg(long, env = "TARGET_REPO", value_name = "OWNER/NAME")]
    pub repo: String,
}

/// Arguments for the `files` command.
#[derive(Args, Debug, Clone)]
pub struct FilesArgs {
    /// Directory the files are written to.
    #[arg(value_name = "OUT_DIR", default_value = "out")]
    pub out_dir: Utf8PathBuf,

    /// File to include; repeat for several. Archive entries need their full
    /// in-archive path (for example `dir1/dir2/file`). Local paths may name
    /// directories, which are read recursively.
    #[arg(
        short,
        long = "file",
        env = "TARGET_FILES",
        value_delimiter = ',',
        required = true,
        value_name = "PATH"
    )]
    pub files: Vec<String>,

    /// Repository to fetch from. Without it, files are read locally.
    #[arg(long, env = "TARGET_REPO", value_name = "OWNER/NAME")]
    pub repo: Option<String>,

    /// Release tag to fetch from.
    #[arg(long, env = "RELEASE_TAG", default_value = "nightly")]
    pub tag: String,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
