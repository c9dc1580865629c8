//! `forgefetch` CLI entrypoint.
//!
//! Lists release tags or stages release (or local) files into a directory.

use std::io::Write;

use clap::Parser;
use forgefetch::{Fetcher, FileRecord, ForgeSettings, RepoId, RequestContext};
use forgefetch_cli::cli::{Cli, Command, FilesArgs, TagsArgs};
use forgefetch_cli::config::load_settings;
use forgefetch_cli::error::{CliError, Result};
use forgefetch_cli::local::collect_local_files;
use forgefetch_cli::output::{print_tags, write_records, write_stderr_line};

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);
    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stdout, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn init_logging(cli: &Cli) {
    let level = match (cli.quiet, cli.verbosity) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, _) => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn run(cli: &Cli, stdout: &mut dyn Write, stderr: &mut dyn Write) -> Result<()> {
    let settings = load_settings(cli.config.as_deref())?;
    let ctx = RequestContext::background();
    match &cli.command {
        Command::Tags(args) => run_tags(args, &settings, &ctx, stdout),
        Command::Files(args) => run_files(cli, args, &settings, &ctx, stderr),
    }
}

fn run_tags(
    args: &TagsArgs,
    settings: &ForgeSettings,
    ctx: &RequestContext,
    stdout: &mut dyn Write,
) -> Result<()> {
    let repo = RepoId::try_from(args.repo.as_str())?;
    let tags = Fetcher::native(repo, settings).list_tags(ctx)?;
    print_tags(stdout, &tags).map_err(|source| CliError::WriteOutput {
        path: "<stdout>".into(),
        source,
    })
}

fn run_files(
    cli: &Cli,
    args: &FilesArgs,
    settings: &ForgeSettings,
    ctx: &RequestContext,
    stderr: &mut dyn Write,
) -> Result<()> {
    let records = gather_records(args, settings, ctx)?;
    let written = write_records(&args.out_dir, &records)?;
    if !cli.quiet {
        for path in &written {
            write_stderr_line(stderr, format!("wrote {path}"));
        }
        write_stderr_line(
            stderr,
            format!("{} files written to {}", written.len(), args.out_dir),
        );
    }
    Ok(())
}

fn gather_records(
    args: &FilesArgs,
    settings: &ForgeSettings,
    ctx: &RequestContext,
) -> Result<Vec<FileRecord>> {
    match args.repo.as_deref().map(str::trim).filter(|repo| !repo.is_empty()) {
        Some(repo) => {
            let repo = RepoId::try_from(repo)?;
            Ok(Fetcher::native(repo, settings).get_files(ctx, &args.tag, &args.files)?)
        }
        None => collect_local_files(&args.files),
    }
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, err);
            1
        }
    }
}
