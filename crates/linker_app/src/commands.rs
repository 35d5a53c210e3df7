use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Result;
use chrono::Local;
use linker_core::{
    InstructionSet, LinkError, LinkPhase, LinkRequest, LinkViewModel, RemoteTarget, StepResult,
};
use linker_engine::{LinkEvent, Linker, LinkerHandle};
use linker_logging::{linker_info, linker_warn};
use tokio::runtime::Runtime;

use crate::cli::{LinkArgs, TargetArgs};
use crate::config::{LinkerConfig, CONFIG_FILENAME};
use crate::render;

const EXIT_FAILED: u8 = 1;

pub fn link(config: &LinkerConfig, args: LinkArgs) -> Result<ExitCode> {
    let linker = config.build_linker(args.target.probe.unwrap_or(config.probe));
    let remote = match resolve_remote(&runtime()?, config, &linker, &args.target) {
        Ok(remote) => remote,
        Err(err) => return Ok(rejected(&err)),
    };
    let gitignore = match args.gitignore {
        Some(template) => Some(template.into()),
        None => config.gitignore_template()?,
    };
    let request = LinkRequest::new(&args.target.path, remote)
        .with_remote_name(config.remote_name.clone())
        .with_commit_message(args.message.unwrap_or_else(|| config.commit_message.clone()))
        .with_branch(args.branch.or_else(|| config.default_branch.clone()))
        .with_gitignore(gitignore);

    if !args.yes && !confirm(&request)? {
        println!("Nothing changed.");
        return Ok(ExitCode::from(EXIT_FAILED));
    }

    let handle = LinkerHandle::new(linker)?;
    if let Err(err) = handle.cancel_on_interrupt() {
        linker_warn!("Ctrl-C will not cancel this run: {}", err);
    }

    let started = Local::now();
    linker_info!(
        "run started {} path={:?} remote={}",
        started.to_rfc3339(),
        request.local_path,
        request.remote
    );
    handle.start(request);

    while let Some(event) = handle.recv() {
        match event {
            LinkEvent::Progress(view) => {
                if let Some(line) = render::progress_line(&view) {
                    println!("{line}");
                }
            }
            LinkEvent::Finished(view) => {
                println!("{}", render::summary(&view, started));
                return Ok(exit_for(&view));
            }
        }
    }
    anyhow::bail!("linker stopped without reporting a result")
}

pub fn check(config: &LinkerConfig, args: TargetArgs) -> Result<ExitCode> {
    let linker = config.build_linker(args.probe.unwrap_or(config.probe));
    let runtime = runtime()?;
    let remote = match resolve_remote(&runtime, config, &linker, &args) {
        Ok(remote) => remote,
        Err(err) => return Ok(rejected(&err)),
    };

    println!("Folder: {}", args.path.display());
    println!("Repository: {remote}");
    match runtime.block_on(linker.check(&args.path, &remote)) {
        Ok(status) => {
            linker_info!("check {}: {}", remote, status.describe());
            print!("{}", render::remote_status(&status));
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            linker_warn!("check failed: {}", err);
            println!("Check failed: {err}");
            println!("Hint: {}", err.kind.hint());
            Ok(ExitCode::from(EXIT_FAILED))
        }
    }
}

pub fn instructions(set: InstructionSet) -> ExitCode {
    print!("{}", render::instructions(set));
    ExitCode::SUCCESS
}

pub fn init_config(path: Option<PathBuf>, force: bool) -> Result<ExitCode> {
    let path = path.unwrap_or_else(|| PathBuf::from(CONFIG_FILENAME));
    let written = LinkerConfig::write_default(&path, force)?;
    println!("Wrote {}", written.display());
    Ok(ExitCode::SUCCESS)
}

fn runtime() -> Result<Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}

/// The repository argument, or one named after the folder when it is left out.
fn resolve_remote(
    runtime: &Runtime,
    config: &LinkerConfig,
    linker: &Linker,
    target: &TargetArgs,
) -> Result<RemoteTarget, LinkError> {
    let default_owner = config.default_owner.as_deref();
    match &target.repo {
        Some(repo) => RemoteTarget::parse(repo, default_owner),
        None => runtime.block_on(linker.folder_target(&target.path, default_owner)),
    }
}

/// Input that cannot become a request is reported like a failed first step.
fn rejected(err: &LinkError) -> ExitCode {
    let view = LinkViewModel {
        phase: LinkPhase::Failed,
        steps: vec![StepResult::failure(LinkPhase::CheckingRemote, err)],
        failure: Some(err.clone()),
        ..LinkViewModel::default()
    };
    if let Some(line) = render::progress_line(&view) {
        println!("{line}");
    }
    println!("Hint: {}", err.kind.hint());
    ExitCode::from(EXIT_FAILED)
}

fn confirm(request: &LinkRequest) -> Result<bool> {
    let mut stdout = io::stdout();
    write!(
        stdout,
        "Link {} to {} as remote '{}' with commit message \"{}\"? [y/N] ",
        display_path(&request.local_path),
        request.remote,
        request.remote_name,
        request.commit_message
    )?;
    stdout.flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

fn display_path(path: &Path) -> String {
    path.canonicalize()
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}

fn exit_for(view: &LinkViewModel) -> ExitCode {
    if view.succeeded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_FAILED)
    }
}
