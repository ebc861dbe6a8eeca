use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use dockr::config::{self, Config};
use dockr::exec::{self, Target};
use dockr::helpers::{BuildRequest, CopyRequest, CopySettings, build_image, copy_files};
use dockr::logging;
use dockr::process::OutputLine;
use dockr::run::{RunEvent, RunRequest, run_container};

/// Exit code used when an attached run hits its timeout, matching coreutils `timeout`.
const TIMEOUT_EXIT: u8 = 124;

#[derive(Debug, Parser)]
#[command(
    name = "dockr",
    version,
    about = "Build images, ship files, and run containers on local or remote Docker hosts"
)]
struct Cli {
    /// Log filter directive (e.g. `info`, `dockr=debug`). Overrides DOCKR_LOG.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Config file to use instead of `./.dockrc`.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build an image from a Dockerfile.
    Build {
        /// Path to the Dockerfile.
        #[arg(short = 'f', long)]
        file: PathBuf,

        /// Image tag, e.g. `dockr:1.2.3`.
        #[arg(short = 't', long)]
        tag: String,

        /// Build context directory.
        #[arg(default_value = ".")]
        context: PathBuf,

        /// Remote host whose daemon performs the build.
        #[arg(long)]
        target: Option<String>,
    },

    /// Copy files to a remote host.
    Copy {
        /// Remote host to copy to.
        #[arg(long)]
        target: String,

        /// Destination path on the remote host.
        #[arg(short = 'd', long)]
        destination: String,

        /// Local files or directories to copy.
        #[arg(required = true)]
        sources: Vec<PathBuf>,
    },

    /// Create a container, print its name, and start it attached.
    Run {
        /// Image reference, e.g. `dockr:1.2.3`.
        image: String,

        /// Argument passed to the container after the image.
        arg: Option<String>,

        /// Remote host to run on. Defaults to `target` from config, else local.
        #[arg(long)]
        target: Option<String>,

        /// Force local execution even if config names a target.
        #[arg(long, conflicts_with = "target")]
        local: bool,

        /// Extra `create` flags as one shell-quoted string, e.g. `--flags "--rm -e N=5"`.
        #[arg(long, allow_hyphen_values = true)]
        flags: Option<String>,
    },
}

fn main() -> ExitCode {
    match real_main() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("dockr: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn real_main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let cfg = match &cli.config {
        Some(path) => config::load_file(path)?,
        None => {
            let cwd = std::env::current_dir().context("cannot determine working directory")?;
            config::load(&cwd)?
        }
    };

    let env_level = std::env::var(logging::ENV_VAR).ok();
    let level = logging::resolve_level(
        cli.log_level.as_deref(),
        env_level.as_deref(),
        cfg.log_level.as_deref(),
    );
    logging::init(&level)?;

    match cli.command {
        Command::Build {
            file,
            tag,
            context,
            target,
        } => {
            let target = Target::from_option(target.as_deref());
            let executor = exec::select(&target, &cfg)?;
            let req = BuildRequest {
                dockerfile: file,
                tag,
                context,
            };
            build_image(executor.as_ref(), &req, &mut print_line)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Copy {
            target,
            destination,
            sources,
        } => {
            let settings = CopySettings::from_config(&cfg)?;
            let req = CopyRequest {
                target,
                sources,
                destination,
            };
            copy_files(&settings, &req, &mut print_line)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Run {
            image,
            arg,
            target,
            local,
            flags,
        } => run(&cfg, image, arg, target, local, flags),
    }
}

fn run(
    cfg: &Config,
    image: String,
    arg: Option<String>,
    target: Option<String>,
    local: bool,
    flags: Option<String>,
) -> Result<ExitCode> {
    let target = if local {
        Target::Local
    } else {
        Target::from_option(target.as_deref().or(cfg.target.as_deref()))
    };
    let flags = match flags {
        Some(raw) => config::split_flags(&raw).map_err(anyhow::Error::msg)?,
        None => cfg.default_flags().map_err(anyhow::Error::msg)?,
    };

    let mut req = RunRequest::new(image).with_flags(flags);
    req.workload_arg = arg;

    let executor = exec::select(&target, cfg)?;
    let outcome = run_container(executor.as_ref(), &req, &mut |event| match event {
        RunEvent::Created { .. } => {}
        RunEvent::Named { name } => {
            let mut out = std::io::stdout().lock();
            let _ = writeln!(out, "{name}");
            let _ = out.flush();
        }
        RunEvent::Output(line) => print_line(line),
    })?;

    if outcome.timed_out {
        eprintln!("dockr: attach to {} timed out", outcome.name);
        return Ok(ExitCode::from(TIMEOUT_EXIT));
    }
    Ok(match outcome.exit_code {
        Some(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        None => ExitCode::FAILURE,
    })
}

/// Relay process output to our own stdout/stderr.
fn print_line(line: OutputLine) {
    match line {
        OutputLine::Stdout(s) => {
            let mut out = std::io::stdout().lock();
            let _ = writeln!(out, "{s}");
        }
        OutputLine::Stderr(s) => eprintln!("{s}"),
        OutputLine::Done(_) => {}
    }
}
