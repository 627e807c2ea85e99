//! Application orchestrator.
//! Parses arguments, initializes logging, installs the interrupt handler, runs
//! the reorganize pipeline and maps the outcome to a process exit status.

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use std::process::ExitCode;
use tracing::{debug, error, warn};

use reorganize::cli;
use reorganize::output as out;
use reorganize::{shutdown, Config, ReorgError, RunSummary};

use crate::logging::init_tracing;

const EXIT_FAILURE: u8 = 1;

/// Run the CLI application.
pub fn run() -> ExitCode {
    let args = match cli::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::from(EXIT_FAILURE),
            };
        }
    };

    if args.help {
        out::print_user(&cli::usage());
        return ExitCode::from(EXIT_FAILURE);
    }

    let Some(cfg) = args.to_config() else {
        out::print_error("missing required argument <SOURCE>");
        eprintln!("{}", cli::usage());
        return ExitCode::from(EXIT_FAILURE);
    };

    let _guard = match init_tracing(cfg.log_level, cfg.log_file.as_deref(), cfg.json) {
        Ok(guard) => guard,
        Err(e) => {
            out::print_error(&format!("Failed to initialize logging: {e}"));
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    if let Err(e) = ctrlc::set_handler(|| {
        shutdown::request();
        out::print_warn("Received interrupt; finishing the current item, then stopping...");
    }) {
        warn!(error = %e, "Could not install interrupt handler");
    }

    debug!(?args, "Starting reorganize");
    // With --json, stdout is the summary object and nothing else.
    if cfg.dry_run && !cfg.json {
        out::print_info("Dry-run: nothing will be changed");
    }

    match execute(&cfg) {
        Ok(summary) => {
            print_summary(&summary, cfg.json);
            if summary.succeeded() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(EXIT_FAILURE)
            }
        }
        Err(e) => {
            log_failure(&e);
            out::print_error(&format!("{e:#}"));
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

fn execute(cfg: &Config) -> Result<RunSummary> {
    reorganize::reorganize(cfg).with_context(|| format!("reorganize '{}'", cfg.source.display()))
}

fn log_failure(e: &anyhow::Error) {
    let Some(re) = e.downcast_ref::<ReorgError>() else {
        error!(error = ?e, "Reorganize failed");
        return;
    };
    let (code, kind) = (re.code(), re.kind());
    match re {
        ReorgError::PathNotFound { role, path } | ReorgError::NotADirectory { role, path } => {
            error!(code, kind, role = *role, path = %path.display(), "Invalid root directory")
        }
        ReorgError::PermissionDenied { path, context } => {
            error!(code, kind, path = %path.display(), %context, "Permission denied")
        }
        ReorgError::SpaceDeclined {
            required,
            available,
            target,
        } => {
            error!(code, kind, required = *required, available = *available, target = %target.display(), "Aborted before any change")
        }
        ReorgError::InvalidConfig(msg) => error!(code, kind, %msg, "Invalid configuration"),
        _ => error!(code, kind, error = %re, "Reorganize failed"),
    }
}

fn print_summary(summary: &RunSummary, json: bool) {
    if json {
        match serde_json::to_string_pretty(summary) {
            Ok(s) => out::print_user(&s),
            Err(e) => out::print_error(&format!("Failed to serialize summary: {e}")),
        }
        return;
    }
    let mut lines = summary.render_text().into_iter();
    if let Some(first) = lines.next() {
        out::print_user(&first);
    }
    for line in lines {
        out::print_warn(&line);
    }
}
