//! `synth` entry point.
//!
//! This binary is the composition root. Responsibilities:
//!
//! 1. **Parse configuration** — load the TOML file named by `--config` into an
//!    immutable [`config::AppConfig`].
//! 2. **Wire observability** — install a `tracing-subscriber` writing pretty
//!    or JSON lines to stderr.
//! 3. **Run the command** — build subject matchers, the trust-policy document,
//!    or the full manifest, and write the result to stdout or a file.
//!
//! Any validation failure stops the run before output is written and exits
//! with status 1.

mod cli;
mod config;
mod logging;

use std::io::Write;
use std::process::ExitCode;

use anyhow::{Context, Result};
use assembly::stacks::declare_pipeline_stack;
use assembly::{synth, App, Expr, FederationSettings, SynthMetadata, TrustPolicyDocument};
use clap::Parser;
use tracing::{info, info_span};
use trust::TrustPolicyBuilder;

use crate::cli::{Cli, Commands};
use crate::config::{load_config, AppConfig};
use crate::logging::{init_logging, LogConfig};

const PIPELINE_STACK_ID: &str = "pipeline";

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(LogConfig {
        format: cli.log_format,
        verbose: cli.verbose,
    }) {
        eprintln!("error: {e:#}");
        return ExitCode::FAILURE;
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    let federation = FederationSettings::default();

    match cli.command {
        Commands::Subjects { json } => subjects(&config, json),
        Commands::Policy => policy(&config, &federation),
        Commands::Manifest { out, deterministic } => {
            let metadata = (!deterministic).then(SynthMetadata::now);
            let rendered = manifest(&config, federation, metadata)?;
            match out {
                Some(path) => {
                    std::fs::write(&path, rendered)
                        .with_context(|| format!("writing {}", path.display()))?;
                    info!(path = %path.display(), "Wrote manifest");
                    Ok(())
                }
                None => print_stdout(&rendered),
            }
        }
    }
}

fn subjects(config: &AppConfig, json: bool) -> Result<()> {
    let matchers = TrustPolicyBuilder::build(&config.trusted_repositories)
        .context("invalid trusted_repositories")?;

    let rendered = if json {
        serde_json::to_string_pretty(&matchers)?
    } else {
        matchers
            .iter()
            .map(|m| m.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    };
    print_stdout(&rendered)
}

fn policy(config: &AppConfig, federation: &FederationSettings) -> Result<()> {
    let matchers = TrustPolicyBuilder::build(&config.trusted_repositories)
        .context("invalid trusted_repositories")?;
    let provider = Expr::literal(config.provider_arn(federation));

    let document = TrustPolicyDocument::new(provider, matchers, federation);
    print_stdout(&serde_json::to_string_pretty(&document.to_value())?)
}

fn manifest(
    config: &AppConfig,
    federation: FederationSettings,
    metadata: Option<SynthMetadata>,
) -> Result<String> {
    let run_id = metadata
        .map(|m| m.run_id.to_string())
        .unwrap_or_else(|| "deterministic".to_string());
    let _span = info_span!("synth", run_id = %run_id).entered();

    let props = config.pipeline_stack_props(federation)?;
    let mut app = App::new();
    declare_pipeline_stack(&mut app, PIPELINE_STACK_ID, &props)
        .context("declaring pipeline stack")?;

    let manifest = synth(&app, metadata)?;
    Ok(serde_json::to_string_pretty(&manifest)?)
}

fn print_stdout(rendered: &str) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{rendered}").context("writing to stdout")?;
    Ok(())
}
