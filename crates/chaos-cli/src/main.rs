use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use chaos_cli::commands;
use chaos_cli::demos::build_app;
use chaos_core::{ChaosConfig, Environment};

#[derive(Parser, Debug)]
#[command(name = "chaos", version, about = "Serverless chaos experiment synthesizer")]
struct Cli {
    /// Configuration file. Defaults to ./chaos.yaml when it exists.
    #[arg(long, global = true, env = "CHAOS_CONFIG")]
    config: Option<PathBuf>,

    /// Account id to pin in the templates
    #[arg(long, global = true, env = "CDK_DEFAULT_ACCOUNT")]
    account: Option<String>,

    /// Region to pin in the templates
    #[arg(long, global = true, env = "CDK_DEFAULT_REGION")]
    region: Option<String>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write one CloudFormation template per stack plus the manifest.
    Synth {
        /// Output directory (overrides `output_dir` from the configuration)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Stacks to synthesize. All stacks when omitted.
        stacks: Vec<String>,
    },

    /// List the stacks of the app.
    List,

    /// Print the template of one stack.
    Show { stack: String },

    /// Lint the synthesized templates for least privilege.
    Check {
        /// Stacks to check. All stacks when omitted.
        stacks: Vec<String>,

        /// Fail on warnings as well as errors
        #[arg(long, default_value_t = false)]
        deny_warnings: bool,
    },
}

fn main() -> Result<()> {
    // stdout carries templates and reports; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config =
        ChaosConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    config.environment = config
        .environment
        .merged_with(&Environment::new(cli.account, cli.region));
    config.validate().context("Invalid configuration")?;

    let app = build_app(&config)?;

    match cli.cmd {
        Command::Synth { out, stacks } => {
            let out_dir = out.unwrap_or_else(|| config.output_dir.clone());
            commands::synth::run(&app, &out_dir, &stacks)?;
        }
        Command::List => commands::list::run(&app),
        Command::Show { stack } => commands::show::run(&app, &stack)?,
        Command::Check {
            stacks,
            deny_warnings,
        } => commands::check::run(&app, &stacks, deny_warnings)?,
    }

    Ok(())
}
