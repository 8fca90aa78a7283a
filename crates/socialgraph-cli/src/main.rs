//! Socialgraph CLI
//!
//! - `generate`: run the stock script over a resource directory and write the
//!   mutation stream as JSON lines
//! - `check`: load a resource directory and report template problems without
//!   generating anything

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use socialgraph_cli::{run, BatchLoader, JsonLinesSink, RunConfig};
use socialgraph_gen::OverridePolicy;
use socialgraph_resources::ResourceBundle;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "socialgraph")]
#[command(author, version, about = "Deterministic synthetic social-graph generator")]
struct Cli {
    /// Debug-level logging (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a dataset and write it as JSON lines.
    Generate {
        /// Resource directory (names, bios, organisations, conversations).
        #[arg(short, long, default_value = "resources")]
        resources: PathBuf,
        /// JSON run configuration (generator + script counts).
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Output file, one operation per line.
        #[arg(short, long, default_value = "socialgraph.jsonl")]
        out: PathBuf,
        /// Overrides the configured seed.
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, default_value_t = 50)]
        batch_size: usize,
        /// Fail instead of warning when an override breaks a soft invariant.
        #[arg(long)]
        strict: bool,
    },

    /// Validate a resource directory.
    Check {
        #[arg(short, long, default_value = "resources")]
        resources: PathBuf,
    },
}

fn init_tracing(verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.parse()?))
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<RunConfig> {
    let Some(path) = path else {
        return Ok(RunConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse config {}", path.display()))
}

fn cmd_generate(
    resources: &Path,
    config: Option<&Path>,
    out: &Path,
    seed: Option<u64>,
    batch_size: usize,
    strict: bool,
) -> Result<()> {
    let mut config = load_config(config)?;
    if let Some(seed) = seed {
        config.generator.seed = seed;
    }
    if strict {
        config.generator.override_policy = OverridePolicy::Strict;
    }

    let bundle = ResourceBundle::load(resources)?;
    let output = run(&config, &bundle)?;

    let file = File::create(out).with_context(|| format!("failed to create {}", out.display()))?;
    let mut loader = BatchLoader::new(JsonLinesSink::new(BufWriter::new(file)), batch_size)?;
    loader.load(&output.ops)?;
    let (sink, report) = loader.finish()?;

    eprintln!("{} {}", "wrote".green().bold(), out.display().to_string().bold());
    eprintln!("  seed:        {}", config.generator.seed);
    eprintln!("  operations:  {}", report.operations);
    eprintln!("  instances:   {}", report.instances);
    eprintln!("  commits:     {}", report.commits);
    let diagnostics = output.diagnostics.len().to_string();
    eprintln!(
        "  diagnostics: {}",
        if output.diagnostics.is_empty() {
            diagnostics.normal()
        } else {
            diagnostics.yellow()
        }
    );
    eprintln!("  sha256:      {}", sink.digest());
    Ok(())
}

fn cmd_check(resources: &Path) -> Result<()> {
    let bundle = ResourceBundle::load(resources)?;
    let mut problems = 0;
    for spec in &bundle.conversations {
        if let Err(offenders) = spec.template.validate() {
            problems += 1;
            eprintln!(
                "{} {}: mentions non-participants {}",
                "error".red().bold(),
                spec.template.reference,
                offenders.join(", ")
            );
        }
    }
    if problems > 0 {
        return Err(anyhow!("{problems} conversation template(s) failed validation"));
    }
    eprintln!(
        "{} {} bios, {} organisations, {} groups, {} conversations",
        "ok".green().bold(),
        bundle.bios.len(),
        bundle.organisations.len(),
        bundle.groups.len(),
        bundle.conversations.len()
    );
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    match cli.command {
        Commands::Generate {
            resources,
            config,
            out,
            seed,
            batch_size,
            strict,
        } => cmd_generate(&resources, config.as_deref(), &out, seed, batch_size, strict),
        Commands::Check { resources } => cmd_check(&resources),
    }
}
