//! caml - remix, index, graph and validate CAML adventure content.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use caml_content::{DocumentFormat, DuplicatePolicy};
use caml_remix::{validate, Catalog, GateGraph, RemixConfig, RemixReport, Remixer};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "caml=info,caml_remix=info,caml_content=info";
const VERBOSE_LOG_FILTER: &str = "caml=debug,caml_remix=debug,caml_content=debug";

#[derive(Parser)]
#[command(name = "caml")]
#[command(about = "Remix and inspect CAML adventure content", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a remix pack from one or more content roots
    Remix(RemixArgs),

    /// Write index.json cataloguing every entity under a root
    Index {
        /// Content root
        root: PathBuf,
    },

    /// Write graph.json linking encounters to their gates and outcomes
    Graph {
        /// Content root
        root: PathBuf,
    },

    /// Check the structure of every document under a root
    Validate {
        /// Content root
        root: PathBuf,
    },
}

#[derive(Args)]
struct RemixArgs {
    /// Content roots, loaded in order
    roots: Vec<PathBuf>,

    /// Output pack directory (replaced)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Seed for target selection
    #[arg(long)]
    seed: Option<u64>,

    /// Number of target encounters
    #[arg(long)]
    pick: Option<usize>,

    /// Output document format
    #[arg(long, value_enum)]
    format: Option<FormatArg>,

    /// Fail on duplicate ids and unparsable files
    #[arg(long)]
    strict: bool,

    /// Read settings from a TOML file; flags override it
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Yaml,
    Json,
}

impl From<FormatArg> for DocumentFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Yaml => DocumentFormat::Yaml,
            FormatArg::Json => DocumentFormat::Json,
        }
    }
}

impl RemixArgs {
    fn into_config(self) -> Result<RemixConfig> {
        let mut config = match &self.config {
            Some(path) => RemixConfig::from_file(path)
                .with_context(|| format!("failed to load {}", path.display()))?,
            None => RemixConfig::default(),
        };

        if !self.roots.is_empty() {
            config.roots = self.roots;
        }
        if let Some(out) = self.out {
            config.out = out;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(pick) = self.pick {
            config.pick = pick;
        }
        if let Some(format) = self.format {
            config.format = format.into();
        }
        if self.strict {
            config.duplicates = DuplicatePolicy::Reject;
        }

        if config.roots.is_empty() {
            bail!("no content roots given");
        }
        Ok(config)
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Remix(args) => {
            let config = args.into_config()?;
            let report = Remixer::new(config.clone())
                .run()
                .context("remix failed")?;
            print_summary(&config, &report);
        }
        Commands::Index { root } => {
            let catalog = Catalog::build(&root)
                .with_context(|| format!("failed to catalog {}", root.display()))?;
            let path = catalog.write(&root)?;
            println!("Wrote {} with {} entries", path.display(), catalog.count);
        }
        Commands::Graph { root } => {
            let graph = GateGraph::build(&root)
                .with_context(|| format!("failed to graph {}", root.display()))?;
            let path = graph.write(&root)?;
            println!(
                "Wrote {} with {} nodes, {} links",
                path.display(),
                graph.nodes.len(),
                graph.links.len()
            );
        }
        Commands::Validate { root } => {
            let report = validate(&root)
                .with_context(|| format!("failed to validate {}", root.display()))?;
            for issue in &report.issues {
                println!("{}", issue);
            }
            let ok = report.ok();
            println!("Validation: {}", if ok { "OK" } else { "FAILED" });
            if !ok {
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        VERBOSE_LOG_FILTER
    } else {
        DEFAULT_LOG_FILTER
    };

    // stdout carries command output; logs go to stderr.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn print_summary(config: &RemixConfig, report: &RemixReport) {
    let result = &report.plan.result;
    println!("Remix written to: {}", config.out.display());
    println!(
        "Targets: {}",
        join(report.plan.targets.iter().map(|id| id.as_str()))
    );
    println!("Included entities: {}", result.included.len());
    println!(
        "Starting tags: {}",
        join(result.starting_tags.iter().map(String::as_str))
    );
    println!(
        "Starting items: {}",
        join(result.starting_items.iter().map(String::as_str))
    );
}

fn join<'a>(items: impl Iterator<Item = &'a str>) -> String {
    let items: Vec<&str> = items.collect();
    if items.is_empty() {
        "(none)".to_string()
    } else {
        items.join(", ")
    }
}
