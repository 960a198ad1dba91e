//! CLI binary for autopojo: generate value classes from a declaration manifest.

use anyhow::{Context, Result};
use autopojo_core::config::GeneratorConfig;
use autopojo_core::model::DeclarationKind;
use autopojo_core::schema;
use autopojo_gen::{FsEmitter, MemoryEmitter, NameResolver, RoundReport, TaskOrchestrator};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "autopojo", about = "Immutable value class generator")]
struct Cli {
    /// Project root directory (defaults to current directory)
    #[arg(short, long, global = true)]
    project: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a generation round over every marked declaration
    Generate {
        /// Declaration manifest (defaults to .autopojo/manifest.json)
        #[arg(short, long)]
        manifest: Option<PathBuf>,

        /// Output directory (overrides output.dir from config)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Render in memory and list what would be written
        #[arg(long)]
        dry_run: bool,

        /// Print the round report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the generated name of every interface in the manifest
    Names {
        /// Declaration manifest (defaults to .autopojo/manifest.json)
        #[arg(short, long)]
        manifest: Option<PathBuf>,
    },
}

fn get_project_root(cli: &Cli) -> Result<PathBuf> {
    match &cli.project {
        Some(p) => Ok(p.clone()),
        None => std::env::current_dir().context("failed to get current directory"),
    }
}

fn manifest_path(project_root: &Path, manifest: Option<PathBuf>) -> PathBuf {
    manifest.unwrap_or_else(|| project_root.join(".autopojo").join("manifest.json"))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let project_root = get_project_root(&cli)?;

    match cli.command {
        Commands::Generate {
            manifest,
            out,
            dry_run,
            json,
        } => cmd_generate(
            &project_root,
            &manifest_path(&project_root, manifest),
            out,
            dry_run,
            json,
        ),
        Commands::Names { manifest } => {
            cmd_names(&project_root, &manifest_path(&project_root, manifest))
        }
    }
}

fn cmd_generate(
    project_root: &Path,
    manifest: &Path,
    out: Option<PathBuf>,
    dry_run: bool,
    json: bool,
) -> Result<()> {
    let config = GeneratorConfig::load(project_root).context("failed to load config")?;
    let repo = schema::load(manifest)?.into_repository()?;
    let out_dir = out.unwrap_or_else(|| config.output_dir(project_root));
    tracing::info!(
        manifest = %manifest.display(),
        declarations = repo.len(),
        out = %out_dir.display(),
        dry_run,
        "loaded declaration manifest"
    );

    let orchestrator = TaskOrchestrator::new(&repo, config);
    let report = if dry_run {
        let memory = MemoryEmitter::new();
        let report = orchestrator.run(&memory);
        for unit in memory.units() {
            println!("would write {}", out_dir.join(&unit.path).display());
        }
        report
    } else {
        orchestrator.run(&FsEmitter::new(&out_dir))
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }

    if !report.is_success() {
        anyhow::bail!("generation failed with {} error(s)", report.errors.len());
    }
    Ok(())
}

fn print_summary(report: &RoundReport) {
    for name in &report.emitted {
        println!("generated {}", name);
    }
    for error in &report.errors {
        eprintln!("{}", error);
    }
    println!(
        "Emitted: {}, nested: {}, errors: {}",
        report.emitted.len(),
        report.filtered.len(),
        report.errors.len()
    );
}

fn cmd_names(project_root: &Path, manifest: &Path) -> Result<()> {
    let config = GeneratorConfig::load(project_root).context("failed to load config")?;
    let repo = schema::load(manifest)?.into_repository()?;
    tracing::debug!(manifest = %manifest.display(), declarations = repo.len(), "resolving names");
    let names = NameResolver::with_suffix(&repo, config.naming.suffix);

    for decl in repo.iter().filter(|d| d.kind == DeclarationKind::Interface) {
        match names.resolve_lenient(decl) {
            Some(name) => println!("{} -> {}", decl.qualified_name(), name),
            None => println!("{} -> (not generated)", decl.qualified_name()),
        }
    }
    Ok(())
}
