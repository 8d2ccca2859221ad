//! DroneClear command line interface.
//!
//! # Usage
//!
//! ```bash
//! # Category counts from the backend
//! droneclear categories
//!
//! # Check a saved slot map against an offline catalog
//! droneclear --catalog parts.json check --build build.json
//!
//! # Rank propellers for a build, 5" class
//! droneclear --catalog parts.json candidates --build build.json --slot propellers --class 5inch
//!
//! # Saved builds on the backend
//! droneclear saved list
//! ```

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use droneclear::api::{ApiClient, BuildStore, CatalogSource};
use droneclear::build::{relations_from_json, BuildState, RehydrateReport};
use droneclear::catalog::{
    similar_components, ComponentQuery, ComponentRegistry, Slot, SortOrder, StaticCatalog,
    DEFAULT_SIMILAR_LIMIT,
};
use droneclear::config::{resolve_config, AppConfig};
use droneclear::rules::Evaluator;
use droneclear::wizard::{infer_frame_class, partition_candidates, ClassFilter};

#[derive(Parser)]
#[command(name = "droneclear")]
#[command(version, about = "Drone build compatibility checker")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (overrides DRONECLEAR_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Read components from a catalog JSON file instead of the backend
    #[arg(long, global = true, conflicts_with = "api")]
    catalog: Option<PathBuf>,

    /// Backend base URL (overrides the configured one)
    #[arg(long, global = true)]
    api: Option<String>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List categories with component counts
    Categories,

    /// Evaluate a build file (JSON object of category -> pid)
    Check {
        #[arg(short, long)]
        build: PathBuf,
    },

    /// Rank the candidates for one slot against a build
    Candidates {
        #[arg(short, long)]
        build: Option<PathBuf>,

        #[arg(short, long, value_parser = parse_slot)]
        slot: Slot,

        /// Size class for frames: all, micro, 3inch, 5inch, 7inch, heavy
        #[arg(long, default_value = "all", value_parser = parse_class)]
        class: ClassFilter,

        #[arg(long)]
        search: Option<String>,

        /// default, name-asc, name-desc, weight-asc, weight-desc, price-asc, price-desc
        #[arg(long, default_value = "default")]
        sort: SortOrder,
    },

    /// Show the inferred size class of every frame
    Classify,

    /// Find parts similar to one component
    Similar {
        #[arg(short, long, value_parser = parse_slot)]
        slot: Slot,

        #[arg(short, long)]
        pid: String,

        #[arg(long, default_value_t = DEFAULT_SIMILAR_LIMIT)]
        limit: usize,
    },

    /// Manage saved builds on the backend
    Saved {
        #[command(subcommand)]
        action: SavedAction,
    },
}

#[derive(Subcommand)]
enum SavedAction {
    List,
    Show { pid: String },
    Delete { pid: String },
}

fn parse_slot(s: &str) -> std::result::Result<Slot, String> {
    Slot::from_slug(s).ok_or_else(|| format!("unknown category '{}'", s))
}

fn parse_class(s: &str) -> std::result::Result<ClassFilter, String> {
    ClassFilter::from_id(s).ok_or_else(|| format!("unknown drone class '{}'", s))
}

// =============================================================================
// MAIN
// =============================================================================

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    droneclear::init_tracing();
    let cli = Cli::parse();

    let mut config = resolve_config(cli.config.as_deref())?;
    if let Some(url) = &cli.api {
        config.api.base_url = url.clone();
        config.validate()?;
    }

    let source = catalog_source(&cli, &config)?;
    let evaluator = Evaluator::new();
    let mut registry = ComponentRegistry::new();

    match cli.command {
        Commands::Categories => {
            let categories = source.list_categories().await?;
            if cli.json {
                return print_json(&categories);
            }
            for category in categories {
                println!("{:<22} {:<24} {}", category.slug, category.name, category.count);
            }
        }

        Commands::Check { ref build } => {
            let (build, report) = load_build_file(build, &mut registry, source.as_ref()).await?;
            let warnings = evaluator.evaluate(&build);

            if cli.json {
                return print_json(&serde_json::json!({
                    "report": report,
                    "aggregates": build.aggregates(),
                    "warnings": warnings,
                }));
            }

            print_report(&report);
            for (slot, component) in build.iter() {
                println!("{:<22} {} ({})", slot, component.name, component.pid);
            }
            let totals = build.aggregates();
            println!(
                "\n{} parts, {:.1} g, ${:.2}",
                totals.filled_count, totals.total_weight_g, totals.total_cost
            );
            if warnings.is_empty() {
                println!("No compatibility issues.");
            }
            for w in &warnings {
                println!("[{}] {}: {}", w.severity, w.title, w.message);
            }
        }

        Commands::Candidates {
            ref build,
            slot,
            class,
            ref search,
            sort,
        } => {
            let build = match build {
                Some(path) => {
                    let (build, report) = load_build_file(path, &mut registry, source.as_ref()).await?;
                    print_report(&report);
                    build
                }
                None => BuildState::new(),
            };

            let query = ComponentQuery {
                search: search.clone(),
                sort,
                ..ComponentQuery::default()
            };
            let pool = query.apply(registry.ensure_category(source.as_ref(), slot).await?);
            let partition = partition_candidates(slot, class, &build, &pool, &evaluator);

            if cli.json {
                return print_json(&partition);
            }
            for (label, list) in [
                ("Compatible", &partition.compatible),
                ("Caution", &partition.caution),
                ("Incompatible", &partition.incompatible),
            ] {
                println!("{} ({})", label, list.len());
                for candidate in list {
                    println!("  {} ({})", candidate.component.name, candidate.component.pid);
                    for w in &candidate.warnings {
                        println!("    [{}] {}", w.severity, w.title);
                    }
                }
            }
        }

        Commands::Classify => {
            let frames = registry.ensure_category(source.as_ref(), Slot::Frames).await?;
            let classes: Vec<_> = frames
                .iter()
                .map(|frame| (frame.pid.clone(), frame.name.clone(), infer_frame_class(frame)))
                .collect();
            if cli.json {
                return print_json(&classes);
            }
            for (pid, name, class) in classes {
                println!("{:<16} {:<32} {}", pid, name, class.label());
            }
        }

        Commands::Similar { slot, ref pid, limit } => {
            let pool = registry.ensure_category(source.as_ref(), slot).await?;
            let Some(target) = pool.iter().find(|c| c.pid == *pid).cloned() else {
                bail!("No component {} in {}", pid, slot);
            };
            let similar = similar_components(&target, pool, limit);
            if cli.json {
                return print_json(&similar);
            }
            for component in similar {
                println!("{:<16} {} ({})", component.pid, component.name, component.manufacturer);
            }
        }

        Commands::Saved { ref action } => {
            if cli.catalog.is_some() {
                bail!("Saved builds live on the backend; drop --catalog");
            }
            let store = ApiClient::new(&config.api)?;
            run_saved(action, &store, cli.json).await?;
        }
    }

    Ok(())
}

async fn run_saved(action: &SavedAction, store: &dyn BuildStore, json: bool) -> Result<()> {
    match action {
        SavedAction::List => {
            let builds = store.list_saved_builds().await?;
            if json {
                return print_json(&builds);
            }
            for build in builds {
                println!("{:<20} {:<32} {} parts", build.pid, build.name, build.relations.len());
            }
        }
        SavedAction::Show { pid } => {
            let build = store.get_saved_build(pid).await?;
            if json {
                return print_json(&build);
            }
            println!("{} ({})", build.name, build.pid);
            if !build.description.is_empty() {
                println!("{}", build.description);
            }
            for (slug, component) in &build.relations {
                println!("  {:<22} {}", slug, component);
            }
        }
        SavedAction::Delete { pid } => {
            store.delete_saved_build(pid).await?;
            println!("Deleted {}", pid);
        }
    }
    Ok(())
}

fn catalog_source(cli: &Cli, config: &AppConfig) -> Result<Box<dyn CatalogSource>> {
    match &cli.catalog {
        Some(path) => Ok(Box::new(StaticCatalog::from_file(path)?)),
        None => Ok(Box::new(ApiClient::new(&config.api)?)),
    }
}

/// Read a JSON slot map, or a saved build record with a `relations` map.
async fn load_build_file(
    path: &Path,
    registry: &mut ComponentRegistry,
    source: &dyn CatalogSource,
) -> Result<(BuildState, RehydrateReport)> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read build {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("Invalid build JSON in {}", path.display()))?;
    let relations = relations_from_json(value)
        .with_context(|| format!("{} must map categories to component ids", path.display()))?;

    Ok(BuildState::rehydrate(&relations, registry, source).await?)
}

fn print_report(report: &RehydrateReport) {
    for dropped in &report.dropped {
        eprintln!("warning: dropped {} -> {}", dropped.slot, dropped.pid);
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
