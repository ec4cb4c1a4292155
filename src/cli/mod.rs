//! Command-line interface for postdb.
//!
//! Provides commands for building the post database, listing what it
//! holds, and showing the resolved configuration.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::catalog::Catalog;
use crate::config::{self, paths, Overrides, ResolvedConfig};
use crate::pipeline;

/// postdb - Markdown to JSON post database builder
#[derive(Parser, Debug)]
#[command(name = "postdb")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file (default: nearest .postdb/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Root of the Markdown source tree
    #[arg(long, global = true, env = "POSTDB_SOURCE")]
    pub source: Option<PathBuf>,

    /// Output directory for the JSON database
    #[arg(long, global = true, env = "POSTDB_DB")]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert new documents and regenerate every output file
    Build,

    /// List posts in the database, newest first
    List {
        /// Maximum number of posts to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Show resolved configuration
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let overrides = Overrides {
            config_file: self.config,
            source_dir: self.source,
            db_dir: self.db,
        };
        let config = config::load_config(&overrides)?;

        match self.command {
            Commands::Build => run_build(&config).await,
            Commands::List { limit } => list_posts(&config, limit).await,
            Commands::Config => show_config(&config),
        }
    }
}

/// Run the pipeline and print a one-line summary
async fn run_build(config: &ResolvedConfig) -> Result<()> {
    let summary = pipeline::build(config).await?;

    println!(
        "{} scanned, {} new, {} already processed, {} failed; {} posts on {} pages",
        summary.scanned,
        summary.created,
        summary.duplicates,
        summary.failed,
        summary.total_posts,
        summary.pages
    );

    Ok(())
}

/// List posts in the database
async fn list_posts(config: &ResolvedConfig, limit: usize) -> Result<()> {
    let catalog = Catalog::load(&paths::aggregate_file(&config.db_dir)).await;

    if catalog.is_empty() {
        println!("Database is empty. Use 'postdb build' to add posts.");
        return Ok(());
    }

    println!("{:<14} {:<12} {:<50}", "ID", "CREATED", "SLUG");
    println!("{}", "-".repeat(78));

    for record in catalog.list(Some(limit)) {
        let slug = if record.slug.is_empty() {
            "(no slug)"
        } else {
            record.slug.as_str()
        };
        println!(
            "{:<14} {:<12} {:<50}",
            record.id.short(),
            record.created_at.format("%Y-%m-%d").to_string(),
            slug
        );
    }

    println!("\nTotal: {} posts", catalog.len());

    Ok(())
}

/// Show resolved configuration
fn show_config(cfg: &ResolvedConfig) -> Result<()> {
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Paths:");
    println!("  Source:    {}", cfg.source_dir.display());
    println!("  Database:  {}", cfg.db_dir.display());
    println!("  Aggregate: {}", paths::aggregate_file(&cfg.db_dir).display());
    println!("  Assets:    {}", paths::assets_dir(&cfg.db_dir).display());
    println!();
    println!("Build:");
    println!("  Extension:      .{}", cfg.build.extension);
    println!("  Posts per page: {}", cfg.build.posts_per_page);

    Ok(())
}
