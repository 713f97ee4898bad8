//! bizdir Maintenance CLI
//!
//! Operator commands for the business directory's category catalog: schema
//! upgrade, order backfill, curated reordering, ad-hoc retagging and audits.

use anyhow::{bail, Context, Result};
use bizdir::catalog::{
    apply_explicit_order, audit_ordering, backfill_missing_order, ensure_order_column,
    list_active_categories, rename_and_retag, CatalogStore, ReorderOptions, Retag,
};
use bizdir::config::DatabaseConfig;
use bizdir::session::with_store;
use bizdir_maint::order_file::load_order_file;
use bizdir_maint::{matcher_from_args, report};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::process;

/// Slug sequence used by `apply-order` when none is given.
const DEFAULT_ORDER_FILE: &str = "config/category_order.toml";

#[derive(Parser)]
#[command(name = "bizdir-maint")]
#[command(about = "Category catalog maintenance for the business directory")]
#[command(version = "0.1.0")]
struct Cli {
    /// Database connection URL (overrides config file and environment)
    #[arg(long)]
    database_url: Option<String>,

    /// Catalog table name
    #[arg(long)]
    table: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet output (errors only)
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add the "order" column if it is missing
    EnsureOrderColumn,

    /// Give every category with an unset order its id as order
    BackfillOrder,

    /// Ensure the column, then backfill
    Migrate,

    /// Apply a curated sequence: the first slug gets order 1
    ApplyOrder {
        /// Slugs in display order (default: read from --file)
        slugs: Vec<String>,

        /// Read the sequence from a TOML (`slugs = [..]`) or plain-text file
        #[arg(long, conflicts_with = "slugs")]
        file: Option<PathBuf>,

        /// Renumber unlisted active categories after the listed ones
        #[arg(long)]
        complete: bool,

        /// All-or-nothing: roll back every write on the first failure
        #[arg(long)]
        atomic: bool,
    },

    /// Rename a category and replace its slug and icon
    Retag {
        /// Match by current slug
        #[arg(long)]
        match_slug: Option<String>,

        /// Match by id
        #[arg(long, conflicts_with_all = ["match_slug", "match_name"])]
        match_id: Option<i32>,

        /// Match by current display name; with --match-slug, name OR slug
        #[arg(long)]
        match_name: Option<String>,

        /// New display name
        #[arg(long)]
        name: String,

        /// New URL slug
        #[arg(long)]
        slug: String,

        /// New icon glyph
        #[arg(long)]
        icon: String,
    },

    /// List active categories in display order
    List {
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Report unset, duplicate and non-contiguous order values
    Audit,
}

fn main() {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    // Initialize logging
    if cli.quiet {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("error")).init();
    } else if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    let result = load_config(&cli).and_then(|config| run(&cli, &config));

    match result {
        Ok(true) => {
            if !cli.quiet {
                println!("{}", "✅ Success".green());
            }
            process::exit(0);
        }
        Ok(false) => {
            eprintln!("{}", "⚠️  Completed with failures".yellow());
            process::exit(1);
        }
        Err(e) => {
            eprintln!("{} {:#}", "❌ Error:".red(), e);
            process::exit(1);
        }
    }
}

fn load_config(cli: &Cli) -> Result<DatabaseConfig> {
    let mut config = DatabaseConfig::load_with_url(cli.database_url.as_deref())
        .context("loading configuration")?;
    if let Some(table) = &cli.table {
        config.table = table.clone();
    }
    Ok(config)
}

/// Dispatch one command; `Ok(false)` means it ran but recorded failures.
fn run(cli: &Cli, config: &DatabaseConfig) -> Result<bool> {
    match &cli.command {
        Commands::EnsureOrderColumn => handle_ensure(config),
        Commands::BackfillOrder => handle_backfill(config),
        Commands::Migrate => handle_migrate(config),
        Commands::ApplyOrder {
            slugs,
            file,
            complete,
            atomic,
        } => {
            let slugs = resolve_slugs(slugs, file.as_deref())?;
            let options = ReorderOptions {
                complete_reassignment: *complete,
                atomic: *atomic,
            };
            handle_apply_order(config, &slugs, options)
        }
        Commands::Retag {
            match_slug,
            match_id,
            match_name,
            name,
            slug,
            icon,
        } => {
            let Some(matcher) =
                matcher_from_args(*match_id, match_slug.clone(), match_name.clone())
            else {
                bail!("retag needs one of --match-slug, --match-id or --match-name");
            };
            let retag = Retag::new(name.as_str(), slug.as_str(), icon.as_str());
            let outcome = with_store(config, |store| rename_and_retag(store, &matcher, &retag))?;
            print_lines(report::retag_lines(&outcome));
            Ok(true)
        }
        Commands::List { json } => {
            let categories = with_store(config, |store| list_active_categories(store))?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&categories)?);
            } else {
                println!("\n📋 Active categories ({})\n", categories.len());
                print_lines(report::listing_lines(&categories));
            }
            Ok(true)
        }
        Commands::Audit => {
            let audit = with_store(config, |store| audit_ordering(store))?;
            println!("\n🔍 Ordering audit\n");
            print_lines(report::audit_lines(&audit));
            Ok(audit.is_clean())
        }
    }
}

fn resolve_slugs(slugs: &[String], file: Option<&std::path::Path>) -> Result<Vec<String>> {
    if !slugs.is_empty() {
        return Ok(slugs.to_vec());
    }
    let path = file.unwrap_or_else(|| std::path::Path::new(DEFAULT_ORDER_FILE));
    log::info!("reading slug sequence from {}", path.display());
    Ok(load_order_file(path)?)
}

fn handle_ensure(config: &DatabaseConfig) -> Result<bool> {
    let (table, outcome) = with_store(config, |store| {
        ensure_order_column(store).map(|outcome| (store.table().to_string(), outcome))
    })?;
    println!("{}", report::order_column_line(&table, outcome));
    Ok(true)
}

fn handle_backfill(config: &DatabaseConfig) -> Result<bool> {
    let written = with_store(config, |store| backfill_missing_order(store))?;
    print_lines(report::backfill_lines(&written));
    Ok(true)
}

fn handle_migrate(config: &DatabaseConfig) -> Result<bool> {
    let (table, outcome, written) = with_store(config, |store| {
        let outcome = ensure_order_column(store)?;
        let written = backfill_missing_order(store)?;
        Ok((store.table().to_string(), outcome, written))
    })?;
    println!("{}", report::order_column_line(&table, outcome));
    print_lines(report::backfill_lines(&written));
    Ok(true)
}

fn handle_apply_order(
    config: &DatabaseConfig,
    slugs: &[String],
    options: ReorderOptions,
) -> Result<bool> {
    println!("Applying order for {} slug(s)...", slugs.len());
    let outcome = with_store(config, |store| apply_explicit_order(store, slugs, options))?;
    print_lines(report::reorder_lines(&outcome));
    Ok(outcome.is_success())
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{}", line);
    }
}
