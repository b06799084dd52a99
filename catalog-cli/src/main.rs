//! Catalog CLI
//!
//! `catalog serve-rest` runs the REST API, `catalog seed` loads demo data.
//! Settings come from `config/config.toml`, `.env` and `CATALOG__*`
//! environment variables; flags override them.

use anyhow::{anyhow, Context};
use catalog::schema::{create_schema, reset_schema};
use catalog::seed::{self, DEFAULT_PRODUCT_COUNT};
use catalog::{ApplicationConfig, CatalogService, DbPool, Repositories, Settings};
use clap::{Parser, Subcommand};
use std::fs::OpenOptions;
use std::process;

#[derive(Parser)]
#[command(name = "catalog")]
#[command(about = "E-commerce catalog backend")]
#[command(version = "0.1.0")]
struct Cli {
    /// Database connection URL (overrides the configured database)
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet output (errors only)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the REST server
    ServeRest {
        /// Listen address (default: app.server_address)
        #[arg(long)]
        address: Option<String>,

        /// Keep all data in process memory instead of PostgreSQL
        #[arg(long)]
        in_memory: bool,
    },

    /// Create the schema and load demo data
    Seed {
        /// Keep existing tables and rows instead of recreating the schema
        #[arg(long)]
        keep_existing: bool,

        /// Number of products to create
        #[arg(long, default_value_t = DEFAULT_PRODUCT_COUNT)]
        products: usize,
    },
}

fn init_logging(cli: &Cli, app: &ApplicationConfig) -> anyhow::Result<()> {
    let level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level));

    if app.is_logging_to_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&app.log_file_path)
            .with_context(|| format!("cannot open log file {}", app.log_file_path))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    builder.init();
    Ok(())
}

fn main() {
    // .env is optional
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let mut settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            process::exit(1);
        }
    };
    if let Some(url) = cli.database_url.clone() {
        settings.database.url = Some(url);
    }

    if let Err(e) = init_logging(&cli, &settings.app) {
        eprintln!("Error initialising logging: {:#}", e);
        process::exit(1);
    }

    settings.app.configure_runtime();

    let result = match cli.command {
        Commands::ServeRest { address, in_memory } => serve_rest(&settings, address, in_memory),
        Commands::Seed {
            keep_existing,
            products,
        } => handle_seed(&settings, keep_existing, products),
    };

    if let Err(e) = result {
        log::error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn serve_rest(settings: &Settings, address: Option<String>, in_memory: bool) -> anyhow::Result<()> {
    log::info!("starting in {} mode", settings.app.env);

    let repos = if in_memory {
        log::warn!("using the in-memory store; data is lost on exit");
        Repositories::in_memory()
    } else {
        let pool = DbPool::new(&settings.database).context("cannot create the connection pool")?;
        let conn = pool.get().context("cannot check out a connection")?;
        create_schema(&conn).context("cannot create the schema")?;
        drop(conn);
        Repositories::postgres(pool)
    };

    let address = address.unwrap_or_else(|| settings.app.server_address.clone());
    let server = catalog::http::start(&address, CatalogService::new(repos))
        .with_context(|| format!("cannot start the server on {address}"))?;
    server
        .join()
        .map_err(|e| anyhow!("server stopped unexpectedly: {:?}", e))
}

fn handle_seed(settings: &Settings, keep_existing: bool, products: usize) -> anyhow::Result<()> {
    let pool = DbPool::new(&settings.database).context("cannot create the connection pool")?;
    {
        let conn = pool.get().context("cannot check out a connection")?;
        if keep_existing {
            create_schema(&conn)?;
        } else {
            reset_schema(&conn)?;
        }
    }

    let service = CatalogService::new(Repositories::postgres(pool));
    let summary = seed::seed(&service, products).context("seeding failed")?;

    log::info!(
        "seeded brand {}, {} categories, supplier {}, {} products",
        summary.brand_id,
        summary.category_ids.len(),
        summary.supplier_id,
        summary.product_ids.len()
    );
    Ok(())
}
