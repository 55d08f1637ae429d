pub mod config;
pub mod model;
pub mod remote;
pub mod search;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use colored::Colorize;
use tokio::io::AsyncBufReadExt;

use config::{SearchConfig, Transport, load_catalog};
use model::GrantRecord;
use remote::rest::RestSearchClient;
use remote::stream::StreamingSearchClient;
use remote::{EnvAuth, OfflineRemote, RemoteSearch};
use search::normalize::NormalizedQuery;
use search::session::{self, SessionConfig, SessionUpdate};
use search::{local, merge};

fn long_version() -> String {
    format!(
        "{} (built {})",
        env!("CARGO_PKG_VERSION"),
        option_env!("VERGEN_BUILD_TIMESTAMP").unwrap_or("unknown")
    )
}

/// Command-line interface.
#[derive(Parser, Debug)]
#[command(
    name = "nofo-search",
    version,
    long_version = long_version(),
    about = "Search and rank grant funding notices (NOFOs)"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// One-shot search: local filter plus an optional remote ranking pass
    Search {
        /// Query text
        query: String,

        /// Path to the catalog JSON file (array of grant records)
        #[arg(long, env = "NOFOS_CATALOG")]
        catalog: PathBuf,

        /// AI search backend base URL; omit for offline (local-only) mode
        #[arg(long, env = "NOFOS_ENDPOINT")]
        endpoint: Option<String>,

        /// Remote transport variant
        #[arg(long, value_enum, default_value_t = Transport::Rest)]
        transport: Transport,

        /// Emit the merged list as JSON instead of a table
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Interactive session: reads queries line by line from stdin
    Live {
        /// Path to the catalog JSON file (array of grant records)
        #[arg(long, env = "NOFOS_CATALOG")]
        catalog: PathBuf,

        /// AI search backend base URL; omit for offline (local-only) mode
        #[arg(long, env = "NOFOS_ENDPOINT")]
        endpoint: Option<String>,

        /// Remote transport variant
        #[arg(long, value_enum, default_value_t = Transport::Rest)]
        transport: Transport,
    },
    /// Generate shell completions to stdout
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate man page to stdout
    Man,
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Search {
            query,
            catalog,
            endpoint,
            transport,
            json,
        } => {
            let cfg = SearchConfig {
                endpoint,
                transport,
                ..Default::default()
            }
            .with_env_fallback();
            run_search(&query, &catalog, &cfg, json).await
        }
        Commands::Live {
            catalog,
            endpoint,
            transport,
        } => {
            let cfg = SearchConfig {
                endpoint,
                transport,
                ..Default::default()
            }
            .with_env_fallback();
            run_live(&catalog, &cfg).await
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "nofos", &mut std::io::stdout());
            Ok(())
        }
        Commands::Man => {
            let cmd = Cli::command();
            let man = clap_mangen::Man::new(cmd);
            let mut out = std::io::stdout();
            man.render(&mut out)?;
            Ok(())
        }
    }
}

fn build_remote(cfg: &SearchConfig) -> Result<Arc<dyn RemoteSearch>> {
    let Some(endpoint) = &cfg.endpoint else {
        return Ok(Arc::new(OfflineRemote));
    };
    match cfg.transport {
        Transport::Rest => {
            let client = RestSearchClient::new(endpoint.clone(), Arc::new(EnvAuth))
                .context("building REST search client")?
                .with_identity(cfg.user_id.clone(), cfg.session_id.clone());
            Ok(Arc::new(client))
        }
        Transport::Stream => {
            let client = StreamingSearchClient::new(endpoint.clone(), Arc::new(EnvAuth))
                .with_identity(cfg.user_id.clone(), cfg.session_id.clone());
            Ok(Arc::new(client))
        }
    }
}

async fn run_search(raw: &str, catalog_path: &PathBuf, cfg: &SearchConfig, json: bool) -> Result<()> {
    let catalog = load_catalog(catalog_path)?;
    let query = NormalizedQuery::new(raw);

    let merged = if cfg.endpoint.is_some() && query.meets_min_len() {
        let remote = build_remote(cfg)?;
        match remote.search(&query).await {
            Ok(response) if !response.results.is_empty() => {
                tracing::info!(
                    results = response.results.len(),
                    search_time_ms = response.search_time_ms,
                    "remote ranking applied"
                );
                merge::merge(&catalog, Some(&response.results))
            }
            Ok(_) => merge::merge(&local::filter(&catalog, &query), None),
            Err(err) => {
                eprintln!("{} {err}", "error:".red().bold());
                return Ok(());
            }
        }
    } else {
        merge::merge(&local::filter(&catalog, &query), None)
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&merged)?);
    } else {
        print_records(&merged);
    }
    Ok(())
}

async fn run_live(catalog_path: &PathBuf, cfg: &SearchConfig) -> Result<()> {
    let catalog = Arc::new(load_catalog(catalog_path)?);
    let remote = build_remote(cfg)?;
    let (handle, mut updates) = session::spawn(catalog, remote, SessionConfig::from_env());

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line.context("reading stdin")? {
                Some(line) if line.trim().is_empty() => handle.clear(),
                Some(line) => handle.input(&line),
                None => break,
            },
            Some(update) = updates.recv() => print_update(&update),
        }
    }

    handle.shutdown();
    // Give an in-flight resolution a moment to land before exiting.
    while let Ok(Some(update)) = tokio::time::timeout(Duration::from_millis(1500), updates.recv()).await
    {
        print_update(&update);
    }
    Ok(())
}

fn print_update(update: &SessionUpdate) {
    match update {
        SessionUpdate::Results(records) => print_records(records),
        SessionUpdate::Searching(true) => eprintln!("{}", "searching…".dimmed()),
        SessionUpdate::Searching(false) => {}
        SessionUpdate::Error(message) => eprintln!("{} {message}", "error:".red().bold()),
    }
}

fn print_records(records: &[GrantRecord]) {
    if records.is_empty() {
        println!("{}", "no matching grants".dimmed());
        return;
    }
    for rec in records {
        let pin = if rec.is_pinned {
            "*".yellow().to_string()
        } else {
            " ".to_string()
        };
        let agency = rec.agency.as_deref().unwrap_or("-");
        println!("{pin} {:<48} {agency}", rec.name);
    }
}
