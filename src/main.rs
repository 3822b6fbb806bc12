use anyhow::{Context, Result};
use barrierlog::{
    aggregate::MultiSelect,
    config::Config,
    export,
    fetch::FormsClient,
    table::{CsvTableStore, Repository},
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

/// Barrier report intake: fetch, normalize and summarize form submissions.
#[derive(Parser, Debug)]
#[command(name = "barrierlog", version)]
struct Args {
    /// YAML config file
    #[arg(short, long, global = true, env = "BARRIER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Re-fetch every submission and rebuild the persisted table
    Refresh,
    /// Load the table (refreshing if none is persisted) and print a summary
    Summary,
    /// Most frequent selections in a multi-select column
    Top {
        /// barriers | solutions
        #[arg(long, default_value = "barriers")]
        field: MultiSelect,
        #[arg(short, long, default_value_t = 5)]
        n: usize,
    },
    /// Write the barrier view (no contact details) to Parquet
    Export {
        #[arg(long, value_name = "FILE")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,barrierlog=info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    let args = Args::parse();

    // ─── 2) config + repository ──────────────────────────────────────
    let cfg = Config::load(args.config.as_deref())?;
    info!(table = %cfg.table_path.display(), "startup");
    let client = FormsClient::new(&cfg.api).context("configuring forms client")?;
    let mut repo = Repository::new(client, CsvTableStore::new(&cfg.table_path));

    // ─── 3) run ──────────────────────────────────────────────────────
    match args.command {
        Command::Refresh => {
            let meta = repo.refresh().await.map_err(|e| {
                error!(error = %e, "refresh failed; persisted table unchanged");
                e
            })?;
            println!(
                "refreshed {} records ({} submissions, quota left: {})",
                meta.active_submissions,
                meta.total_submissions,
                meta.limit_left
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| "unknown".into())
            );
        }
        Command::Summary => {
            let count = repo.load().await?.len();
            println!("records: {}", count);
            match repo.latest_date() {
                Ok(d) => println!("latest date: {}", d),
                Err(_) => println!("latest date: none"),
            }
        }
        Command::Top { field, n } => {
            repo.load().await?;
            println!("top {} {}", n, field);
            for (value, count) in repo.top_values(field, n) {
                println!("{:>5}  {}", count, value);
            }
        }
        Command::Export { out } => {
            repo.load().await?;
            let rows = export::write_barrier_parquet(&repo.barrier_view(), &out)?;
            println!("wrote {} rows to {}", rows, out.display());
        }
    }

    Ok(())
}
