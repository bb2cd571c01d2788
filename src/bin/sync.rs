//! Cron/batch entry point. Prints a JSON summary on stdout; logs go to
//! stderr. Exits 1 when a run fails outright.

use anyhow::{Context, Result};
use bson::oid::ObjectId;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rand::{rngs::StdRng, SeedableRng};
use serde_json::{json, Value};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use ly_fantasy::config::AppConfig;
use ly_fantasy::database::{connection::connect_store, Store};
use ly_fantasy::models::sync::{SyncQuery, SyncTarget};
use ly_fantasy::services::draft::DraftRunner;
use ly_fantasy::services::http_fetch::HttpFetcher;
use ly_fantasy::services::scheduler::MatchupScheduler;
use ly_fantasy::services::sync_runner::SyncService;

#[derive(Parser)]
#[command(name = "sync")]
#[command(about = "Legislative Yuan fantasy league batch jobs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pull activity scores for one category, or `all`
    Scores {
        /// proposals, cosigns, interpellations, speeches, rollcalls or all
        category: String,

        /// Only legislators whose Chinese name contains this
        #[arg(long)]
        legislator: Option<String>,

        #[arg(long)]
        limit: Option<usize>,

        #[arg(long)]
        offset: Option<usize>,

        /// Window start for speeches and roll-calls (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Window end (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,
    },
    /// Refresh the legislator directory
    Legislators,
    /// Regenerate a league's round-robin schedule
    Schedule {
        #[arg(long, env = "LEAGUE_ID")]
        league: String,
    },
    /// Score every matchup of a week and recompute records
    Week {
        #[arg(long, env = "LEAGUE_ID")]
        league: String,

        #[arg(long)]
        week: u32,

        /// Rescore matchups that already have a result
        #[arg(long)]
        force: bool,
    },
    /// Run a league's draft
    Draft {
        #[arg(long, env = "LEAGUE_ID")]
        league: String,

        /// Seed for the random fallback picks
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok((output, succeeded)) => {
            println!("{}", pretty(&output));
            if succeeded {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            }
        }
        Err(e) => {
            error!("❌ {:#}", e);
            println!("{}", pretty(&json!({ "success": false, "error": e.to_string() })));
            ExitCode::from(1)
        }
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

async fn run(cli: Cli) -> Result<(Value, bool)> {
    let config = Arc::new(AppConfig::from_env().context("loading configuration")?);
    let store: Arc<dyn Store> = Arc::new(connect_store(&config).await.context("connecting to MongoDB")?);
    let fetcher = HttpFetcher::new(config.fetch).context("building HTTP client")?;

    match cli.command {
        Commands::Scores {
            category,
            legislator,
            limit,
            offset,
            from,
            to,
        } => {
            let query = SyncQuery {
                legislator,
                limit,
                offset,
                from,
                to,
            };
            let service = SyncService::new(store, fetcher, config);

            if category.eq_ignore_ascii_case("all") {
                let report = service.run_all(&query).await?;
                let succeeded = report.all_succeeded();
                let failures = report.failures();
                let mut output = json!({ "success": succeeded, "results": report.results });
                if !succeeded {
                    output["error"] = json!(failures.join("; "));
                }
                return Ok((output, succeeded));
            }

            let target = SyncTarget::parse(&category)
                .with_context(|| format!("unknown category '{}'", category))?;
            let summary = service.run(target, &query).await?;
            Ok((
                json!({ "success": true, "results": { target.as_str(): summary } }),
                true,
            ))
        }
        Commands::Legislators => {
            let summary = SyncService::new(store, fetcher, config).sync_legislators().await?;
            Ok((json!({ "success": true, "results": { "legislators": summary } }), true))
        }
        Commands::Schedule { league } => {
            let league_id = parse_league(&league)?;
            let matchups = MatchupScheduler::new(store.as_ref())
                .generate_schedule(&league_id)
                .await?;
            info!(matchups = matchups.len(), "Schedule written");
            Ok((json!({ "success": true, "results": { "matchups": matchups.len() } }), true))
        }
        Commands::Week { league, week, force } => {
            let league_id = parse_league(&league)?;
            let matchups = MatchupScheduler::new(store.as_ref())
                .calculate_week(&league_id, week, force)
                .await?;
            Ok((json!({ "success": true, "results": matchups }), true))
        }
        Commands::Draft { league, seed } => {
            let league_id = parse_league(&league)?;
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            let outcome = DraftRunner::new(store.as_ref())
                .run(&league_id, &mut rng)
                .await?;
            Ok((json!({ "success": true, "results": outcome }), true))
        }
    }
}

fn parse_league(raw: &str) -> Result<ObjectId> {
    ObjectId::parse_str(raw).with_context(|| format!("invalid league id '{}'", raw))
}
