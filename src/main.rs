use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use crewmatch::analytics::TimeWindow;
use crewmatch::config::{ConfigOverrides, EngineConfig};
use crewmatch::engine::MatchEngine;
use crewmatch::output::csv::{rankings_to_csv, suggestions_to_csv};
use crewmatch::output::json::render_json;
use crewmatch::output::table::{
    render_analytics_table, render_ranking_table, render_score_table, render_suggestions_table,
};
use crewmatch::ranking::RankedMatch;
use crewmatch::scoring::cache::MemoryScoreCache;
use crewmatch::server::run_server;
use crewmatch::snapshot::store::JsonStore;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Debug, Parser)]
#[command(
    name = "crewmatch",
    about = "Compatibility scoring and improvement suggestions for creative marketplaces"
)]
struct Cli {
    /// JSON dataset with profiles, opportunities and outcome history.
    #[arg(short, long, default_value = "dataset.json")]
    data: PathBuf,
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
    #[arg(long = "min-score")]
    min_score: Option<f64>,
    #[arg(long = "experience-ceiling")]
    experience_ceiling: Option<f64>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Score one profile against one opportunity.
    Score {
        profile: String,
        opportunity: String,
    },
    /// Rank open opportunities for a profile.
    RankOpportunities {
        profile: String,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Rank candidate profiles for an opportunity.
    RankProfiles {
        opportunity: String,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Improvement suggestions and score potential for a profile.
    Suggest { profile: String },
    /// Matchmaking analytics roll-up for a profile.
    Analytics {
        profile: String,
        #[arg(long, default_value = "month")]
        window: String,
    },
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        #[arg(long, default_value_t = 3002)]
        port: u16,
    },
    Config {
        #[arg(long)]
        init: bool,
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(EngineConfig::default_path);
    let mut config = EngineConfig::load(Some(&config_path))?;
    config.apply_overrides(ConfigOverrides {
        min_score: cli.min_score,
        experience_ceiling_years: cli.experience_ceiling,
    });

    if let Commands::Config { init, show } = &cli.command {
        if *init {
            EngineConfig::write_template(&config_path)?;
            info!("wrote config template to {}", config_path.display());
        }
        if *show || !*init {
            println!("{}", toml::to_string_pretty(&config)?);
        }
        return Ok(());
    }

    let store = JsonStore::load(&cli.data)?;
    info!(
        profiles = store.profile_count(),
        opportunities = store.opportunity_count(),
        "dataset loaded from {}",
        cli.data.display()
    );
    let engine = Arc::new(MatchEngine::new(
        Arc::new(store),
        Some(Arc::new(MemoryScoreCache::new())),
        config,
    )?);

    let now = Utc::now();
    match cli.command {
        Commands::Score {
            profile,
            opportunity,
        } => {
            let score = engine.score(&profile, &opportunity, now).await?;
            match cli.output {
                OutputFormat::Table => println!("{}", render_score_table(&score)),
                OutputFormat::Json => println!("{}", render_json(&score)?),
                OutputFormat::Csv => {
                    warn!("no CSV renderer for score breakdowns, emitting JSON");
                    println!("{}", render_json(&score)?);
                }
            }
        }
        Commands::RankOpportunities { profile, limit } => {
            let matches = engine.rank_opportunities(&profile, limit, now).await?;
            print_rankings(&matches, "Opportunity", cli.output)?;
        }
        Commands::RankProfiles { opportunity, limit } => {
            let matches = engine.rank_profiles(&opportunity, limit, now).await?;
            print_rankings(&matches, "Profile", cli.output)?;
        }
        Commands::Suggest { profile } => {
            let report = engine.insights(&profile, now).await?;
            match cli.output {
                OutputFormat::Table => println!("{}", render_suggestions_table(&report)),
                OutputFormat::Json => println!("{}", render_json(&report)?),
                OutputFormat::Csv => println!("{}", suggestions_to_csv(&report)?),
            }
        }
        Commands::Analytics { profile, window } => {
            let window = TimeWindow::from_str(&window).map_err(|e| anyhow!(e.to_string()))?;
            let snapshot = engine.analytics(&profile, window, now).await?;
            match cli.output {
                OutputFormat::Table => println!("{}", render_analytics_table(&snapshot)),
                OutputFormat::Json => println!("{}", render_json(&snapshot)?),
                OutputFormat::Csv => {
                    warn!("no CSV renderer for analytics, emitting JSON");
                    println!("{}", render_json(&snapshot)?);
                }
            }
        }
        Commands::Serve { host, port } => {
            let bind = format!("{host}:{port}");
            let addr: SocketAddr = bind
                .parse()
                .map_err(|e| anyhow!("invalid bind address {bind}: {e}"))?;
            run_server(engine, addr).await?;
        }
        Commands::Config { .. } => unreachable!("handled before engine construction"),
    }

    Ok(())
}

fn print_rankings(
    matches: &[RankedMatch],
    id_header: &str,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", render_ranking_table(matches, id_header)),
        OutputFormat::Json => println!("{}", render_json(matches)?),
        OutputFormat::Csv => println!("{}", rankings_to_csv(matches)?),
    }
    Ok(())
}
