mod commands;
mod render;

use clap::{Args, Parser, Subcommand, ValueEnum};
use hotleads_core::CategoryFilter;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "hotleads")]
#[command(about = "Find recently listed local businesses that have no website")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Search for ranked, call-ready leads.
    Leads(SearchArgs),
    /// Resolve a postal code or address to coordinates.
    Geocode {
        /// Postal code or free-text address.
        hint: String,
    },
    /// Print the Overpass queries a search would send, without sending them.
    Query(SearchArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Debug, Args)]
#[command(group(
    clap::ArgGroup::new("place")
        .required(true)
        .args(["location", "lat"])
))]
struct SearchArgs {
    /// Postal code or address to search around.
    #[arg(long)]
    location: Option<String>,

    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    lat: Option<f64>,

    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    lon: Option<f64>,

    /// Search radius in metres; without it a geocoded bounding box is used.
    #[arg(long)]
    radius: Option<u32>,

    /// Look-back window in days.
    #[arg(long, default_value_t = 7, value_parser = clap::value_parser!(u32).range(0..=60))]
    days: u32,

    /// Category filter such as `shop=beauty`; repeatable. Defaults to the niches file.
    #[arg(long = "niche", value_parser = parse_filter)]
    niches: Vec<CategoryFilter>,

    /// Search every category instead of the configured niches.
    #[arg(long, conflicts_with = "niches")]
    all_niches: bool,

    /// Extra chain name to exclude; repeatable.
    #[arg(long = "blacklist")]
    blacklist: Vec<String>,

    /// Drop the niches file's default chain blacklist.
    #[arg(long)]
    no_default_blacklist: bool,

    /// Look up phone numbers for records that have none.
    #[arg(long)]
    enrich: bool,

    /// Drop businesses whose name resolves to a live website.
    #[arg(long)]
    probe: bool,

    /// Include records that already list a website.
    #[arg(long)]
    allow_website: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

fn parse_filter(raw: &str) -> Result<CategoryFilter, String> {
    raw.parse().map_err(|e: hotleads_core::ConfigError| e.to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = hotleads_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Leads(args) => commands::run_leads(&config, &args).await,
        Commands::Geocode { hint } => commands::run_geocode(&config, &hint).await,
        Commands::Query(args) => commands::run_query(&config, &args).await,
    }
}
