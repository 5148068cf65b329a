//! Radius query CLI over the real-price pipeline.
//!
//! Resolves the center address, pulls the transaction registers from the
//! remote store and prints the matches with their aggregates. Presentation
//! only; all pipeline semantics live in the `realprice` crate.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::{Datelike, Utc};
use clap::{Parser, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use drive_client::DriveClient;
use realprice::{
    Category, DriveStore, FilteredRecord, NominatimGeocoder, Pipeline, PipelineError,
    QueryOutcome, QueryParams, TtlCache,
};

mod config;
use config::Config;

#[derive(Parser)]
#[command(name = "realprice")]
#[command(about = "Radius query over real-price transaction registers")]
#[command(version)]
struct Cli {
    /// Center address for the search
    #[arg(short, long, default_value = "台中市大里區西湖路427號")]
    address: String,

    /// Search radius in kilometers
    #[arg(short, long, default_value_t = 1.5)]
    radius_km: f64,

    /// Transaction category to match
    #[arg(short, long, value_enum, default_value = "house")]
    category: CategoryArg,

    /// Maximum building age in years (houses only; defaults to 30)
    #[arg(long)]
    max_age: Option<u32>,

    /// Number of latest transactions to print
    #[arg(short, long, default_value_t = 5)]
    limit: usize,

    /// Root folder id in the remote store (overrides DRIVE_ROOT_FOLDER_ID)
    #[arg(long)]
    root_folder: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum CategoryArg {
    House,
    Land,
}

impl From<CategoryArg> for Category {
    fn from(value: CategoryArg) -> Self {
        match value {
            CategoryArg::House => Category::Building,
            CategoryArg::Land => Category::Land,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,realprice=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;

    let root_folder = cli
        .root_folder
        .or(config.drive_root_folder_id)
        .context("DRIVE_ROOT_FOLDER_ID or --root-folder must be provided")?;

    let store = DriveStore::new(DriveClient::new(config.drive_access_token));

    let mut geocoder = NominatimGeocoder::new(config.nominatim_user_agent)?;
    if let Some(base_url) = config.nominatim_base_url {
        geocoder = geocoder.with_base_url(base_url);
    }

    let category: Category = cli.category.into();
    let max_age_years = match category {
        Category::Building => cli.max_age.or(Some(30)),
        _ => None,
    };

    let pipeline = Pipeline::new(store, geocoder, root_folder).with_table_cache(TtlCache::new(
        Duration::from_secs(config.table_cache_ttl_secs),
    ));

    let params = QueryParams {
        address: cli.address.clone(),
        radius_km: cli.radius_km,
        category,
        max_age_years,
        current_year: Utc::now().year(),
    };

    let result = match pipeline.run(&params).await {
        Ok(result) => result,
        Err(PipelineError::UnresolvableAddress { address }) => {
            bail!("Could not resolve '{address}' to coordinates; try a more precise address");
        }
        Err(e) => return Err(e.into()),
    };

    println!(
        "Center: {:.6}, {:.6} (radius {} km, category {})",
        result.center.lat, result.center.lon, cli.radius_km, category
    );

    match &result.outcome {
        QueryOutcome::Matches(records) => print_matches(records, cli.limit),
        QueryOutcome::NoData => println!("No usable transaction data in the source tree."),
        QueryOutcome::NoLocationData => {
            println!("The transaction data carries no coordinates; a radius search is not possible.")
        }
        QueryOutcome::NoMatches => {
            println!("No transactions matched; try a larger radius or different conditions.")
        }
    }

    let report = &result.report;
    tracing::info!(
        documents_found = report.documents_found,
        documents_failed = report.documents_failed,
        folders_failed = report.folders_failed,
        rows_merged = report.rows_merged,
        rows_dropped = report.rows_dropped,
        rows_unlocated = report.rows_unlocated,
        "Query finished"
    );

    Ok(())
}

fn print_matches(records: &[FilteredRecord], limit: usize) {
    let count = records.len();
    let mean = records
        .iter()
        .map(|r| r.record.unit_price_per_ping)
        .sum::<f64>()
        / count as f64;
    let max = records
        .iter()
        .map(|r| r.record.unit_price_per_ping)
        .fold(f64::MIN, f64::max);

    println!("Transactions in range: {count}");
    println!("Mean unit price: {mean:.2} (10k NT$ / ping)");
    println!("Max unit price:  {max:.2} (10k NT$ / ping)");
    println!();
    println!("Latest {} transactions:", limit.min(count));
    for r in records.iter().take(limit) {
        let total = r
            .record
            .total_price
            .map(|p| format!("{p:.0}"))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{}  {}  total {}  unit {:.2}  age {}  {:.3} km",
            r.record.transaction_date,
            r.record.address,
            total,
            r.record.unit_price_per_ping,
            r.record.building_age_years,
            r.distance_km
        );
    }
}
