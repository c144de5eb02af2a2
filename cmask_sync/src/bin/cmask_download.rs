use anyhow::Result;
use chrono::NaiveDate;
use clap::Parser;

use cmask_sync::acquisition::run_acquisition;
use cmask_sync::config::EtlConfig;
use cmask_sync::listing::HttpLister;
use cmask_sync::state::Phase;

/// Download CMASK geotiffs for the DETER monthly mosaics.
#[derive(Parser)]
#[command(version, about = "DETER CMASK monthly acquisition")]
struct Cli {
    /// Force a specific target month (first day, YYYY-MM-DD); skips the
    /// closed-month check entirely.
    #[arg(long, value_name = "YYYY-MM-DD")]
    force_month: Option<NaiveDate>,

    /// Proceed whenever a closed month exists, even if it was already
    /// processed (daily catch-up runs).
    #[arg(long)]
    every_day: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let cli = Cli::parse();

    let mut config = EtlConfig::from_env()?;
    if let Some(month) = cli.force_month {
        config.force_month = Some(month);
        config.every_day = false;
    } else if cli.every_day {
        config.every_day = config.force_month.is_none();
    }

    let client = reqwest::Client::new();
    let lister = HttpLister::new(client.clone(), config.base_url.clone());

    let report = run_acquisition(&config, &lister, client).await?;
    match report.phase {
        Phase::Processed => {
            let target = report.target_month.map(|m| m.format("%Y-%m").to_string());
            println!(
                "{}: processed {} ({} of {} candidate tiles found)",
                config.biome,
                target.as_deref().unwrap_or("?"),
                report.found_items,
                report.resolved_items,
            );
        }
        phase => println!("{}: nothing to do ({phase:?})", config.biome),
    }
    Ok(())
}
