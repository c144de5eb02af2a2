use anyhow::Result;
use clap::Parser;

use cmask_sync::config::EtlConfig;
use cmask_sync::zonal::run_zonal;

/// Compute per-municipality cloud area from the month's non-cloud mosaic.
#[derive(Parser)]
#[command(version, about = "DETER CMASK zonal cloud statistics")]
struct Cli {}

fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let _cli = Cli::parse();

    let config = EtlConfig::from_env()?;
    let report = run_zonal(&config)?;
    println!(
        "{}: updated {} municipalities for {}-{:02}",
        config.biome, report.municipalities, report.year, report.month
    );
    Ok(())
}
