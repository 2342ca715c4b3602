use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use sidereal_chart::{ChartCalculator, ChartSettings, EphemerisOracle};

/// `DEFAULT_FIXED_AYANAMSA` as clap expects it; checked in the tests below.
const DEFAULT_FIXED_AYANAMSA_ARG: &str = "24.0";

#[derive(Parser)]
#[command(name = "sidereal-chart", about = "Sidereal birth chart with equal houses")]
struct Cli {
    /// Local birth date (YYYY-MM-DD)
    #[arg(long)]
    date: String,
    /// Local wall-clock time (HH:MM or HH:MM:SS)
    #[arg(long)]
    time: String,
    /// IANA timezone name, e.g. Asia/Kolkata
    #[arg(long)]
    timezone: String,
    /// Latitude in degrees, north positive
    #[arg(long, allow_hyphen_values = true)]
    latitude: f64,
    /// Longitude in degrees, east positive
    #[arg(long, allow_hyphen_values = true)]
    longitude: f64,
    /// Settings file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Subtract a constant ayanamsa instead of the ephemeris value
    #[arg(
        long,
        value_name = "DEGREES",
        num_args = 0..=1,
        default_missing_value = DEFAULT_FIXED_AYANAMSA_ARG
    )]
    fixed_ayanamsa: Option<f64>,
    /// Print the chart as JSON
    #[arg(long)]
    json: bool,
}

#[cfg(feature = "swisseph")]
fn oracle(settings: &ChartSettings) -> Result<Box<dyn EphemerisOracle>> {
    let eph = sidereal_chart::SwissEph::new(settings.ephemeris_path.as_deref())?;
    Ok(Box::new(eph))
}

#[cfg(not(feature = "swisseph"))]
fn oracle(settings: &ChartSettings) -> Result<Box<dyn EphemerisOracle>> {
    if let Some(path) = &settings.ephemeris_path {
        log::warn!(
            "ignoring ephemeris path {}: built without the swisseph feature",
            path.display()
        );
    }
    Ok(Box::new(sidereal_chart::AnalyticEphemeris::new()))
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut settings = match &cli.config {
        Some(path) => ChartSettings::from_json_file(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => ChartSettings::default(),
    };
    if let Some(degrees) = cli.fixed_ayanamsa {
        settings = settings.with_fixed_ayanamsa(degrees);
    }

    let calculator = ChartCalculator::new(oracle(&settings)?, settings)?;
    let chart = calculator.compute_from_strings(
        &cli.date,
        &cli.time,
        &cli.timezone,
        cli.latitude,
        cli.longitude,
    )?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&chart)?);
    } else {
        print!("{chart}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use sidereal_chart::DEFAULT_FIXED_AYANAMSA;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn fixed_ayanamsa_arg_matches_library_default() {
        let parsed: f64 = DEFAULT_FIXED_AYANAMSA_ARG.parse().unwrap();
        assert_eq!(parsed, DEFAULT_FIXED_AYANAMSA);
    }

    #[test]
    fn bare_fixed_ayanamsa_flag_uses_default() {
        let cli = Cli::try_parse_from([
            "sidereal-chart",
            "--date",
            "1996-03-20",
            "--time",
            "10:20",
            "--timezone",
            "Asia/Kolkata",
            "--latitude",
            "29.4739",
            "--longitude",
            "77.7041",
            "--fixed-ayanamsa",
        ])
        .unwrap();
        assert_eq!(cli.fixed_ayanamsa, Some(DEFAULT_FIXED_AYANAMSA));
        assert!(!cli.json);
    }

    #[test]
    fn negative_coordinates_parse() {
        let cli = Cli::try_parse_from([
            "sidereal-chart",
            "--date",
            "2021-07-01",
            "--time",
            "12:00",
            "--timezone",
            "America/New_York",
            "--latitude",
            "-33.9",
            "--longitude",
            "-74.0",
            "--json",
        ])
        .unwrap();
        assert_eq!(cli.latitude, -33.9);
        assert_eq!(cli.longitude, -74.0);
        assert!(cli.json);
    }
}
