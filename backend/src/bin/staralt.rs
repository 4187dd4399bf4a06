//! Staralt command-line front end.
//!
//! Prints night windows, horizon crossings, observer status and target
//! visibility tracks as JSON for the configured site.
//!
//! # Usage
//!
//! ```bash
//! staralt track --ra 20.5243 --dec -20.245 --minalt 30 --minmoonsep 40
//! staralt track --ra 01:22:05.8 --dec=-20:14:42 --reference 2024-01-25T20:00:00Z
//! staralt night --reference 2024-01-25T20:00:00Z --pretty
//! staralt crossing --body sun --horizon -18 --mode next
//! staralt status
//! ```
//!
//! # Environment Variables
//!
//! - `OBSERVER_LATITUDE`, `OBSERVER_LONGITUDE`, `OBSERVER_ELEVATION`,
//!   `OBSERVER_TIMEZONE`, `OBSERVER_NAME`, `OBSERVER_OBSERVATORY`: site overrides
//! - `RUST_LOG`: Log level (default: info)

use std::env;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use staralt::api::{StaraltContext, StaraltQuery};
use staralt::config::StaraltConfig;
use staralt::geometry::MeeusGeometry;
use staralt::models::{CoordinateInput, Instant};
use staralt::services::{observer_status, Body, CrossingMode};

#[derive(Parser)]
#[command(name = "staralt", version, about = "Twilight windows and target visibility tracks")]
struct Cli {
    /// TOML configuration file (default: staralt.toml in the usual locations)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Visibility track of a target over the night around the reference instant
    Track {
        /// Right ascension. A bare number is decimal degrees (`10` is 10°, not
        /// 10h); write hours as text such as `10h` or `10:00:00`. Must be of
        /// the same kind as --dec.
        #[arg(long, allow_hyphen_values = true)]
        ra: String,
        /// Declination: decimal degrees, or sexagesimal text such as `-20:14:42`
        /// when --ra is sexagesimal
        #[arg(long, allow_hyphen_values = true)]
        dec: String,
        #[arg(long)]
        objname: Option<String>,
        /// Minimum target altitude, degrees
        #[arg(long, allow_hyphen_values = true)]
        minalt: Option<f64>,
        /// Minimum moon separation, degrees
        #[arg(long)]
        minmoonsep: Option<f64>,
        /// Reference instant (default: now)
        #[arg(long)]
        reference: Option<String>,
    },
    /// Twilight boundaries of the night around the reference instant
    Night {
        #[arg(long)]
        reference: Option<String>,
    },
    /// Sun or moon horizon crossing
    Crossing {
        #[arg(long, value_enum, default_value_t = BodyArg::Sun)]
        body: BodyArg,
        /// Horizon angle, degrees
        #[arg(long, allow_hyphen_values = true, default_value_t = -18.0)]
        horizon: f64,
        #[arg(long, value_enum, default_value_t = CrossingMode::Next)]
        mode: CrossingMode,
        /// Look for a setting instead of a rising crossing
        #[arg(long)]
        setting: bool,
        #[arg(long)]
        reference: Option<String>,
    },
    /// Observer status snapshot
    Status,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum BodyArg {
    Sun,
    Moon,
}

impl From<BodyArg> for Body {
    fn from(arg: BodyArg) -> Self {
        match arg {
            BodyArg::Sun => Body::Sun,
            BodyArg::Moon => Body::Moon,
        }
    }
}

/// Numbers are decimal degrees, anything else is sexagesimal text. A bare
/// number is never read as hours, unlike a one-field string at the JSON boundary.
fn coordinate(raw: &str) -> CoordinateInput {
    match raw.trim().parse::<f64>() {
        Ok(v) => CoordinateInput::Degrees(v),
        Err(_) => CoordinateInput::Sexagesimal(raw.to_string()),
    }
}

fn reference_instant(raw: Option<&str>) -> anyhow::Result<Instant> {
    match raw {
        Some(text) => text
            .parse()
            .with_context(|| format!("invalid --reference '{}'", text)),
        None => Ok(Instant::now()),
    }
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<StaraltConfig> {
    let config = match path {
        Some(path) => StaraltConfig::from_file(path)?,
        None => StaraltConfig::from_default_location().unwrap_or_else(|e| {
            info!("{}; using built-in defaults", e);
            StaraltConfig::default()
        }),
    };
    Ok(config.with_env_overrides()?)
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> anyhow::Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", json);
    Ok(())
}

#[derive(Serialize)]
struct CrossingOutput {
    body: Body,
    horizon_deg: f64,
    mode: CrossingMode,
    rising: bool,
    reference: String,
    crossing: Option<String>,
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;
    let site = config.site()?;
    let geometry = MeeusGeometry::new();
    let context = StaraltContext::new(&geometry, &site)
        .with_search(config.search()?)
        .with_grid(config.grid()?)
        .with_default_thresholds(config.thresholds()?);

    info!(
        "Site {} at ({:.4}, {:.4}), {}",
        site.observatory_name(),
        site.latitude_deg(),
        site.longitude_deg(),
        site.timezone().name()
    );

    match cli.command {
        Command::Track {
            ra,
            dec,
            objname,
            minalt,
            minmoonsep,
            reference,
        } => {
            let query = StaraltQuery {
                ra: coordinate(&ra),
                dec: coordinate(&dec),
                objname,
                target_minalt: minalt,
                target_minmoonsep: minmoonsep,
                reference_instant: reference,
            };
            let data = context.staralt(&query)?;
            info!(
                "{} samples, {} observable",
                data.len(),
                data.color_target.iter().filter(|c| *c == "g").count()
            );
            print_json(&data, cli.pretty)?;
        }
        Command::Night { reference } => {
            let reference = reference_instant(reference.as_deref())?;
            let window = context.night_window(reference)?;
            if window.is_degenerate() {
                info!("No dark night around {}", reference.isoformat());
            }
            print_json(&window, cli.pretty)?;
        }
        Command::Crossing {
            body,
            horizon,
            mode,
            setting,
            reference,
        } => {
            let reference = reference_instant(reference.as_deref())?;
            let body = Body::from(body);
            let crossing =
                context
                    .solver()
                    .find_crossing(body, reference, horizon, mode, !setting)?;
            print_json(
                &CrossingOutput {
                    body,
                    horizon_deg: horizon,
                    mode,
                    rising: !setting,
                    reference: reference.isoformat(),
                    crossing: crossing.map(|t| t.isoformat()),
                },
                cli.pretty,
            )?;
        }
        Command::Status => {
            let status = observer_status(&site, &geometry, Instant::now())?;
            print_json(&status, cli.pretty)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn query(ra: &str, dec: &str) -> StaraltQuery {
        StaraltQuery::new(coordinate(ra), coordinate(dec))
    }

    #[test]
    fn test_bare_number_ra_is_degrees() {
        let target = query("10", "-20").target().unwrap();
        assert_eq!(target.ra_deg(), 10.0);

        let target = query("10h", "-20:00:00").target().unwrap();
        assert!((target.ra_deg() - 150.0).abs() < 1e-9);
    }

    #[test]
    fn test_ra_help_spells_out_units() {
        let cli = Cli::command();
        let track = cli.find_subcommand("track").unwrap();
        let ra = track
            .get_arguments()
            .find(|arg| arg.get_id() == "ra")
            .unwrap();
        let help = ra.get_long_help().or(ra.get_help()).unwrap().to_string();
        assert!(help.contains("decimal degrees"), "{}", help);
        assert!(help.contains("10h"), "{}", help);
    }
}
