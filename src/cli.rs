//! CLI interface for dutylog.
//!
//! Each subcommand is non-interactive: a JSON file in, structured output out.
//! JSON goes to stdout unless `--out` names a file, in which case a one-line
//! summary is printed to stderr instead.

mod format;

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use jiff::SignedDuration;
use serde::de::DeserializeOwned;
use tracing::debug;

use dutylog::model::TripRequest;
use dutylog::planner::RouteRequest;
use dutylog::{TripReport, plan_route, plan_trip};

use crate::config::Config;

use format::{format_grid, format_report};

/// dutylog — Hours-of-Service daily logs from a trip schedule.
#[derive(Debug, Parser)]
#[command(name = "dutylog", after_long_help = WORKFLOW_HELP)]
pub struct Cli {
    /// Config file to use instead of `~/.dutylog/config.toml`.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

const WORKFLOW_HELP: &str = r#"Workflow: checking a trip
  1. dutylog plan route.json --out trip-report.json
     → lays out breaks, fuel, resets and restarts along the route
  2. dutylog evaluate trip.json --text
     → daily totals, remarks and violations for an existing schedule
  3. dutylog grid trip.json --day 2 --resolution quarter-hour

Input files:
  trip.json   { "trip": { "driverName", "truckNumber", "tripStartUtc", ... },
                "stops": [ { "kind", "startUtc", "durationHours", ... } ] }
  route.json  { "trip": { ... }, "route": { "legs": [ { "from", "to",
                "distanceMiles", "drivingHours" } ] } }

Logging:
  RUST_LOG=dutylog=debug dutylog evaluate trip.json"#;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Evaluate an existing stop schedule.
    ///
    /// Builds the duty timeline, splits it into daily logs in the trip's
    /// time zone, and checks the 11/14/8/70 rules.
    Evaluate {
        /// Trip request JSON.
        input: PathBuf,

        /// Write the report JSON to this file instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,

        /// Print a human-readable report instead of JSON.
        #[arg(long, conflicts_with = "out")]
        text: bool,
    },

    /// Plan a legal schedule along a route, then evaluate it.
    Plan {
        /// Route request JSON.
        input: PathBuf,

        /// Write the report JSON to this file instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,

        /// Print a human-readable report instead of JSON.
        #[arg(long, conflicts_with = "out")]
        text: bool,
    },

    /// Draw the four-row duty grid for each day of a trip.
    Grid {
        /// Trip request JSON.
        input: PathBuf,

        /// Only this day (starting at 1).
        #[arg(long)]
        day: Option<u32>,

        /// Width of one grid cell.
        #[arg(long, value_enum, default_value_t = Resolution::QuarterHour)]
        resolution: Resolution,
    },

    /// Print the effective configuration as JSON.
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Resolution {
    Hour,
    HalfHour,
    QuarterHour,
}

impl Resolution {
    fn width(self) -> SignedDuration {
        match self {
            Self::Hour => SignedDuration::from_hours(1),
            Self::HalfHour => SignedDuration::from_mins(30),
            Self::QuarterHour => SignedDuration::from_mins(15),
        }
    }
}

/// Run the CLI, returning an error message on failure.
pub fn run(cli: Cli, config: &Config) -> Result<(), String> {
    match cli.command {
        Command::Evaluate { input, out, text } => {
            let request: TripRequest = read_json(&input)?;
            let report =
                plan_trip(&request, &config.plan_options()).map_err(|e| e.to_string())?;
            emit(&report, out.as_deref(), text)
        }
        Command::Plan { input, out, text } => {
            let request: RouteRequest = read_json(&input)?;
            let report =
                plan_route(&request, &config.plan_options()).map_err(|e| e.to_string())?;
            emit(&report, out.as_deref(), text)
        }
        Command::Grid {
            input,
            day,
            resolution,
        } => {
            let request: TripRequest = read_json(&input)?;
            let report =
                plan_trip(&request, &config.plan_options()).map_err(|e| e.to_string())?;
            cmd_grid(&report, day, resolution)
        }
        Command::Config => {
            let json = serde_json::to_string_pretty(config)
                .map_err(|e| format!("failed to serialize config: {e}"))?;
            println!("{json}");
            Ok(())
        }
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, String> {
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    debug!(path = %path.display(), bytes = contents.len(), "read input");
    serde_json::from_str(&contents).map_err(|e| format!("invalid input {}: {e}", path.display()))
}

fn emit(report: &TripReport, out: Option<&Path>, text: bool) -> Result<(), String> {
    if text {
        println!("{}", format_report(report));
        return Ok(());
    }

    let json = serde_json::to_string_pretty(report)
        .map_err(|e| format!("failed to serialize report: {e}"))?;

    match out {
        Some(path) => {
            fs::write(path, &json)
                .map_err(|e| format!("failed to write {}: {e}", path.display()))?;
            eprintln!("{} → {}", describe(report), path.display());
        }
        None => {
            println!("{json}");
        }
    }

    Ok(())
}

fn cmd_grid(report: &TripReport, day: Option<u32>, resolution: Resolution) -> Result<(), String> {
    let logs: Vec<_> = report
        .logs
        .iter()
        .filter(|log| day.is_none_or(|d| log.day_index == d))
        .collect();

    if logs.is_empty() {
        return Err(format!(
            "no day {} in this trip (it has {})",
            day.unwrap_or_default(),
            report.logs.len()
        ));
    }

    let grids: Vec<String> = logs
        .iter()
        .map(|log| format_grid(log, resolution.width()))
        .collect();
    println!("{}", grids.join("\n\n"));
    Ok(())
}

/// Short human-readable description of a report.
fn describe(report: &TripReport) -> String {
    let s = &report.summary;
    let blocking = s.violations.iter().filter(|v| v.is_blocking()).count();
    let verdict = if s.feasible {
        "feasible".to_string()
    } else {
        format!("{blocking} violation(s)")
    };
    format!(
        "{} day(s), {:.1} mi, {verdict}",
        report.logs.len(),
        s.total_distance_miles
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_grid_options() {
        let cli = Cli::try_parse_from([
            "dutylog",
            "--config",
            "alt.toml",
            "grid",
            "trip.json",
            "--day",
            "2",
            "--resolution",
            "half-hour",
        ])
        .unwrap();
        assert_eq!(cli.config.as_deref(), Some(Path::new("alt.toml")));
        match cli.command {
            Command::Grid {
                day, resolution, ..
            } => {
                assert_eq!(day, Some(2));
                assert_eq!(resolution, Resolution::HalfHour);
                assert_eq!(resolution.width(), SignedDuration::from_mins(30));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn text_and_out_conflict() {
        let result = Cli::try_parse_from(["dutylog", "evaluate", "t.json", "--text", "--out", "r.json"]);
        assert!(result.is_err());
    }

    #[test]
    fn reads_trip_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trip.json");
        fs::write(
            &path,
            r#"{
  "trip": {
    "driverName": "Dana Reyes",
    "truckNumber": "T-114",
    "tripStartUtc": "2025-03-03T13:00:00Z",
    "timeZone": "America/Chicago"
  },
  "stops": [
    {
      "kind": "pickup",
      "startUtc": "2025-03-03T13:00:00Z",
      "durationHours": 1.0,
      "position": { "lat": 41.88, "lng": -87.63 },
      "label": "Chicago, IL"
    },
    {
      "kind": "drivingSegment",
      "startUtc": "2025-03-03T14:00:00Z",
      "durationHours": 2.5,
      "position": { "lat": 41.88, "lng": -87.63 },
      "label": "En route to Peoria, IL",
      "distanceMiles": 160.0
    }
  ]
}"#,
        )
        .unwrap();

        let request: TripRequest = read_json(&path).unwrap();
        let report = plan_trip(&request, &Config::default().plan_options()).unwrap();
        assert!(report.summary.feasible);
        assert_eq!(describe(&report), "1 day(s), 160.0 mi, feasible");
    }
}
