use crate::types::{Coordinates, WorkoutKind};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

const DEFAULT_STORE: &str = "workouts.json";
const DEFAULT_ZOOM: f64 = crate::controller::DEFAULT_ZOOM;

#[derive(Parser, Debug)]
#[command(
    name = "mapty",
    about = "Log geotagged running and cycling workouts and keep them between runs"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Cmd,

    /// Where workouts are persisted.
    #[arg(long, value_name = "PATH", default_value = DEFAULT_STORE, global = true)]
    pub store: PathBuf,

    /// Storage format of `--store`.
    #[arg(long, value_enum, default_value_t = Backend::Json, global = true)]
    pub backend: Backend,

    /// Starting location as `LAT,LON`. Without it, new workouts are disabled.
    #[arg(long, value_name = "LAT,LON", global = true, allow_hyphen_values = true)]
    pub origin: Option<Coordinates>,

    /// Map zoom level used when centering.
    #[arg(long, default_value_t = DEFAULT_ZOOM, global = true)]
    pub zoom: f64,

    /// Increase log verbosity (-v, -vv). Defaults to INFO.
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Decrease log verbosity (-q, -qq). Defaults to INFO.
    #[arg(short = 'q', long, action = ArgAction::Count, global = true)]
    pub quiet: u8,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Record a workout at a spot on the map.
    Add {
        #[arg(value_enum)]
        kind: WorkoutKind,

        /// Where the workout happened, as `LAT,LON`.
        #[arg(long, value_name = "LAT,LON", allow_hyphen_values = true)]
        at: Coordinates,

        /// Distance in km.
        #[arg(long, default_value = "", allow_hyphen_values = true)]
        distance: String,

        /// Duration in minutes.
        #[arg(long, default_value = "", allow_hyphen_values = true)]
        duration: String,

        /// Steps per minute (running).
        #[arg(long, default_value = "", allow_hyphen_values = true)]
        cadence: String,

        /// Elevation gain in meters (cycling).
        #[arg(long, default_value = "", allow_hyphen_values = true)]
        elevation: String,
    },

    /// Print every stored workout.
    List,

    /// Center the map on one workout.
    Show {
        /// Workout id as printed by `list`.
        id: String,
    },

    /// Delete every workout.
    Reset,

    /// Write all workouts as GPX waypoints.
    ExportGpx {
        /// Output file; stdout when omitted.
        #[arg(long, value_name = "PATH")]
        out: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    Json,
    Sqlite,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_an_add_with_negative_coordinates() {
        let cli = Cli::try_parse_from([
            "mapty", "--origin", "-33.9,18.4", "add", "cycling", "--at", "-33.92,18.42",
            "--distance", "20", "--duration", "60", "--elevation", "-40",
        ])
        .unwrap();

        assert_eq!(cli.backend, Backend::Json);
        assert_eq!(cli.zoom, 13.0);
        assert!(cli.origin.is_some());
        let Cmd::Add { kind, at, elevation, .. } = cli.cmd else {
            panic!("expected add");
        };
        assert_eq!(kind, WorkoutKind::Cycling);
        assert!((at.lat() + 33.92).abs() < 1e-12);
        assert_eq!(elevation, "-40");
    }
}
