#![deny(
    warnings,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo
)]
#![allow(clippy::multiple_crate_versions)]

use anyhow::{Context, Result, bail};
use clap::Parser;
use mapty::cli::{Backend, Cli, Cmd};
use mapty::controller::{ControllerConfig, Event, WorkoutController};
use mapty::database::SqliteStore;
use mapty::error::LocationError;
use mapty::ports::{Collaborators, ListView, PersistenceStore};
use mapty::storage::JsonFileStore;
use mapty::term::{TerminalForm, TerminalList, TerminalMap, TerminalShell};
use mapty::types::{Coordinates, RawFields};
use mapty::{gpx, utils};
use std::fs;
use std::io;

#[macro_use]
extern crate mapty;

fn main() -> Result<()> {
    let cli = Cli::parse();
    utils::init_logging(cli.verbose, cli.quiet);

    let storage = open_storage(&cli)?;
    // Only commands that show the list print the restored entries.
    let list: Box<dyn ListView> = match cli.cmd {
        Cmd::Add { .. } | Cmd::List => Box::new(TerminalList::stdout()),
        Cmd::Show { .. } | Cmd::Reset | Cmd::ExportGpx { .. } => {
            Box::new(TerminalList::new(io::sink()))
        }
    };

    let config = ControllerConfig {
        zoom_level: cli.zoom,
        ..ControllerConfig::default()
    };
    let mut app = WorkoutController::new(
        Collaborators {
            map: Box::new(TerminalMap),
            list,
            form: Box::new(TerminalForm::default()),
            storage,
            shell: Box::new(TerminalShell),
        },
        config,
    );

    let restored = app.restore_from_persistence();
    dlog!(
        "mode={:?} store={} restored={restored}",
        cli.cmd,
        cli.store.display()
    );

    match cli.origin {
        Some(origin) => app.locate(move || Ok::<_, LocationError>(origin)),
        None if matches!(cli.cmd, Cmd::Add { .. }) => app.locate(|| {
            Err::<Coordinates, _>(LocationError::Unavailable(
                "no starting location given (use --origin LAT,LON)".to_string(),
            ))
        }),
        None => {}
    }

    match cli.cmd {
        Cmd::Add {
            kind,
            at,
            distance,
            duration,
            cadence,
            elevation,
        } => {
            app.handle(Event::MapClicked(at))
                .context("choosing the workout location")?;
            app.handle(Event::ActivityTypeChanged(kind))?;

            let fields = RawFields {
                distance,
                duration,
                cadence,
                elevation,
            };
            let id = app
                .submit(kind, &fields)
                .with_context(|| format!("adding {kind} workout"))?;
            tracing::info!(%id, total = app.store().len(), "workout saved");
        }
        Cmd::List => {
            if app.store().is_empty() {
                eprintln!("no workouts yet");
            }
        }
        Cmd::Show { id } => {
            if !app.select_workout(&id) {
                bail!("no workout with id {id}");
            }
        }
        Cmd::Reset => {
            app.handle(Event::ResetRequested)
                .context("deleting persisted workouts")?;
        }
        Cmd::ExportGpx { out } => {
            let doc = gpx::write_waypoints(app.store().all())?;
            match out {
                Some(path) => {
                    fs::write(&path, doc)
                        .with_context(|| format!("writing GPX: {}", path.display()))?;
                    tracing::info!(path = %path.display(), waypoints = app.store().len(), "gpx written");
                }
                None => print!("{doc}"),
            }
        }
    }

    Ok(())
}

fn open_storage(cli: &Cli) -> Result<Box<dyn PersistenceStore>> {
    let storage: Box<dyn PersistenceStore> = match cli.backend {
        Backend::Json => Box::new(JsonFileStore::new(cli.store.clone())),
        Backend::Sqlite => Box::new(
            SqliteStore::open(&cli.store)
                .with_context(|| format!("opening SQLite store: {}", cli.store.display()))?,
        ),
    };
    Ok(storage)
}
