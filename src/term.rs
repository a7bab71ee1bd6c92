//! Terminal stand-ins for the map, list, form and shell.

use crate::ports::{AppShell, FormView, ListView, MapView, Severity};
use crate::types::{Coordinates, WorkoutKind, WorkoutSummary};
use std::io::{self, Write};

/// Map actions become log lines.
#[derive(Debug, Default)]
pub struct TerminalMap;

impl MapView for TerminalMap {
    fn center_on(&mut self, coordinates: Coordinates, zoom_level: f64) {
        tracing::info!(at = %coordinates, zoom = zoom_level, "map centered");
    }

    fn place_marker(&mut self, coordinates: Coordinates, label: &str) {
        tracing::info!(at = %coordinates, "marker: {label}");
    }
}

/// Writes one line per entry.
pub struct TerminalList<W: Write> {
    out: W,
}

impl TerminalList<io::Stdout> {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write> TerminalList<W> {
    pub const fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ListView for TerminalList<W> {
    fn append_entry(&mut self, summary: &WorkoutSummary) {
        if let Err(e) = writeln!(self.out, "{summary}") {
            tracing::warn!(err = %e, "could not write workout entry");
        }
    }
}

/// The command line already carries the form values; only track visibility.
#[derive(Debug, Default)]
pub struct TerminalForm {
    visible: bool,
}

impl FormView for TerminalForm {
    fn show(&mut self) {
        self.visible = true;
    }

    fn hide(&mut self) {
        self.visible = false;
    }

    fn clear(&mut self) {}

    fn show_fields_for(&mut self, kind: WorkoutKind) {
        crate::dlog!("form fields for {kind} visible={}", self.visible);
    }
}

#[derive(Debug, Default)]
pub struct TerminalShell;

impl AppShell for TerminalShell {
    fn alert(&mut self, severity: Severity, message: &str) {
        match severity {
            Severity::Error => eprintln!("error: {message}"),
            Severity::Warning => eprintln!("warning: {message}"),
        }
    }

    fn reload(&mut self) {
        tracing::info!("restart requested; the next run starts empty");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Workout;
    use chrono::{Local, TimeZone, Utc};

    #[test]
    fn list_writes_one_line_per_entry() {
        let here = Coordinates::new(10.0, 20.0).unwrap();
        let at = Local
            .with_ymd_and_hms(2024, 4, 14, 9, 30, 0)
            .unwrap()
            .with_timezone(&Utc);
        let run = Workout::running(here, 5.0, 25.0, 180.0, at).unwrap();
        let ride = Workout::cycling(here, 20.0, 60.0, 150.0, at).unwrap();

        let mut list = TerminalList::new(Vec::new());
        list.append_entry(&WorkoutSummary::from(&run));
        list.append_entry(&WorkoutSummary::from(&ride));

        let text = String::from_utf8(list.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("running on April 14"));
        assert!(lines[0].contains("5.0 min/km"));
        assert!(lines[1].contains("20.0 km/h"));
        assert!(lines[1].contains("150 m"));
    }
}
