use crate::dlog;
use crate::error::{ControllerError, LocationError, ValidationError};
use crate::ports::{
    AppShell, Clock, Collaborators, FormView, ListView, LocationProvider, MapView,
    PersistenceStore, Severity, SystemClock,
};
use crate::store::WorkoutStore;
use crate::types::{Coordinates, RawFields, Workout, WorkoutKind, WorkoutSummary};
use chrono::TimeDelta;

pub const DEFAULT_ZOOM: f64 = 13.0;
pub const DEFAULT_ORIGIN_LABEL: &str = "your current coordinates";

#[derive(Debug, Clone, PartialEq)]
pub struct ControllerConfig {
    /// Zoom used when centering the map on the origin or a workout.
    pub zoom_level: f64,
    /// Popup text of the marker placed at the starting location.
    pub origin_label: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            zoom_level: DEFAULT_ZOOM,
            origin_label: DEFAULT_ORIGIN_LABEL.to_string(),
        }
    }
}

/// Where the controller is in the new-workout flow.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum State {
    /// Waiting for the starting location.
    Locating,
    /// Location failed. Workouts can be listed but not created.
    NoLocation,
    Idle,
    /// A spot was picked on the map and the form is open.
    AwaitingInput {
        pending: Coordinates,
        kind: WorkoutKind,
    },
}

/// Things that happen to the controller, one at a time.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    LocationResolved(Result<Coordinates, LocationError>),
    MapClicked(Coordinates),
    FormSubmitted { kind: WorkoutKind, fields: RawFields },
    FormCancelled,
    ActivityTypeChanged(WorkoutKind),
    EntryClicked(String),
    ResetRequested,
}

/// Session orchestration between user input, the map and persisted storage.
pub struct WorkoutController {
    store: WorkoutStore,
    state: State,
    origin: Option<Coordinates>,
    config: ControllerConfig,
    clock: Box<dyn Clock>,
    map: Box<dyn MapView>,
    list: Box<dyn ListView>,
    form: Box<dyn FormView>,
    storage: Box<dyn PersistenceStore>,
    shell: Box<dyn AppShell>,
}

impl WorkoutController {
    pub fn new(collaborators: Collaborators, config: ControllerConfig) -> Self {
        let Collaborators {
            map,
            list,
            form,
            storage,
            shell,
        } = collaborators;

        Self {
            store: WorkoutStore::new(),
            state: State::Locating,
            origin: None,
            config,
            clock: Box::new(SystemClock),
            map,
            list,
            form,
            storage,
            shell,
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub const fn state(&self) -> State {
        self.state
    }

    pub const fn store(&self) -> &WorkoutStore {
        &self.store
    }

    pub const fn origin(&self) -> Option<Coordinates> {
        self.origin
    }

    /// Asks `provider` for the starting location and feeds the outcome back in.
    pub fn locate(&mut self, provider: impl LocationProvider) {
        self.location_resolved(provider.current_position());
    }

    pub fn handle(&mut self, event: Event) -> Result<(), ControllerError> {
        dlog!("event {event:?} state={:?}", self.state);
        match event {
            Event::LocationResolved(result) => self.location_resolved(result),
            Event::MapClicked(at) => self.choose_location(at)?,
            Event::FormSubmitted { kind, fields } => {
                self.submit(kind, &fields)?;
            }
            Event::FormCancelled => self.cancel(),
            Event::ActivityTypeChanged(kind) => self.change_activity(kind),
            Event::EntryClicked(id) => {
                self.select_workout(&id);
            }
            Event::ResetRequested => self.reset_all()?,
        }
        Ok(())
    }

    /// Takes only the first resolution; later ones are ignored.
    pub fn location_resolved(&mut self, result: Result<Coordinates, LocationError>) {
        if self.state != State::Locating {
            dlog!("ignoring repeated location resolution state={:?}", self.state);
            return;
        }

        match result {
            Ok(origin) => {
                tracing::info!(%origin, "location resolved");
                self.origin = Some(origin);
                self.map.center_on(origin, self.config.zoom_level);
                self.map.place_marker(origin, &self.config.origin_label);
                for w in self.store.all() {
                    self.map.place_marker(w.coordinates(), &w.marker_label());
                }
                self.state = State::Idle;
            }
            Err(e) => {
                tracing::warn!(err = %e, "no location; workout creation disabled");
                self.shell
                    .alert(Severity::Error, &format!("Could not find your coordinates: {e}"));
                self.state = State::NoLocation;
            }
        }
    }

    /// A spot on the map was picked: hold it and open the form.
    pub fn choose_location(&mut self, at: Coordinates) -> Result<(), ControllerError> {
        let kind = match self.state {
            State::Locating | State::NoLocation => return Err(ControllerError::CreationDisabled),
            State::Idle => WorkoutKind::Running,
            State::AwaitingInput { kind, .. } => kind,
        };
        self.state = State::AwaitingInput { pending: at, kind };
        self.form.show_fields_for(kind);
        self.form.show();
        Ok(())
    }

    pub fn change_activity(&mut self, kind: WorkoutKind) {
        if let State::AwaitingInput { pending, .. } = self.state {
            self.state = State::AwaitingInput { pending, kind };
        }
        self.form.show_fields_for(kind);
    }

    pub fn cancel(&mut self) {
        if matches!(self.state, State::AwaitingInput { .. }) {
            self.state = State::Idle;
        }
        self.form.clear();
        self.form.hide();
    }

    /// Parses what was typed into the form, then [`Self::create_workout`].
    pub fn submit(&mut self, kind: WorkoutKind, fields: &RawFields) -> Result<String, ControllerError> {
        self.ensure_awaiting_input()?;
        match fields.parse(kind) {
            Ok((distance_km, duration_min, specific)) => {
                self.create_workout(kind, distance_km, duration_min, specific)
            }
            Err(e) => {
                self.reject(&e);
                Err(e.into())
            }
        }
    }

    /// Validates, stores, persists and renders a new workout at the pending
    /// location. Returns the new workout's id. On a validation failure the
    /// form stays open and the store is untouched.
    pub fn create_workout(
        &mut self,
        kind: WorkoutKind,
        distance_km: f64,
        duration_min: f64,
        specific: f64,
    ) -> Result<String, ControllerError> {
        let pending = self.ensure_awaiting_input()?;
        self.state = State::AwaitingInput { pending, kind };

        // Ids come from the creation millisecond; step past any already taken.
        let mut created_at = self.clock.now();
        let workout = loop {
            let w =
                match Workout::new(kind, pending, distance_km, duration_min, specific, created_at) {
                    Ok(w) => w,
                    Err(e) => {
                        self.reject(&e);
                        return Err(e.into());
                    }
                };
            if self.store.find_by_id(w.id()).is_none() {
                break w;
            }
            dlog!("workout id {} taken, moving creation time 1ms forward", w.id());
            created_at += TimeDelta::milliseconds(1);
        };

        let id = workout.id().to_string();
        let summary = WorkoutSummary::from(&workout);
        let label = workout.marker_label();
        self.store.add(workout);
        self.persist();

        self.map.place_marker(pending, &label);
        self.list.append_entry(&summary);
        self.form.clear();
        self.form.hide();
        self.state = State::Idle;

        tracing::info!(%id, %kind, distance_km, duration_min, "workout created");
        Ok(id)
    }

    /// Loads the persisted snapshot. Absent or unreadable data leaves an empty
    /// store without alerting; dropped records raise one warning. Returns the
    /// number of workouts restored.
    pub fn restore_from_persistence(&mut self) -> usize {
        let snapshot = match self.storage.load() {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                dlog!("no persisted workouts");
                self.store = WorkoutStore::new();
                return 0;
            }
            Err(e) => {
                tracing::warn!(err = %e, "ignoring unreadable persisted workouts");
                self.store = WorkoutStore::new();
                return 0;
            }
        };

        let (store, rejected) = WorkoutStore::from_snapshot(&snapshot);
        if !rejected.is_empty() {
            let details = rejected
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            self.shell.alert(
                Severity::Warning,
                &format!("Skipped {} saved workout(s): {details}", rejected.len()),
            );
        }
        self.store = store;

        let map_ready = self.origin.is_some();
        for w in self.store.all() {
            self.list.append_entry(&WorkoutSummary::from(w));
            if map_ready {
                self.map.place_marker(w.coordinates(), &w.marker_label());
            }
        }

        tracing::info!(restored = self.store.len(), "restored workouts");
        self.store.len()
    }

    /// Centers the map on the workout with `id`. Unknown ids do nothing.
    pub fn select_workout(&mut self, id: &str) -> bool {
        let Some(w) = self.store.find_by_id(id) else {
            dlog!("select of unknown workout id={id}");
            return false;
        };
        self.map.center_on(w.coordinates(), self.config.zoom_level);
        true
    }

    /// Forgets every workout, here and in storage, then restarts the app.
    pub fn reset_all(&mut self) -> Result<(), ControllerError> {
        self.store.reset(&mut *self.storage)?;
        tracing::info!("all workouts cleared");
        self.shell.reload();
        Ok(())
    }

    fn ensure_awaiting_input(&self) -> Result<Coordinates, ControllerError> {
        match self.state {
            State::AwaitingInput { pending, .. } => Ok(pending),
            State::Idle => Err(ControllerError::NotAwaitingInput),
            State::Locating | State::NoLocation => Err(ControllerError::CreationDisabled),
        }
    }

    fn reject(&mut self, e: &ValidationError) {
        dlog!("rejected workout input: {e}");
        self.shell.alert(
            Severity::Error,
            &format!("Inputs have to be positive numbers! ({e})"),
        );
    }

    /// Save failures are non-fatal; memory stays authoritative.
    fn persist(&mut self) {
        if let Err(e) = self.storage.save(&self.store.to_snapshot()) {
            tracing::warn!(err = %e, "could not save workouts");
            self.shell.alert(
                Severity::Warning,
                &format!("Workouts could not be saved: {e}"),
            );
        }
    }
}
