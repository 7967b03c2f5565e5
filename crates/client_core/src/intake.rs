//! Upload lifecycle: a pure state machine plus the async session that drives it.
//!
//! Only one upload is ever outstanding. While it is in flight every new
//! intake attempt is refused, and nothing cancels the call itself; instead
//! each upload carries a generation so a response that lands after a reset is
//! discarded. A reset does not free the intake: new files are refused until
//! the abandoned call resolves.

use std::{path::Path, sync::Arc};

use shared::{error::AnalysisError, protocol::AnalysisResult};
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::{
    projection::{project, Projection, ZipPolicy},
    Analyzer, CsvUpload,
};

const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileSource {
    Dropped,
    Picked,
}

/// Single filename check for every intake path.
pub fn validate_csv_name(filename: &str) -> Result<(), AnalysisError> {
    let is_csv = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if is_csv {
        Ok(())
    } else {
        Err(AnalysisError::InvalidFile(format!(
            "Apenas arquivos .csv são suportados (recebido \"{filename}\")."
        )))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadedAnalysis {
    pub filename: String,
    pub result: AnalysisResult,
    pub projection: Projection,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IntakeState {
    Idle,
    /// A file is hovering over the drop target. An error shown before the
    /// drag started comes back if the drag is abandoned.
    Dragging {
        pending_error: Option<String>,
    },
    Loading,
    Error(String),
    Ready(Arc<LoadedAnalysis>),
}

impl IntakeState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn accepts_files(&self) -> bool {
        matches!(self, Self::Idle | Self::Dragging { .. } | Self::Error(_))
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Error(message) => Some(message.as_str()),
            Self::Dragging {
                pending_error: Some(message),
            } => Some(message.as_str()),
            _ => None,
        }
    }

    pub fn loaded(&self) -> Option<&LoadedAnalysis> {
        match self {
            Self::Ready(loaded) => Some(loaded.as_ref()),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Dragging { .. } => "dragging",
            Self::Loading => "loading",
            Self::Error(_) => "error",
            Self::Ready(_) => "ready",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntakeRefusal {
    #[error("an upload is already in progress")]
    Busy,
    #[error("a result is being displayed; reset before uploading another file")]
    ResultShown,
    #[error(transparent)]
    InvalidFile(AnalysisError),
}

/// Issued when an upload starts; completing with an outdated ticket is a no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTicket {
    generation: u64,
    filename: String,
}

impl UploadTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    Stale,
}

#[derive(Debug)]
pub struct IntakeController {
    state: IntakeState,
    generation: u64,
    /// Generation of the outstanding call, kept across resets until its
    /// `complete` arrives.
    in_flight: Option<u64>,
    policy: ZipPolicy,
}

impl Default for IntakeController {
    fn default() -> Self {
        Self::new(ZipPolicy::default())
    }
}

impl IntakeController {
    pub fn new(policy: ZipPolicy) -> Self {
        Self {
            state: IntakeState::Idle,
            generation: 0,
            in_flight: None,
            policy,
        }
    }

    pub fn state(&self) -> &IntakeState {
        &self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn has_call_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Whether a drop, pick or drag would be considered right now.
    pub fn accepts_files(&self) -> bool {
        self.in_flight.is_none() && self.state.accepts_files()
    }

    /// Returns whether the state changed.
    pub fn drag_enter(&mut self) -> bool {
        if self.in_flight.is_some() {
            return false;
        }
        let next = match &self.state {
            IntakeState::Idle => IntakeState::Dragging {
                pending_error: None,
            },
            IntakeState::Error(message) => IntakeState::Dragging {
                pending_error: Some(message.clone()),
            },
            _ => return false,
        };
        self.state = next;
        true
    }

    pub fn drag_leave(&mut self) -> bool {
        let IntakeState::Dragging { pending_error } = &mut self.state else {
            return false;
        };
        let next = match pending_error.take() {
            Some(message) => IntakeState::Error(message),
            None => IntakeState::Idle,
        };
        self.state = next;
        true
    }

    /// Moves to `Loading` for a dropped or picked file.
    ///
    /// A rejected filename leaves the controller in `Error` so the reason is
    /// shown next to the still-usable upload control.
    pub fn begin_upload(
        &mut self,
        filename: &str,
        source: FileSource,
    ) -> Result<UploadTicket, IntakeRefusal> {
        if !self.accepts_files() {
            if matches!(self.state, IntakeState::Ready(_)) {
                return Err(IntakeRefusal::ResultShown);
            }
            debug!(filename, ?source, "ignoring file while an upload is in flight");
            return Err(IntakeRefusal::Busy);
        }

        if let Err(err) = validate_csv_name(filename) {
            self.state = IntakeState::Error(err.user_message());
            return Err(IntakeRefusal::InvalidFile(err));
        }

        self.generation += 1;
        self.in_flight = Some(self.generation);
        self.state = IntakeState::Loading;
        Ok(UploadTicket {
            generation: self.generation,
            filename: filename.to_string(),
        })
    }

    pub fn complete(
        &mut self,
        ticket: &UploadTicket,
        outcome: Result<AnalysisResult, AnalysisError>,
    ) -> Completion {
        if self.in_flight == Some(ticket.generation) {
            self.in_flight = None;
        }
        if ticket.generation != self.generation || !self.state.is_loading() {
            debug!(
                filename = %ticket.filename,
                ticket_generation = ticket.generation,
                current_generation = self.generation,
                "discarding stale analysis response"
            );
            return Completion::Stale;
        }

        let loaded = outcome.and_then(|result| self.load(ticket, result));
        self.state = match loaded {
            Ok(loaded) => IntakeState::Ready(Arc::new(loaded)),
            Err(err) => IntakeState::Error(err.user_message()),
        };
        Completion::Applied
    }

    /// Clears any result or error. An in-flight upload is invalidated, but new
    /// files stay refused until that call completes.
    pub fn reset(&mut self) {
        if self.state.is_loading() {
            debug!(generation = self.generation, "abandoning in-flight upload");
        }
        self.generation += 1;
        self.state = IntakeState::Idle;
    }

    fn load(
        &self,
        ticket: &UploadTicket,
        result: AnalysisResult,
    ) -> Result<LoadedAnalysis, AnalysisError> {
        let projection = project(&result, self.policy)?;
        Ok(LoadedAnalysis {
            filename: ticket.filename.clone(),
            result,
            projection,
        })
    }
}

#[derive(Debug, Clone)]
pub enum IntakeEvent {
    StateChanged(IntakeState),
    StaleResponseDiscarded { filename: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Settled(IntakeState),
    /// The session was reset while the call was in flight.
    Discarded,
}

pub struct IntakeSession {
    analyzer: Arc<dyn Analyzer>,
    controller: Mutex<IntakeController>,
    events: broadcast::Sender<IntakeEvent>,
}

impl IntakeSession {
    pub fn new(analyzer: Arc<dyn Analyzer>, policy: ZipPolicy) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            analyzer,
            controller: Mutex::new(IntakeController::new(policy)),
            events,
        }
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<IntakeEvent> {
        self.events.subscribe()
    }

    pub async fn state(&self) -> IntakeState {
        self.controller.lock().await.state().clone()
    }

    pub async fn accepts_files(&self) -> bool {
        self.controller.lock().await.accepts_files()
    }

    pub async fn drag_enter(&self) {
        let mut controller = self.controller.lock().await;
        if controller.drag_enter() {
            self.publish(controller.state());
        }
    }

    pub async fn drag_leave(&self) {
        let mut controller = self.controller.lock().await;
        if controller.drag_leave() {
            self.publish(controller.state());
        }
    }

    pub async fn reset(&self) {
        let mut controller = self.controller.lock().await;
        controller.reset();
        self.publish(controller.state());
    }

    /// Performs exactly one call to the analyzer, unless the file is refused.
    pub async fn submit(
        &self,
        upload: CsvUpload,
        source: FileSource,
    ) -> Result<SubmitOutcome, IntakeRefusal> {
        let ticket = {
            let mut controller = self.controller.lock().await;
            let began = controller.begin_upload(&upload.filename, source);
            if !matches!(began, Err(IntakeRefusal::Busy | IntakeRefusal::ResultShown)) {
                self.publish(controller.state());
            }
            began?
        };

        info!(
            filename = %ticket.filename(),
            generation = ticket.generation(),
            ?source,
            "upload started"
        );
        let outcome = self.analyzer.analyze(upload).await;
        if let Err(err) = &outcome {
            warn!(kind = ?err.kind(), error = %err, "analysis upload failed");
        }

        let mut controller = self.controller.lock().await;
        match controller.complete(&ticket, outcome) {
            Completion::Applied => {
                let state = controller.state().clone();
                info!(filename = %ticket.filename(), state = state.name(), "upload settled");
                self.publish(&state);
                Ok(SubmitOutcome::Settled(state))
            }
            Completion::Stale => {
                let _ = self.events.send(IntakeEvent::StaleResponseDiscarded {
                    filename: ticket.filename().to_string(),
                });
                Ok(SubmitOutcome::Discarded)
            }
        }
    }

    fn publish(&self, state: &IntakeState) {
        let _ = self.events.send(IntakeEvent::StateChanged(state.clone()));
    }
}

#[cfg(test)]
#[path = "tests/intake_tests.rs"]
mod tests;
