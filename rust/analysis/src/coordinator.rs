// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Host-side lifecycle of one face analysis.
//!
//! The coordinator is owned by the host's UI thread and is the only code
//! that talks to the document and the field display. It never touches them
//! from inside a change notification: [`restart_calculation`] only stops the
//! worker and raises a flag, and the next [`update_results`] tick does the
//! actual re-initialization.
//!
//! ```text
//! Uninitialized -> Initializing -> Running -> Draining -> Finished
//!                       ^             |
//!                       |             v
//!                       +------- Interrupted
//! ```
//!
//! [`restart_calculation`]: AnalysisCoordinator::restart_calculation
//! [`update_results`]: AnalysisCoordinator::update_results

use std::fmt;
use std::sync::Arc;

use field_lite_model::{FaceGeometry, FaceRef, FaceResolver, FieldSink, PrimitiveId, SchemaIndex};

use crate::buffer::{FieldResults, ResultBuffer};
use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::worker::{SamplingGrid, WorkerAgent, WorkerOutcome};

/// Where the analysis is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalysisState {
    /// Created; the first tick will initialize it.
    Uninitialized,
    /// Display registration reset; no worker running.
    Initializing,
    /// A worker thread is producing samples.
    Running,
    /// Every grid node was evaluated but the last batch has not been
    /// delivered yet. The next tick delivers it and moves to `Finished`.
    Draining,
    /// Stopped before the grid was exhausted; waiting for a restart.
    Interrupted,
    /// Every sample of the run has been delivered.
    Finished,
}

impl AnalysisState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisState::Uninitialized => "Uninitialized",
            AnalysisState::Initializing => "Initializing",
            AnalysisState::Running => "Running",
            AnalysisState::Draining => "Draining",
            AnalysisState::Interrupted => "Interrupted",
            AnalysisState::Finished => "Finished",
        }
    }
}

impl fmt::Display for AnalysisState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The field display slot this analysis pushes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FieldRegistration {
    primitive: PrimitiveId,
    schema: SchemaIndex,
}

/// Drives one face analysis from the host thread.
#[derive(Debug)]
pub struct AnalysisCoordinator {
    face: FaceRef,
    config: AnalysisConfig,
    state: AnalysisState,
    needs_initialization: bool,
    worker: Option<WorkerAgent>,
    buffer: Option<Arc<ResultBuffer>>,
    registration: Option<FieldRegistration>,
    delivered: usize,
}

impl AnalysisCoordinator {
    /// Creates a coordinator for `face`. Nothing runs until the first
    /// [`update_results`](Self::update_results) tick or an explicit
    /// [`initialize`](Self::initialize).
    pub fn new(face: FaceRef, config: AnalysisConfig) -> Self {
        Self {
            face,
            config,
            state: AnalysisState::Uninitialized,
            needs_initialization: true,
            worker: None,
            buffer: None,
            registration: None,
            delivered: 0,
        }
    }

    /// The analyzed face.
    pub fn face_reference(&self) -> FaceRef {
        self.face
    }

    pub fn state(&self) -> AnalysisState {
        self.state
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn needs_initialization(&self) -> bool {
        self.needs_initialization
    }

    pub fn has_worker(&self) -> bool {
        self.worker.is_some()
    }

    pub fn is_worker_alive(&self) -> bool {
        self.worker.as_ref().is_some_and(WorkerAgent::is_thread_alive)
    }

    /// The current run's buffer, if a run has been started.
    pub fn buffer(&self) -> Option<&Arc<ResultBuffer>> {
        self.buffer.as_ref()
    }

    /// The field primitive results are displayed on, once initialized.
    pub fn primitive(&self) -> Option<PrimitiveId> {
        self.registration.map(|r| r.primitive)
    }

    /// Number of samples in the last batch pushed to the display.
    pub fn delivered(&self) -> usize {
        self.delivered
    }

    /// Resets the display registration and starts a fresh calculation.
    ///
    /// Must only be called when the document may be touched (an idle tick),
    /// never from a change notification.
    pub fn initialize(&mut self, document: &dyn FaceResolver, fields: &mut dyn FieldSink) -> bool {
        self.needs_initialization = false;
        if self.worker.is_some() {
            self.stop_calculation();
        }

        self.reset_registration(fields);
        self.buffer = None;
        self.delivered = 0;
        self.state = AnalysisState::Initializing;
        tracing::debug!(face = %self.face, "Analysis initialized");

        self.start_calculation(document)
    }

    /// Starts a worker on the face's current geometry.
    ///
    /// Returns `false`, creating neither buffer nor worker, when the face no
    /// longer resolves or the thread cannot be spawned.
    pub fn start_calculation(&mut self, document: &dyn FaceResolver) -> bool {
        if self.worker.is_some() {
            self.stop_calculation();
        }
        match self.try_start(document) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(face = %self.face, error = %e, "Analysis not started");
                false
            }
        }
    }

    fn try_start(&mut self, document: &dyn FaceResolver) -> Result<()> {
        let face = self.resolve(document)?;
        let grid = SamplingGrid::new(face.domain(), self.config.density);
        let buffer = Arc::new(ResultBuffer::new());
        let mut worker = WorkerAgent::new(
            grid,
            Arc::clone(&buffer),
            self.config.field.build(&face),
            self.config.sample_delay,
        );
        worker.start()?;

        tracing::info!(
            face = %self.face,
            density = grid.density,
            samples = grid.sample_count(),
            "Analysis running"
        );
        self.buffer = Some(buffer);
        self.worker = Some(worker);
        self.needs_initialization = false;
        self.state = AnalysisState::Running;
        Ok(())
    }

    fn resolve(&self, document: &dyn FaceResolver) -> Result<FaceGeometry> {
        document
            .resolve_face(&self.face)
            .ok_or(AnalysisError::FaceUnavailable(self.face))
    }

    /// Host idle tick: delivers new samples and reports whether the worker
    /// is still running.
    ///
    /// A pending (re)initialization is carried out first, in which case the
    /// return value is whether the new calculation started.
    pub fn update_results(&mut self, document: &dyn FaceResolver, fields: &mut dyn FieldSink) -> bool {
        if self.needs_initialization {
            return self.initialize(document, fields);
        }
        let Some(buffer) = self.buffer.clone() else {
            return false;
        };

        // Sample liveness before draining so a finished worker's last
        // samples are always part of this read.
        let alive = self.is_worker_alive();
        if !alive && self.state == AnalysisState::Running {
            self.join_finished_worker();
        }
        if let Some(results) = buffer.get_results() {
            if let Err(e) = self.publish(fields, &results) {
                tracing::warn!(face = %self.face, error = %e, "Dropped analysis results");
            }
        }
        if self.state == AnalysisState::Draining {
            self.state = AnalysisState::Finished;
            tracing::info!(face = %self.face, samples = self.delivered, "Analysis finished");
        }
        alive
    }

    fn publish(&mut self, fields: &mut dyn FieldSink, results: &FieldResults) -> Result<()> {
        let registration = match self.registration {
            Some(r) => r,
            None => self.reset_registration(fields),
        };
        fields.update_primitive(
            registration.primitive,
            &results.points,
            &results.values,
            registration.schema,
        )?;
        self.delivered = results.len();
        tracing::trace!(face = %self.face, samples = results.len(), "Analysis results delivered");
        Ok(())
    }

    fn join_finished_worker(&mut self) {
        let outcome = self.worker.take().and_then(|mut worker| worker.wait_to_finish());
        tracing::debug!(face = %self.face, ?outcome, "Analysis worker joined");
        self.state = match outcome {
            Some(WorkerOutcome::Completed { .. }) => AnalysisState::Draining,
            _ => AnalysisState::Interrupted,
        };
    }

    /// Signals the worker to stop and waits for it.
    ///
    /// Returns after at most one in-flight sample. Results already in the
    /// buffer remain readable by the next tick. A worker that had already
    /// evaluated the whole grid leaves the analysis `Draining` rather than
    /// `Interrupted`.
    pub fn stop_calculation(&mut self) {
        if let Some(buffer) = &self.buffer {
            buffer.set_completed();
        }
        let Some(mut worker) = self.worker.take() else {
            return;
        };
        let outcome = worker.wait_to_finish();
        tracing::debug!(face = %self.face, ?outcome, "Analysis worker stopped");
        if matches!(self.state, AnalysisState::Running | AnalysisState::Initializing) {
            self.state = match outcome {
                Some(WorkerOutcome::Completed { .. }) => AnalysisState::Draining,
                _ => AnalysisState::Interrupted,
            };
        }
    }

    /// Stops the worker and schedules re-initialization for the next tick.
    ///
    /// Safe to call from a document change notification.
    pub fn restart_calculation(&mut self) {
        self.stop_calculation();
        self.needs_initialization = true;
        self.state = AnalysisState::Interrupted;
        tracing::debug!(face = %self.face, "Analysis restart scheduled");
    }

    /// Stops the analysis and removes its field primitive from the display.
    pub fn dismiss(&mut self, fields: &mut dyn FieldSink) {
        self.stop_calculation();
        self.needs_initialization = false;
        if let Some(registration) = self.registration.take() {
            if let Err(e) = fields.remove_primitive(registration.primitive) {
                tracing::debug!(face = %self.face, error = %e, "Field primitive already gone");
            }
        }
        self.buffer = None;
    }

    // Registers the schema and makes sure an empty primitive exists for the
    // face, reusing the previous one when the display still has it.
    fn reset_registration(&mut self, fields: &mut dyn FieldSink) -> FieldRegistration {
        let schema = fields.register_schema(self.config.schema.clone());
        let primitive = match self.registration {
            Some(previous) if fields.clear_primitive(previous.primitive).is_ok() => previous.primitive,
            _ => fields.add_primitive(self.face),
        };
        let registration = FieldRegistration { primitive, schema };
        self.registration = Some(registration);
        registration
    }
}

impl Drop for AnalysisCoordinator {
    fn drop(&mut self) {
        self.stop_calculation();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use field_lite_model::{Document, ElementKey, Point3, SpatialFieldManager, Vector3};
    use std::time::Duration;

    fn setup(width: f64) -> (Document, ElementKey, FaceRef) {
        let mut doc = Document::new();
        let wall = doc.add_element(
            "Wall",
            vec![FaceGeometry::rectangle(
                Point3::origin(),
                Vector3::x(),
                Vector3::z(),
                width,
                width,
            )],
        );
        let face = doc.face_ref(wall, 0).unwrap();
        (doc, wall, face)
    }

    fn fast_config(density: u32) -> AnalysisConfig {
        AnalysisConfig::default()
            .with_density(density)
            .with_sample_delay(Duration::ZERO)
    }

    fn run_to_completion(
        coordinator: &mut AnalysisCoordinator,
        doc: &Document,
        fields: &mut SpatialFieldManager,
    ) {
        while coordinator.update_results(doc, fields) {
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn new_coordinator_waits_for_first_tick() {
        let (_doc, _, face) = setup(4.0);
        let coordinator = AnalysisCoordinator::new(face, fast_config(4));
        assert_eq!(coordinator.state(), AnalysisState::Uninitialized);
        assert!(coordinator.needs_initialization());
        assert!(!coordinator.has_worker());
        assert_eq!(coordinator.face_reference(), face);
    }

    #[test]
    fn first_tick_initializes_and_run_finishes() {
        let (doc, _, face) = setup(4.0);
        let mut fields = SpatialFieldManager::new();
        let mut coordinator = AnalysisCoordinator::new(face, fast_config(4));

        assert!(coordinator.update_results(&doc, &mut fields));
        assert!(!coordinator.needs_initialization());
        run_to_completion(&mut coordinator, &doc, &mut fields);

        assert_eq!(coordinator.state(), AnalysisState::Finished);
        assert!(!coordinator.has_worker());
        let primitive = fields.primitive(coordinator.primitive().unwrap()).unwrap();
        assert_eq!(primitive.values.len(), 25);
        assert_eq!(primitive.face, face);
        assert_eq!(fields.schema(primitive.schema.unwrap()).unwrap().name, "Multithreaded");
    }

    #[test]
    fn unresolvable_face_creates_nothing() {
        let (mut doc, wall, face) = setup(4.0);
        doc.delete_element(wall).unwrap();
        let mut coordinator = AnalysisCoordinator::new(face, fast_config(4));

        assert!(!coordinator.start_calculation(&doc));
        assert!(!coordinator.has_worker());
        assert!(coordinator.buffer().is_none());
    }

    #[test]
    fn stop_interrupts_running_worker() {
        let (doc, _, face) = setup(4.0);
        let mut fields = SpatialFieldManager::new();
        let config = fast_config(40).with_sample_delay(Duration::from_millis(5));
        let mut coordinator = AnalysisCoordinator::new(face, config);

        assert!(coordinator.initialize(&doc, &mut fields));
        coordinator.stop_calculation();

        assert_eq!(coordinator.state(), AnalysisState::Interrupted);
        assert!(!coordinator.has_worker());
        let buffer = coordinator.buffer().unwrap();
        assert!(buffer.is_completed());
        assert!(buffer.len() < 41 * 41);
        // Stopped runs do not report as alive.
        assert!(!coordinator.update_results(&doc, &mut fields));
        assert_eq!(coordinator.state(), AnalysisState::Interrupted);
    }

    #[test]
    fn reinitialize_reuses_the_display_primitive() {
        let (doc, _, face) = setup(4.0);
        let mut fields = SpatialFieldManager::new();
        let mut coordinator = AnalysisCoordinator::new(face, fast_config(2));

        coordinator.initialize(&doc, &mut fields);
        run_to_completion(&mut coordinator, &doc, &mut fields);
        let first = coordinator.primitive().unwrap();

        coordinator.restart_calculation();
        assert!(coordinator.update_results(&doc, &mut fields));
        assert_eq!(coordinator.state(), AnalysisState::Running);
        assert_eq!(coordinator.primitive(), Some(first));
        assert_eq!(fields.primitive_count(), 1);
        assert_eq!(fields.schemas().len(), 1);
    }

    #[test]
    fn dismiss_removes_primitive() {
        let (doc, _, face) = setup(4.0);
        let mut fields = SpatialFieldManager::new();
        let mut coordinator = AnalysisCoordinator::new(face, fast_config(2));
        coordinator.initialize(&doc, &mut fields);
        run_to_completion(&mut coordinator, &doc, &mut fields);

        coordinator.dismiss(&mut fields);
        assert_eq!(fields.primitive_count(), 0);
        assert!(!coordinator.update_results(&doc, &mut fields));
    }

    #[test]
    fn explicit_start_is_not_discarded_by_the_first_tick() {
        let (doc, _, face) = setup(4.0);
        let mut fields = SpatialFieldManager::new();
        let config = fast_config(40).with_sample_delay(Duration::from_millis(5));
        let mut coordinator = AnalysisCoordinator::new(face, config);

        assert!(coordinator.start_calculation(&doc));
        assert!(!coordinator.needs_initialization());
        let started = Arc::clone(coordinator.buffer().unwrap());
        std::thread::sleep(Duration::from_millis(30));

        assert!(coordinator.update_results(&doc, &mut fields));
        assert!(Arc::ptr_eq(&started, coordinator.buffer().unwrap()));
        assert!(!started.is_completed());
        assert_eq!(coordinator.state(), AnalysisState::Running);
        assert!(coordinator.delivered() > 0);
        coordinator.stop_calculation();
    }

    #[test]
    fn stopping_an_exhausted_run_drains_instead_of_interrupting() {
        let (doc, _, face) = setup(4.0);
        let mut fields = SpatialFieldManager::new();
        let mut coordinator = AnalysisCoordinator::new(face, fast_config(2));

        assert!(coordinator.initialize(&doc, &mut fields));
        let buffer = Arc::clone(coordinator.buffer().unwrap());
        while buffer.len() < 9 {
            std::thread::yield_now();
        }
        coordinator.stop_calculation();
        assert_eq!(coordinator.state(), AnalysisState::Draining);
        assert_eq!(coordinator.delivered(), 0);

        // The next tick delivers the whole grid and finishes.
        assert!(!coordinator.update_results(&doc, &mut fields));
        assert_eq!(coordinator.state(), AnalysisState::Finished);
        assert_eq!(coordinator.delivered(), 9);
        let primitive = fields.primitive(coordinator.primitive().unwrap()).unwrap();
        assert_eq!(primitive.values.len(), 9);
    }

    #[test]
    fn state_names() {
        assert_eq!(AnalysisState::Draining.to_string(), "Draining");
        assert_eq!(AnalysisState::Interrupted.as_str(), "Interrupted");
    }
}
