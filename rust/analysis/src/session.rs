// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Host-application context for face analysis.
//!
//! One [`AnalysisSession`] is created at host startup and dropped at
//! shutdown; the host forwards its idle, document-changed and
//! document-closing callbacks to it. The session owns at most one
//! [`AnalysisCoordinator`] at a time.

use field_lite_model::{DocumentChange, FaceRef, FaceResolver, FieldSink};

use crate::config::AnalysisConfig;
use crate::coordinator::AnalysisCoordinator;

#[derive(Debug, Default)]
pub struct AnalysisSession {
    config: AnalysisConfig,
    coordinator: Option<AnalysisCoordinator>,
    wants_idle: bool,
}

impl AnalysisSession {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            coordinator: None,
            wants_idle: false,
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn coordinator(&self) -> Option<&AnalysisCoordinator> {
        self.coordinator.as_ref()
    }

    /// Whether the host should keep raising idle callbacks.
    pub fn wants_idle(&self) -> bool {
        self.wants_idle
    }

    /// Begins analyzing `face`, replacing any analysis in progress. The work
    /// starts on the next idle tick.
    pub fn start_analysis(&mut self, face: FaceRef, fields: &mut dyn FieldSink) {
        self.dismiss(fields);
        tracing::info!(face = %face, "Analysis requested");
        self.coordinator = Some(AnalysisCoordinator::new(face, self.config.clone()));
        self.wants_idle = true;
    }

    /// Idle callback. Returns `true` while the analysis is still running.
    pub fn on_idle(&mut self, document: &dyn FaceResolver, fields: &mut dyn FieldSink) -> bool {
        let Some(coordinator) = self.coordinator.as_mut() else {
            self.wants_idle = false;
            return false;
        };
        let running = coordinator.update_results(document, fields);
        self.wants_idle = running || coordinator.needs_initialization();
        running
    }

    /// Document-changed callback. Restarts the analysis if its element was
    /// touched; the restart itself happens on the next idle tick.
    pub fn on_document_changed(&mut self, change: &DocumentChange) {
        let Some(coordinator) = self.coordinator.as_mut() else {
            return;
        };
        let face = coordinator.face_reference();
        if change.affects(face.element) {
            tracing::debug!(face = %face, version = change.version, "Analyzed element changed");
            coordinator.restart_calculation();
            self.wants_idle = true;
        }
    }

    /// Document-closing callback.
    pub fn on_document_closing(&mut self, fields: &mut dyn FieldSink) {
        self.dismiss(fields);
    }

    /// Stops the current analysis, if any, and clears its display.
    pub fn dismiss(&mut self, fields: &mut dyn FieldSink) {
        if let Some(mut coordinator) = self.coordinator.take() {
            tracing::info!(face = %coordinator.face_reference(), "Analysis dismissed");
            coordinator.dismiss(fields);
        }
        self.wants_idle = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::AnalysisState;
    use field_lite_model::{Document, FaceGeometry, Point3, SpatialFieldManager, Vector3};
    use std::time::Duration;

    fn document() -> (Document, FaceRef, FaceRef) {
        let mut doc = Document::new();
        let face = || FaceGeometry::rectangle(Point3::origin(), Vector3::x(), Vector3::z(), 4.0, 3.0);
        let wall = doc.add_element("Wall", vec![face()]);
        let other = doc.add_element("Other", vec![face()]);
        let wall = doc.face_ref(wall, 0).unwrap();
        let other = doc.face_ref(other, 0).unwrap();
        (doc, wall, other)
    }

    fn session() -> AnalysisSession {
        AnalysisSession::new(
            AnalysisConfig::default()
                .with_density(3)
                .with_sample_delay(Duration::ZERO),
        )
    }

    fn idle_until_done(session: &mut AnalysisSession, doc: &Document, fields: &mut SpatialFieldManager) {
        while session.on_idle(doc, fields) || session.wants_idle() {
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn idle_without_analysis_stops_idling() {
        let (doc, _, _) = document();
        let mut fields = SpatialFieldManager::new();
        let mut session = session();
        assert!(!session.on_idle(&doc, &mut fields));
        assert!(!session.wants_idle());
    }

    #[test]
    fn start_runs_on_idle_until_finished() {
        let (doc, wall, _) = document();
        let mut fields = SpatialFieldManager::new();
        let mut session = session();
        session.start_analysis(wall, &mut fields);
        assert!(session.wants_idle());

        idle_until_done(&mut session, &doc, &mut fields);
        let coordinator = session.coordinator().unwrap();
        assert_eq!(coordinator.state(), AnalysisState::Finished);
        assert_eq!(coordinator.delivered(), 16);
    }

    #[test]
    fn unrelated_change_is_ignored() {
        let (mut doc, wall, other) = document();
        let mut fields = SpatialFieldManager::new();
        let mut session = session();
        session.start_analysis(wall, &mut fields);
        idle_until_done(&mut session, &doc, &mut fields);

        let change = doc
            .modify_face(&other, |f| f.domain.max.u = 10.0)
            .unwrap();
        session.on_document_changed(&change);
        assert!(!session.wants_idle());
        assert_eq!(session.coordinator().unwrap().state(), AnalysisState::Finished);
    }

    #[test]
    fn change_to_analyzed_element_restarts_on_next_idle() {
        let (mut doc, wall, _) = document();
        let mut fields = SpatialFieldManager::new();
        let mut session = session();
        session.start_analysis(wall, &mut fields);
        idle_until_done(&mut session, &doc, &mut fields);

        let change = doc.modify_face(&wall, |f| f.domain.max.u = 8.0).unwrap();
        session.on_document_changed(&change);
        assert!(session.wants_idle());
        assert!(session.coordinator().unwrap().needs_initialization());

        idle_until_done(&mut session, &doc, &mut fields);
        let coordinator = session.coordinator().unwrap();
        assert_eq!(coordinator.state(), AnalysisState::Finished);
        let primitive = fields.primitive(coordinator.primitive().unwrap()).unwrap();
        let max_u = primitive.points.iter().map(|p| p.u).fold(f64::MIN, f64::max);
        assert_eq!(max_u, 8.0);
    }

    #[test]
    fn deleted_element_stops_without_retrying() {
        let (mut doc, wall, _) = document();
        let mut fields = SpatialFieldManager::new();
        let mut session = session();
        session.start_analysis(wall, &mut fields);

        let change = doc.delete_element(wall.element).unwrap();
        session.on_document_changed(&change);
        assert!(!session.on_idle(&doc, &mut fields));
        assert!(!session.wants_idle());
        assert!(!session.coordinator().unwrap().has_worker());
    }

    #[test]
    fn closing_dismisses_analysis() {
        let (doc, wall, _) = document();
        let mut fields = SpatialFieldManager::new();
        let mut session = session();
        session.start_analysis(wall, &mut fields);
        session.on_idle(&doc, &mut fields);
        assert_eq!(fields.primitive_count(), 1);

        session.on_document_closing(&mut fields);
        assert!(session.coordinator().is_none());
        assert_eq!(fields.primitive_count(), 0);
        assert!(!session.wants_idle());
    }

    #[test]
    fn starting_a_new_analysis_replaces_the_old_one() {
        let (doc, wall, other) = document();
        let mut fields = SpatialFieldManager::new();
        let mut session = session();
        session.start_analysis(wall, &mut fields);
        session.on_idle(&doc, &mut fields);

        session.start_analysis(other, &mut fields);
        assert_eq!(fields.primitive_count(), 0);
        idle_until_done(&mut session, &doc, &mut fields);
        assert_eq!(fields.primitive_count(), 1);
        assert_eq!(session.coordinator().unwrap().face_reference(), other);
    }
}
