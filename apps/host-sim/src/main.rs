// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Field-Lite Host - a simulated BIM host application.
//!
//! Builds a small document, starts an analysis on one face and then behaves
//! like a host event loop: it raises idle callbacks at a fixed interval,
//! edits the analyzed face partway through, and finally writes the field
//! display as a JSON snapshot.
//!
//! # Environment
//!
//! - `TICK_INTERVAL_MS`, `MAX_TICKS`, `EDIT_AT_TICK`, `OUTPUT_PATH`, `LOG_FORMAT`
//! - `FIELD_LITE_DENSITY`, `FIELD_LITE_SAMPLE_DELAY_MS`, `FIELD_LITE_SCHEMA`,
//!   `FIELD_LITE_FIELD`

use std::f64::consts::PI;
use std::thread;

use anyhow::Context;
use field_lite_analysis::AnalysisSession;
use field_lite_model::{
    Document, FaceGeometry, FaceRef, Point3, SpatialFieldManager, Surface, UvRect, Vector3,
};

mod config;

use config::{Config, LogFormat};

fn main() -> anyhow::Result<()> {
    let config = Config::from_env();
    init_tracing(config.log_format);

    tracing::info!(
        tick_ms = config.tick_interval.as_millis() as u64,
        max_ticks = config.max_ticks,
        edit_at_tick = config.edit_at_tick,
        density = config.analysis.density,
        field = %config.analysis.field,
        "Starting Field-Lite host"
    );

    let (mut document, face) = sample_document().context("Failed to build sample document")?;
    let mut fields = SpatialFieldManager::new();
    let mut session = AnalysisSession::new(config.analysis.clone());
    session.start_analysis(face, &mut fields);

    let mut ticks = 0u32;
    while ticks < config.max_ticks {
        ticks += 1;

        if ticks == config.edit_at_tick {
            let change = document
                .modify_face(&face, |geometry| geometry.domain.max.u *= 1.5)
                .context("Failed to edit analyzed face")?;
            tracing::info!(tick = ticks, version = change.version, "Edited analyzed face");
            session.on_document_changed(&change);
        }

        let running = session.on_idle(&document, &mut fields);
        if !running && !session.wants_idle() {
            break;
        }
        thread::sleep(config.tick_interval);
    }

    match session.coordinator() {
        Some(coordinator) => tracing::info!(
            ticks,
            state = %coordinator.state(),
            delivered = coordinator.delivered(),
            "Analysis loop ended"
        ),
        None => tracing::warn!(ticks, "No analysis was running"),
    }

    let json = fields
        .snapshot()
        .to_json()
        .context("Failed to serialize field snapshot")?;
    match &config.output {
        Some(path) => {
            std::fs::write(path, &json)
                .with_context(|| format!("Failed to write snapshot to {}", path.display()))?;
            tracing::info!(path = %path.display(), "Wrote field snapshot");
        }
        None => println!("{json}"),
    }

    session.on_document_closing(&mut fields);
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG")
            .unwrap_or_else(|_| "info,field_lite_analysis=debug,field_lite_host=debug".into()),
    );
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.pretty().init(),
    }
}

/// A wall and a barrel vault. Returns the wall's outer face.
fn sample_document() -> field_lite_model::Result<(Document, FaceRef)> {
    let mut document = Document::new();
    let wall = document.add_element(
        "Basic Wall: Exterior",
        vec![
            FaceGeometry::rectangle(Point3::origin(), Vector3::x(), Vector3::z(), 6.0, 3.0),
            FaceGeometry::rectangle(
                Point3::new(0.0, 0.3, 0.0),
                Vector3::x(),
                Vector3::z(),
                6.0,
                3.0,
            ),
        ],
    );
    document.add_element(
        "Barrel Vault",
        vec![FaceGeometry::new(
            Surface::Cylinder {
                origin: Point3::new(0.0, 4.0, 3.0),
                axis: Vector3::x(),
                ref_dir: Vector3::y(),
                radius: 2.0,
            },
            UvRect::from_bounds(0.0, 0.0, PI, 6.0),
        )],
    );
    let face = document.face_ref(wall, 0)?;
    Ok((document, face))
}
