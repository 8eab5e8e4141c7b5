// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Analysis configuration, with optional overrides from environment variables.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use field_lite_model::{FaceGeometry, Point3, ResultSchema};

use crate::error::AnalysisError;
use crate::field::{DistanceField, FieldFunction, GridWorkload};

/// Which scalar field the worker evaluates.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// Synthetic workload on grid indices.
    Grid,
    /// Distance from each face point to `target`.
    Distance { target: Point3<f64> },
}

impl FieldKind {
    /// Builds the field function for one run on `face`.
    pub fn build(&self, face: &FaceGeometry) -> Arc<dyn FieldFunction> {
        match self {
            FieldKind::Grid => Arc::new(GridWorkload),
            FieldKind::Distance { target } => Arc::new(DistanceField::new(face.clone(), *target)),
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Grid => f.write_str("grid"),
            FieldKind::Distance { target } => {
                write!(f, "distance:{},{},{}", target.x, target.y, target.z)
            }
        }
    }
}

impl FromStr for FieldKind {
    type Err = AnalysisError;

    /// Accepts `grid` or `distance:x,y,z`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("grid") {
            return Ok(FieldKind::Grid);
        }
        let invalid = || AnalysisError::Config(format!("unknown field kind {s:?}"));
        let coords = s
            .strip_prefix("distance:")
            .ok_or_else(invalid)?
            .split(',')
            .map(|c| c.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| invalid())?;
        match coords.as_slice() {
            [x, y, z] => Ok(FieldKind::Distance {
                target: Point3::new(*x, *y, *z),
            }),
            _ => Err(invalid()),
        }
    }
}

/// Settings for one analysis.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Grid resolution: the worker evaluates `(density + 1)^2` samples.
    pub density: u32,
    /// Artificial per-sample delay; zero disables it.
    pub sample_delay: Duration,
    /// Schema the results are tagged with in the field display.
    pub schema: ResultSchema,
    pub field: FieldKind,
}

impl AnalysisConfig {
    /// Built-in defaults overridden by `FIELD_LITE_DENSITY`,
    /// `FIELD_LITE_SAMPLE_DELAY_MS`, `FIELD_LITE_SCHEMA` and `FIELD_LITE_FIELD`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            density: std::env::var("FIELD_LITE_DENSITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.density),
            sample_delay: std::env::var("FIELD_LITE_SAMPLE_DELAY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.sample_delay),
            schema: std::env::var("FIELD_LITE_SCHEMA")
                .ok()
                .filter(|name| !name.trim().is_empty())
                .map(|name| ResultSchema::new(name, defaults.schema.description.clone()))
                .unwrap_or(defaults.schema),
            field: match std::env::var("FIELD_LITE_FIELD") {
                Ok(value) => value.parse().unwrap_or_else(|e| {
                    tracing::warn!(error = %e, "Ignoring FIELD_LITE_FIELD");
                    defaults.field
                }),
                Err(_) => defaults.field,
            },
        }
    }

    pub fn with_density(mut self, density: u32) -> Self {
        self.density = density;
        self
    }

    pub fn with_sample_delay(mut self, delay: Duration) -> Self {
        self.sample_delay = delay;
        self
    }

    pub fn with_field(mut self, field: FieldKind) -> Self {
        self.field = field;
        self
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            density: 10,
            sample_delay: Duration::from_millis(100),
            schema: ResultSchema::new("Multithreaded", "Incrementally computed face analysis"),
            field: FieldKind::Grid,
        }
    }
}
