// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! JSON export of a spatial field manager's displayed results.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::fields::{ResultSchema, SpatialFieldManager};
use crate::surface::UvPoint;

/// Serializable view of every primitive and schema in a manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSnapshot {
    pub schemas: Vec<ResultSchema>,
    pub primitives: Vec<PrimitiveSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimitiveSnapshot {
    /// Stable string of the face the primitive is displayed on.
    pub face: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    pub updates: u64,
    pub points: Vec<UvPoint>,
    pub values: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl SpatialFieldManager {
    /// Captures the current state of all primitives.
    pub fn snapshot(&self) -> FieldSnapshot {
        let primitives = self
            .primitives
            .values()
            .map(|p| {
                let min = p.values.iter().copied().reduce(f64::min);
                let max = p.values.iter().copied().reduce(f64::max);
                PrimitiveSnapshot {
                    face: p.face.to_stable_string(),
                    schema: p
                        .schema
                        .and_then(|i| self.schema(i))
                        .map(|s| s.name.clone()),
                    updates: p.updates,
                    points: p.points.clone(),
                    values: p.values.clone(),
                    min,
                    max,
                }
            })
            .collect();

        FieldSnapshot {
            schemas: self.schemas().to_vec(),
            primitives,
        }
    }
}

impl FieldSnapshot {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Total number of samples across all primitives.
    pub fn sample_count(&self) -> usize {
        self.primitives.iter().map(|p| p.values.len()).sum()
    }
}
