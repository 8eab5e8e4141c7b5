// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Spatial field visualization: result schemas and per-face primitives that
//! receive batches of `(uv, value)` samples.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

use crate::error::{Error, Result};
use crate::keys::{FaceRef, PrimitiveId};
use crate::surface::UvPoint;

/// Index of a registered result schema.
pub type SchemaIndex = usize;

/// Describes what a batch of field values means.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSchema {
    pub name: String,
    pub description: String,
}

impl ResultSchema {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// The visualization sink an analysis pushes into.
pub trait FieldSink {
    /// Registers a schema, or returns the index of an already registered
    /// schema with the same name.
    fn register_schema(&mut self, schema: ResultSchema) -> SchemaIndex;

    /// Adds an empty primitive displayed on `face`.
    fn add_primitive(&mut self, face: FaceRef) -> PrimitiveId;

    /// Replaces the primitive's samples with this batch.
    fn update_primitive(
        &mut self,
        id: PrimitiveId,
        points: &[UvPoint],
        values: &[f64],
        schema: SchemaIndex,
    ) -> Result<()>;

    /// Drops the primitive's samples but keeps it registered.
    fn clear_primitive(&mut self, id: PrimitiveId) -> Result<()>;

    fn remove_primitive(&mut self, id: PrimitiveId) -> Result<()>;
}

/// One displayed field on one face.
#[derive(Debug, Clone)]
pub struct FieldPrimitive {
    pub face: FaceRef,
    pub points: Vec<UvPoint>,
    pub values: Vec<f64>,
    pub schema: Option<SchemaIndex>,
    /// Number of batches pushed since the primitive was added or cleared.
    pub updates: u64,
}

/// In-memory spatial field manager for one view.
#[derive(Debug, Default)]
pub struct SpatialFieldManager {
    schemas: Vec<ResultSchema>,
    schema_names: FxHashMap<String, SchemaIndex>,
    pub(crate) primitives: SlotMap<PrimitiveId, FieldPrimitive>,
}

impl SpatialFieldManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schema(&self, index: SchemaIndex) -> Option<&ResultSchema> {
        self.schemas.get(index)
    }

    pub fn schemas(&self) -> &[ResultSchema] {
        &self.schemas
    }

    pub fn primitive(&self, id: PrimitiveId) -> Option<&FieldPrimitive> {
        self.primitives.get(id)
    }

    pub fn primitive_count(&self) -> usize {
        self.primitives.len()
    }

    /// Iterates primitives in slot order.
    pub fn primitives(&self) -> impl Iterator<Item = (PrimitiveId, &FieldPrimitive)> {
        self.primitives.iter()
    }

    fn primitive_mut(&mut self, id: PrimitiveId) -> Result<&mut FieldPrimitive> {
        self.primitives
            .get_mut(id)
            .ok_or(Error::PrimitiveNotFound(id))
    }
}

impl FieldSink for SpatialFieldManager {
    fn register_schema(&mut self, schema: ResultSchema) -> SchemaIndex {
        if let Some(&index) = self.schema_names.get(&schema.name) {
            return index;
        }
        let index = self.schemas.len();
        self.schema_names.insert(schema.name.clone(), index);
        self.schemas.push(schema);
        index
    }

    fn add_primitive(&mut self, face: FaceRef) -> PrimitiveId {
        self.primitives.insert(FieldPrimitive {
            face,
            points: Vec::new(),
            values: Vec::new(),
            schema: None,
            updates: 0,
        })
    }

    fn update_primitive(
        &mut self,
        id: PrimitiveId,
        points: &[UvPoint],
        values: &[f64],
        schema: SchemaIndex,
    ) -> Result<()> {
        if points.len() != values.len() {
            return Err(Error::LengthMismatch {
                points: points.len(),
                values: values.len(),
            });
        }
        if schema >= self.schemas.len() {
            return Err(Error::SchemaNotFound(schema));
        }
        let primitive = self.primitive_mut(id)?;
        primitive.points.clear();
        primitive.points.extend_from_slice(points);
        primitive.values.clear();
        primitive.values.extend_from_slice(values);
        primitive.schema = Some(schema);
        primitive.updates += 1;
        Ok(())
    }

    fn clear_primitive(&mut self, id: PrimitiveId) -> Result<()> {
        let primitive = self.primitive_mut(id)?;
        primitive.points.clear();
        primitive.values.clear();
        primitive.schema = None;
        primitive.updates = 0;
        Ok(())
    }

    fn remove_primitive(&mut self, id: PrimitiveId) -> Result<()> {
        self.primitives
            .remove(id)
            .map(|_| ())
            .ok_or(Error::PrimitiveNotFound(id))
    }
}
